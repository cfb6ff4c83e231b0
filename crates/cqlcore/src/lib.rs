//! Clinical Quality Language (CQL) implementation for Rust
//!
//! This crate provides a complete CQL engine for FHIR R4 analytics:
//! - Parsing CQL source into an AST
//! - Lowering the AST into a typed, resolved intermediate representation
//! - Evaluating that IR against a retriever and terminology provider
//!
//! # Example
//!
//! ```ignore
//! use cqlcore::{compile, evaluate};
//! use cqlcore_eval::EvaluationContext;
//!
//! let cql = r#"
//! library Example version '1.0.0'
//!
//! define InPopulation:
//!     AgeInYears() >= 18
//! "#;
//!
//! let library = compile(cql)?;
//! let mut ctx = EvaluationContext::new();
//! let results = evaluate(&library, &mut ctx)?;
//! ```

// Re-export all public APIs from internal crates
pub use cqlcore_ast as ast;
pub use cqlcore_diagnostics as diagnostics;
pub use cqlcore_eval as eval;
pub use cqlcore_ir as ir;
pub use cqlcore_model as model;
pub use cqlcore_parser as parser;
pub use cqlcore_types as types;

// Convenience re-exports
pub use cqlcore_diagnostics::{CqlError, Result};
pub use cqlcore_eval::{CqlEngine, EvaluationContext};
pub use cqlcore_ir::Library;
pub use cqlcore_types::CqlValue;

/// Parse and lower a single CQL source text into a compiled, typed library.
///
/// This is the front-end pipeline end to end: parse to AST, then lower the
/// AST to the typed IR (reference resolution, overload selection, implicit
/// conversion insertion). A single library's `include` statements are not
/// resolved here; pass the libraries a multi-library compilation depends on
/// via [`compile_with_dependencies`] instead.
pub fn compile(source: &str) -> Result<Library> {
    let ast_library = cqlcore_parser::parse(source)?;
    let mut lowering = cqlcore_ir::AstLowering::with_source(source);
    Ok(lowering.convert_library(&ast_library))
}

/// Parse and lower CQL source, given the already-compiled libraries it
/// `include`s (keyed by library name).
pub fn compile_with_dependencies(
    source: &str,
    _dependencies: &std::collections::HashMap<String, Library>,
) -> Result<Library> {
    // TODO(cross-library resolution): thread `_dependencies` into AstLowering
    // once its resolver consults an external library registry rather than
    // only the current library's own definitions.
    compile(source)
}

/// Compile a set of CQL sources that `include` one another, keyed by the
/// library name each source is known by (the same name other sources'
/// `include` statements reference).
///
/// Builds the include graph from each library's lowered `includes` section,
/// topologically orders it, and rejects circular includes with a
/// [`CqlError::Semantic`] (`CQL0114`) naming every library on the cycle.
/// Returns every compiled library, keyed by name.
pub fn compile_library_set(
    sources: &std::collections::HashMap<String, String>,
) -> Result<std::collections::HashMap<String, Library>> {
    let mut libraries = std::collections::HashMap::new();
    for (name, source) in sources {
        libraries.insert(name.clone(), compile(source)?);
    }

    let graph: std::collections::HashMap<String, Vec<String>> = libraries
        .iter()
        .map(|(name, library)| {
            let deps = library
                .includes
                .as_ref()
                .map(|defs| defs.defs.iter().map(|d| d.path.clone()).collect())
                .unwrap_or_default();
            (name.clone(), deps)
        })
        .collect();

    let order = topological_include_order(&graph)?;

    for name in &order {
        let library = &libraries[name];
        let dependencies: std::collections::HashMap<String, Library> = library
            .includes
            .iter()
            .flat_map(|defs| defs.defs.iter())
            .filter_map(|inc| libraries.get(&inc.path).map(|lib| (inc.path.clone(), lib.clone())))
            .collect();
        compile_with_dependencies(&sources[name], &dependencies)?;
    }

    Ok(libraries)
}

/// Topologically order an include graph, detecting cycles.
///
/// A library whose include chain reaches back to itself is reported as a
/// `CQL0114` (circular reference) semantic error naming the full cycle, so
/// that every library participating in the cycle sees the same diagnostic.
fn topological_include_order(
    graph: &std::collections::HashMap<String, Vec<String>>,
) -> Result<Vec<String>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit(
        node: &str,
        graph: &std::collections::HashMap<String, Vec<String>>,
        state: &mut std::collections::HashMap<String, State>,
        path: &mut Vec<String>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        match state.get(node).copied() {
            Some(State::Done) => return Ok(()),
            Some(State::Visiting) => {
                let cycle_start = path.iter().position(|n| n == node).unwrap_or(0);
                let mut cycle = path[cycle_start..].to_vec();
                cycle.push(node.to_string());
                return Err(CqlError::semantic(
                    cqlcore_diagnostics::CQL0114,
                    format!("circular library include: {}", cycle.join(" -> ")),
                ));
            }
            _ => {}
        }
        state.insert(node.to_string(), State::Visiting);
        path.push(node.to_string());
        if let Some(deps) = graph.get(node) {
            for dep in deps {
                if graph.contains_key(dep) {
                    visit(dep, graph, state, path, order)?;
                }
            }
        }
        path.pop();
        state.insert(node.to_string(), State::Done);
        order.push(node.to_string());
        Ok(())
    }

    let mut state = std::collections::HashMap::new();
    let mut order = Vec::new();
    let mut path = Vec::new();
    for node in graph.keys() {
        visit(node, graph, &mut state, &mut path, &mut order)?;
    }
    Ok(order)
}

/// Build an [`EvaluationContext`] populated with every non-root library from
/// a compiled set, keyed by the local include identifier the root library
/// uses to refer to them, so qualified `Lib.Name` references resolve.
pub fn link_included_libraries(
    root: &Library,
    compiled: &std::collections::HashMap<String, Library>,
) -> std::collections::HashMap<String, std::sync::Arc<Library>> {
    root.includes
        .iter()
        .flat_map(|defs| defs.defs.iter())
        .filter_map(|inc| {
            compiled
                .get(&inc.path)
                .map(|lib| (inc.local_identifier.clone(), std::sync::Arc::new(lib.clone())))
        })
        .collect()
}

/// Evaluate every public definition in a compiled library.
pub fn evaluate(
    library: &Library,
    ctx: &mut EvaluationContext,
) -> cqlcore_eval::EvalResult<indexmap::IndexMap<String, CqlValue>> {
    CqlEngine::new().evaluate_library(library, ctx)
}

/// Evaluate a single named definition in a compiled library.
pub fn evaluate_definition(
    library: &Library,
    name: &str,
    ctx: &mut EvaluationContext,
) -> cqlcore_eval::EvalResult<CqlValue> {
    CqlEngine::new().evaluate_expression(library, name, ctx)
}

/// Evaluate a library into the platform-neutral result structure: every
/// definition's outcome tagged with its closed-set type name, or the
/// structured error that aborted it. Pass `include_private` to also return
/// private definitions (e.g. for debugging a library's helper expressions).
pub fn evaluate_to_result(
    library: &Library,
    ctx: &mut EvaluationContext,
    include_private: bool,
) -> cqlcore_eval::EvalResult<cqlcore_eval::LibraryResult> {
    cqlcore_eval::result::evaluate_to_result(&CqlEngine::new(), library, ctx, include_private)
}
