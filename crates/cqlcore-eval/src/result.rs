//! Result model
//!
//! Wraps [`CqlEngine::evaluate_library_collecting`] in the platform-neutral
//! shape external consumers see: an ordered list of library blocks, each a
//! map from definition name to a typed, tagged value or a structured error.
//! Per-definition failures never abort the library (see the engine's error
//! taxonomy); only a cancellation or other catastrophic error aborts the
//! whole invocation, surfacing as the outer `Result::Err`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::engine::CqlEngine;
use crate::error::{ErrorLocation, EvalError};
use cqlcore_ir::Library;
use cqlcore_types::CqlValue;

/// A value tagged with its closed-set type name, for platform-neutral
/// consumption (JSON, etc.) by hosts that don't share the Rust type system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedValue {
    /// One of the fixed result type tags, e.g. `System.Integer`, `List`,
    /// `System.ValueSet`.
    pub type_tag: String,
    /// The value itself.
    pub value: CqlValue,
}

impl TypedValue {
    /// Tag a value with its closed-set type name.
    pub fn new(value: CqlValue) -> Self {
        let type_tag = type_tag_for(&value);
        Self { type_tag, value }
    }
}

/// Derive the external type tag for a value.
///
/// Mirrors [`CqlValue::get_type`]'s qualified name for most variants. A
/// `ValueSet`/`CodeSystem` reference has no dedicated `CqlValue` variant in
/// this interpreter (see `eval_valueset_ref`/`eval_codesystem_ref`); it is
/// represented as the same `{"type": ..., "name": ...}` placeholder tuple
/// used at retrieve time, so that shape is recognized here too rather than
/// falling through to a plain `Tuple` tag.
fn type_tag_for(value: &CqlValue) -> String {
    match value {
        CqlValue::Null => "Null".to_string(),
        CqlValue::List(_) => "List".to_string(),
        CqlValue::Interval(_) => "Interval".to_string(),
        CqlValue::Tuple(tuple) => match tuple.get("type") {
            Some(CqlValue::String(kind)) if kind == "ValueSet" => "System.ValueSet".to_string(),
            Some(CqlValue::String(kind)) if kind == "CodeSystem" => "System.CodeSystem".to_string(),
            _ => "Tuple".to_string(),
        },
        other => other.get_type().qualified_name(),
    }
}

/// A structured evaluation failure, shaped for external consumption: a
/// stable category (see [`EvalError::category`]), the rendered message, the
/// source location of the expression that raised it (when the engine could
/// resolve one), and the chain of causes that led to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultError {
    /// Stable category tag (`division-by-zero`, `missing-terminology-resource`, ...).
    pub category: String,
    /// Rendered error message.
    pub message: String,
    /// Library and 1-based line/column range of the failing expression,
    /// when the engine attached one (e.g. a retrieve or top-level definition).
    pub location: Option<ErrorLocation>,
    /// The error that caused this one, if any (e.g. the terminology error
    /// underneath a retrieve's `missing-terminology-resource`).
    pub cause: Option<Box<ResultError>>,
}

impl From<&EvalError> for ResultError {
    fn from(err: &EvalError) -> Self {
        let (location, cause) = match err {
            EvalError::Located { location, source } => {
                (Some(location.clone()), Some(Box::new(ResultError::from(source.as_ref()))))
            }
            _ => (None, None),
        };
        Self {
            category: err.category().to_string(),
            message: err.to_string(),
            location,
            cause,
        }
    }
}

/// One definition's outcome: its tagged value, or the error that aborted it.
pub type DefinitionOutcome = Result<TypedValue, ResultError>;

/// One library's result block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryResult {
    /// Library name.
    pub library_name: String,
    /// Library version, when declared.
    pub library_version: Option<String>,
    /// Definition name to outcome, in declaration order.
    pub definitions: IndexMap<String, DefinitionOutcome>,
}

impl LibraryResult {
    /// Iterate only the successfully evaluated definitions.
    pub fn values(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.definitions
            .iter()
            .filter_map(|(name, outcome)| outcome.as_ref().ok().map(|v| (name.as_str(), v)))
    }

    /// Iterate only the failed definitions.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &ResultError)> {
        self.definitions
            .iter()
            .filter_map(|(name, outcome)| outcome.as_ref().err().map(|e| (name.as_str(), e)))
    }
}

/// The full, ordered result of an evaluation invocation: one block per
/// evaluated library, in the order the libraries were evaluated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Per-library result blocks.
    pub libraries: Vec<LibraryResult>,
}

impl EvaluationResult {
    /// An empty result, ready to have library blocks pushed onto it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a library's result block.
    pub fn push(&mut self, result: LibraryResult) {
        self.libraries.push(result);
    }

    /// Look up a library's block by name.
    pub fn library(&self, name: &str) -> Option<&LibraryResult> {
        self.libraries.iter().find(|block| block.library_name == name)
    }
}

/// Evaluate every definition in `library` (public-only, or public and
/// private when `include_private` is set) and wrap the outcome in the
/// platform-neutral result structure.
///
/// A per-definition evaluation error is captured in its slot rather than
/// propagated; only a catastrophic failure (cancellation) returns `Err`,
/// aborting the whole invocation per the engine's error taxonomy.
pub fn evaluate_to_result(
    engine: &CqlEngine,
    library: &Library,
    ctx: &mut EvaluationContext,
    include_private: bool,
) -> Result<LibraryResult, EvalError> {
    let outcomes = engine.evaluate_library_collecting(library, ctx, include_private)?;
    let definitions = outcomes
        .into_iter()
        .map(|(name, outcome)| {
            let result = outcome
                .map(TypedValue::new)
                .map_err(|err| ResultError::from(&err));
            (name, result)
        })
        .collect();

    Ok(LibraryResult {
        library_name: library.identifier.id.clone(),
        library_version: library.identifier.version.clone(),
        definitions,
    })
}
