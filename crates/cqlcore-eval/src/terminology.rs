//! Bundled in-memory terminology provider
//!
//! Implements the `in-valueset`/`in-codesystem`/`expand-valueset` contract
//! entirely against value sets and code systems registered in memory: no
//! network call, no external terminology server. A value set's `compose` may
//! reference other value sets or whole code systems by URL; expansion
//! resolves that graph recursively, detects cycles, and memoizes results per
//! `(url, version)` for the life of the provider.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::context::TerminologyProvider as EvalTerminologyProvider;
use crate::error::{EvalError, EvalResult};
use cqlcore_types::{CqlCode, CqlConcept, CqlValue};

/// One `compose.include` entry in a value set definition.
#[derive(Debug, Clone)]
pub enum ComposeInclude {
    /// An explicit, enumerated list of codes from a system.
    Codes { system: String, codes: Vec<CqlCode> },
    /// Every code in a bundled code system.
    CodeSystem { url: String },
    /// Every code in another bundled value set (nested compose).
    ValueSet { url: String },
}

/// A bundled value set definition.
#[derive(Debug, Clone)]
pub struct ValueSetDefinition {
    pub url: String,
    pub version: Option<String>,
    pub compose: Vec<ComposeInclude>,
}

impl ValueSetDefinition {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: None,
            compose: Vec::new(),
        }
    }

    pub fn with_codes(mut self, system: impl Into<String>, codes: Vec<CqlCode>) -> Self {
        self.compose.push(ComposeInclude::Codes {
            system: system.into(),
            codes,
        });
        self
    }

    pub fn with_code_system(mut self, url: impl Into<String>) -> Self {
        self.compose.push(ComposeInclude::CodeSystem { url: url.into() });
        self
    }

    pub fn with_value_set(mut self, url: impl Into<String>) -> Self {
        self.compose.push(ComposeInclude::ValueSet { url: url.into() });
        self
    }

    pub fn at_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A bundled code system definition: a flat enumeration of codes.
#[derive(Debug, Clone)]
pub struct CodeSystemDefinition {
    pub url: String,
    pub version: Option<String>,
    pub codes: Vec<CqlCode>,
}

impl CodeSystemDefinition {
    pub fn new(url: impl Into<String>, codes: Vec<CqlCode>) -> Self {
        Self {
            url: url.into(),
            version: None,
            codes,
        }
    }
}

/// Errors surfaced while expanding a bundled value set or code system.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TerminologyError {
    #[error("unknown value set: {0}")]
    UnknownValueSet(String),

    #[error("unknown code system: {0}")]
    UnknownCodeSystem(String),

    #[error("circular compose detected while expanding: {0}")]
    CircularCompose(String),

    #[error("url {0} resolves to a {1}, not a value set")]
    KindMismatch(String, &'static str),
}

/// A bundled, in-memory terminology provider.
///
/// Registration (`with_value_set`/`with_code_system`) is expected at setup
/// time; lookups use a reader-preferring lock so concurrent evaluations never
/// block each other once the bundle is populated. Multiple versions of the
/// same url may be registered; a lookup with no version picks the highest
/// version by string comparison, matching the data-model catalog's rule for
/// unversioned resolution.
#[derive(Default)]
pub struct InMemoryTerminologyProvider {
    value_sets: RwLock<HashMap<String, Vec<ValueSetDefinition>>>,
    code_systems: RwLock<HashMap<String, Vec<CodeSystemDefinition>>>,
    expansion_cache: RwLock<HashMap<(String, Option<String>), Vec<CqlCode>>>,
}

/// Pick the entry matching `version` exactly, or (when `version` is `None`)
/// the entry with the lexicographically greatest version string.
fn resolve_version<'a, T>(
    entries: &'a [T],
    version: Option<&str>,
    version_of: impl Fn(&T) -> &Option<String>,
) -> Option<&'a T> {
    match version {
        Some(v) => entries.iter().find(|e| version_of(e).as_deref() == Some(v)),
        None => entries
            .iter()
            .max_by(|a, b| version_of(a).cmp(version_of(b))),
    }
}

impl InMemoryTerminologyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value_set(self, vs: ValueSetDefinition) -> Self {
        self.value_sets
            .write()
            .entry(vs.url.clone())
            .or_default()
            .push(vs);
        self
    }

    pub fn with_code_system(self, cs: CodeSystemDefinition) -> Self {
        self.code_systems
            .write()
            .entry(cs.url.clone())
            .or_default()
            .push(cs);
        self
    }

    /// Expand a value set into its member codes, resolving nested
    /// value-set/code-system references and caching the result.
    pub fn try_expand_value_set(&self, url: &str) -> Result<Vec<CqlCode>, TerminologyError> {
        self.try_expand_value_set_versioned(url, None)
    }

    /// Version-qualified expansion; `version: None` resolves to the
    /// highest registered version for `url`.
    pub fn try_expand_value_set_versioned(
        &self,
        url: &str,
        version: Option<&str>,
    ) -> Result<Vec<CqlCode>, TerminologyError> {
        let cache_key = (url.to_string(), version.map(str::to_string));
        if let Some(cached) = self.expansion_cache.read().get(&cache_key) {
            return Ok(cached.clone());
        }
        let mut visited = HashSet::new();
        let expanded = self.expand_value_set_inner(url, version, &mut visited)?;
        self.expansion_cache
            .write()
            .insert(cache_key, expanded.clone());
        Ok(expanded)
    }

    fn expand_value_set_inner(
        &self,
        url: &str,
        version: Option<&str>,
        visited: &mut HashSet<String>,
    ) -> Result<Vec<CqlCode>, TerminologyError> {
        if !visited.insert(url.to_string()) {
            log::warn!("circular value set compose detected at {url}");
            return Err(TerminologyError::CircularCompose(url.to_string()));
        }
        let value_sets = self.value_sets.read();
        let vs = resolve_version(
            value_sets.get(url).map(Vec::as_slice).unwrap_or(&[]),
            version,
            |vs| &vs.version,
        )
        .cloned();
        drop(value_sets);
        let vs = match vs {
            Some(vs) => vs,
            None => {
                if self.code_systems.read().contains_key(url) {
                    return Err(TerminologyError::KindMismatch(url.to_string(), "code system"));
                }
                return Err(TerminologyError::UnknownValueSet(url.to_string()));
            }
        };

        let mut codes = Vec::new();
        for include in &vs.compose {
            match include {
                ComposeInclude::Codes { codes: cs, .. } => codes.extend(cs.iter().cloned()),
                ComposeInclude::CodeSystem { url: cs_url } => {
                    let code_systems = self.code_systems.read();
                    let cs = resolve_version(
                        code_systems.get(cs_url).map(Vec::as_slice).unwrap_or(&[]),
                        None,
                        |cs| &cs.version,
                    )
                    .cloned()
                    .ok_or_else(|| TerminologyError::UnknownCodeSystem(cs_url.clone()))?;
                    codes.extend(cs.codes);
                }
                ComposeInclude::ValueSet { url: nested_url } => {
                    codes.extend(self.expand_value_set_inner(nested_url, None, visited)?);
                }
            }
        }
        Ok(codes)
    }

    /// Whether `code` belongs to the code system named `code_system_id`
    /// (highest registered version). Errors if `code_system_id` is actually
    /// a registered value set url rather than a code system.
    pub fn try_in_code_system(
        &self,
        code: &CqlCode,
        code_system_id: &str,
    ) -> Result<bool, TerminologyError> {
        let code_systems = self.code_systems.read();
        let cs = resolve_version(
            code_systems.get(code_system_id).map(Vec::as_slice).unwrap_or(&[]),
            None,
            |cs| &cs.version,
        )
        .cloned();
        drop(code_systems);
        let cs = match cs {
            Some(cs) => cs,
            None => {
                if self.value_sets.read().contains_key(code_system_id) {
                    return Err(TerminologyError::KindMismatch(code_system_id.to_string(), "value set"));
                }
                return Err(TerminologyError::UnknownCodeSystem(code_system_id.to_string()));
            }
        };
        Ok(cs.codes.iter().any(|c| c.is_equivalent(code)))
    }
}

/// Lift a bundled-provider lookup into the engine-facing contract: an
/// unknown url is "no data" (`Ok(None)`, interpreted as CQL null), while a
/// kind mismatch or circular compose is a real evaluation failure that must
/// not be silently swallowed.
fn lift<T>(result: Result<T, TerminologyError>) -> EvalResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(TerminologyError::UnknownValueSet(_)) | Err(TerminologyError::UnknownCodeSystem(_)) => Ok(None),
        Err(TerminologyError::CircularCompose(url)) => Err(EvalError::TerminologyError {
            message: format!("circular compose detected while expanding value set {url}"),
        }),
        Err(TerminologyError::KindMismatch(url, actual_kind)) => {
            Err(EvalError::kind_mismatch(url, "value set", actual_kind))
        }
    }
}

impl EvalTerminologyProvider for InMemoryTerminologyProvider {
    fn in_value_set(&self, code: &CqlValue, value_set_id: &str) -> EvalResult<Option<bool>> {
        let Some(cql_code) = extract_code(code) else {
            return Ok(None);
        };
        let expanded = match lift(self.try_expand_value_set(value_set_id))? {
            Some(expanded) => expanded,
            None => return Ok(None),
        };
        Ok(Some(expanded.iter().any(|c| c.is_equivalent(cql_code))))
    }

    fn in_code_system(&self, code: &CqlValue, code_system_id: &str) -> EvalResult<Option<bool>> {
        let Some(cql_code) = extract_code(code) else {
            return Ok(None);
        };
        lift(self.try_in_code_system(cql_code, code_system_id))
    }

    fn expand_value_set(&self, value_set_id: &str) -> EvalResult<Option<Vec<CqlValue>>> {
        let codes = match lift(self.try_expand_value_set(value_set_id))? {
            Some(codes) => codes,
            None => return Ok(None),
        };
        Ok(Some(codes.into_iter().map(CqlValue::Code).collect()))
    }

    fn lookup_display(&self, code: &CqlValue) -> EvalResult<Option<String>> {
        let Some(cql_code) = extract_code(code) else {
            return Ok(None);
        };
        if let Some(display) = &cql_code.display {
            return Ok(Some(display.clone()));
        }
        let code_systems = self.code_systems.read();
        Ok(code_systems.values().flatten().find_map(|cs| {
            cs.codes
                .iter()
                .find(|c| c.is_equivalent(cql_code))
                .and_then(|c| c.display.clone())
        }))
    }
}

fn extract_code(value: &CqlValue) -> Option<&CqlCode> {
    match value {
        CqlValue::Code(c) => Some(c),
        CqlValue::Concept(CqlConcept { codes, .. }) => codes.first(),
        _ => None,
    }
}
