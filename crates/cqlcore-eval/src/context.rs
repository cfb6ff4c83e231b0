//! Evaluation context for CQL execution
//!
//! Carries everything the interpreter needs while walking a compiled library:
//! the current retrieve/terminology contract implementations, the
//! per-invocation result cache, the query scope stack, and the timestamp
//! fixed at the start of evaluation that `Now()`/`Today()`/`TimeOfDay()`
//! read from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{EvalError, EvalResult};
use crate::CqlValue;
use cqlcore_ir::Library;
use cqlcore_types::{CqlDate, CqlDateTime, CqlTime};

/// Default maximum expression-evaluation recursion depth.
///
/// Guards against stack overflow from pathological or self-referential
/// expression definitions; `ExpressionRef` cycles are the main source.
pub const DEFAULT_RECURSION_LIMIT: usize = 512;

/// Retrieve contract consumed by the interpreter.
///
/// Implementations resolve a CQL `retrieve` against whatever backing store
/// they wrap (a FHIR bundle, a database, a test fixture) and expose the
/// property-path accessor the interpreter uses to read fields off the
/// resources that come back. Resources are opaque to the interpreter beyond
/// that accessor.
#[allow(clippy::too_many_arguments)]
pub trait DataProvider: Send + Sync {
    /// Retrieve resources of `data_type` within the current context.
    fn retrieve(
        &self,
        data_type: &str,
        context_type: Option<&str>,
        context_value: Option<&CqlValue>,
        template_id: Option<&str>,
        code_property: Option<&str>,
        codes: Option<&CqlValue>,
        date_property: Option<&str>,
        date_range: Option<&CqlValue>,
    ) -> Vec<CqlValue>;

    /// Read `path` off a resource returned by `retrieve`.
    fn get_property(&self, resource: &CqlValue, path: &str) -> Option<CqlValue>;
}

/// Bundled in-memory terminology contract consumed by the interpreter.
///
/// Every operation returns `Result<Option<_>, EvalError>`: `Ok(None)` means
/// "unknown" (the terminology provider has no data for that code or value
/// set), which the operators above this layer interpret as a CQL null rather
/// than `false`. `Err` is reserved for a genuine terminology failure the
/// caller must not silently swallow — a valueset/codesystem kind mismatch, or
/// a circular `compose` — which the operators propagate as a real
/// evaluation error instead of collapsing it to null.
pub trait TerminologyProvider: Send + Sync {
    /// Whether `code` is a member of the value set named `value_set_id`.
    fn in_value_set(&self, code: &CqlValue, value_set_id: &str) -> EvalResult<Option<bool>>;

    /// Whether `code` belongs to the code system named `code_system_id`.
    fn in_code_system(&self, code: &CqlValue, code_system_id: &str) -> EvalResult<Option<bool>>;

    /// Expand a value set into its member codes.
    fn expand_value_set(&self, value_set_id: &str) -> EvalResult<Option<Vec<CqlValue>>>;

    /// Look up the display string for a code.
    fn lookup_display(&self, code: &CqlValue) -> EvalResult<Option<String>>;
}

/// A single entry in a query scope: the alias/let bindings visible while
/// evaluating a query clause, plus the enclosing scope for lexical lookup.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    aliases: HashMap<String, CqlValue>,
    lets: HashMap<String, CqlValue>,
    specials: HashMap<String, CqlValue>,
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a query source alias (e.g. the `E` in `[Encounter] E`).
    pub fn set_alias(&mut self, name: impl Into<String>, value: CqlValue) {
        self.aliases.insert(name.into(), value);
    }

    /// Look up an alias binding.
    pub fn get_alias(&self, name: &str) -> Option<&CqlValue> {
        self.aliases.get(name)
    }

    /// Bind a query `let` variable.
    pub fn set_let(&mut self, name: impl Into<String>, value: CqlValue) {
        self.lets.insert(name.into(), value);
    }

    /// Look up a `let` binding.
    pub fn get_let(&self, name: &str) -> Option<&CqlValue> {
        self.lets.get(name)
    }

    /// Bind an implicit iteration variable (`$this`, `$index`, `$total`).
    pub fn set_special(&mut self, name: impl Into<String>, value: CqlValue) {
        self.specials.insert(name.into(), value);
    }

    /// Look up an implicit iteration variable.
    pub fn get_special(&self, name: &str) -> Option<&CqlValue> {
        self.specials.get(name)
    }
}

/// A node in the optional explainability/provenance trace: the expression
/// that produced `value`, and the child nodes that fed into it.
#[derive(Debug, Clone)]
pub struct TraceNode {
    pub expression: String,
    pub value: CqlValue,
    pub children: Vec<TraceNode>,
}

/// Evaluation context for CQL expression execution.
///
/// One context is built per invocation (a single `evaluate_library` /
/// `evaluate_expression` call). It owns the fixed "now" timestamp, the
/// per-invocation memoization cache keyed by `"{library}:{definition}"`, the
/// query scope stack, and handles to the pluggable retrieve and terminology
/// contracts. Cloning a context does not share its cache with the original;
/// use [`EvaluationContext::child_scope`] to push/pop query scopes instead.
pub struct EvaluationContext {
    /// Current context type (e.g., "Patient")
    pub context_type: Option<String>,
    /// Current context value (e.g., Patient resource)
    pub context_value: Option<CqlValue>,
    /// Parameter values
    pub parameters: HashMap<String, CqlValue>,
    /// Local variables/definitions
    pub locals: HashMap<String, CqlValue>,

    retriever: Option<Arc<dyn DataProvider>>,
    terminology: Option<Arc<dyn TerminologyProvider>>,

    /// The library an unqualified `ExpressionRef`/`FunctionRef` resolves
    /// against. A stack because evaluating a qualified `Lib.Name` reference
    /// switches "current library" to the included library for the duration
    /// of that nested evaluation, then restores the caller's.
    library_stack: Mutex<Vec<Arc<Library>>>,

    /// Other compiled libraries this invocation's library set `include`s,
    /// keyed by the *local* include identifier as seen from whichever
    /// library is currently on top of `library_stack`.
    included_libraries: HashMap<String, Arc<Library>>,

    now: CqlDateTime,

    cache: Mutex<HashMap<String, CqlValue>>,

    recursion_depth: AtomicUsize,
    recursion_limit: usize,

    scopes: Mutex<Vec<Scope>>,

    cancelled: Arc<AtomicBool>,

    trace_enabled: bool,
    trace: Mutex<Vec<TraceNode>>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContext {
    /// Create a new empty context, with `now` fixed at construction time.
    pub fn new() -> Self {
        EvaluationContextBuilder::new().build()
    }

    /// Begin building a context with a retriever, terminology provider,
    /// parameters, or an explicit `now`.
    pub fn builder() -> EvaluationContextBuilder {
        EvaluationContextBuilder::new()
    }

    /// Set the context type and value
    pub fn with_context(mut self, context_type: impl Into<String>, value: CqlValue) -> Self {
        self.context_type = Some(context_type.into());
        self.context_value = Some(value);
        self
    }

    /// Set a parameter value
    pub fn set_parameter(&mut self, name: impl Into<String>, value: CqlValue) {
        self.parameters.insert(name.into(), value);
    }

    /// Get a parameter value
    pub fn get_parameter(&self, name: &str) -> Option<&CqlValue> {
        self.parameters.get(name)
    }

    /// Set a parameter value scoped to a specific library (`(library,
    /// parameter-name)` per §4.7's environment model).
    pub fn set_parameter_qualified(
        &mut self,
        library_name: impl AsRef<str>,
        name: impl AsRef<str>,
        value: CqlValue,
    ) {
        self.parameters
            .insert(Self::qualified_parameter_key(library_name.as_ref(), name.as_ref()), value);
    }

    /// Look up a parameter, preferring the `(library, name)`-qualified
    /// entry when `library_name` is given and falling back to the bare
    /// name (the common case of a single-library invocation).
    pub fn get_parameter_qualified(
        &self,
        library_name: Option<&str>,
        name: &str,
    ) -> Option<&CqlValue> {
        if let Some(lib) = library_name {
            if let Some(value) = self.parameters.get(&Self::qualified_parameter_key(lib, name)) {
                return Some(value);
            }
        }
        self.parameters.get(name)
    }

    fn qualified_parameter_key(library_name: &str, name: &str) -> String {
        format!("{library_name}::{name}")
    }

    /// Set a local variable
    pub fn set_local(&mut self, name: impl Into<String>, value: CqlValue) {
        self.locals.insert(name.into(), value);
    }

    /// Get a local variable
    pub fn get_local(&self, name: &str) -> Option<&CqlValue> {
        self.locals.get(name)
    }

    /// The retrieve contract, if one was configured.
    pub fn retriever(&self) -> Option<&Arc<dyn DataProvider>> {
        self.retriever.as_ref()
    }

    /// The terminology contract, if one was configured.
    pub fn terminology(&self) -> Option<&Arc<dyn TerminologyProvider>> {
        self.terminology.as_ref()
    }

    /// The timestamp `Now()` resolves to: fixed once per invocation so that
    /// repeated calls within the same evaluation are mutually consistent.
    pub fn now(&self) -> &CqlDateTime {
        &self.now
    }

    /// `Today()`: the date component of [`Self::now`].
    pub fn today(&self) -> CqlDate {
        CqlDate {
            year: self.now.year,
            month: self.now.month,
            day: self.now.day,
        }
    }

    /// `TimeOfDay()`: the time component of [`Self::now`].
    pub fn time_of_day(&self) -> CqlTime {
        CqlTime {
            hour: self.now.hour.unwrap_or(0),
            minute: self.now.minute,
            second: self.now.second,
            millisecond: self.now.millisecond,
        }
    }

    /// Look up a memoized definition result.
    pub fn get_cached(&self, key: &str) -> Option<CqlValue> {
        self.cache.lock().get(key).cloned()
    }

    /// Memoize a definition result.
    pub fn cache_result(&self, key: impl Into<String>, value: CqlValue) {
        self.cache.lock().insert(key.into(), value);
    }

    /// Enter one level of expression evaluation, failing once the
    /// recursion limit is exceeded. Pairs with [`Self::exit_recursion`];
    /// callers must call both around a single `evaluate` dispatch.
    pub fn enter_recursion(&self) -> bool {
        let depth = self.recursion_depth.fetch_add(1, Ordering::SeqCst) + 1;
        if depth > self.recursion_limit {
            self.recursion_depth.fetch_sub(1, Ordering::SeqCst);
            false
        } else {
            true
        }
    }

    /// Leave one level of expression evaluation.
    pub fn exit_recursion(&self) {
        self.recursion_depth.fetch_sub(1, Ordering::SeqCst);
    }

    /// Push a fresh query scope (e.g. entering a `query` clause, a
    /// `Filter`/`ForEach`/`Aggregate` iteration, or a user-function call).
    pub fn push_scope(&self) {
        self.scopes.lock().push(Scope::new());
    }

    /// Pop the innermost query scope.
    pub fn pop_scope(&self) {
        self.scopes.lock().pop();
    }

    /// Look up an alias binding, searching from the innermost scope outward.
    pub fn get_alias(&self, name: &str) -> Option<CqlValue> {
        self.scopes
            .lock()
            .iter()
            .rev()
            .find_map(|s| s.get_alias(name).cloned())
    }

    /// Look up a `let` binding, searching from the innermost scope outward.
    pub fn get_let(&self, name: &str) -> Option<CqlValue> {
        self.scopes
            .lock()
            .iter()
            .rev()
            .find_map(|s| s.get_let(name).cloned())
    }

    /// Look up an implicit iteration variable (`$this`, `$index`, `$total`),
    /// searching from the innermost scope outward.
    pub fn get_special(&self, name: &str) -> Option<CqlValue> {
        self.scopes
            .lock()
            .iter()
            .rev()
            .find_map(|s| s.get_special(name).cloned())
    }

    /// Bind an alias in the innermost scope.
    pub fn set_alias(&self, name: impl Into<String>, value: CqlValue) {
        if let Some(scope) = self.scopes.lock().last_mut() {
            scope.set_alias(name, value);
        }
    }

    /// Bind a `let` variable in the innermost scope.
    pub fn set_let(&self, name: impl Into<String>, value: CqlValue) {
        if let Some(scope) = self.scopes.lock().last_mut() {
            scope.set_let(name, value);
        }
    }

    /// Bind an implicit iteration variable in the innermost scope.
    pub fn set_special(&self, name: impl Into<String>, value: CqlValue) {
        if let Some(scope) = self.scopes.lock().last_mut() {
            scope.set_special(name, value);
        }
    }

    /// The active retrieve contract, if one was configured. Alias of
    /// [`Self::retriever`] matching the `DataProvider` naming used at call
    /// sites that read resource properties.
    pub fn data_provider(&self) -> Option<&Arc<dyn DataProvider>> {
        self.retriever.as_ref()
    }

    /// The active terminology contract, if one was configured. Alias of
    /// [`Self::terminology`].
    pub fn terminology_provider(&self) -> Option<&Arc<dyn TerminologyProvider>> {
        self.terminology.as_ref()
    }

    /// The library an unqualified `ExpressionRef`/`FunctionRef` currently
    /// resolves against: the library on top of the library stack.
    pub fn main_library_arc(&self) -> Option<Arc<Library>> {
        self.library_stack.lock().last().cloned()
    }

    /// Push a library onto the current-library stack, making it the target
    /// of unqualified references until [`Self::pop_library`] is called.
    pub fn push_library(&self, library: Arc<Library>) {
        self.library_stack.lock().push(library);
    }

    /// Pop the innermost current-library frame, restoring the caller's.
    pub fn pop_library(&self) {
        self.library_stack.lock().pop();
    }

    /// Resolve a local include identifier (as used by the library currently
    /// on top of the stack) to its compiled library.
    pub fn get_included_library(&self, local_identifier: &str) -> Option<Arc<Library>> {
        self.included_libraries.get(local_identifier).cloned()
    }

    /// Mark this invocation as cancelled. Checked at retrieve, terminology,
    /// and top-level-definition boundaries.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Return `Err(EvalError::Cancelled)` if the invocation was cancelled.
    pub fn check_cancelled(&self) -> EvalResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(EvalError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Whether provenance tracing is enabled for this invocation.
    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    /// Record a completed trace node for the current top-level definition.
    pub fn record_trace(&self, node: TraceNode) {
        if self.trace_enabled {
            self.trace.lock().push(node);
        }
    }

    /// Drain the accumulated trace nodes.
    pub fn take_trace(&self) -> Vec<TraceNode> {
        std::mem::take(&mut self.trace.lock())
    }
}

/// Builder for [`EvaluationContext`].
#[derive(Default)]
pub struct EvaluationContextBuilder {
    context_type: Option<String>,
    context_value: Option<CqlValue>,
    parameters: HashMap<String, CqlValue>,
    retriever: Option<Arc<dyn DataProvider>>,
    terminology: Option<Arc<dyn TerminologyProvider>>,
    now: Option<CqlDateTime>,
    recursion_limit: Option<usize>,
    cancelled: Option<Arc<AtomicBool>>,
    trace_enabled: bool,
    included_libraries: HashMap<String, Arc<Library>>,
}

impl EvaluationContextBuilder {
    /// Start a new builder with no retriever, terminology provider, or parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the evaluation context (e.g. the current Patient).
    pub fn with_context(mut self, context_type: impl Into<String>, value: CqlValue) -> Self {
        self.context_type = Some(context_type.into());
        self.context_value = Some(value);
        self
    }

    /// Set a parameter value.
    pub fn with_parameter(mut self, name: impl Into<String>, value: CqlValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Set a parameter value scoped to a specific library.
    pub fn with_qualified_parameter(
        mut self,
        library_name: impl AsRef<str>,
        name: impl AsRef<str>,
        value: CqlValue,
    ) -> Self {
        self.parameters.insert(
            format!("{}::{}", library_name.as_ref(), name.as_ref()),
            value,
        );
        self
    }

    /// Attach a retrieve contract implementation.
    pub fn with_retriever(mut self, retriever: Arc<dyn DataProvider>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Attach a terminology contract implementation.
    pub fn with_terminology(mut self, terminology: Arc<dyn TerminologyProvider>) -> Self {
        self.terminology = Some(terminology);
        self
    }

    /// Fix `Now()`/`Today()`/`TimeOfDay()` to an explicit timestamp instead
    /// of the wall-clock time at build.
    pub fn with_now(mut self, now: CqlDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// Override the default recursion limit.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    /// Share a cancellation flag with the caller so it can cancel an
    /// in-flight evaluation from another thread.
    pub fn with_cancellation_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(token);
        self
    }

    /// Record a provenance trace of evaluated definitions.
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace_enabled = enabled;
        self
    }

    /// Register a compiled dependency, reachable from the main library (or
    /// any other registered dependency) via `local_identifier` — the name
    /// the `include` statement bound it to.
    pub fn with_included_library(
        mut self,
        local_identifier: impl Into<String>,
        library: Arc<Library>,
    ) -> Self {
        self.included_libraries.insert(local_identifier.into(), library);
        self
    }

    /// Register every dependency of a multi-library compilation at once,
    /// keyed by local include identifier.
    pub fn with_included_libraries(mut self, libraries: HashMap<String, Arc<Library>>) -> Self {
        self.included_libraries.extend(libraries);
        self
    }

    /// Build the context.
    pub fn build(self) -> EvaluationContext {
        EvaluationContext {
            context_type: self.context_type,
            context_value: self.context_value,
            parameters: self.parameters,
            locals: HashMap::new(),
            retriever: self.retriever,
            terminology: self.terminology,
            library_stack: Mutex::new(Vec::new()),
            included_libraries: self.included_libraries,
            now: self.now.unwrap_or_else(wall_clock_now),
            cache: Mutex::new(HashMap::new()),
            recursion_depth: AtomicUsize::new(0),
            recursion_limit: self.recursion_limit.unwrap_or(DEFAULT_RECURSION_LIMIT),
            scopes: Mutex::new(Vec::new()),
            cancelled: self.cancelled.unwrap_or_default(),
            trace_enabled: self.trace_enabled,
            trace: Mutex::new(Vec::new()),
        }
    }
}

fn wall_clock_now() -> CqlDateTime {
    let now = chrono::Local::now();
    use chrono::{Datelike, Timelike};
    CqlDateTime {
        year: now.year(),
        month: Some(now.month() as u8),
        day: Some(now.day() as u8),
        hour: Some(now.hour() as u8),
        minute: Some(now.minute() as u8),
        second: Some(now.second() as u8),
        millisecond: Some((now.nanosecond() / 1_000_000) as u16),
        timezone_offset: Some((now.offset().local_minus_utc() / 60) as i16),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursion_limit_trips() {
        let ctx = EvaluationContext::builder().with_recursion_limit(2).build();
        assert!(ctx.enter_recursion());
        assert!(ctx.enter_recursion());
        assert!(!ctx.enter_recursion());
    }

    #[test]
    fn cache_roundtrips() {
        let ctx = EvaluationContext::new();
        assert!(ctx.get_cached("Lib:Def").is_none());
        ctx.cache_result("Lib:Def", CqlValue::Integer(1));
        assert_eq!(ctx.get_cached("Lib:Def"), Some(CqlValue::Integer(1)));
    }

    #[test]
    fn cancellation_is_observed() {
        let ctx = EvaluationContext::new();
        assert!(ctx.check_cancelled().is_ok());
        ctx.cancel();
        assert!(ctx.check_cancelled().is_err());
    }

    #[test]
    fn scope_lookup_walks_outward() {
        let ctx = EvaluationContext::new();
        ctx.push_scope();
        ctx.set_alias("E", CqlValue::Integer(1));
        ctx.push_scope();
        assert_eq!(ctx.get_alias("E"), Some(CqlValue::Integer(1)));
        ctx.pop_scope();
        ctx.pop_scope();
    }
}
