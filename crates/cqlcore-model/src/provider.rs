//! Provider contracts for the data-model catalog and for retrieve execution

use crate::model_info::{PropertyInfo, TypeInfo};
use async_trait::async_trait;
use cqlcore_types::{CqlCode, CqlInterval, CqlValue};

/// Data-model catalog contract (type lookup, property traversal, retrievability).
///
/// Implemented by [`crate::registry::ModelRegistry`] over a loaded `ModelInfo`
/// descriptor. Exists as a trait so a compiled library can be resolved against
/// whichever data model (FHIR, QDM, ...) its `using` declaration names.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Look up a named type in the model.
    async fn get_type(&self, type_name: &str) -> Result<Option<TypeInfo>, ModelProviderError>;

    /// Resolve the type of `property` on `parent`, traversing the base-type chain.
    async fn get_property_type(
        &self,
        parent: &str,
        property: &str,
    ) -> Result<Option<PropertyInfo>, ModelProviderError>;

    /// Whether `type_name` can be the target of a `retrieve`.
    fn is_retrievable(&self, type_name: &str) -> bool;

    /// The primary code path used for unqualified terminology filters on a retrieve.
    fn get_primary_code_path(&self, type_name: &str) -> Option<String>;
}

/// Errors surfaced by a [`ModelProvider`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelProviderError {
    #[error("failed to parse model descriptor: {0}")]
    ParseError(String),

    #[error("failed to read model descriptor: {0}")]
    IoError(String),

    #[error("unknown type: {0}")]
    UnknownType(String),
}

/// Retrieve contract: produce the opaque resources backing a CQL `retrieve`.
///
/// A `DataRetriever` is handed the resource/context type, an optional
/// terminology filter, and an optional date-range filter, and returns the
/// matching resources as opaque [`CqlValue::Tuple`] values. Property access on
/// those resources goes through the data model (not the retriever), so the
/// retriever itself stays a thin pluggable data-access seam.
#[async_trait]
pub trait DataRetriever: Send + Sync {
    /// Retrieve resources of `data_type` within `context` (e.g. the current patient).
    #[allow(clippy::too_many_arguments)]
    async fn retrieve(
        &self,
        context: &str,
        data_type: &str,
        code_path: Option<&str>,
        codes: Option<&[CqlCode]>,
        valueset: Option<&str>,
        date_path: Option<&str>,
        date_range: Option<&CqlInterval>,
    ) -> Result<Vec<CqlValue>, DataRetrieverError>;
}

/// Errors surfaced by a [`DataRetriever`].
#[derive(Debug, thiserror::Error)]
pub enum DataRetrieverError {
    #[error("retrieve failed: {0}")]
    RetrieveFailed(String),

    #[error("unknown resource type: {0}")]
    TypeNotFound(String),

    #[error("retrieve cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}
