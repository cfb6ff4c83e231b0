//! FHIR ModelInfo support
//!
//! This module provides embedded FHIR R4 ModelInfo.

pub mod r4;

pub use r4::*;
