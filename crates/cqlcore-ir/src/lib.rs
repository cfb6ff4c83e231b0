//! CQL typed intermediate representation (IR)
//!
//! This crate provides:
//! - Typed IR node definitions (the compiled form of a CQL library; each
//!   node carries a static result type and a source span, analogous in
//!   spirit to the published ELM schema but private to this engine)
//! - AST-to-IR lowering with reference resolution, overload selection,
//!   and implicit-conversion insertion

pub mod ir;
pub mod lowering;

pub use ir::*;
pub use lowering::AstLowering;
