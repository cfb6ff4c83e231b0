//! Basic integration example showing how to use the CQL data model components
//!
//! This example demonstrates:
//! - Loading the embedded FHIR R4 ModelInfo
//! - Using ModelProvider for type lookups
//! - Creating a DataRetriever

use cqlcore_model::{fhir::fhir_r4_registry, DataRetriever, ModelProvider, NoOpDataRetriever};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== CQL Data Model Integration Example ===\n");

    println!("1. Loading FHIR R4 ModelInfo...");
    let r4_registry = fhir_r4_registry()?;
    println!("   ok FHIR R4 ModelInfo loaded successfully");

    println!("\n2. Querying Patient type information...");
    if let Some(patient_type) = r4_registry.get_type("Patient").await? {
        println!("   ok Found Patient type");
        println!("     - Retrievable: {}", patient_type.retrievable);
        println!(
            "     - Primary code path: {}",
            patient_type.primary_code_path.as_deref().unwrap_or("N/A")
        );
        println!("     - Properties: {}", patient_type.elements.len());
    }

    println!("\n3. Querying Patient.id property...");
    if let Some(id_prop) = r4_registry.get_property_type("Patient", "id").await? {
        println!("   ok Found id property");
        println!("     - Type: {}", id_prop.element_type);
        println!("     - Is List: {}", id_prop.is_list);
    }

    println!("\n4. Creating DataRetriever...");
    let retriever = Arc::new(NoOpDataRetriever::new()) as Arc<dyn DataRetriever>;
    let _ = retriever;
    println!("   ok DataRetriever created");

    println!("\n=== Integration Complete ===");
    Ok(())
}
