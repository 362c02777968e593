//! Shapecheck
//!
//! An embeddable RDF triple store with indexed pattern queries, and an
//! engine that runs validation functions (constraints, validators, rules and
//! targets) over it.
//!
//! # Modules
//!
//! - [`rdf`]: terms, the indexed triple store, lazy pattern cursors,
//!   Turtle/N-Triples loading
//! - [`validation`]: the validation function contract, the stock function
//!   library, the engine and its reports
//!
//! ## Example Usage
//!
//! ```rust
//! use shapecheck::rdf::{vocab, Literal, NamedNode, Term, Triple, TripleStore};
//! use shapecheck::validation::{
//!     EngineConfig, FunctionBinding, FunctionRegistry, Shape, ValidationEngine,
//! };
//!
//! let store = TripleStore::new();
//! let alice = NamedNode::new("http://example.org/alice").unwrap();
//! store
//!     .insert(Triple::new(
//!         alice.clone(),
//!         NamedNode::new(vocab::RDF_TYPE).unwrap(),
//!         NamedNode::new(vocab::OWL_THING).unwrap(),
//!     ))
//!     .unwrap();
//!
//! let registry = FunctionRegistry::with_builtins();
//! let shape = Shape::new("Things")
//!     .with_target_function(FunctionBinding::new(registry.get("findThings").unwrap()))
//!     .with_constraint(
//!         FunctionBinding::new(registry.get("hasMaxLength").unwrap())
//!             .with_param("maxLength", Literal::new_simple_literal("10")),
//!     );
//!
//! let engine = ValidationEngine::new(EngineConfig::default()).unwrap();
//! let report = engine.validate(&store, &[shape]).unwrap();
//!
//! // The IRI of ex:alice is longer than ten characters.
//! assert!(!report.conforms);
//! assert_eq!(report.results[0].focus_node, Term::from(alice));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod rdf;
pub mod validation;

// Re-export main types for convenience
pub use rdf::{
    BlankNode, Literal, NamedNode, PatternCursor, StoreError, StoreResult, Subject, Term,
    TermError, TermFactory, TermResult, Triple, TripleStore,
};

pub use validation::{
    EngineConfig, EngineError, EngineResult, FunctionBinding, FunctionRegistry, Shape,
    ValidationEngine, ValidationFunction, ValidationReport, Violation,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
