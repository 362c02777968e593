//! RDF data model and indexed triple store
//!
//! This module implements:
//! - RDF terms (IRIs, blank nodes, literals) and triples
//! - A term factory owned by the caller instead of a global singleton
//! - An in-memory triple store with SPO/POS/OSP indices
//! - Lazy pattern cursors with explicit release
//! - Turtle and N-Triples loading
//!
//! # Example
//!
//! ```rust
//! use shapecheck::rdf::{NamedNode, Literal, Term, Triple, TripleStore};
//!
//! let store = TripleStore::new();
//!
//! let alice = NamedNode::new("http://example.org/alice").unwrap();
//! let name = NamedNode::new("http://xmlns.com/foaf/0.1/name").unwrap();
//! store.insert(Triple::new(alice.clone(), name, Literal::new_simple_literal("Alice"))).unwrap();
//!
//! let mut cursor = store.find(Some(&Term::from(alice)), None, None);
//! let triple = cursor.next_triple().unwrap().unwrap();
//! assert_eq!(triple.object.lex(), Some("Alice"));
//! cursor.close();
//! ```

mod cursor;
mod factory;
mod namespace;
mod serialization;
mod store;
mod types;

pub use types::{
    BlankNode, Literal, NamedNode, Subject, Term, TermError, TermResult, Triple,
};

pub use store::{StoreError, StoreResult, TripleStore};

pub use cursor::PatternCursor;

pub use factory::TermFactory;

pub use namespace::{vocab, NamespaceManager, PrefixError, PrefixResult};

pub use serialization::{
    ParseError, ParseResult, RdfFormat, RdfParser, RdfSerializer, SerializeError,
    SerializeResult,
};
