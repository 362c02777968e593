//! RDF serialization formats
//!
//! Supports:
//! - Turtle (TTL)
//! - N-Triples (NT)

mod turtle;

use super::{StoreError, TermError, Triple, TripleStore};
use std::path::Path;
use thiserror::Error;

/// RDF serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    /// Turtle format (.ttl)
    Turtle,
    /// N-Triples format (.nt)
    NTriples,
}

impl RdfFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ttl" | "turtle" => Some(RdfFormat::Turtle),
            "nt" | "ntriples" => Some(RdfFormat::NTriples),
            _ => None,
        }
    }
}

/// Parse errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax error reported by the parser
    #[error("Parse error: {0}")]
    Parse(String),

    /// Well-formed syntax producing a malformed term
    #[error("Malformed term: {0}")]
    Term(#[from] TermError),

    /// Loading into a store that has open cursors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<rio_turtle::TurtleError> for ParseError {
    fn from(e: rio_turtle::TurtleError) -> Self {
        ParseError::Parse(e.to_string())
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// RDF parser
pub struct RdfParser;

impl RdfParser {
    /// Parse RDF data from a string
    pub fn parse(input: &str, format: RdfFormat) -> ParseResult<Vec<Triple>> {
        match format {
            RdfFormat::Turtle => turtle::parse_turtle(input.as_bytes()),
            RdfFormat::NTriples => turtle::parse_ntriples(input.as_bytes()),
        }
    }

    /// Parse RDF data from a file
    pub fn parse_file(path: &Path, format: RdfFormat) -> ParseResult<Vec<Triple>> {
        let input = std::fs::read_to_string(path)?;
        Self::parse(&input, format)
    }

    /// Parse a file and load its triples into a store. Returns the number of
    /// new triples.
    pub fn load_file(store: &TripleStore, path: &Path, format: RdfFormat) -> ParseResult<usize> {
        let triples = Self::parse_file(path, format)?;
        Ok(store.insert_all(&triples)?)
    }
}

/// RDF serializer
pub struct RdfSerializer;

impl RdfSerializer {
    /// Serialize triples to a string
    pub fn serialize(triples: &[Triple], format: RdfFormat) -> SerializeResult<String> {
        match format {
            RdfFormat::Turtle => turtle::serialize_turtle(triples),
            RdfFormat::NTriples => Ok(triples.iter().map(|t| format!("{}\n", t)).collect()),
        }
    }

    /// Serialize every triple of a store
    pub fn serialize_store(store: &TripleStore, format: RdfFormat) -> SerializeResult<String> {
        Self::serialize(&store.triples(), format)
    }
}
