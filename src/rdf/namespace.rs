//! RDF namespace and prefix management
//!
//! Prefixed names (`ex:knows`) are how validation plans refer to terms, so the
//! manager expands them into full IRIs. Frequently used vocabulary IRIs live in
//! [`vocab`].

use indexmap::IndexMap;
use thiserror::Error;

/// Prefix errors
#[derive(Error, Debug)]
pub enum PrefixError {
    /// Unknown prefix
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// Not a prefixed name
    #[error("Not a prefixed name: {0}")]
    NotPrefixed(String),
}

pub type PrefixResult<T> = Result<T, PrefixError>;

/// Vocabulary IRIs used by the store and the stock function library
pub mod vocab {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    pub const SH: &str = "http://www.w3.org/ns/shacl#";

    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
    pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
}

/// Namespace manager with common prefixes
///
/// Prefixes keep their registration order, so `compact` is deterministic
/// when two namespaces overlap.
#[derive(Debug, Clone)]
pub struct NamespaceManager {
    /// Prefix → IRI mappings
    prefixes: IndexMap<String, String>,
}

impl NamespaceManager {
    /// Create a new namespace manager with common prefixes
    pub fn new() -> Self {
        let mut mgr = Self {
            prefixes: IndexMap::new(),
        };

        mgr.add_prefix("rdf", vocab::RDF);
        mgr.add_prefix("rdfs", vocab::RDFS);
        mgr.add_prefix("xsd", vocab::XSD);
        mgr.add_prefix("owl", vocab::OWL);
        mgr.add_prefix("sh", vocab::SH);

        mgr
    }

    /// Add a prefix, replacing an earlier binding of the same name
    pub fn add_prefix(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    /// Get IRI for a prefix
    pub fn get_iri(&self, prefix: &str) -> PrefixResult<&str> {
        self.prefixes
            .get(prefix)
            .map(|s| s.as_str())
            .ok_or_else(|| PrefixError::UnknownPrefix(prefix.to_string()))
    }

    /// Expand a prefixed name (prefix:local) to a full IRI
    pub fn expand(&self, prefixed: &str) -> PrefixResult<String> {
        let (prefix, local) = prefixed
            .split_once(':')
            .ok_or_else(|| PrefixError::NotPrefixed(prefixed.to_string()))?;
        let iri = self.get_iri(prefix)?;
        Ok(format!("{}{}", iri, local))
    }

    /// Compact an IRI using the longest matching namespace
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, ns)| iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, ns)| format!("{}:{}", prefix, &iri[ns.len()..]))
    }
}

impl Default for NamespaceManager {
    fn default() -> Self {
        Self::new()
    }
}
