//! Term construction capability
//!
//! Validation functions never build terms through global state; the engine
//! hands each invocation a reference to its own [`TermFactory`].

use super::namespace::{vocab, NamespaceManager};
use super::types::{BlankNode, Literal, NamedNode, Term, TermError, TermResult};

/// Value-based term constructors.
///
/// Equal inputs always produce equal terms. Prefixed names are expanded
/// through the factory's namespace table.
#[derive(Debug, Clone, Default)]
pub struct TermFactory {
    namespaces: NamespaceManager,
}

impl TermFactory {
    /// Create a factory with the common prefixes registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory using an existing namespace table
    pub fn with_namespaces(namespaces: NamespaceManager) -> Self {
        Self { namespaces }
    }

    /// Namespace table used by [`TermFactory::prefixed`]
    pub fn namespaces(&self) -> &NamespaceManager {
        &self.namespaces
    }

    /// IRI term
    pub fn named_node(&self, uri: impl Into<String>) -> TermResult<Term> {
        NamedNode::new(uri).map(Term::from)
    }

    /// IRI term from a prefixed name such as `rdf:type`
    pub fn prefixed(&self, name: &str) -> TermResult<Term> {
        let iri = self
            .namespaces
            .expand(name)
            .map_err(|e| TermError::InvalidIri(e.to_string()))?;
        self.named_node(iri)
    }

    /// Fresh blank node
    pub fn blank_node(&self) -> Term {
        Term::from(BlankNode::new())
    }

    /// Literal from a lexical form, an optional datatype and an optional
    /// language tag. See [`Literal::from_parts`] for the accepted combinations.
    pub fn literal(
        &self,
        lex: impl Into<String>,
        datatype: Option<&NamedNode>,
        language: Option<&str>,
    ) -> TermResult<Term> {
        Literal::from_parts(lex, datatype, language).map(Term::from)
    }

    /// Literal with an explicit datatype
    pub fn typed_literal(&self, lex: impl Into<String>, datatype: &NamedNode) -> TermResult<Term> {
        self.literal(lex, Some(datatype), None)
    }

    /// Plain string literal
    pub fn string(&self, lex: impl Into<String>) -> Term {
        Term::from(Literal::new_simple_literal(lex))
    }

    /// xsd:integer literal
    pub fn integer(&self, value: i64) -> Term {
        self.xsd(value.to_string(), vocab::XSD_INTEGER)
    }

    /// xsd:boolean literal
    pub fn boolean(&self, value: bool) -> Term {
        self.xsd(value.to_string(), vocab::XSD_BOOLEAN)
    }

    fn xsd(&self, lex: String, datatype: &'static str) -> Term {
        let datatype = oxrdf::NamedNode::new_unchecked(datatype);
        Term::from(Literal::from(oxrdf::Literal::new_typed_literal(lex, datatype)))
    }
}
