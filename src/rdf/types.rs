//! RDF term model
//!
//! This module provides wrapper types around the oxrdf library for the terms
//! handled by the store and by validation functions.

use oxrdf::vocab::{rdf, xsd};
use oxrdf::{
    BlankNode as OxBlankNode,
    Literal as OxLiteral,
    NamedNode as OxNamedNode,
    Term as OxTerm,
};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Malformed term errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid blank node identifier
    #[error("Invalid blank node: {0}")]
    InvalidBlankNode(String),

    /// Language tag is not well formed
    #[error("Invalid language tag: {0}")]
    InvalidLanguageTag(String),

    /// Language tag combined with a non-string datatype
    #[error("Language tag '{language}' is not allowed on a literal of type {datatype}")]
    LanguageOnTypedLiteral { language: String, datatype: String },

    /// rdf:langString without a language tag
    #[error("Literal \"{0}\" is typed rdf:langString but has no language tag")]
    MissingLanguageTag(String),

    /// Term not allowed in subject position
    #[error("{0} cannot be used as a triple subject")]
    InvalidSubject(String),

    /// Term not allowed in predicate position
    #[error("{0} cannot be used as a triple predicate")]
    InvalidPredicate(String),

    /// Term text could not be parsed
    #[error("Cannot parse term: {0}")]
    Parse(String),
}

pub type TermResult<T> = Result<T, TermError>;

/// Named node (IRI)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedNode(OxNamedNode);

impl NamedNode {
    /// Create a new named node from an absolute IRI string
    pub fn new(iri: impl Into<String>) -> TermResult<Self> {
        OxNamedNode::new(iri)
            .map(Self)
            .map_err(|e| TermError::InvalidIri(e.to_string()))
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner oxrdf NamedNode
    pub fn inner(&self) -> &OxNamedNode {
        &self.0
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

impl From<OxNamedNode> for NamedNode {
    fn from(node: OxNamedNode) -> Self {
        Self(node)
    }
}

/// Blank node, identified locally to the store that holds it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(OxBlankNode);

impl BlankNode {
    /// Create a new blank node with a unique identifier
    pub fn new() -> Self {
        Self(OxBlankNode::default())
    }

    /// Create a blank node from an explicit identifier
    pub fn with_id(id: impl Into<String>) -> TermResult<Self> {
        OxBlankNode::new(id)
            .map(Self)
            .map_err(|e| TermError::InvalidBlankNode(e.to_string()))
    }

    /// Get the blank node identifier
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for BlankNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialOrd for BlankNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BlankNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.as_str())
    }
}

impl From<OxBlankNode> for BlankNode {
    fn from(node: OxBlankNode) -> Self {
        Self(node)
    }
}

/// RDF literal value
///
/// Language tags are kept exactly as given but compare case-insensitively,
/// so `"chat"@FR` and `"chat"@fr` are the same literal.
#[derive(Debug, Clone)]
pub struct Literal(OxLiteral);

impl Literal {
    /// Create a simple literal (xsd:string)
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self(OxLiteral::new_simple_literal(value))
    }

    /// Create a typed literal
    ///
    /// `rdf:langString` is rejected: it needs a language tag.
    pub fn new_typed_literal(value: impl Into<String>, datatype: NamedNode) -> TermResult<Self> {
        let value = value.into();
        if datatype.inner().as_ref() == rdf::LANG_STRING {
            return Err(TermError::MissingLanguageTag(value));
        }
        Ok(Self(OxLiteral::new_typed_literal(value, datatype.0)))
    }

    /// Create a literal with a language tag
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> TermResult<Self> {
        let language = language.into();
        // oxrdf normalizes the tag it validates; only the check is kept.
        OxLiteral::new_language_tagged_literal("", language.as_str())
            .map_err(|_| TermError::InvalidLanguageTag(language.clone()))?;
        Ok(Self(OxLiteral::new_language_tagged_literal_unchecked(value, language)))
    }

    /// Create a literal from its parts.
    ///
    /// A language tag is only accepted with no datatype, `xsd:string` or
    /// `rdf:langString`; any other datatype is a malformed term.
    pub fn from_parts(
        value: impl Into<String>,
        datatype: Option<&NamedNode>,
        language: Option<&str>,
    ) -> TermResult<Self> {
        match (datatype, language) {
            (None, None) => Ok(Self::new_simple_literal(value)),
            (Some(dt), None) => Self::new_typed_literal(value, dt.clone()),
            (dt, Some(lang)) => match dt {
                Some(dt)
                    if dt.inner().as_ref() != xsd::STRING
                        && dt.inner().as_ref() != rdf::LANG_STRING =>
                {
                    Err(TermError::LanguageOnTypedLiteral {
                        language: lang.to_string(),
                        datatype: dt.as_str().to_string(),
                    })
                }
                _ => Self::new_language_tagged_literal(value, lang),
            },
        }
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    /// Get the datatype
    pub fn datatype(&self) -> NamedNode {
        NamedNode(self.0.datatype().into_owned())
    }

    /// Get the inner oxrdf Literal
    pub fn inner(&self) -> &OxLiteral {
        &self.0
    }

    fn language_key(&self) -> Option<String> {
        self.language().map(|l| l.to_ascii_lowercase())
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
            && self.0.datatype() == other.0.datatype()
            && match (self.language(), other.language()) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
        self.0.datatype().as_str().hash(state);
        self.language_key().hash(state);
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value()
            .cmp(other.value())
            .then_with(|| self.0.datatype().as_str().cmp(other.0.datatype().as_str()))
            .then_with(|| self.language_key().cmp(&other.language_key()))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<OxLiteral> for Literal {
    fn from(lit: OxLiteral) -> Self {
        Self(lit)
    }
}

/// Triple subject (NamedNode or BlankNode)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::NamedNode(n) => write!(f, "{}", n),
            Subject::BlankNode(b) => write!(f, "{}", b),
        }
    }
}

impl From<NamedNode> for Subject {
    fn from(node: NamedNode) -> Self {
        Subject::NamedNode(node)
    }
}

impl From<BlankNode> for Subject {
    fn from(node: BlankNode) -> Self {
        Subject::BlankNode(node)
    }
}

impl TryFrom<Term> for Subject {
    type Error = TermError;

    fn try_from(term: Term) -> TermResult<Self> {
        match term {
            Term::NamedNode(n) => Ok(Subject::NamedNode(n)),
            Term::BlankNode(b) => Ok(Subject::BlankNode(b)),
            Term::Literal(l) => Err(TermError::InvalidSubject(l.to_string())),
        }
    }
}

/// Any RDF term.
///
/// Terms are ordered by variant first (IRIs, then blank nodes, then
/// literals) and then by their string content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
    /// Literal value
    Literal(Literal),
}

impl Term {
    /// Parse a term written in N-Triples syntax (`<iri>`, `_:id`, `"lex"^^<dt>`)
    pub fn parse(text: &str) -> TermResult<Self> {
        let text = text.trim();
        let term = OxTerm::from_str(text).map_err(|e| TermError::Parse(e.to_string()))?;
        match term {
            // oxrdf lowercases the tag; keep it as written
            OxTerm::Literal(l) if l.language().is_some() => {
                let tag = text.rsplit_once('@').map_or("", |(_, tag)| tag);
                Ok(Term::Literal(Literal::new_language_tagged_literal(l.value(), tag)?))
            }
            other => Term::try_from(other),
        }
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Check if this is a named node
    pub fn is_uri(&self) -> bool {
        matches!(self, Term::NamedNode(_))
    }

    /// Check if this is a blank node
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// IRI of a named node
    pub fn uri(&self) -> Option<&str> {
        match self {
            Term::NamedNode(n) => Some(n.as_str()),
            _ => None,
        }
    }

    /// Lexical form of a literal
    pub fn lex(&self) -> Option<&str> {
        match self {
            Term::Literal(l) => Some(l.value()),
            _ => None,
        }
    }

    /// Datatype of a literal
    pub fn datatype(&self) -> Option<NamedNode> {
        match self {
            Term::Literal(l) => Some(l.datatype()),
            _ => None,
        }
    }

    /// Language tag of a literal
    pub fn language(&self) -> Option<&str> {
        match self {
            Term::Literal(l) => l.language(),
            _ => None,
        }
    }

    /// Borrow as a named node
    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Term::NamedNode(n) => Some(n),
            _ => None,
        }
    }

    /// Borrow as a literal
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(n) => write!(f, "{}", n),
            Term::BlankNode(b) => write!(f, "{}", b),
            Term::Literal(l) => write!(f, "{}", l),
        }
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<NamedNode> for Term {
    fn from(node: NamedNode) -> Self {
        Term::NamedNode(node)
    }
}

impl From<BlankNode> for Term {
    fn from(node: BlankNode) -> Self {
        Term::BlankNode(node)
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl From<Subject> for Term {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::NamedNode(n) => Term::NamedNode(n),
            Subject::BlankNode(b) => Term::BlankNode(b),
        }
    }
}

impl TryFrom<OxTerm> for Term {
    type Error = TermError;

    fn try_from(term: OxTerm) -> TermResult<Self> {
        match term {
            OxTerm::NamedNode(n) => Ok(Term::NamedNode(n.into())),
            OxTerm::BlankNode(b) => Ok(Term::BlankNode(b.into())),
            OxTerm::Literal(l) => Ok(Term::Literal(l.into())),
            #[allow(unreachable_patterns)]
            other => Err(TermError::Parse(format!("quoted triples are not supported: {}", other))),
        }
    }
}

/// RDF triple (subject-predicate-object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    /// Subject
    pub subject: Subject,
    /// Predicate
    pub predicate: NamedNode,
    /// Object
    pub object: Term,
}

impl Triple {
    /// Create a new triple
    pub fn new(subject: impl Into<Subject>, predicate: NamedNode, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

    /// Build a triple from three untyped terms, checking each position
    pub fn from_terms(subject: Term, predicate: Term, object: Term) -> TermResult<Self> {
        let subject = Subject::try_from(subject)?;
        let predicate = match predicate {
            Term::NamedNode(n) => n,
            other => return Err(TermError::InvalidPredicate(other.to_string())),
        };
        Ok(Self {
            subject,
            predicate,
            object,
        })
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xsd_integer() -> NamedNode {
        NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap()
    }

    #[test]
    fn test_named_node() {
        let node = NamedNode::new("http://example.org/alice").unwrap();
        assert_eq!(node.as_str(), "http://example.org/alice");
        assert_eq!(node.to_string(), "<http://example.org/alice>");
        assert!(NamedNode::new("not an iri").is_err());
    }

    #[test]
    fn test_blank_node() {
        let node1 = BlankNode::new();
        let node2 = BlankNode::new();
        assert_ne!(node1, node2);

        let named = BlankNode::with_id("b0").unwrap();
        assert_eq!(named.to_string(), "_:b0");
    }

    #[test]
    fn test_literal_accessors() {
        let lit = Literal::new_simple_literal("Alice");
        assert_eq!(lit.value(), "Alice");
        assert_eq!(lit.datatype().as_str(), "http://www.w3.org/2001/XMLSchema#string");
        assert_eq!(lit.language(), None);

        let lit = Literal::new_language_tagged_literal("Hallo", "de-AT").unwrap();
        assert_eq!(lit.language(), Some("de-AT"));
        assert_eq!(
            lit.datatype().as_str(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString"
        );
    }

    #[test]
    fn test_language_tag_case_insensitive_equality() {
        let upper = Literal::new_language_tagged_literal("chat", "FR").unwrap();
        let lower = Literal::new_language_tagged_literal("chat", "fr").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.language(), Some("FR"));

        let mut set = std::collections::HashSet::new();
        set.insert(Term::from(upper));
        assert!(set.contains(&Term::from(lower)));
    }

    #[test]
    fn test_language_on_typed_literal_rejected() {
        let err = Literal::from_parts("4", Some(&xsd_integer()), Some("en")).unwrap_err();
        assert!(matches!(err, TermError::LanguageOnTypedLiteral { .. }));

        let string = NamedNode::new("http://www.w3.org/2001/XMLSchema#string").unwrap();
        let lit = Literal::from_parts("hi", Some(&string), Some("en")).unwrap();
        assert_eq!(lit.language(), Some("en"));
    }

    #[test]
    fn test_lang_string_requires_tag() {
        let lang_string =
            NamedNode::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#langString").unwrap();
        let err = Literal::new_typed_literal("x", lang_string).unwrap_err();
        assert!(matches!(err, TermError::MissingLanguageTag(_)));
    }

    #[test]
    fn test_invalid_language_tag() {
        assert!(matches!(
            Literal::new_language_tagged_literal("x", "not a tag"),
            Err(TermError::InvalidLanguageTag(_))
        ));
    }

    #[test]
    fn test_term_accessors() {
        let iri = Term::from(NamedNode::new("http://example.org/a").unwrap());
        assert!(iri.is_uri());
        assert_eq!(iri.uri(), Some("http://example.org/a"));
        assert_eq!(iri.lex(), None);

        let lit = Term::from(Literal::new_typed_literal("4", xsd_integer()).unwrap());
        assert!(lit.is_literal());
        assert_eq!(lit.lex(), Some("4"));
        assert_eq!(lit.datatype(), Some(xsd_integer()));

        let blank = Term::from(BlankNode::new());
        assert!(blank.is_blank_node());
        assert_eq!(blank.uri(), None);
    }

    #[test]
    fn test_term_parse() {
        let term = Term::parse("<http://example.org/a>").unwrap();
        assert_eq!(term.uri(), Some("http://example.org/a"));

        let term = Term::parse("\"2\"^^<http://www.w3.org/2001/XMLSchema#integer>").unwrap();
        assert_eq!(term.lex(), Some("2"));
        assert_eq!(term.datatype(), Some(xsd_integer()));

        assert!(Term::parse("nonsense").is_err());
    }

    #[test]
    fn test_parse_keeps_language_tag_case() {
        let parsed = Term::parse("\"Haus\"@DE-at").unwrap();
        assert_eq!(parsed.language(), Some("DE-at"));
        assert_eq!(parsed.lex(), Some("Haus"));

        let built = Term::from(Literal::new_language_tagged_literal("Haus", "DE-at").unwrap());
        assert_eq!(parsed.language(), built.language());
        assert_eq!(parsed, built);
    }

    #[test]
    fn test_term_ordering_by_variant() {
        let iri = Term::from(NamedNode::new("http://z.example/").unwrap());
        let blank = Term::from(BlankNode::with_id("a").unwrap());
        let lit = Term::from(Literal::new_simple_literal("a"));
        let mut terms = vec![lit.clone(), blank.clone(), iri.clone()];
        terms.sort();
        assert_eq!(terms, vec![iri, blank, lit]);
    }

    #[test]
    fn test_triple_from_terms() {
        let s = Term::from(NamedNode::new("http://example.org/s").unwrap());
        let p = Term::from(NamedNode::new("http://example.org/p").unwrap());
        let o = Term::from(Literal::new_simple_literal("o"));

        let triple = Triple::from_terms(s.clone(), p.clone(), o.clone()).unwrap();
        assert_eq!(Term::from(triple.subject.clone()), s);
        assert_eq!(
            triple.to_string(),
            "<http://example.org/s> <http://example.org/p> \"o\" ."
        );

        assert!(matches!(
            Triple::from_terms(o.clone(), p.clone(), s.clone()),
            Err(TermError::InvalidSubject(_))
        ));
        assert!(matches!(
            Triple::from_terms(s, o.clone(), o),
            Err(TermError::InvalidPredicate(_))
        ));
    }
}
