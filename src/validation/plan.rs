//! Validation plans
//!
//! A plan is a YAML document naming shapes, their targets and the registry
//! functions bound to them:
//!
//! ```yaml
//! prefixes:
//!   ex: http://example.org/
//! shapes:
//!   - name: PersonShape
//!     targets:
//!       - node: ex:alice
//!       - function: findThings
//!     path: ex:name
//!     constraints:
//!       - function: hasMaxLength
//!         params:
//!           maxLength: 10
//! ```
//!
//! Terms are prefixed names or N-Triples terms (`<http://...>`, `"text"@en`,
//! `_:b0`). Integer and boolean scalars become `xsd:integer` and
//! `xsd:boolean` literals.

use super::engine::{FunctionBinding, Shape, Target};
use super::function::FunctionRegistry;
use crate::rdf::{NamespaceManager, Term, TermError, TermFactory};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Plan errors
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid plan: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid term {text:?}: {source}")]
    Term { text: String, source: TermError },

    #[error("Path of shape {shape} must be an IRI")]
    InvalidPath { shape: String },
}

pub type PlanResult<T> = Result<T, PlanError>;

/// A term as written in a plan
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PlanTerm {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PlanTarget {
    Node {
        node: String,
    },
    Function {
        function: String,
        #[serde(default)]
        params: IndexMap<String, PlanTerm>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanBinding {
    pub function: String,
    #[serde(default)]
    pub params: IndexMap<String, PlanTerm>,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanShape {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<PlanTarget>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub constraints: Vec<PlanBinding>,
    #[serde(default)]
    pub rules: Vec<PlanBinding>,
}

/// Deserialized plan document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValidationPlan {
    #[serde(default)]
    pub prefixes: IndexMap<String, String>,
    #[serde(default)]
    pub shapes: Vec<PlanShape>,
}

impl ValidationPlan {
    pub fn from_yaml(text: &str) -> PlanResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> PlanResult<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Namespace table: the common prefixes plus the plan's own
    pub fn namespaces(&self) -> NamespaceManager {
        let mut namespaces = NamespaceManager::new();
        for (prefix, iri) in &self.prefixes {
            namespaces.add_prefix(prefix.clone(), iri.clone());
        }
        namespaces
    }

    /// Resolve function names and terms into engine shapes
    pub fn shapes(&self, registry: &FunctionRegistry) -> PlanResult<Vec<Shape>> {
        let factory = TermFactory::with_namespaces(self.namespaces());
        self.shapes
            .iter()
            .map(|shape| build_shape(shape, registry, &factory))
            .collect()
    }
}

fn build_shape(plan: &PlanShape, registry: &FunctionRegistry, factory: &TermFactory) -> PlanResult<Shape> {
    let mut shape = Shape::new(plan.name.clone());

    for target in &plan.targets {
        shape.targets.push(match target {
            PlanTarget::Node { node } => Target::Node(term(node, factory)?),
            PlanTarget::Function { function, params } => {
                Target::Function(binding(function, params, &[], registry, factory)?)
            }
        });
    }

    if let Some(path) = &plan.path {
        match term(path, factory)? {
            Term::NamedNode(iri) => shape.path = Some(iri),
            _ => {
                return Err(PlanError::InvalidPath {
                    shape: plan.name.clone(),
                })
            }
        }
    }

    for c in &plan.constraints {
        shape
            .constraints
            .push(binding(&c.function, &c.params, &c.messages, registry, factory)?);
    }
    for r in &plan.rules {
        shape
            .rules
            .push(binding(&r.function, &r.params, &r.messages, registry, factory)?);
    }
    Ok(shape)
}

fn binding(
    name: &str,
    params: &IndexMap<String, PlanTerm>,
    messages: &[String],
    registry: &FunctionRegistry,
    factory: &TermFactory,
) -> PlanResult<FunctionBinding> {
    let function = registry
        .get(name)
        .ok_or_else(|| PlanError::UnknownFunction(name.to_string()))?;

    let mut binding = FunctionBinding::new(function);
    for (param, value) in params {
        let value = match value {
            PlanTerm::Integer(n) => factory.integer(*n),
            PlanTerm::Boolean(b) => factory.boolean(*b),
            PlanTerm::Text(text) => term(text, factory)?,
        };
        binding.params.insert(param.clone(), value);
    }
    binding.messages.extend(messages.iter().cloned());
    Ok(binding)
}

/// N-Triples term or prefixed name
fn term(text: &str, factory: &TermFactory) -> PlanResult<Term> {
    let text = text.trim();
    let parsed = if text.starts_with(&['<', '"', '_'][..]) {
        Term::parse(text)
    } else {
        factory.prefixed(text)
    };
    parsed.map_err(|source| PlanError::Term {
        text: text.to_string(),
        source,
    })
}
