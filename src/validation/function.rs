//! Validation function contract
//!
//! A validation function is anything implementing [`ValidationFunction`]:
//! native Rust closures wrapped in [`NativeFunction`], or functions provided
//! by an embedding scripting host. Every function declares a [`Signature`]
//! (kind and parameter list) that the engine checks before invoking it, and
//! receives everything it may touch through an [`Invocation`].

use super::report::Violation;
use crate::rdf::{PatternCursor, StoreError, Term, TermError, TermFactory, Triple, TripleStore};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Bound parameter values keyed by parameter name, in binding order
pub type Bindings = IndexMap<String, Term>;

/// Failure raised by a validation function.
///
/// This is distinct from a function returning `false` or violations: the
/// engine records it as a fault against the focus node and carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FunctionFault {
    pub message: String,
}

impl FunctionFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<StoreError> for FunctionFault {
    fn from(e: StoreError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<TermError> for FunctionFault {
    fn from(e: TermError) -> Self {
        Self::new(e.to_string())
    }
}

pub type FunctionResult<T> = Result<T, FunctionFault>;

/// Calling convention of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    /// `(focus, value, params) -> bool`, or `(focus, path, params) -> bool`
    /// when the signature is per-focus
    Constraint,
    /// `(focus, value, params) -> [Violation]`, or per focus like a constraint
    Validator,
    /// `(focus, params) -> [Triple]`, inferred facts
    Rule,
    /// `(params) -> [node]`, focus node selection
    Target,
    /// `(params) -> Term?`
    Function,
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionKind::Constraint => "constraint",
            FunctionKind::Validator => "validator",
            FunctionKind::Rule => "rule",
            FunctionKind::Target => "target",
            FunctionKind::Function => "function",
        };
        f.write_str(name)
    }
}

/// Declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
}

/// Static description of a function: name, calling convention, parameters
/// and message templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub kind: FunctionKind,
    pub parameters: Vec<Parameter>,
    /// Message templates with `{$name}` placeholders
    pub messages: Vec<String>,
    /// Invoked once per focus node with `$path` bound and no `$value`,
    /// instead of once per value node
    pub per_focus: bool,
}

impl Signature {
    pub fn new(name: impl Into<String>, kind: FunctionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: Vec::new(),
            messages: Vec::new(),
            per_focus: false,
        }
    }

    /// Look up a declared parameter
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Names of required parameters missing from `bindings`
    pub fn missing<'a>(&'a self, bindings: &'a Bindings) -> impl Iterator<Item = &'a str> + 'a {
        self.parameters
            .iter()
            .filter(move |p| !p.optional && !bindings.contains_key(&p.name))
            .map(|p| p.name.as_str())
    }

    /// Names bound in `bindings` that the signature does not declare
    pub fn undeclared<'a>(&'a self, bindings: &'a Bindings) -> impl Iterator<Item = &'a str> + 'a {
        bindings
            .keys()
            .filter(move |name| self.parameter(name).is_none())
            .map(|name| name.as_str())
    }
}

/// What a function returned. The variant must agree with the function's
/// [`FunctionKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Boolean(bool),
    Violations(Vec<Violation>),
    Triples(Vec<Triple>),
    Nodes(Vec<Term>),
    Term(Option<Term>),
}

impl Outcome {
    pub fn kind(&self) -> FunctionKind {
        match self {
            Outcome::Boolean(_) => FunctionKind::Constraint,
            Outcome::Violations(_) => FunctionKind::Validator,
            Outcome::Triples(_) => FunctionKind::Rule,
            Outcome::Nodes(_) => FunctionKind::Target,
            Outcome::Term(_) => FunctionKind::Function,
        }
    }
}

/// Everything one invocation may use.
///
/// Cursors opened through [`Invocation::find`] borrow the store for the
/// invocation only and cannot escape it.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    /// Focus node (`$this`); unset for targets and plain functions
    pub this: Option<&'a Term>,
    /// Value node (`$value`); the focus itself for node-level constraints,
    /// unset for per-focus ones
    pub value: Option<&'a Term>,
    /// Shape path (`$path`) for property-level constraints
    pub path: Option<&'a Term>,
    /// Declared parameter bindings
    pub params: &'a Bindings,
    /// Data graph (`$data`)
    pub data: &'a TripleStore,
    /// Term constructors
    pub factory: &'a TermFactory,
}

impl<'a> Invocation<'a> {
    /// The focus node, or a fault if none is bound
    pub fn this(&self) -> FunctionResult<&'a Term> {
        self.this.ok_or_else(|| FunctionFault::new("no focus node bound ($this)"))
    }

    /// The value node, or a fault if none is bound
    pub fn value(&self) -> FunctionResult<&'a Term> {
        self.value.ok_or_else(|| FunctionFault::new("no value node bound ($value)"))
    }

    /// A parameter by name. `this`, `value` and `path` resolve to the
    /// engine-bound terms when no declared parameter has that name.
    pub fn param(&self, name: &str) -> FunctionResult<&'a Term> {
        self.optional_param(name)
            .ok_or_else(|| FunctionFault::new(format!("parameter ${} is not bound", name)))
    }

    /// A parameter by name, if bound
    pub fn optional_param(&self, name: &str) -> Option<&'a Term> {
        self.params.get(name).or(match name {
            "this" => self.this,
            "value" => self.value,
            "path" => self.path,
            _ => None,
        })
    }

    /// A parameter whose lexical form must parse as a number
    pub fn numeric_param<T: std::str::FromStr>(&self, name: &str) -> FunctionResult<T> {
        let term = self.param(name)?;
        let lex = term.lex().unwrap_or_default();
        lex.trim().parse().map_err(|_| {
            FunctionFault::new(format!("parameter ${} is not numeric: {}", name, term))
        })
    }

    /// Pattern query over the data graph
    pub fn find(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> PatternCursor<'a> {
        self.data.find(subject, predicate, object)
    }
}

/// A function the engine can invoke.
///
/// Implementations must be pure with respect to the store: no mutation and
/// no hidden I/O, so the engine may run focus nodes in parallel.
pub trait ValidationFunction: Send + Sync {
    fn signature(&self) -> &Signature;

    fn call(&self, invocation: &Invocation<'_>) -> FunctionResult<Outcome>;
}

type Body = dyn Fn(&Invocation<'_>) -> FunctionResult<Outcome> + Send + Sync;

/// A validation function implemented in Rust
pub struct NativeFunction {
    signature: Signature,
    body: Box<Body>,
}

impl NativeFunction {
    fn from_body(name: impl Into<String>, kind: FunctionKind, body: Box<Body>) -> Self {
        Self {
            signature: Signature::new(name, kind),
            body,
        }
    }

    /// Boolean constraint: `true` means satisfied
    pub fn constraint<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> FunctionResult<bool> + Send + Sync + 'static,
    {
        let body = move |inv: &Invocation<'_>| f(inv).map(Outcome::Boolean);
        Self::from_body(name, FunctionKind::Constraint, Box::new(body))
    }

    /// Validator returning detailed violations; empty means valid
    pub fn validator<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> FunctionResult<Vec<Violation>> + Send + Sync + 'static,
    {
        let body = move |inv: &Invocation<'_>| f(inv).map(Outcome::Violations);
        Self::from_body(name, FunctionKind::Validator, Box::new(body))
    }

    /// Derivation rule returning triples to assert
    pub fn rule<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> FunctionResult<Vec<Triple>> + Send + Sync + 'static,
    {
        let body = move |inv: &Invocation<'_>| f(inv).map(Outcome::Triples);
        Self::from_body(name, FunctionKind::Rule, Box::new(body))
    }

    /// Target selecting focus nodes
    pub fn target<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> FunctionResult<Vec<Term>> + Send + Sync + 'static,
    {
        let body = move |inv: &Invocation<'_>| f(inv).map(Outcome::Nodes);
        Self::from_body(name, FunctionKind::Target, Box::new(body))
    }

    /// Function computing an optional term
    pub fn function<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> FunctionResult<Option<Term>> + Send + Sync + 'static,
    {
        let body = move |inv: &Invocation<'_>| f(inv).map(Outcome::Term);
        Self::from_body(name, FunctionKind::Function, Box::new(body))
    }

    /// Declare a required parameter
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.signature.parameters.push(Parameter {
            name: name.into(),
            optional: false,
        });
        self
    }

    /// Declare an optional parameter
    pub fn with_optional_parameter(mut self, name: impl Into<String>) -> Self {
        self.signature.parameters.push(Parameter {
            name: name.into(),
            optional: true,
        });
        self
    }

    /// Invoke once per focus node rather than once per value node
    pub fn per_focus(mut self) -> Self {
        self.signature.per_focus = true;
        self
    }

    /// Add a message template
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.signature.messages.push(template.into());
        self
    }

    pub fn into_shared(self) -> Arc<dyn ValidationFunction> {
        Arc::new(self)
    }
}

impl ValidationFunction for NativeFunction {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, invocation: &Invocation<'_>) -> FunctionResult<Outcome> {
        (self.body)(invocation)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Functions addressable by name
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Arc<dyn ValidationFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the stock function library
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for function in super::library::builtins() {
            registry.register(function.into_shared());
        }
        registry
    }

    /// Register a function under its signature name, replacing any
    /// earlier function of the same name
    pub fn register(&mut self, function: Arc<dyn ValidationFunction>) {
        self.functions
            .insert(function.signature().name.clone(), function);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ValidationFunction>> {
        self.functions.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
