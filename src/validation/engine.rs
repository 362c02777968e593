//! Validation engine
//!
//! Resolves focus nodes for a shape, invokes its bound functions per focus
//! node and value node (or once per focus node for per-focus functions), and
//! aggregates the outcome. Focus nodes are
//! independent, so they are evaluated on the rayon pool and merged back in
//! focus order. Rule materialization runs as a separate phase: every rule is
//! evaluated against a quiescent store first, then the inferred triples are
//! written in one atomic insert.

use super::config::{ConfigError, EngineConfig};
use super::function::{Bindings, FunctionKind, Invocation, Outcome, ValidationFunction};
use super::report::{FaultRecord, ResultAggregator, ValidationReport, ValidationResult, Violation};
use crate::rdf::{NamedNode, StoreError, Term, TermError, TermFactory, Triple, TripleStore};
use indexmap::IndexSet;
use rayon::prelude::*;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Engine errors. Function faults are not among them unless a single
/// function was called directly: during a pass they are recorded in the
/// report instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed term: {0}")]
    Term(#[from] TermError),

    #[error("Function {function} requires parameter ${parameter}")]
    MissingParameter { function: String, parameter: String },

    #[error("Function {function} does not declare parameter ${parameter}")]
    UnknownParameter { function: String, parameter: String },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} is a {actual} function and cannot be used as a {slot}")]
    KindMismatch {
        function: String,
        actual: FunctionKind,
        slot: &'static str,
    },

    #[error("Rule iteration exceeded iteration limit of {0}")]
    RuleIterationLimit(usize),

    #[error("Validation pass cancelled")]
    Cancelled,

    #[error("Function {function} failed: {message}")]
    Fault { function: String, message: String },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A function together with its parameter values
#[derive(Clone)]
pub struct FunctionBinding {
    pub function: Arc<dyn ValidationFunction>,
    pub params: Bindings,
    /// Message templates added to the function's own
    pub messages: Vec<String>,
}

impl FunctionBinding {
    pub fn new(function: Arc<dyn ValidationFunction>) -> Self {
        Self {
            function,
            params: Bindings::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Term>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.messages.push(template.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.function.signature().name
    }

    pub fn kind(&self) -> FunctionKind {
        self.function.signature().kind
    }

    /// Check the binding against the function's signature for use in `slot`
    pub fn check(&self, accepted: &[FunctionKind], slot: &'static str) -> EngineResult<()> {
        let signature = self.function.signature();
        if !accepted.contains(&signature.kind) {
            return Err(EngineError::KindMismatch {
                function: signature.name.clone(),
                actual: signature.kind,
                slot,
            });
        }
        if let Some(parameter) = signature.missing(&self.params).next() {
            return Err(EngineError::MissingParameter {
                function: signature.name.clone(),
                parameter: parameter.to_string(),
            });
        }
        if let Some(parameter) = signature.undeclared(&self.params).next() {
            return Err(EngineError::UnknownParameter {
                function: signature.name.clone(),
                parameter: parameter.to_string(),
            });
        }
        Ok(())
    }

    fn templates(&self) -> impl Iterator<Item = &str> {
        self.function
            .signature()
            .messages
            .iter()
            .chain(&self.messages)
            .map(|m| m.as_str())
    }
}

impl fmt::Debug for FunctionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionBinding")
            .field("function", &self.name())
            .field("params", &self.params)
            .field("messages", &self.messages)
            .finish()
    }
}

/// How a shape selects focus nodes
#[derive(Debug, Clone)]
pub enum Target {
    Node(Term),
    Function(FunctionBinding),
}

/// Constraints and rules applied to a set of focus nodes
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub name: String,
    pub targets: Vec<Target>,
    /// Property path; node shape when unset
    pub path: Option<NamedNode>,
    /// Constraint and validator bindings
    pub constraints: Vec<FunctionBinding>,
    /// Rule bindings
    pub rules: Vec<FunctionBinding>,
}

impl Shape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_target_node(mut self, node: impl Into<Term>) -> Self {
        self.targets.push(Target::Node(node.into()));
        self
    }

    pub fn with_target_function(mut self, binding: FunctionBinding) -> Self {
        self.targets.push(Target::Function(binding));
        self
    }

    pub fn with_path(mut self, path: NamedNode) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_constraint(mut self, binding: FunctionBinding) -> Self {
        self.constraints.push(binding);
        self
    }

    pub fn with_rule(mut self, binding: FunctionBinding) -> Self {
        self.rules.push(binding);
        self
    }
}

/// Cooperative cancellation flag, checked between function invocations
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of rule materialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleReport {
    /// Triples added to the store
    pub inferred: usize,
    /// Read/write rounds run
    pub iterations: usize,
    pub faults: Vec<FaultRecord>,
}

impl RuleReport {
    fn merge(&mut self, other: RuleReport) {
        self.inferred += other.inferred;
        self.iterations += other.iterations;
        self.faults.extend(other.faults);
    }
}

#[derive(Default)]
struct FocusOutcome {
    results: Vec<ValidationResult>,
    faults: Vec<FaultRecord>,
}

/// Validation engine.
///
/// Owns the term factory handed to every invocation and, when configured
/// with a thread count, a dedicated rayon pool.
pub struct ValidationEngine {
    config: EngineConfig,
    factory: TermFactory,
    pool: Option<rayon::ThreadPool>,
    cancel: CancellationToken,
}

impl ValidationEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let pool = match config.worker_threads {
            Some(threads) if config.parallel => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("shapecheck-worker-{}", i))
                    .build()
                    .map_err(|e| EngineError::ThreadPool(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(Self {
            config,
            factory: TermFactory::new(),
            pool,
            cancel: CancellationToken::new(),
        })
    }

    /// Use a factory with a custom namespace table
    pub fn with_factory(mut self, factory: TermFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn factory(&self) -> &TermFactory {
        &self.factory
    }

    /// Handle that cancels running and future passes until reset
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Focus nodes of a shape: explicit nodes and target function results,
    /// in first-seen order without duplicates
    pub fn focus_nodes(&self, store: &TripleStore, shape: &Shape) -> EngineResult<Vec<Term>> {
        let (nodes, faults) = self.resolve_targets(store, shape)?;
        match faults.into_iter().next() {
            Some(fault) => Err(EngineError::Fault {
                function: fault.source,
                message: fault.message,
            }),
            None => Ok(nodes),
        }
    }

    /// Validate every shape in order and merge the reports
    pub fn validate(&self, store: &TripleStore, shapes: &[Shape]) -> EngineResult<ValidationReport> {
        let mut report = ValidationReport::empty();
        for shape in shapes {
            report.merge(self.validate_shape(store, shape)?);
        }
        info!(
            conforms = report.conforms,
            results = report.results.len(),
            faults = report.faults.len(),
            "Validation finished"
        );
        Ok(report)
    }

    /// Validate one shape.
    ///
    /// Results are ordered by focus node, then constraint, then value node,
    /// whatever the degree of parallelism.
    pub fn validate_shape(&self, store: &TripleStore, shape: &Shape) -> EngineResult<ValidationReport> {
        for binding in &shape.constraints {
            binding.check(&[FunctionKind::Constraint, FunctionKind::Validator], "constraint")?;
            let signature = binding.function.signature();
            let needs_path = signature.per_focus && signature.parameter("path").is_some();
            if needs_path && shape.path.is_none() && !binding.params.contains_key("path") {
                return Err(EngineError::MissingParameter {
                    function: signature.name.clone(),
                    parameter: "path".to_string(),
                });
            }
        }

        let (focus, target_faults) = self.resolve_targets(store, shape)?;
        debug!(shape = %shape.name, focus_nodes = focus.len(), "Validating shape");

        let path = shape.path.clone().map(Term::from);
        let outcomes = self.map_ordered(&focus, |node| {
            self.evaluate_focus(store, shape, path.as_ref(), node)
        });

        let mut aggregator = ResultAggregator::new();
        aggregator.begin();
        for fault in target_faults {
            aggregator.record_fault(fault);
        }
        for outcome in outcomes {
            let outcome = outcome?;
            for result in outcome.results {
                aggregator.record(result);
            }
            for fault in outcome.faults {
                aggregator.record_fault(fault);
            }
        }
        Ok(aggregator.finish())
    }

    /// Materialize the rules of every shape in order
    pub fn apply_all_rules(&self, store: &TripleStore, shapes: &[Shape]) -> EngineResult<RuleReport> {
        let mut report = RuleReport::default();
        for shape in shapes {
            report.merge(self.apply_rules(store, shape)?);
        }
        Ok(report)
    }

    /// Materialize the rules of one shape.
    ///
    /// Each round evaluates every rule for every focus node, then writes the
    /// union of their triples. With `iterate_rules` set, rounds repeat until
    /// one adds nothing, failing once `max_rule_iterations` rounds have run.
    /// A conflicting reader makes the write fail with the store unchanged.
    pub fn apply_rules(&self, store: &TripleStore, shape: &Shape) -> EngineResult<RuleReport> {
        let mut report = RuleReport::default();
        if shape.rules.is_empty() {
            return Ok(report);
        }
        for binding in &shape.rules {
            binding.check(&[FunctionKind::Rule], "rule")?;
        }

        let (focus, target_faults) = self.resolve_targets(store, shape)?;
        report.faults.extend(target_faults);

        loop {
            if report.iterations >= self.config.max_rule_iterations {
                warn!(shape = %shape.name, "Rule iteration limit reached");
                return Err(EngineError::RuleIterationLimit(self.config.max_rule_iterations));
            }
            report.iterations += 1;

            let mut inferred = Vec::new();
            for outcome in self.map_ordered(&focus, |node| self.infer(store, shape, node)) {
                let (triples, faults) = outcome?;
                inferred.extend(triples);
                report.faults.extend(faults);
            }

            let added = store.insert_all(&inferred)?;
            report.inferred += added;
            debug!(
                shape = %shape.name,
                iteration = report.iterations,
                added,
                "Rule round finished"
            );

            if added == 0 || !self.config.iterate_rules {
                break;
            }
        }
        Ok(report)
    }

    /// Call a term function
    pub fn call_function(&self, store: &TripleStore, binding: &FunctionBinding) -> EngineResult<Option<Term>> {
        binding.check(&[FunctionKind::Function], "function")?;
        let invocation = self.invocation(store, binding, None, None, None);
        match invoke(binding, &invocation) {
            Ok(Outcome::Term(term)) => Ok(term),
            Ok(other) => Err(EngineError::Fault {
                function: binding.name().to_string(),
                message: unexpected(&other),
            }),
            Err(message) => Err(EngineError::Fault {
                function: binding.name().to_string(),
                message,
            }),
        }
    }

    fn invocation<'a>(
        &'a self,
        store: &'a TripleStore,
        binding: &'a FunctionBinding,
        this: Option<&'a Term>,
        value: Option<&'a Term>,
        path: Option<&'a Term>,
    ) -> Invocation<'a> {
        Invocation {
            this,
            value,
            path,
            params: &binding.params,
            data: store,
            factory: &self.factory,
        }
    }

    fn resolve_targets(&self, store: &TripleStore, shape: &Shape) -> EngineResult<(Vec<Term>, Vec<FaultRecord>)> {
        let mut nodes = IndexSet::new();
        let mut faults = Vec::new();

        for target in &shape.targets {
            match target {
                Target::Node(node) => {
                    nodes.insert(node.clone());
                }
                Target::Function(binding) => {
                    binding.check(&[FunctionKind::Target], "target")?;
                    let invocation = self.invocation(store, binding, None, None, None);
                    let message = match invoke(binding, &invocation) {
                        Ok(Outcome::Nodes(found)) => {
                            let iri_only = self.config.targets_iri_only;
                            nodes.extend(found.into_iter().filter(|n| !iri_only || n.is_uri()));
                            continue;
                        }
                        Ok(other) => unexpected(&other),
                        Err(message) => message,
                    };
                    warn!(shape = %shape.name, function = binding.name(), %message, "Target function fault");
                    faults.push(FaultRecord {
                        shape: shape.name.clone(),
                        source: binding.name().to_string(),
                        focus_node: None,
                        message,
                    });
                }
            }
        }
        Ok((nodes.into_iter().collect(), faults))
    }

    fn evaluate_focus(
        &self,
        store: &TripleStore,
        shape: &Shape,
        path: Option<&Term>,
        focus: &Term,
    ) -> EngineResult<FocusOutcome> {
        let values = match path {
            Some(path) => store.find(Some(focus), Some(path), None).objects(),
            None => vec![focus.clone()],
        };

        let mut outcome = FocusOutcome::default();
        for binding in &shape.constraints {
            if binding.function.signature().per_focus {
                let invocation = self.invocation(store, binding, Some(focus), None, path);
                self.evaluate(shape, binding, focus, &invocation, &mut outcome)?;
                continue;
            }
            for value in &values {
                let invocation = self.invocation(store, binding, Some(focus), Some(value), path);
                self.evaluate(shape, binding, focus, &invocation, &mut outcome)?;
            }
        }
        Ok(outcome)
    }

    /// One constraint invocation. `false` is a violation whose value is the
    /// value node, or the focus for per-focus functions.
    fn evaluate(
        &self,
        shape: &Shape,
        binding: &FunctionBinding,
        focus: &Term,
        invocation: &Invocation<'_>,
        outcome: &mut FocusOutcome,
    ) -> EngineResult<()> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let message = match invoke(binding, invocation) {
            Ok(Outcome::Boolean(true)) => return Ok(()),
            Ok(Outcome::Boolean(false)) => {
                let violation = Violation::new(invocation.value.unwrap_or(focus).clone());
                outcome.results.push(self.result(shape, binding, invocation, focus, violation));
                return Ok(());
            }
            Ok(Outcome::Violations(violations)) => {
                for violation in violations {
                    outcome.results.push(self.result(shape, binding, invocation, focus, violation));
                }
                return Ok(());
            }
            Ok(other) => unexpected(&other),
            Err(message) => message,
        };
        warn!(shape = %shape.name, function = binding.name(), focus = %focus, %message, "Function fault");
        outcome.faults.push(FaultRecord {
            shape: shape.name.clone(),
            source: binding.name().to_string(),
            focus_node: Some(focus.clone()),
            message,
        });
        Ok(())
    }

    fn result(
        &self,
        shape: &Shape,
        binding: &FunctionBinding,
        invocation: &Invocation<'_>,
        focus: &Term,
        violation: Violation,
    ) -> ValidationResult {
        let mut messages: Vec<String> = binding
            .templates()
            .map(|template| {
                render_message(template, |name| match name {
                    "value" => Some(&violation.value),
                    _ => invocation.optional_param(name),
                })
            })
            .collect();
        messages.extend(violation.message);

        ValidationResult {
            shape: shape.name.clone(),
            source: binding.name().to_string(),
            focus_node: focus.clone(),
            path: violation.path.or_else(|| invocation.path.cloned()),
            value: violation.value,
            messages,
        }
    }

    fn infer(&self, store: &TripleStore, shape: &Shape, focus: &Term) -> EngineResult<(Vec<Triple>, Vec<FaultRecord>)> {
        let mut triples = Vec::new();
        let mut faults = Vec::new();
        for binding in &shape.rules {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let invocation = self.invocation(store, binding, Some(focus), None, None);
            let message = match invoke(binding, &invocation) {
                Ok(Outcome::Triples(inferred)) => {
                    triples.extend(inferred);
                    continue;
                }
                Ok(other) => unexpected(&other),
                Err(message) => message,
            };
            warn!(shape = %shape.name, function = binding.name(), focus = %focus, %message, "Rule fault");
            faults.push(FaultRecord {
                shape: shape.name.clone(),
                source: binding.name().to_string(),
                focus_node: Some(focus.clone()),
                message,
            });
        }
        Ok((triples, faults))
    }

    fn map_ordered<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if !self.config.parallel {
            return items.iter().map(&f).collect();
        }
        let op = || items.par_iter().map(&f).collect();
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

/// Call a function, turning faults and panics into a message
fn invoke(binding: &FunctionBinding, invocation: &Invocation<'_>) -> Result<Outcome, String> {
    match catch_unwind(AssertUnwindSafe(|| binding.function.call(invocation))) {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(fault)) => Err(fault.message),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
}

fn unexpected(outcome: &Outcome) -> String {
    format!("returned a {} result", outcome.kind())
}

/// Substitute `{$name}` placeholders. Literals render as their lexical
/// form, IRIs without brackets; unknown names are left in place.
pub fn render_message<'t>(template: &str, lookup: impl Fn(&str) -> Option<&'t Term>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{$") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        match lookup(&after[..end]) {
            Some(Term::Literal(l)) => out.push_str(l.value()),
            Some(Term::NamedNode(n)) => out.push_str(n.as_str()),
            Some(term) => out.push_str(&term.to_string()),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
