//! Validation results and their aggregation

use crate::rdf::Term;
use serde::Serialize;
use std::fmt;

/// Violation detail returned by a validator function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Offending value node
    pub value: Term,
    /// Path the value was reached through, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Term>,
    /// Message supplied by the function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Violation {
    pub fn new(value: Term) -> Self {
        Self {
            value,
            path: None,
            message: None,
        }
    }

    pub fn with_path(mut self, path: Term) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// One violation, attributed to the shape and function that found it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub shape: String,
    pub source: String,
    pub focus_node: Term,
    pub value: Term,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Term>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// A function that failed instead of answering. Faults are kept apart from
/// violations and never abort the rest of the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultRecord {
    pub shape: String,
    pub source: String,
    /// Unset for faults raised while selecting targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_node: Option<Term>,
    pub message: String,
}

/// Aggregator lifecycle. [`ResultAggregator::finish`] consumes the
/// aggregator, so the finished state is the [`ValidationReport`] itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Running,
}

/// Collects the results of one validation pass, in recording order
#[derive(Debug)]
pub struct ResultAggregator {
    state: PassState,
    results: Vec<ValidationResult>,
    faults: Vec<FaultRecord>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {
            state: PassState::Idle,
            results: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Start the pass
    pub fn begin(&mut self) {
        self.state = PassState::Running;
    }

    /// Append a violation
    pub fn record(&mut self, result: ValidationResult) {
        self.state = PassState::Running;
        self.results.push(result);
    }

    /// Append a fault
    pub fn record_fault(&mut self, fault: FaultRecord) {
        self.state = PassState::Running;
        self.faults.push(fault);
    }

    /// Violations recorded so far
    pub fn collect(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn faults(&self) -> &[FaultRecord] {
        &self.faults
    }

    /// End the pass
    pub fn finish(self) -> ValidationReport {
        ValidationReport {
            conforms: self.results.is_empty() && self.faults.is_empty(),
            results: self.results,
            faults: self.faults,
        }
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True when neither a violation nor a fault was recorded
    pub conforms: bool,
    pub results: Vec<ValidationResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<FaultRecord>,
}

impl ValidationReport {
    /// Report of a pass that found nothing
    pub fn empty() -> Self {
        Self {
            conforms: true,
            results: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// Append another report, keeping its order
    pub fn merge(&mut self, other: ValidationReport) {
        self.conforms &= other.conforms;
        self.results.extend(other.results);
        self.faults.extend(other.faults);
    }

    pub fn has_faults(&self) -> bool {
        !self.faults.is_empty()
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conforms: {}", self.conforms)?;
        writeln!(f, "Results ({}):", self.results.len())?;
        for r in &self.results {
            write!(f, "  [{}] {} focus={} value={}", r.shape, r.source, r.focus_node, r.value)?;
            if let Some(path) = &r.path {
                write!(f, " path={}", path)?;
            }
            writeln!(f)?;
            for message in &r.messages {
                writeln!(f, "    {}", message)?;
            }
        }
        if !self.faults.is_empty() {
            writeln!(f, "Faults ({}):", self.faults.len())?;
            for fault in &self.faults {
                write!(f, "  [{}] {}", fault.shape, fault.source)?;
                if let Some(focus) = &fault.focus_node {
                    write!(f, " focus={}", focus)?;
                }
                writeln!(f, ": {}", fault.message)?;
            }
        }
        Ok(())
    }
}
