//! Validation functions and the engine that runs them
//!
//! - [`function`]: the contract every constraint, validator, rule, target
//!   and term function implements, and the registry that names them
//! - [`library`]: native stock functions
//! - [`engine`]: shapes, focus-node resolution, parallel evaluation, rule
//!   materialization
//! - [`report`]: violation records and the per-pass aggregator
//! - [`config`] and [`plan`]: YAML engine settings and validation plans

pub mod config;
pub mod engine;
pub mod function;
pub mod library;
pub mod plan;
pub mod report;

pub use config::{ConfigError, ConfigResult, EngineConfig};

pub use engine::{
    render_message, CancellationToken, EngineError, EngineResult, FunctionBinding, RuleReport,
    Shape, Target, ValidationEngine,
};

pub use function::{
    Bindings, FunctionFault, FunctionKind, FunctionRegistry, FunctionResult, Invocation,
    NativeFunction, Outcome, Parameter, Signature, ValidationFunction,
};

pub use plan::{PlanError, PlanResult, ValidationPlan};

pub use report::{
    FaultRecord, PassState, ResultAggregator, ValidationReport, ValidationResult, Violation,
};
