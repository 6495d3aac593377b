//! Kernel error type.
//!
//! Everything here is a fatal configuration error: a script-authoring or
//! registry-wiring bug. These abort the whole evaluation pass and
//! propagate unmodified to the caller - no resultOps or scheduledActions
//! from a failed pass are valid. Soft business failures (missing message
//! resource, unknown recipient) are NOT errors; action handlers model
//! those as `log` result ops and the cascade continues.

use thiserror::Error;

/// Fatal configuration errors raised during an evaluation pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// An action name with no registered handler.
    #[error("Invalid action \"{0}\".")]
    InvalidAction(String),

    /// A condition op with no registered handler.
    #[error("Invalid if operation \"{op}\". Valid operations: {}.", valid_ops.join(", "))]
    InvalidConditionOp { op: String, valid_ops: Vec<String> },

    /// A condition node whose parameters do not fit its handler.
    #[error("Malformed condition: {0}")]
    MalformedCondition(String),

    /// An action clause whose shape is not what the resolver expects
    /// (e.g. a selected branch with no action list).
    #[error("Malformed action clause: {0}")]
    MalformedActionClause(String),
}

impl KernelError {
    pub fn invalid_condition_op(op: impl Into<String>, valid_ops: Vec<String>) -> Self {
        Self::InvalidConditionOp {
            op: op.into(),
            valid_ops,
        }
    }
}
