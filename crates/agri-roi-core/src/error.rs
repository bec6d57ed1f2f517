use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgriRoiError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Simulation failure: only {completed} of {requested} trials completed ({reason})")]
    SimulationFailure {
        completed: u32,
        requested: u32,
        reason: String,
    },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AgriRoiError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AgriRoiError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AgriRoiError {
    fn from(e: serde_json::Error) -> Self {
        AgriRoiError::SerializationError(e.to_string())
    }
}
