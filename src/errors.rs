use thiserror::Error;

/// A result type for acquisition maximization errors
pub type Result<T> = std::result::Result<T, AcqError>;

/// An error raised while scoring or maximizing an acquisition function
#[derive(Error, Debug)]
pub enum AcqError {
    /// When configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
    /// When an invalid value is encountered
    #[error("Value error: {0}")]
    InvalidValue(String),
    /// When the surrogate model cannot predict at the given points
    #[error("Surrogate error: {0}")]
    SurrogateError(String),
    /// When no candidate within the bounds satisfies the constraints
    #[error("Infeasible: {0}")]
    InfeasibleError(String),
    /// When an ndarray shape manipulation fails
    #[error(transparent)]
    ShapeError(#[from] ndarray::ShapeError),
}
