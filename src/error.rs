//! Error types for the flappy-rl crate

use thiserror::Error;

/// Main error type for the flappy-rl crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid action index {index} (expected 0 = flap or 1 = noop)")]
    InvalidAction { index: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid encoder '{input}'. Expected one of: {expected}")]
    ParseEncoder { input: String, expected: String },

    #[error("invalid feature set '{input}'. Expected one of: {expected}")]
    ParseFeatureSet { input: String, expected: String },

    #[error("invalid agent kind '{input}'. Expected one of: {expected}")]
    ParseAgentKind { input: String, expected: String },

    #[error("feature vector has {got} entries but the weights expect {expected}")]
    FeatureLengthMismatch { expected: usize, got: usize },

    #[error("unsupported agent file version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("agent file holds a {found} agent, not {expected}")]
    AgentKindMismatch { expected: String, found: String },

    #[error("cannot save learner '{name}': it does not expose a serializable state")]
    UnsupportedLearner { name: String },

    #[error("score history is empty")]
    EmptyScores,

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
