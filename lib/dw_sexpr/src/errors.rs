use thiserror::Error;

pub type SexprResult<T> = Result<T, SexprError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SexprError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: unexpected end of input")]
    UnexpectedEnd { line: usize },

    #[error("line {line}: unbalanced closing parenthesis")]
    UnbalancedParen { line: usize },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

impl SexprError {
    /// Line of the input where the error was detected, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::UnexpectedEnd { line } | Self::UnbalancedParen { line } => {
                Some(*line)
            }
            Self::InvalidPattern(_) => None,
        }
    }
}
