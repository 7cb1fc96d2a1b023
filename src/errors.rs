//! Global error handling.
//!
//! Each sub-crate of the project defines its own type error.
//! Their types can be unified, for example in a main function,
//! when winding results at the top-level.
//!
//! ```rust
//! use absint::prelude::*;
//! use absint::sexpr;
//!
//! fn main() -> AbsintResult<()> { // can return an AbsintError
//!    let _expr = sexpr::parse("(a b)")?; // can return a SexprError
//!    Ok(())
//! }
//! ```

use dw_analysis::errors::AnalysisError;
use dw_domains::errors::DomainError;
use dw_sexpr::errors::SexprError;
use thiserror::Error;

/// An alias for result that can be an [`AbsintError`].
pub type AbsintResult<T> = Result<T, AbsintError>;

/// The main error type for error winding at the top-level.
/// It mainly consists of transparent wrapper over error types that
/// are defined in dependencies.
#[derive(Debug, Error)]
pub enum AbsintError {
    /// Custom error for reporting bad command line arguments usage.
    #[error("bad arguments: {0}")]
    BadArguments(String),

    /// Error that can be returned from regex compilation.
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Error that can be returned from [`dw_analysis`] functions.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Error that can be returned from [`dw_sexpr`] functions.
    #[error(transparent)]
    Sexpr(#[from] SexprError),

    /// Error that can be returned from [`dw_domains`] functions.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
