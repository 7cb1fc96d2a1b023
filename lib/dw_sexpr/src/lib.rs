//! S-expressions: data structure, reader, printer and structural patterns.
//!
//! ```
//! use dw_sexpr::{parse, Pattern, Sexpr};
//!
//! let expr = parse("(call f #1 \"s\")").unwrap();
//! let bindings = Pattern::parse("(call ?fun . ?args)").unwrap().matches(&expr).unwrap();
//! assert_eq!(bindings["fun"], Sexpr::symbol("f"));
//! assert_eq!(expr.to_string(), "(call f #1 \"s\")");
//! ```

pub mod errors;
mod parsers;
pub mod pattern;
pub mod reader;
pub mod sexpr;

pub use errors::{SexprError, SexprResult};
pub use parsers::MAX_DEPTH;
pub use pattern::{Bindings, Pattern};
pub use reader::SexprReader;
pub use sexpr::Sexpr;

/// Parses a text holding exactly one s-expression.
pub fn parse(source: &str) -> SexprResult<Sexpr> {
    let mut reader = SexprReader::new(source);
    let expr = reader.read();
    if let Some(err) = reader.error() {
        return Err(err.clone());
    }
    let Some(expr) = expr else {
        return Err(SexprError::UnexpectedEnd { line: reader.line() });
    };
    if !reader.eoi() {
        // A single trailing ')' is reported as such.
        reader.read();
        return Err(reader.error().cloned().unwrap_or_else(|| SexprError::Parse {
            line: reader.line(),
            message: "trailing input after expression".to_string(),
        }));
    }
    Ok(expr)
}

/// Parses every s-expression of a text.
pub fn parse_all(source: &str) -> SexprResult<Vec<Sexpr>> {
    let mut reader = SexprReader::new(source);
    let exprs: Vec<Sexpr> = reader.by_ref().collect();
    match reader.error() {
        Some(err) => Err(err.clone()),
        None => Ok(exprs),
    }
}
