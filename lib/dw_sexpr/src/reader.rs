use crate::errors::SexprError;
use crate::parsers;
use crate::sexpr::Sexpr;
use nom::Finish;

/// Streams the s-expressions of a text one after the other.
///
/// The first error puts the reader in a failed state: no further expression
/// is read and [`SexprReader::what`] gives the diagnostic.
#[derive(Debug, Clone)]
pub struct SexprReader<'a> {
    source: &'a str,
    rest: &'a str,
    error: Option<SexprError>,
}

impl<'a> SexprReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            rest: source,
            error: None,
        }
    }

    /// Reads the next expression, `None` at end of input or on failure.
    pub fn read(&mut self) -> Option<Sexpr> {
        if self.error.is_some() {
            return None;
        }
        match parsers::next_sexpr(self.rest).finish() {
            Ok((rest, expr)) => {
                self.rest = rest;
                expr
            }
            Err(failure) => {
                let err = failure.into_error(self.source);
                log::warn!("s-expression reader failed: {err}");
                self.error = Some(err);
                None
            }
        }
    }

    pub fn fail(&self) -> bool {
        self.error.is_some()
    }

    /// Diagnostic of the failure, empty if the reader did not fail.
    pub fn what(&self) -> String {
        self.error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn error(&self) -> Option<&SexprError> {
        self.error.as_ref()
    }

    /// Whether only whitespaces and comments remain.
    pub fn eoi(&self) -> bool {
        match parsers::skip(self.rest) {
            Ok((rest, ())) => rest.is_empty(),
            Err(_) => false,
        }
    }

    /// Current line in the input.
    pub fn line(&self) -> usize {
        parsers::line_at(self.source, self.source.len() - self.rest.len())
    }
}

impl<'a> Iterator for SexprReader<'a> {
    type Item = Sexpr;

    fn next(&mut self) -> Option<Sexpr> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn several_expressions() {
        let mut reader = SexprReader::new("a (b c)\n; done\n #3");
        assert_eq!(reader.read(), Some(Sexpr::symbol("a")));
        assert!(!reader.eoi());
        assert_eq!(
            reader.read(),
            Some(Sexpr::list([Sexpr::symbol("b"), Sexpr::symbol("c")]))
        );
        assert_eq!(reader.read(), Some(Sexpr::Int(3)));
        assert!(reader.eoi());
        assert_eq!(reader.line(), 3);
        assert_eq!(reader.read(), None);
        assert!(!reader.fail());
        assert_eq!(reader.what(), "");
    }

    #[test]
    fn failed_state_is_sticky() {
        let mut reader = SexprReader::new("(a) b)\n(c)");
        assert_eq!(reader.read(), Some(Sexpr::list([Sexpr::symbol("a")])));
        assert_eq!(reader.read(), Some(Sexpr::symbol("b")));
        assert_eq!(reader.read(), None);
        assert!(reader.fail());
        assert_eq!(reader.error(), Some(&SexprError::UnbalancedParen { line: 1 }));
        assert_eq!(reader.read(), None);
        assert!(reader.what().contains("line 1"));
    }

    #[test]
    fn iterator() {
        let exprs: Vec<_> = SexprReader::new("x y z").collect();
        assert_eq!(exprs.len(), 3);
    }
}
