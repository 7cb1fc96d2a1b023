//! Structural patterns over s-expressions.
//!
//! In textual form, `?name` captures the matched sub-expression, `_` matches
//! anything, `. ?rest` as the last two items of a list captures the remaining
//! items as a list, and every other atom matches itself.

use crate::errors::{SexprError, SexprResult};
use crate::sexpr::Sexpr;
use std::collections::BTreeMap;

pub type Bindings = BTreeMap<String, Sexpr>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Wildcard,
    Capture(String),
    Literal(Sexpr),
    List {
        items: Vec<Pattern>,
        tail: Option<Box<Pattern>>,
    },
}

impl Pattern {
    pub fn capture<S: Into<String>>(name: S) -> Self {
        Self::Capture(name.into())
    }

    pub fn list<I: IntoIterator<Item = Pattern>>(items: I) -> Self {
        Self::List {
            items: items.into_iter().collect(),
            tail: None,
        }
    }

    pub fn list_with_tail<I: IntoIterator<Item = Pattern>>(items: I, tail: Pattern) -> Self {
        Self::List {
            items: items.into_iter().collect(),
            tail: Some(Box::new(tail)),
        }
    }

    pub fn parse(source: &str) -> SexprResult<Self> {
        Self::compile(&crate::parse(source)?)
    }

    /// Builds a pattern from its textual form.
    pub fn compile(expr: &Sexpr) -> SexprResult<Self> {
        match expr {
            Sexpr::Symbol(name) if name == "_" => Ok(Self::Wildcard),
            Sexpr::Symbol(name) if name == "." => Err(SexprError::InvalidPattern(
                "'.' is only allowed before the last item of a list".to_string(),
            )),
            Sexpr::Symbol(name) => match name.strip_prefix('?') {
                Some("") => Err(SexprError::InvalidPattern(
                    "capture without a name".to_string(),
                )),
                Some(var) => Ok(Self::capture(var)),
                None => Ok(Self::Literal(expr.clone())),
            },
            Sexpr::List(items) => {
                let (items, tail) = match items.as_slice() {
                    [init @ .., Sexpr::Symbol(dot), last] if dot == "." => {
                        (init, Some(Box::new(Self::compile(last)?)))
                    }
                    _ => (items.as_slice(), None),
                };
                let items = items
                    .iter()
                    .map(Self::compile)
                    .collect::<SexprResult<Vec<_>>>()?;
                Ok(Self::List { items, tail })
            }
            Sexpr::Int(_) | Sexpr::Str(_) => Ok(Self::Literal(expr.clone())),
        }
    }

    /// Matches an expression, returning the captured sub-expressions.
    ///
    /// A variable captured twice must be bound to equal expressions.
    pub fn matches(&self, expr: &Sexpr) -> Option<Bindings> {
        let mut bindings = Bindings::new();
        if self.match_into(expr, &mut bindings) {
            Some(bindings)
        } else {
            None
        }
    }

    fn match_into(&self, expr: &Sexpr, bindings: &mut Bindings) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Literal(lit) => lit == expr,
            Self::Capture(name) => bind(bindings, name, expr.clone()),
            Self::List { items, tail } => {
                let Sexpr::List(exprs) = expr else {
                    return false;
                };
                let enough = match tail {
                    Some(_) => exprs.len() >= items.len(),
                    None => exprs.len() == items.len(),
                };
                if !enough {
                    return false;
                }
                if !items
                    .iter()
                    .zip(exprs)
                    .all(|(item, expr)| item.match_into(expr, bindings))
                {
                    return false;
                }
                match tail {
                    Some(tail) => {
                        let rest = Sexpr::List(exprs[items.len()..].to_vec());
                        tail.match_into(&rest, bindings)
                    }
                    None => true,
                }
            }
        }
    }
}

fn bind(bindings: &mut Bindings, name: &str, expr: Sexpr) -> bool {
    match bindings.get(name) {
        Some(bound) => *bound == expr,
        None => {
            bindings.insert(name.to_string(), expr);
            true
        }
    }
}

impl Sexpr {
    /// Shortcut for [`Pattern::matches`].
    pub fn matches(&self, pattern: &Pattern) -> Option<Bindings> {
        pattern.matches(self)
    }
}
