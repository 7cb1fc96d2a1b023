use crate::errors::{SexprError, SexprResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sexpr {
    Symbol(String),
    Int(i32),
    Str(String),
    List(Vec<Sexpr>),
}

impl Sexpr {
    /// The empty list `()`.
    pub fn nil() -> Self {
        Self::List(Vec::new())
    }

    pub fn symbol<S: Into<String>>(name: S) -> Self {
        Self::Symbol(name.into())
    }

    pub fn string<S: Into<String>>(content: S) -> Self {
        Self::Str(content.into())
    }

    pub fn list<I: IntoIterator<Item = Sexpr>>(items: I) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::List(items) if items.is_empty())
    }

    pub fn is_atom(&self) -> bool {
        !matches!(self, Self::List(_))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i32> for Sexpr {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<Vec<Sexpr>> for Sexpr {
    fn from(items: Vec<Sexpr>) -> Self {
        Self::List(items)
    }
}

impl FromStr for Sexpr {
    type Err = SexprError;

    fn from_str(s: &str) -> SexprResult<Self> {
        crate::parse(s)
    }
}

enum Token<'a> {
    Expr(&'a Sexpr),
    Space,
    Close,
}

fn fmt_atom(atom: &Sexpr, f: &mut fmt::Formatter) -> fmt::Result {
    match atom {
        Sexpr::Symbol(name) => write!(f, "{name}"),
        Sexpr::Int(n) => write!(f, "#{n}"),
        Sexpr::Str(s) => {
            write!(f, "\"")?;
            for c in s.chars() {
                match c {
                    '"' | '\\' => write!(f, "\\{c}")?,
                    _ => write!(f, "{c}")?,
                }
            }
            write!(f, "\"")
        }
        Sexpr::List(_) => Ok(()),
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut todo = vec![Token::Expr(self)];
        while let Some(token) = todo.pop() {
            match token {
                Token::Expr(Sexpr::List(items)) => {
                    write!(f, "(")?;
                    todo.push(Token::Close);
                    for (i, item) in items.iter().enumerate().rev() {
                        todo.push(Token::Expr(item));
                        if i > 0 {
                            todo.push(Token::Space);
                        }
                    }
                }
                Token::Expr(atom) => fmt_atom(atom, f)?,
                Token::Space => write!(f, " ")?,
                Token::Close => write!(f, ")")?,
            }
        }
        Ok(())
    }
}

impl Drop for Sexpr {
    // Nested lists are moved to a local stack so that dropping a deep
    // expression does not recurse.
    fn drop(&mut self) {
        let Self::List(items) = self else {
            return;
        };
        if items.iter().all(Sexpr::is_atom) {
            return;
        }
        let mut stack = std::mem::take(items);
        while let Some(mut expr) = stack.pop() {
            if let Self::List(items) = &mut expr {
                stack.append(items);
            }
        }
    }
}
