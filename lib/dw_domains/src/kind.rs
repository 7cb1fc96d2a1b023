//! Shape of an element of an abstract domain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An element of an abstract domain is either the least element, the
/// greatest element, or something in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbstractValueKind {
    Bottom,
    Value,
    Top,
}

impl AbstractValueKind {
    #[inline]
    pub fn is_bottom(self) -> bool {
        self == Self::Bottom
    }

    #[inline]
    pub fn is_value(self) -> bool {
        self == Self::Value
    }

    #[inline]
    pub fn is_top(self) -> bool {
        self == Self::Top
    }
}

impl fmt::Display for AbstractValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bottom => write!(f, "bottom"),
            Self::Value => write!(f, "value"),
            Self::Top => write!(f, "top"),
        }
    }
}
