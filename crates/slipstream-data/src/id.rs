//! Logical item ids.

use std::fmt;

/// Index into a source's flattened item space.
///
/// [`Id::SELF`] is the reserved address of a category's own `data`
/// slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(pub u64);

impl Id {
    pub const SELF: Id = Id(u64::MAX);

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_self(self) -> bool {
        self == Id::SELF
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self() {
            write!(f, "Id(Self)")
        } else {
            write!(f, "Id({})", self.0)
        }
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id(value)
    }
}
