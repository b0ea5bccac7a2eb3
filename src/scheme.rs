//! Collision-resolution strategy codes.
//!
//! Hash tables in this family self-describe which of nine strategies they
//! use through a numeric code in `1..=9`. Only `ArrayOfLinkedNodes` is
//! implemented in this crate; the rest exist so the code space is named.

use core::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum CollisionResolution {
    LinearProbe = 1,
    QuadraticProbe = 2,
    DoubleHashing = 3,
    ArrayOfArrays = 4,
    ArrayOfLinkedNodes = 5,
    ArrayOfSearchTrees = 6,
    LinkedNodesOfArrays = 7,
    LinkedNodesOfLinkedNodes = 8,
    LinkedNodesOfSearchTrees = 9,
}

impl CollisionResolution {
    pub const ALL: [CollisionResolution; 9] = [
        Self::LinearProbe,
        Self::QuadraticProbe,
        Self::DoubleHashing,
        Self::ArrayOfArrays,
        Self::ArrayOfLinkedNodes,
        Self::ArrayOfSearchTrees,
        Self::LinkedNodesOfArrays,
        Self::LinkedNodesOfLinkedNodes,
        Self::LinkedNodesOfSearchTrees,
    ];

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Probing strategies (codes 1-3) keep entries inside the slot array;
    /// every other strategy chains them off a bucket.
    pub const fn is_open_addressing(self) -> bool {
        matches!(
            self,
            Self::LinearProbe | Self::QuadraticProbe | Self::DoubleHashing
        )
    }
}

impl TryFrom<u8> for CollisionResolution {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.code() == code)
            .ok_or(code)
    }
}

impl fmt::Display for CollisionResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LinearProbe => "open addressing: linear probe",
            Self::QuadraticProbe => "open addressing: quadratic probe",
            Self::DoubleHashing => "open addressing: double hashing",
            Self::ArrayOfArrays => "chained bucket: array of arrays",
            Self::ArrayOfLinkedNodes => "chained bucket: array of linked nodes",
            Self::ArrayOfSearchTrees => "chained bucket: array of search trees",
            Self::LinkedNodesOfArrays => "chained bucket: linked nodes of arrays",
            Self::LinkedNodesOfLinkedNodes => "chained bucket: linked nodes of linked nodes",
            Self::LinkedNodesOfSearchTrees => "chained bucket: linked nodes of search trees",
        };
        f.write_str(name)
    }
}
