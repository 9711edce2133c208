//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Two families live here: the
//! client-facing [`RouteHandle`] that simulation code holds, and the
//! engine-side ids ([`EngineRouteId`], [`NodeId`], [`EdgeId`]) that never
//! leave the route engines and the dispatcher.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID": the inner type's `MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// `false` only for the `INVALID` sentinel.
            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Client-facing route identifier handed out by the dispatcher.
    ///
    /// Allocated from a monotonically increasing counter starting at 1 and
    /// never reused; `u64` so a long-running process cannot wrap it.
    pub struct RouteHandle(u64);
}

typed_id! {
    /// A route engine's internal id for a computed route.  Only meaningful to
    /// the engine that issued it.
    pub struct EngineRouteId(u32);
}

typed_id! {
    /// Opaque identity of the object that owns a route (a unit, a vehicle).
    /// Passed through to the engine untouched.
    pub struct OwnerId(u32);
}

typed_id! {
    /// Index of a mover profile in the application's profile table.
    pub struct MoverId(u16);
}

typed_id! {
    /// Index of a navigation-graph node.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed navigation-graph edge.
    pub struct EdgeId(u32);
}
