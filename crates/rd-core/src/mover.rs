//! Mover profiles shared by every route engine.
//!
//! A profile describes *what* is moving, not *where*: the terrain classes it
//! may enter and how much room it needs.  Engines decide how to honour these
//! fields; the dispatcher only passes them through.

use crate::MoverId;

/// Which terrain classes a mover can traverse.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoverKind {
    /// Land only.
    #[default]
    Ground,
    /// Water only.
    Ship,
    /// Land and water.
    Hover,
}

impl MoverKind {
    #[inline]
    pub fn can_enter_land(self) -> bool {
        matches!(self, MoverKind::Ground | MoverKind::Hover)
    }

    #[inline]
    pub fn can_enter_water(self) -> bool {
        matches!(self, MoverKind::Ship | MoverKind::Hover)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoverKind::Ground => "ground",
            MoverKind::Ship   => "ship",
            MoverKind::Hover  => "hover",
        }
    }
}

impl std::fmt::Display for MoverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement characteristics of one class of mover.
///
/// `Copy` so it can travel inside queued operations without reference
/// counting.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoverProfile {
    pub id: MoverId,
    pub kind: MoverKind,
    /// Radius of the mover's footprint in world units.  Graph edges narrower
    /// than twice this value are skipped.
    pub footprint: f32,
}

impl MoverProfile {
    pub fn new(id: MoverId, kind: MoverKind, footprint: f32) -> Self {
        Self { id, kind, footprint }
    }
}
