//! Coordinate systems for positions and sizes.
//!
//! Callers may express geometry in pixels, as a fraction of the viewport, or
//! in signed normalized units centred on the viewport. Everything is mapped to
//! pixels before it reaches a batch.

use std::fmt;
use std::str::FromStr;

use glint_core::math::Vec2;
use glint_device::Viewport;

use crate::error::UsageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordinateSystem {
    /// Pixels, origin at the top left.
    #[default]
    Absolute,
    /// `0..1` across the viewport.
    Relative,
    /// `-1..1` across the viewport, `0` at its centre.
    Snorm,
}

impl CoordinateSystem {
    pub const fn name(self) -> &'static str {
        match self {
            CoordinateSystem::Absolute => "absolute",
            CoordinateSystem::Relative => "relative",
            CoordinateSystem::Snorm => "snorm",
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoordinateSystem {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" => Ok(CoordinateSystem::Absolute),
            "relative" => Ok(CoordinateSystem::Relative),
            "snorm" => Ok(CoordinateSystem::Snorm),
            _ => Err(UsageError::UnknownCoordinateSystem(s.to_string())),
        }
    }
}

impl TryFrom<u32> for CoordinateSystem {
    type Error = UsageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CoordinateSystem::Absolute),
            1 => Ok(CoordinateSystem::Relative),
            2 => Ok(CoordinateSystem::Snorm),
            other => Err(UsageError::UnknownCoordinateSystem(other.to_string())),
        }
    }
}

/// Map a position into pixels.
pub fn map_position(value: Vec2, cs: CoordinateSystem, viewport: Viewport) -> Vec2 {
    let extent = viewport.size();
    match cs {
        CoordinateSystem::Absolute => value,
        CoordinateSystem::Relative => value * extent,
        CoordinateSystem::Snorm => (value * 0.5 + 0.5) * extent,
    }
}

/// Map a size (or any offset) into pixels.
pub fn map_size(value: Vec2, cs: CoordinateSystem, viewport: Viewport) -> Vec2 {
    let extent = viewport.size();
    match cs {
        CoordinateSystem::Absolute => value,
        CoordinateSystem::Relative => value * extent,
        CoordinateSystem::Snorm => value * 0.5 * extent,
    }
}

/// Inverse of [`map_position`]. Returns `value` unchanged for an empty
/// viewport.
pub fn unmap_position(value: Vec2, cs: CoordinateSystem, viewport: Viewport) -> Vec2 {
    if viewport.is_empty() {
        return value;
    }
    let extent = viewport.size();
    match cs {
        CoordinateSystem::Absolute => value,
        CoordinateSystem::Relative => value / extent,
        CoordinateSystem::Snorm => (value / extent - 0.5) * 2.0,
    }
}

/// Inverse of [`map_size`]. Returns `value` unchanged for an empty viewport.
pub fn unmap_size(value: Vec2, cs: CoordinateSystem, viewport: Viewport) -> Vec2 {
    if viewport.is_empty() {
        return value;
    }
    let extent = viewport.size();
    match cs {
        CoordinateSystem::Absolute => value,
        CoordinateSystem::Relative => value / extent,
        CoordinateSystem::Snorm => value / extent * 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport::new(800, 600);
    const ALL: [CoordinateSystem; 3] = [
        CoordinateSystem::Absolute,
        CoordinateSystem::Relative,
        CoordinateSystem::Snorm,
    ];

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn test_position_table() {
        let v = Vec2::new(0.5, 0.25);
        assert_eq!(map_position(v, CoordinateSystem::Absolute, VIEWPORT), v);
        assert_eq!(
            map_position(v, CoordinateSystem::Relative, VIEWPORT),
            Vec2::new(400.0, 150.0)
        );
        assert_eq!(
            map_position(v, CoordinateSystem::Snorm, VIEWPORT),
            Vec2::new(600.0, 375.0)
        );
        assert_eq!(
            map_position(Vec2::splat(-1.0), CoordinateSystem::Snorm, VIEWPORT),
            Vec2::ZERO
        );
    }

    #[test]
    fn test_size_table() {
        let v = Vec2::new(0.5, 1.0);
        assert_eq!(
            map_size(v, CoordinateSystem::Relative, VIEWPORT),
            Vec2::new(400.0, 600.0)
        );
        assert_eq!(
            map_size(Vec2::splat(2.0), CoordinateSystem::Snorm, VIEWPORT),
            Vec2::new(800.0, 600.0)
        );
    }

    #[test]
    fn test_mapping_is_invertible() {
        let samples = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.3, -0.7),
            Vec2::new(123.0, 45.5),
            Vec2::new(-1.0, 1.0),
        ];
        for cs in ALL {
            for v in samples {
                let p = map_position(v, cs, VIEWPORT);
                assert!(approx(unmap_position(p, cs, VIEWPORT), v), "{cs} position {v}");
                let s = map_size(v, cs, VIEWPORT);
                assert!(approx(unmap_size(s, cs, VIEWPORT), v), "{cs} size {v}");
            }
        }
    }

    #[test]
    fn test_empty_viewport_inverse_is_identity() {
        let v = Vec2::new(3.0, 4.0);
        let empty = Viewport::new(0, 600);
        assert_eq!(unmap_position(v, CoordinateSystem::Snorm, empty), v);
        assert_eq!(unmap_size(v, CoordinateSystem::Relative, empty), v);
    }

    #[test]
    fn test_parse() {
        assert_eq!("SNORM".parse(), Ok(CoordinateSystem::Snorm));
        assert_eq!("Relative".parse(), Ok(CoordinateSystem::Relative));
        assert_eq!(
            "polar".parse::<CoordinateSystem>(),
            Err(UsageError::UnknownCoordinateSystem("polar".into()))
        );
        assert_eq!(CoordinateSystem::try_from(0), Ok(CoordinateSystem::Absolute));
        assert!(CoordinateSystem::try_from(3).is_err());
    }
}
