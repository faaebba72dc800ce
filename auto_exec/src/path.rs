//! # Path
//!
//! Pose and path types handed to the path follower. Every path in the routine is a straight line
//! between two points, with the heading interpolated linearly from the start heading to the end
//! heading along its length.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position and heading of the robot in the field frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose {
    /// Position in the field frame.
    ///
    /// Units: inches
    pub position_in: Vector2<f64>,

    /// Heading, anticlockwise from the +ve x axis.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// A straight line path with linear heading interpolation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub start: Pose,
    pub end: Pose,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Create a pose from a position in inches and a heading in degrees.
    pub fn new(x_in: f64, y_in: f64, heading_deg: f64) -> Self {
        Self {
            position_in: Vector2::new(x_in, y_in),
            heading_rad: heading_deg.to_radians(),
        }
    }

    pub fn x(&self) -> f64 {
        self.position_in.x
    }

    pub fn y(&self) -> f64 {
        self.position_in.y
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_rad.to_degrees()
    }
}

impl Path {
    /// Build a line between two points, turning from `start_heading_deg` to `end_heading_deg`.
    pub fn line(
        start: (f64, f64),
        end: (f64, f64),
        start_heading_deg: f64,
        end_heading_deg: f64,
    ) -> Self {
        Self {
            start: Pose::new(start.0, start.1, start_heading_deg),
            end: Pose::new(end.0, end.1, end_heading_deg),
        }
    }

    /// Length of the path.
    ///
    /// Units: inches
    pub fn length_in(&self) -> f64 {
        (self.end.position_in - self.start.position_in).norm()
    }

    /// Pose at the fraction `t` along the path, `t` is clamped to `[0, 1]`.
    pub fn pose_at(&self, t: f64) -> Pose {
        let t = t.max(0.0).min(1.0);

        Pose {
            position_in: self.start.position_in.lerp(&self.end.position_in, t),
            heading_rad: self.start.heading_rad * (1.0 - t) + self.end.heading_rad * t,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_line_interpolation() {
        let path = Path::line((18.0, 85.0), (48.0, 96.0), 90.0, 135.0);

        let mid = path.pose_at(0.5);
        assert!((mid.x() - 33.0).abs() < 1e-9);
        assert!((mid.y() - 90.5).abs() < 1e-9);
        assert!((mid.heading_deg() - 112.5).abs() < 1e-9);

        assert_eq!(path.pose_at(-1.0), path.start);
        assert_eq!(path.pose_at(2.0), path.end);
    }

    #[test]
    fn test_zero_length_path() {
        let path = Path::line((48.0, 96.0), (48.0, 96.0), 135.0, 135.0);
        assert_eq!(path.length_in(), 0.0);

        let pose = path.pose_at(0.3);
        assert!((pose.position_in - path.start.position_in).norm() < 1e-9);
        assert!((pose.heading_rad - path.start.heading_rad).abs() < 1e-9);
    }
}
