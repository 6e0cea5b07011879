//! Head-pose classification and the mapping from a head direction onto
//! the sector the user is currently looking at.

use crate::detection::Sector;
use serde::{Deserialize, Serialize};

/// The user's inferred head direction for one user-camera frame.
///
/// `Indeterminate` is the fail-soft value produced when the face-pose
/// tracker could not fit exactly one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum DirectionEstimate {
    Forward,
    Left,
    Right,
    Up,
    Down,
    LeftUp,
    LeftDown,
    RightUp,
    RightDown,
    Indeterminate,
}

/// Groups the nine head directions onto the three scene sectors.
/// `Indeterminate` selects no sector: the caller holds the last active
/// sector and reconciles nothing this tick.
pub fn active_sector(estimate: DirectionEstimate) -> Option<Sector> {
    use DirectionEstimate as D;
    match estimate {
        D::Left | D::LeftUp | D::LeftDown => Some(Sector::Left),
        D::Right | D::RightUp | D::RightDown => Some(Sector::Right),
        D::Forward | D::Up | D::Down => Some(Sector::Forward),
        D::Indeterminate => None,
    }
}

/// Euler angles of the head, in degrees, as recovered by the external
/// face-pose tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseAngles {
    /// Rotation about the ear-to-ear axis. A level head reads near
    /// +/-180, not 0.
    pub pitch: f32,
    /// Rotation about the vertical axis; negative is to the user's left.
    pub yaw: f32,
    /// Rotation about the nose axis. Unused by classification.
    pub roll: f32,
}

impl PoseAngles {
    /// The pose the tracker reports alongside a failed face fit.
    pub const SENTINEL: PoseAngles = PoseAngles {
        pitch: -1.0,
        yaw: -1.0,
        roll: -1.0,
    };

    /// True for the failed-fit sentinel pose.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

/// Classifies head poses into [`DirectionEstimate`]s using yaw and
/// pitch thresholds.
///
/// Forward (level) pitch is `threshold <= |pitch| < 180`; the pitch of
/// a level head sits near +/-180 because of how the projection matrix
/// is decomposed, so the threshold is an absolute minimum rather than a
/// band around zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionGate {
    left_yaw_threshold: f32,
    right_yaw_threshold: f32,
    forward_pitch_min: f32,
}

impl Default for DirectionGate {
    fn default() -> Self {
        Self::new(-30.0, 30.0, 165.0)
    }
}

impl DirectionGate {
    /// Builds a gate. `left_yaw_threshold` is expected to be negative,
    /// `right_yaw_threshold` positive; `forward_pitch_min` is taken as
    /// an absolute value.
    pub fn new(left_yaw_threshold: f32, right_yaw_threshold: f32, forward_pitch_min: f32) -> Self {
        Self {
            left_yaw_threshold,
            right_yaw_threshold,
            forward_pitch_min: forward_pitch_min.abs(),
        }
    }

    fn is_level(&self, pitch: f32) -> bool {
        self.forward_pitch_min <= pitch.abs() && pitch.abs() < 180.0
    }

    /// Maps a pose to a head direction. The sentinel pose maps to
    /// `Indeterminate`.
    pub fn classify(&self, pose: PoseAngles) -> DirectionEstimate {
        use DirectionEstimate as D;
        if pose.is_sentinel() {
            return D::Indeterminate;
        }
        if pose.yaw <= self.left_yaw_threshold {
            if self.is_level(pose.pitch) {
                D::Left
            } else if pose.pitch < 0.0 {
                D::LeftDown
            } else {
                D::LeftUp
            }
        } else if pose.yaw >= self.right_yaw_threshold {
            if self.is_level(pose.pitch) {
                D::Right
            } else if pose.pitch < 0.0 {
                D::RightDown
            } else {
                D::RightUp
            }
        } else if self.is_level(pose.pitch) {
            D::Forward
        } else if pose.pitch < 0.0 {
            D::Down
        } else {
            D::Up
        }
    }
}
