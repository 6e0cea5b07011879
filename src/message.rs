//! The tagged messages that flow from the producers into the session
//! loop, and the trait every message source implements.

use crate::detection::DetectionFrame;
use crate::direction::DirectionEstimate;

/// One unit of work for the session loop. The variants carry the same
/// tags the producers use: scene, user gaze, recognized speech.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A fresh detection frame from the scene camera.
    Scene(DetectionFrame),
    /// A head-direction estimate from the user camera.
    Gaze(DirectionEstimate),
    /// An utterance from the speech recognizer, sentinels included.
    Speech(String),
}

/// A typed, clearable iterator that yields [`Message`]s in arrival
/// order. The live bus, the synthetic feed, and scenario replay all
/// implement this, so the session loop does not care which one it is
/// draining.
pub trait MessageSource: Iterator<Item = Message> {
    /// Discards everything still queued.
    fn clear(&mut self);
}
