//! EchoSight is an assistive-perception prototype for visually
//! impaired users. A scene camera and an object detector watch the
//! world, a user-facing camera and a face-pose tracker watch where the
//! wearer is looking, and a speech recognizer listens for questions.
//! EchoSight fuses the three streams: it remembers what was last
//! announced in each direction, narrates only what changed ("2 more
//! chairs", "1 fewer person"), and buzzes a haptic belt about hazards
//! the wearer is NOT currently looking at.
//!
//! The detector, pose tracker, recognizer, speech synthesizer, and the
//! LLM description generator are external collaborators reached over
//! narrow seams; this crate owns the state tracking, change detection,
//! gaze gating, haptic policy, and the plumbing between them.

#![warn(missing_docs)]
pub mod args;
pub mod bus;
pub mod component;
pub mod detection;
pub mod direction;
pub mod dummy_feed;
pub mod feed_decoder;
pub mod gui;
pub mod haptics;
pub mod history;
pub mod message;
pub mod narration;
pub mod scenario;
pub mod session;
pub mod transcript;
