//! The bounded dialogue history shared with the external description
//! generator, plus the seam that produces answers to user queries.
//!
//! Every user entry carries a snapshot of the per-sector object counts
//! at the time of the query, so the generator can answer "what is in
//! front of me" without re-running detection.

use crate::detection::{Counts, DetectionFrame, Sector};
use crate::narration::spoken_position;
use serde::Serialize;
use std::collections::VecDeque;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Agent {
    /// The person wearing the device.
    User,
    /// The description generator.
    System,
}

/// Per-sector counts frozen at query time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneSnapshot {
    /// Counts for the left sector.
    pub left: Counts,
    /// Counts for the forward sector.
    pub forward: Counts,
    /// Counts for the right sector.
    pub right: Counts,
}

impl SceneSnapshot {
    /// Copies the counts out of a frame.
    pub fn from_frame(frame: &DetectionFrame) -> Self {
        Self {
            left: frame.sector(Sector::Left).counts.clone(),
            forward: frame.sector(Sector::Forward).counts.clone(),
            right: frame.sector(Sector::Right).counts.clone(),
        }
    }
}

/// One line of dialogue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// Who said it.
    pub agent: Agent,
    /// What was said.
    pub message: String,
    /// The scene at query time; `None` for system entries.
    pub objects: Option<SceneSnapshot>,
}

/// A sliding window of dialogue. Older entries fall off so the prompt
/// sent to the external generator stays bounded.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: VecDeque<Entry>,
    window: usize,
}

impl Transcript {
    /// How many entries are kept unless configured otherwise.
    pub const DEFAULT_WINDOW: usize = 10;

    /// A transcript keeping the most recent `window` entries.
    pub fn new(window: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            window: window.max(1),
        }
    }

    /// Appends a user query together with the current scene.
    pub fn push_user_query(&mut self, message: &str, frame: &DetectionFrame) {
        self.push(Entry {
            agent: Agent::User,
            message: message.to_owned(),
            objects: Some(SceneSnapshot::from_frame(frame)),
        });
    }

    /// Appends the generator's answer.
    pub fn push_system_response(&mut self, message: &str) {
        self.push(Entry {
            agent: Agent::System,
            message: message.to_owned(),
            objects: None,
        });
    }

    fn push(&mut self, entry: Entry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.window {
            self.entries.pop_front();
        }
    }

    /// The retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

/// Answers user queries. The production implementation forwards the
/// transcript and the current image to the external LLM; [`EchoResponder`]
/// answers from the counts alone.
pub trait DialogueResponder {
    /// Produces the system's answer to the newest user entry.
    fn respond(&mut self, transcript: &Transcript, frame: &DetectionFrame) -> String;
}

/// A template responder that lists what is currently visible. Keeps
/// the loop testable with no network in reach.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoResponder;

impl DialogueResponder for EchoResponder {
    fn respond(&mut self, _transcript: &Transcript, frame: &DetectionFrame) -> String {
        if frame.is_empty() {
            return "There is no object around you.".to_owned();
        }
        let mut parts = Vec::new();
        for sector in Sector::ALL {
            for (label, count) in &frame.sector(sector).counts {
                parts.push(format!("{} {} {}", count, label, spoken_position(sector)));
            }
        }
        format!("I can see {}.", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection};

    fn frame() -> DetectionFrame {
        let detections = [
            Detection {
                label: "chair".to_owned(),
                confidence: 0.9,
                bbox: BoundingBox {
                    x1: 10.0,
                    y1: 0.0,
                    x2: 60.0,
                    y2: 80.0,
                },
            },
            Detection {
                label: "person".to_owned(),
                confidence: 0.8,
                bbox: BoundingBox {
                    x1: 130.0,
                    y1: 0.0,
                    x2: 170.0,
                    y2: 90.0,
                },
            },
        ];
        DetectionFrame::from_detections(&detections, 300.0, 0.5)
    }

    #[test]
    fn user_entries_carry_the_scene() {
        let mut transcript = Transcript::default();
        transcript.push_user_query("what is in front of me?", &frame());

        let entry = transcript.entries().next().unwrap();
        assert_eq!(entry.agent, Agent::User);
        let snapshot = entry.objects.as_ref().unwrap();
        assert_eq!(snapshot.left["chair"], 1);
        assert_eq!(snapshot.forward["person"], 1);
        assert!(snapshot.right.is_empty());
    }

    #[test]
    fn window_drops_the_oldest_entries() {
        let mut transcript = Transcript::new(3);
        let frame = frame();
        for i in 0..5 {
            transcript.push_user_query(&format!("query {}", i), &frame);
        }
        assert_eq!(transcript.len(), 3);
        let first = transcript.entries().next().unwrap();
        assert_eq!(first.message, "query 2");
    }

    #[test]
    fn echo_responder_lists_visible_objects() {
        let mut responder = EchoResponder;
        let transcript = Transcript::default();
        assert_eq!(
            responder.respond(&transcript, &frame()),
            "I can see 1 chair on your left, 1 person ahead."
        );
    }

    #[test]
    fn echo_responder_handles_an_empty_scene() {
        let mut responder = EchoResponder;
        let transcript = Transcript::default();
        assert_eq!(
            responder.respond(&transcript, &DetectionFrame::default()),
            "There is no object around you."
        );
    }
}
