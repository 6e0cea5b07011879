//! Turns announcement payloads into spoken-ready text and hands the
//! text to a speech sink. The real text-to-speech engine and the
//! LLM-backed description generator are external collaborators; this
//! module owns the seams and a deterministic template fallback so the
//! loop works offline.

use crate::component::{Component, ComponentError};
use crate::detection::Sector;
use crate::history::{Announcement, Delta};
use log::info;
use std::fmt;

/// The spoken form of a sector, from the listener's point of view.
pub fn spoken_position(sector: Sector) -> &'static str {
    match sector {
        Sector::Left => "on your left",
        Sector::Forward => "ahead",
        Sector::Right => "on your right",
    }
}

/// Renders an announcement payload as text.
pub trait Narrator {
    /// One sentence describing the payload.
    fn describe(&self, announcement: &Announcement) -> String;
}

/// Deterministic, template-based rendering. Used whenever the external
/// description generator is unavailable or not wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateNarrator;

fn phrase(label: &str, delta: Delta) -> String {
    match delta {
        Delta::Sighted(n) => format!("{} {}", n, label),
        Delta::Added(n) => format!("{} more {}", n, label),
        Delta::Removed(n) => format!("{} fewer {}", n, label),
    }
}

impl Narrator for TemplateNarrator {
    fn describe(&self, announcement: &Announcement) -> String {
        match announcement {
            Announcement::NothingDetected { sector } => {
                format!("nothing detected {}", spoken_position(*sector))
            }
            Announcement::Changes { sector, deltas } => {
                let phrases: Vec<String> = deltas
                    .iter()
                    .map(|(label, &delta)| phrase(label, delta))
                    .collect();
                format!("{} {}", phrases.join(", "), spoken_position(*sector))
            }
        }
    }
}

/// A fire-and-forget text sink, standing in for the TTS engine.
pub trait Speaker {
    /// Speaks (or otherwise delivers) the text. Best-effort.
    fn say(&mut self, text: &str);
}

/// Logs every utterance instead of synthesizing audio.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn say(&mut self, text: &str) {
        info!("speaking: {}", text);
    }
}

/// Pipeline stage: announcement in, rendered text out.
pub struct NarrationStage<N: Narrator> {
    narrator: N,
}

impl<N: Narrator> NarrationStage<N> {
    /// Wraps a narrator for use on a pipeline thread.
    pub fn new(narrator: N) -> Self {
        Self { narrator }
    }
}

impl<N: Narrator> Component for NarrationStage<N> {
    type InData = Announcement;
    type OutData = String;

    fn convert(&mut self, input: Announcement) -> String {
        self.narrator.describe(&input)
    }

    fn finalize(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}

impl<N: Narrator> fmt::Display for NarrationStage<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NarrationStage")
    }
}

/// Terminal pipeline stage: text in, spoken out.
pub struct SpeechStage<S: Speaker> {
    speaker: S,
}

impl<S: Speaker> SpeechStage<S> {
    /// Wraps a speaker for use on a pipeline thread.
    pub fn new(speaker: S) -> Self {
        Self { speaker }
    }
}

impl<S: Speaker> Component for SpeechStage<S> {
    type InData = String;
    type OutData = ();

    fn convert(&mut self, input: String) {
        self.speaker.say(&input);
    }

    fn finalize(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}

impl<S: Speaker> fmt::Display for SpeechStage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpeechStage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::run_component;
    use std::collections::BTreeMap;
    use std::sync::mpsc::channel;

    fn changes(sector: Sector, pairs: &[(&str, Delta)]) -> Announcement {
        let deltas: BTreeMap<String, Delta> = pairs
            .iter()
            .map(|&(label, delta)| (label.to_owned(), delta))
            .collect();
        Announcement::Changes { sector, deltas }
    }

    #[test]
    fn nothing_detected_wording() {
        let narrator = TemplateNarrator;
        assert_eq!(
            narrator.describe(&Announcement::NothingDetected {
                sector: Sector::Left
            }),
            "nothing detected on your left"
        );
    }

    #[test]
    fn delta_wording_covers_all_variants() {
        let narrator = TemplateNarrator;
        let announcement = changes(
            Sector::Forward,
            &[
                ("bottle", Delta::Removed(1)),
                ("chair", Delta::Added(2)),
                ("person", Delta::Sighted(1)),
            ],
        );
        // BTreeMap ordering keeps the sentence deterministic.
        assert_eq!(
            narrator.describe(&announcement),
            "1 fewer bottle, 2 more chair, 1 person ahead"
        );
    }

    #[test]
    fn narration_stage_renders_over_a_channel() {
        let (ann_tx, stage_rx) = channel();
        let (stage_tx, text_rx) = channel();
        run_component(
            Box::new(NarrationStage::new(TemplateNarrator)),
            stage_rx,
            stage_tx,
        );

        ann_tx
            .send(changes(Sector::Right, &[("cup", Delta::Sighted(1))]))
            .unwrap();
        assert_eq!(text_rx.recv().unwrap(), "1 cup on your right");
    }
}
