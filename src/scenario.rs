//! Reading, writing, and replaying recorded feed sessions.
//!
//! A scenario file is a [ron]-serialized recording of everything the
//! helper feed produced during a session: a small header plus an
//! ordered list of timestamped [`FeedEvent`]s. Replaying one drives
//! the session loop exactly like live hardware, which is how the whole
//! pipeline gets exercised on a desk with no cameras attached.
//!
//! On disk a scenario looks like:
//!
//! ```text
//! (header:(name:"kitchen walk",tick_millis:250),records:[
//!     (at_millis:0,event:Scene(image_width:640,detections:[...])),
//!     (at_millis:250,event:Gaze((pitch:-172.5,yaw:-41.0,roll:2.0))),
//! ])
//! ```

use crate::direction::DirectionGate;
use crate::feed_decoder::FeedEvent;
use crate::message::{Message, MessageSource};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Everything that can go wrong reading or writing a scenario.
#[derive(Debug)]
pub enum ScenarioError {
    /// Io failed while reading or writing the file.
    Io(std::io::Error),
    /// Serialization of the scenario failed.
    Ron(ron::Error),
    /// Deserialization of the scenario failed.
    RonSpanned(ron::de::SpannedError),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ScenarioError::Io(error) => Cow::from(format!("io error: {}", error)),
            ScenarioError::Ron(error) => Cow::from(format!("ron error: {}", error)),
            ScenarioError::RonSpanned(error) => Cow::from(format!("ron spanning error: {}", error)),
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for ScenarioError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScenarioHeader {
    name: String,
    tick_millis: u64,
}

/// One feed event with the instant it was captured, relative to the
/// start of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Milliseconds since the recording started.
    pub at_millis: u64,
    /// What the feed produced.
    pub event: FeedEvent,
}

/// A recorded feed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    header: ScenarioHeader,
    records: Vec<ScenarioRecord>,
}

impl Scenario {
    /// Make a [`ScenarioBuilder`] to assemble a recording in memory.
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            name: name.into(),
            tick_millis: 250,
            records: Vec::new(),
        }
    }

    /// The recording's name.
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// The nominal capture cadence, in milliseconds.
    pub fn tick_millis(&self) -> u64 {
        self.header.tick_millis
    }

    /// The recorded events, oldest first.
    pub fn records(&self) -> &[ScenarioRecord] {
        &self.records
    }

    /// Write out a scenario to the path provided.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let mut handle = File::create(path).map_err(ScenarioError::Io)?;
        self.to_file(&mut handle)
    }

    /// Write out a scenario to the [Write]able object provided.
    pub fn to_file(&self, file: &mut impl Write) -> Result<(), ScenarioError> {
        let text = ron::ser::to_string(self).map_err(ScenarioError::Ron)?;
        file.write_all(text.as_bytes()).map_err(ScenarioError::Io)
    }

    /// Read a scenario from the path provided.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let mut handle = File::open(path).map_err(ScenarioError::Io)?;
        Self::from_file(&mut handle)
    }

    /// Read a scenario from the [Read]able object provided.
    pub fn from_file(file: &mut impl Read) -> Result<Self, ScenarioError> {
        let mut text = String::new();
        file.read_to_string(&mut text).map_err(ScenarioError::Io)?;
        ron::de::from_str(&text).map_err(ScenarioError::RonSpanned)
    }
}

/// Assembles a [`Scenario`] record by record.
pub struct ScenarioBuilder {
    name: String,
    tick_millis: u64,
    records: Vec<ScenarioRecord>,
}

impl ScenarioBuilder {
    /// Sets the nominal capture cadence.
    pub fn tick_millis(mut self, tick_millis: u64) -> Self {
        self.tick_millis = tick_millis;
        self
    }

    /// Appends an event at the given instant. Callers are expected to
    /// append in nondecreasing time order.
    pub fn record(mut self, at_millis: u64, event: FeedEvent) -> Self {
        self.records.push(ScenarioRecord { at_millis, event });
        self
    }

    /// Finishes the scenario.
    pub fn build(self) -> Scenario {
        Scenario {
            header: ScenarioHeader {
                name: self.name,
                tick_millis: self.tick_millis,
            },
            records: self.records,
        }
    }
}

/// Plays a scenario back as a [`MessageSource`], waiting out the
/// recorded gaps between events so the session loop sees live-like
/// pacing.
pub struct Replayer {
    records: std::vec::IntoIter<ScenarioRecord>,
    confidence_threshold: f32,
    gate: DirectionGate,
    last_at: u64,
    paced: bool,
}

impl Replayer {
    /// A paced replayer: honors the recorded timestamps.
    pub fn new(scenario: Scenario, confidence_threshold: f32, gate: DirectionGate) -> Self {
        Self {
            records: scenario.records.into_iter(),
            confidence_threshold,
            gate,
            last_at: 0,
            paced: true,
        }
    }

    /// An unpaced replayer: yields as fast as the consumer pulls.
    /// Meant for tests.
    pub fn unpaced(scenario: Scenario, confidence_threshold: f32, gate: DirectionGate) -> Self {
        Self {
            paced: false,
            ..Self::new(scenario, confidence_threshold, gate)
        }
    }
}

impl Iterator for Replayer {
    type Item = Message;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        if self.paced {
            let wait = record.at_millis.saturating_sub(self.last_at);
            if wait > 0 {
                spin_sleep::sleep(Duration::from_millis(wait));
            }
        }
        self.last_at = record.at_millis;
        Some(
            record
                .event
                .into_message(self.confidence_threshold, &self.gate),
        )
    }
}

impl MessageSource for Replayer {
    fn clear(&mut self) {
        self.records.by_ref().for_each(drop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection, Sector};
    use crate::direction::{DirectionEstimate, PoseAngles};

    fn sample() -> Scenario {
        Scenario::builder("kitchen walk")
            .tick_millis(250)
            .record(
                0,
                FeedEvent::Scene {
                    image_width: 300.0,
                    detections: vec![Detection {
                        label: "person".to_owned(),
                        confidence: 0.9,
                        bbox: BoundingBox {
                            x1: 40.0,
                            y1: 0.0,
                            x2: 60.0,
                            y2: 50.0,
                        },
                    }],
                },
            )
            .record(
                250,
                FeedEvent::Gaze(PoseAngles {
                    pitch: -172.0,
                    yaw: -45.0,
                    roll: 0.0,
                }),
            )
            .record(500, FeedEvent::Speech("what is around me?".to_owned()))
            .build()
    }

    #[test]
    fn round_trips_through_a_file() {
        let scenario = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.ron");

        scenario.to_path(&path).unwrap();
        let read_back = Scenario::from_path(&path).unwrap();

        assert_eq!(scenario, read_back);
        assert_eq!(read_back.name(), "kitchen walk");
        assert_eq!(read_back.records().len(), 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Scenario::from_path("/nonexistent/walk.ron");
        assert!(matches!(result, Err(ScenarioError::Io(_))));
    }

    #[test]
    fn garbage_is_a_deserialization_error() {
        let mut garbage = "not a scenario".as_bytes();
        let result = Scenario::from_file(&mut garbage);
        assert!(matches!(result, Err(ScenarioError::RonSpanned(_))));
    }

    #[test]
    fn replayer_converts_records_to_messages() {
        let mut replayer = Replayer::unpaced(sample(), 0.5, DirectionGate::default());

        match replayer.next().unwrap() {
            Message::Scene(frame) => {
                assert_eq!(frame.sector(Sector::Left).counts["person"], 1)
            }
            other => panic!("expected scene, got {:?}", other),
        }
        assert_eq!(
            replayer.next(),
            Some(Message::Gaze(DirectionEstimate::Left))
        );
        assert_eq!(
            replayer.next(),
            Some(Message::Speech("what is around me?".to_owned()))
        );
        assert_eq!(replayer.next(), None);
    }

    #[test]
    fn clear_discards_the_rest() {
        let mut replayer = Replayer::unpaced(sample(), 0.5, DirectionGate::default());
        replayer.next();
        replayer.clear();
        assert_eq!(replayer.next(), None);
    }
}
