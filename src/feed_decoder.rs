//! Parsers for the ASCII line protocol spoken by the helper processes
//! that wrap the object detector, the face-pose tracker, and the speech
//! recognizer. One event per newline-terminated line:
//!
//! ```text
//! +SCENE:640;person,0.91,12.0,30.5,110.0,220.0;chair,0.55,400.0,80.0,610.0,300.0
//! +GAZE:-172.5,-41.0,2.0
//! +SPEECH:"what is in front of me"
//! ```
//!
//! A scene line starts with the image width in pixels, followed by zero
//! or more detections. A gaze line carries pitch, yaw, and roll in
//! degrees; the sentinel `-1,-1,-1` accompanies a failed face fit.
//! The recognizer's sentinel utterances (`COULDN'T UNDERSTAND`,
//! `UNKNOWN ERROR`) arrive as ordinary speech payloads and are handled
//! downstream, never here.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while1},
    character::complete::char,
    combinator::map,
    error::Error,
    multi::many0,
    number::complete::float,
    sequence::{delimited, preceded, tuple},
    Finish, IResult,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::detection::{BoundingBox, Detection, DetectionFrame};
use crate::direction::{DirectionGate, PoseAngles};
use crate::message::Message;

/// One decoded line from the helper feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedEvent {
    /// One detector invocation: image width plus every raw detection.
    Scene {
        /// Width of the analyzed image, in pixels.
        image_width: f32,
        /// Raw detections, unfiltered by confidence.
        detections: Vec<Detection>,
    },
    /// One face-pose estimate.
    Gaze(PoseAngles),
    /// One recognized utterance, recognizer sentinels included.
    Speech(String),
}

impl FeedEvent {
    /// Turns a decoded event into the message the session loop
    /// consumes: scenes are filtered and partitioned into a frame,
    /// poses are classified into a head direction.
    pub fn into_message(self, confidence_threshold: f32, gate: &DirectionGate) -> Message {
        match self {
            FeedEvent::Scene {
                image_width,
                detections,
            } => Message::Scene(DetectionFrame::from_detections(
                &detections,
                image_width,
                confidence_threshold,
            )),
            FeedEvent::Gaze(pose) => Message::Gaze(gate.classify(pose)),
            FeedEvent::Speech(text) => Message::Speech(text),
        }
    }
}

fn parse_label(s: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c != ',' && c != ';' && c != '\n'),
        |cs: &str| cs.to_owned(),
    )(s)
}

fn parse_detection(s: &str) -> IResult<&str, Detection> {
    map(
        tuple((
            parse_label,
            preceded(char(','), float),
            preceded(char(','), float),
            preceded(char(','), float),
            preceded(char(','), float),
            preceded(char(','), float),
        )),
        |(label, confidence, x1, y1, x2, y2)| Detection {
            label,
            confidence,
            bbox: BoundingBox { x1, y1, x2, y2 },
        },
    )(s)
}

fn parse_scene(s: &str) -> IResult<&str, FeedEvent> {
    map(
        tuple((
            preceded(tag("+SCENE:"), float),
            many0(preceded(char(';'), parse_detection)),
        )),
        |(image_width, detections)| FeedEvent::Scene {
            image_width,
            detections,
        },
    )(s)
}

fn parse_gaze(s: &str) -> IResult<&str, FeedEvent> {
    map(
        tuple((
            preceded(tag("+GAZE:"), float),
            preceded(char(','), float),
            preceded(char(','), float),
        )),
        |(pitch, yaw, roll)| FeedEvent::Gaze(PoseAngles { pitch, yaw, roll }),
    )(s)
}

fn parse_speech(s: &str) -> IResult<&str, FeedEvent> {
    map(
        preceded(
            tag("+SPEECH:"),
            delimited(char('"'), take_till(|c| c == '"'), char('"')),
        ),
        |text: &str| FeedEvent::Speech(text.to_owned()),
    )(s)
}

fn parse_feed_event(s: &str) -> IResult<&str, FeedEvent> {
    alt((parse_scene, parse_gaze, parse_speech))(s)
}

impl FromStr for FeedEvent {
    type Err = Error<String>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_feed_event(s.trim_end()).finish() {
            Ok((_remaining, event)) => Ok(event),
            Err(Error { input, code }) => Err(Error {
                input: input.to_string(),
                code,
            }),
        }
    }
}
