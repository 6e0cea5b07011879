//! The single consumer of the message bus. Owns the history tracker,
//! the active-sector latch, the haptic policy, and the dialogue
//! transcript, and processes messages strictly in arrival order, so no
//! locking is needed anywhere in the tracker.

use crate::detection::{DetectionFrame, Sector};
use crate::direction::{active_sector, DirectionEstimate};
use crate::haptics::{ActuatorLink, HapticCommand, HapticPolicy};
use crate::history::{Announcement, HistoryTracker};
use crate::message::Message;
use crate::transcript::{DialogueResponder, Transcript};
use log::{debug, warn};
use std::sync::mpsc::{Sender, SyncSender, TrySendError};

/// Utterances the recognizer emits in place of raising. They mean "no
/// user query this tick" and are skipped, not answered.
pub const RECOGNIZER_SENTINELS: [&str; 2] = ["COULDN'T UNDERSTAND", "UNKNOWN ERROR"];

/// True for the recognizer's failure sentinels.
pub fn is_recognizer_sentinel(text: &str) -> bool {
    RECOGNIZER_SENTINELS.contains(&text)
}

/// Where the session is in its startup handshake. Nothing is
/// reconciled or warned about until the first detection frame exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No detection frame has arrived yet.
    AwaitingFirstFrame,
    /// At least one frame exists; every tick is actionable.
    Ready,
}

/// The reconciliation loop's state. Announcements leave through a
/// bounded channel with a non-blocking send; dialogue answers leave
/// through the narration pipeline's text channel. Neither path can
/// stall the loop.
pub struct Session<A: ActuatorLink, R: DialogueResponder> {
    tracker: HistoryTracker,
    policy: HapticPolicy,
    actuator: A,
    responder: R,
    transcript: Transcript,
    announcements: SyncSender<Announcement>,
    speech_out: Sender<String>,
    phase: Phase,
    frame: DetectionFrame,
    active: Option<Sector>,
    last_commands: [HapticCommand; 3],
}

impl<A: ActuatorLink, R: DialogueResponder> Session<A, R> {
    /// Builds a session around its output channels.
    pub fn new(
        policy: HapticPolicy,
        actuator: A,
        responder: R,
        announcements: SyncSender<Announcement>,
        speech_out: Sender<String>,
        transcript_window: usize,
    ) -> Self {
        Self {
            tracker: HistoryTracker::new(),
            policy,
            actuator,
            responder,
            transcript: Transcript::new(transcript_window),
            announcements,
            speech_out,
            phase: Phase::AwaitingFirstFrame,
            frame: DetectionFrame::default(),
            active: None,
            last_commands: Sector::ALL.map(HapticCommand::off),
        }
    }

    /// Processes one message. Call in strict arrival order.
    pub fn handle(&mut self, message: Message) {
        match message {
            Message::Scene(frame) => {
                self.frame = frame;
                if self.phase == Phase::AwaitingFirstFrame {
                    debug!("first detection frame arrived");
                    self.phase = Phase::Ready;
                }
                self.tick();
            }
            Message::Gaze(estimate) => self.handle_gaze(estimate),
            Message::Speech(text) => self.handle_speech(text),
        }
    }

    fn handle_gaze(&mut self, estimate: DirectionEstimate) {
        match active_sector(estimate) {
            Some(sector) => {
                let changed = self.active != Some(sector);
                self.active = Some(sector);
                if changed {
                    self.tick();
                }
            }
            // Indeterminate: hold the last selection, no forced
            // re-announcement.
            None => debug!("indeterminate gaze, holding {:?}", self.active),
        }
    }

    fn handle_speech(&mut self, text: String) {
        if is_recognizer_sentinel(&text) {
            debug!("recognizer sentinel, no user query: {}", text);
            return;
        }
        self.transcript.push_user_query(&text, &self.frame);
        let reply = self.responder.respond(&self.transcript, &self.frame);
        self.transcript.push_system_response(&reply);
        if self.speech_out.send(reply).is_err() {
            warn!("speech pipeline gone, dropping dialogue reply");
        }
    }

    // One actionable instant: reconcile the active sector against the
    // current frame, then re-evaluate the belt for every sector.
    fn tick(&mut self) {
        if self.phase == Phase::AwaitingFirstFrame {
            return;
        }
        if let Some(sector) = self.active {
            if let Some(announcement) = self
                .tracker
                .reconcile(sector, &self.frame.sector(sector).counts)
            {
                match self.announcements.try_send(announcement) {
                    Ok(()) => {}
                    Err(TrySendError::Full(a)) => {
                        warn!("narration backlog full, dropping {} delta", a.sector())
                    }
                    Err(TrySendError::Disconnected(_)) => warn!("narration pipeline gone"),
                }
            }
        }
        let commands = self.policy.evaluate(&self.frame, self.active);
        for command in commands {
            self.actuator.send(command);
        }
        self.last_commands = commands;
    }

    /// Where the startup handshake stands.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The sector the user is currently looking at, if known.
    pub fn active(&self) -> Option<Sector> {
        self.active
    }

    /// The most recent detection frame.
    pub fn frame(&self) -> &DetectionFrame {
        &self.frame
    }

    /// The belt commands written on the last tick.
    pub fn last_commands(&self) -> [HapticCommand; 3] {
        self.last_commands
    }

    /// The per-sector history.
    pub fn tracker(&self) -> &HistoryTracker {
        &self.tracker
    }

    /// The dialogue so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection};
    use crate::haptics::NullActuator;
    use crate::transcript::EchoResponder;
    use std::sync::mpsc::{channel, sync_channel, Receiver};

    fn frame_with(label: &str, sector: Sector) -> DetectionFrame {
        let center = match sector {
            Sector::Left => 50.0,
            Sector::Forward => 150.0,
            Sector::Right => 250.0,
        };
        let detections = [Detection {
            label: label.to_owned(),
            confidence: 0.9,
            bbox: BoundingBox {
                x1: center - 10.0,
                y1: 0.0,
                x2: center + 10.0,
                y2: 50.0,
            },
        }];
        DetectionFrame::from_detections(&detections, 300.0, 0.5)
    }

    #[allow(clippy::type_complexity)]
    fn session() -> (
        Session<NullActuator, EchoResponder>,
        Receiver<Announcement>,
        Receiver<String>,
    ) {
        let (ann_tx, ann_rx) = sync_channel(8);
        let (text_tx, text_rx) = channel();
        let policy = HapticPolicy::new(vec!["person".to_owned()], 150);
        let session = Session::new(
            policy,
            NullActuator,
            EchoResponder,
            ann_tx,
            text_tx,
            Transcript::DEFAULT_WINDOW,
        );
        (session, ann_rx, text_rx)
    }

    #[test]
    fn gaze_before_any_frame_does_nothing() {
        let (mut session, ann_rx, _text_rx) = session();
        session.handle(Message::Gaze(DirectionEstimate::Left));
        assert_eq!(session.phase(), Phase::AwaitingFirstFrame);
        assert!(ann_rx.try_recv().is_err());
        // The gaze itself is still latched for when the frame arrives.
        assert_eq!(session.active(), Some(Sector::Left));
    }

    #[test]
    fn frame_plus_gaze_produces_an_announcement() {
        let (mut session, ann_rx, _text_rx) = session();
        session.handle(Message::Gaze(DirectionEstimate::Forward));
        session.handle(Message::Scene(frame_with("chair", Sector::Forward)));
        assert_eq!(session.phase(), Phase::Ready);
        let announcement = ann_rx.try_recv().unwrap();
        assert_eq!(announcement.sector(), Sector::Forward);
    }

    #[test]
    fn unchanged_scene_stays_silent() {
        let (mut session, ann_rx, _text_rx) = session();
        session.handle(Message::Gaze(DirectionEstimate::Forward));
        session.handle(Message::Scene(frame_with("chair", Sector::Forward)));
        ann_rx.try_recv().unwrap();
        session.handle(Message::Scene(frame_with("chair", Sector::Forward)));
        assert!(ann_rx.try_recv().is_err());
    }

    #[test]
    fn indeterminate_gaze_holds_the_last_sector() {
        let (mut session, _ann_rx, _text_rx) = session();
        session.handle(Message::Scene(frame_with("chair", Sector::Forward)));
        session.handle(Message::Gaze(DirectionEstimate::Right));
        session.handle(Message::Gaze(DirectionEstimate::Indeterminate));
        assert_eq!(session.active(), Some(Sector::Right));
    }

    #[test]
    fn hazard_warns_until_looked_at() {
        let (mut session, _ann_rx, _text_rx) = session();
        session.handle(Message::Gaze(DirectionEstimate::Forward));
        session.handle(Message::Scene(frame_with("person", Sector::Right)));

        let right = session.last_commands()[Sector::Right.index()];
        assert!(right.is_on());

        session.handle(Message::Gaze(DirectionEstimate::RightUp));
        let right = session.last_commands()[Sector::Right.index()];
        assert!(!right.is_on());
    }

    #[test]
    fn recognizer_sentinels_are_skipped() {
        let (mut session, _ann_rx, text_rx) = session();
        session.handle(Message::Scene(frame_with("chair", Sector::Forward)));
        session.handle(Message::Speech("COULDN'T UNDERSTAND".to_owned()));
        assert!(text_rx.try_recv().is_err());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn real_queries_get_a_reply() {
        let (mut session, _ann_rx, text_rx) = session();
        session.handle(Message::Scene(frame_with("chair", Sector::Forward)));
        session.handle(Message::Speech("what is in front of me?".to_owned()));
        let reply = text_rx.try_recv().unwrap();
        assert!(reply.contains("chair"));
        assert_eq!(session.transcript().len(), 2);
    }
}
