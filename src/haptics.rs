//! The haptic warning policy and the serial link to the actuator belt.
//!
//! The policy is stateless: each tick it looks at the current frame and
//! the sector the user is looking at, and decides per sector whether
//! the belt motor should buzz. It warns about hazards the user is NOT
//! looking at; a hazard in the active sector is assumed seen.

use crate::detection::{DetectionFrame, Sector};
use log::warn;
use serial2::SerialPort;
use std::fmt;
use std::io;
use std::path::Path;

/// One motor command for one sector. Intensity 0 means off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HapticCommand {
    /// Which motor.
    pub sector: Sector,
    /// PWM duty the belt firmware applies, 0-255.
    pub intensity: u8,
}

impl HapticCommand {
    /// A buzz at the given intensity.
    pub fn on(sector: Sector, intensity: u8) -> Self {
        Self { sector, intensity }
    }

    /// Stops the sector's motor.
    pub fn off(sector: Sector) -> Self {
        Self {
            sector,
            intensity: 0,
        }
    }

    /// True when the command starts or keeps the motor running.
    pub fn is_on(&self) -> bool {
        self.intensity > 0
    }
}

// The exact line the belt firmware parses, newline added at write time.
impl fmt::Display for HapticCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WARN: {} {}", self.sector, self.intensity)
    }
}

/// Decides per sector whether the belt should warn.
#[derive(Debug, Clone)]
pub struct HapticPolicy {
    hazard_labels: Vec<String>,
    intensity: u8,
}

impl HapticPolicy {
    /// A policy warning about the given labels at the given intensity.
    pub fn new(hazard_labels: Vec<String>, intensity: u8) -> Self {
        Self {
            hazard_labels,
            intensity,
        }
    }

    fn sector_is_hazardous(&self, frame: &DetectionFrame, sector: Sector) -> bool {
        self.hazard_labels
            .iter()
            .any(|label| frame.sector(sector).counts.contains_key(label))
    }

    /// One command per sector for this tick. A sector warns when it
    /// holds a hazard-class object and the user's gaze is elsewhere.
    /// Idempotent: the same inputs always produce the same commands.
    pub fn evaluate(
        &self,
        frame: &DetectionFrame,
        active: Option<Sector>,
    ) -> [HapticCommand; 3] {
        Sector::ALL.map(|sector| {
            if self.sector_is_hazardous(frame, sector) && active != Some(sector) {
                HapticCommand::on(sector, self.intensity)
            } else {
                HapticCommand::off(sector)
            }
        })
    }
}

/// Where haptic commands go. The seam lets tests and the monitor run
/// without a belt attached.
pub trait ActuatorLink {
    /// Delivers one command, best-effort.
    fn send(&mut self, command: HapticCommand);
}

/// The real belt behind a serial port. Writes are best-effort: a failed
/// write is logged and dropped, never allowed to stall perception.
pub struct SerialActuator {
    port: SerialPort,
}

impl SerialActuator {
    /// Baud rate the belt firmware listens at.
    pub const BAUD_RATE: u32 = 9600;

    /// Opens the belt device.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let port = SerialPort::open(path.as_ref(), Self::BAUD_RATE)?;
        Ok(Self { port })
    }
}

impl ActuatorLink for SerialActuator {
    fn send(&mut self, command: HapticCommand) {
        let line = format!("{}\n", command);
        if let Err(error) = self.port.write_all(line.as_bytes()) {
            warn!("haptic write failed, dropping {}: {}", command, error);
        }
    }
}

impl ActuatorLink for Box<dyn ActuatorLink> {
    fn send(&mut self, command: HapticCommand) {
        (**self).send(command);
    }
}

/// Swallows every command. Used when no belt is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullActuator;

impl ActuatorLink for NullActuator {
    fn send(&mut self, _command: HapticCommand) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection};

    fn frame_with(label: &str, sector: Sector) -> DetectionFrame {
        // image width 300: centers at 50, 150, 250
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

    fn command_for(commands: &[HapticCommand; 3], sector: Sector) -> HapticCommand {
        commands[sector.index()]
    }

    #[test]
    fn warns_about_hazards_outside_the_active_sector() {
        let policy = HapticPolicy::new(vec!["person".to_owned()], 150);
        let frame = frame_with("person", Sector::Right);

        let commands = policy.evaluate(&frame, Some(Sector::Forward));
        assert!(command_for(&commands, Sector::Right).is_on());
        assert_eq!(command_for(&commands, Sector::Right).intensity, 150);
        assert!(!command_for(&commands, Sector::Left).is_on());
        assert!(!command_for(&commands, Sector::Forward).is_on());
    }

    #[test]
    fn looking_at_the_hazard_silences_the_warning() {
        let policy = HapticPolicy::new(vec!["person".to_owned()], 150);
        let frame = frame_with("person", Sector::Right);

        let before = policy.evaluate(&frame, Some(Sector::Forward));
        assert!(command_for(&before, Sector::Right).is_on());

        let after = policy.evaluate(&frame, Some(Sector::Right));
        assert!(!command_for(&after, Sector::Right).is_on());
    }

    #[test]
    fn non_hazard_objects_never_warn() {
        let policy = HapticPolicy::new(vec!["person".to_owned()], 150);
        let frame = frame_with("chair", Sector::Left);
        let commands = policy.evaluate(&frame, Some(Sector::Forward));
        assert!(commands.iter().all(|c| !c.is_on()));
    }

    #[test]
    fn unknown_gaze_warns_everywhere_hazardous() {
        let policy = HapticPolicy::new(vec!["person".to_owned()], 90);
        let frame = frame_with("person", Sector::Left);
        let commands = policy.evaluate(&frame, None);
        assert!(command_for(&commands, Sector::Left).is_on());
    }

    #[test]
    fn command_framing_matches_the_belt_protocol() {
        assert_eq!(
            HapticCommand::on(Sector::Left, 150).to_string(),
            "WARN: LEFT 150"
        );
        assert_eq!(
            HapticCommand::off(Sector::Forward).to_string(),
            "WARN: FORWARD 0"
        );
    }
}
