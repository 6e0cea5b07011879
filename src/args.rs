// Commandline argument parser using clap for EchoSight

use clap::{Args, Parser, Subcommand};

/// Assistive-perception loop: narrates scene changes and warns about
/// hazards the wearer is not looking at.
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct SightArgs {
    #[command(subcommand)]
    /// Which task to perform, a live session or a scenario replay
    pub command: CommandTask,

    /// Minimum detector confidence for a detection to count
    #[arg(short = 'c', long = "confidence", default_value_t = 0.5)]
    pub confidence: f32,

    /// Yaw at or below which the head counts as turned left, in degrees
    #[arg(long = "left-yaw", default_value_t = -30.0, allow_hyphen_values = true)]
    pub left_yaw: f32,

    /// Yaw at or above which the head counts as turned right, in degrees
    #[arg(long = "right-yaw", default_value_t = 30.0)]
    pub right_yaw: f32,

    /// Minimum absolute pitch for the head to count as level, in degrees
    #[arg(long = "pitch-min", default_value_t = 165.0)]
    pub pitch_min: f32,
}

/// The run modes.
#[derive(Debug, Subcommand, Clone)]
pub enum CommandTask {
    /// Run the live loop against the helper feed over serial
    #[command(about)]
    Live(LiveCommand),

    /// Replay a recorded scenario file through the same loop
    #[command(about)]
    Replay(ReplayCommand),
}

/// Options for a live session.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct LiveCommand {
    /// Serial device carrying the detector and face-tracker feed;
    /// prompts with a selector when omitted
    #[arg(short = 'f', long = "feed")]
    pub feed_device: Option<String>,

    /// Serial device of the haptic belt; runs without haptics when
    /// omitted and nothing is selected
    #[arg(short = 'd', long = "haptics")]
    pub haptic_device: Option<String>,

    /// Object labels that trigger a haptic warning
    #[arg(long = "hazards", num_args = 1.., default_values_t = [String::from("person")])]
    pub hazards: Vec<String>,

    /// Warn intensity written to the belt, 0-255
    #[arg(short = 'i', long = "intensity", default_value_t = 150)]
    pub intensity: u8,

    /// Queued messages kept before the oldest is dropped
    #[arg(long = "capacity", default_value_t = 64)]
    pub capacity: usize,
}

/// Options for a replay.
#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct ReplayCommand {
    /// Scenario file to replay
    #[arg(short = 'i', long = "infile")]
    pub infile: String,

    /// Ignore recorded timestamps and replay as fast as possible
    #[arg(long = "fast")]
    pub fast: bool,
}
