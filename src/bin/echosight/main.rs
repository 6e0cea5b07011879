//! The perception loop. `live` reads the helper feed over serial and
//! drives the haptic belt; `replay` pushes a recorded scenario through
//! the exact same loop.
//!
//! Example:
//! ```text
//! cargo run --bin echosight -- --confidence 0.6 live \
//!     --feed      /dev/ttyUSB0 \
//!     --haptics   /dev/ttyUSB1 \
//!     --hazards   person "sports ball" \
//!     --intensity 150
//! ```

use clap::Parser;
use echosight::{
    args::{
        CommandTask::{Live, Replay},
        LiveCommand, ReplayCommand, SightArgs,
    },
    bus::Bus,
    component::{run_component, run_sink},
    direction::DirectionGate,
    feed_decoder::FeedEvent,
    gui::select_device,
    haptics::{ActuatorLink, HapticPolicy, NullActuator, SerialActuator},
    narration::{LogSpeaker, NarrationStage, SpeechStage, TemplateNarrator},
    scenario::{Replayer, Scenario},
    session::Session,
    transcript::{EchoResponder, Transcript},
};
use log::{info, warn};
use serial2::SerialPort;
use std::{
    path::PathBuf,
    process,
    str::{self, FromStr},
    sync::mpsc::{channel, sync_channel},
    thread::spawn,
    time::Duration,
};

/// Baud rate of the helper-feed link.
const FEED_BAUD: u32 = 115200;

/// Depth of the bounded session-to-narration channel.
const NARRATION_BACKLOG: usize = 8;

fn main() {
    env_logger::init();
    let args = SightArgs::parse();
    let gate = DirectionGate::new(args.left_yaw, args.right_yaw, args.pitch_min);

    match args.command.clone() {
        Live(cmd) => run_live(&args, gate, cmd),
        Replay(cmd) => run_replay(&args, gate, cmd),
    }
}

/// Resolves a device path from the commandline, falling back to the
/// interactive selector.
fn resolve_device(explicit: Option<String>, prompt: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }
    let ports = SerialPort::available_ports().expect("failed to list serial ports");
    select_device(ports, prompt).expect("device selector failed")
}

fn run_live(args: &SightArgs, gate: DirectionGate, cmd: LiveCommand) {
    let feed_path = resolve_device(cmd.feed_device, " Helper Feed ").unwrap_or_else(|| {
        eprintln!("no feed device selected, nothing to perceive");
        process::exit(1);
    });

    // The feed is essential; the belt is not.
    let mut port = SerialPort::open(&feed_path, FEED_BAUD).expect("failed to open feed device");
    port.set_read_timeout(Duration::MAX)
        .expect("failed to set read timeout");

    let actuator: Box<dyn ActuatorLink> =
        match resolve_device(cmd.haptic_device, " Haptic Belt ") {
            Some(path) => match SerialActuator::open(&path) {
                Ok(link) => Box::new(link),
                Err(error) => {
                    warn!("belt unavailable ({}), continuing without haptics", error);
                    Box::new(NullActuator)
                }
            },
            None => {
                info!("no haptic device selected, continuing without haptics");
                Box::new(NullActuator)
            }
        };

    let mut bus = Bus::new(cmd.capacity);
    let producer = bus.clone();
    let threshold = args.confidence;
    let _feed_thread = spawn(move || {
        // Accumulate bytes until each newline, then decode the line.
        let mut buffer = [0; 1024];
        let mut read_buf = Vec::new();

        loop {
            let read_len = port.read(&mut buffer).expect("feed device disconnected");

            for &c in buffer.iter().take(read_len) {
                read_buf.push(c);
                if c == b'\n' {
                    match str::from_utf8(&read_buf) {
                        Ok(s) => match FeedEvent::from_str(s) {
                            Ok(event) => producer.publish(event.into_message(threshold, &gate)),
                            Err(error) => {
                                warn!("unparseable feed line: {}", error);
                            }
                        },
                        // Often happens at the beginning of transmission
                        // while there is still garbage in the helper's
                        // buffer.
                        Err(error) => {
                            warn!("feed sent invalid utf-8: {:?}", error);
                        }
                    }
                    read_buf.clear();
                }
            }
        }
    });

    let (ann_tx, ann_rx) = sync_channel(NARRATION_BACKLOG);
    let (text_tx, text_rx) = channel();
    run_component(
        Box::new(NarrationStage::new(TemplateNarrator)),
        ann_rx,
        text_tx.clone(),
    );
    run_sink(Box::new(SpeechStage::new(LogSpeaker)), text_rx);

    let policy = HapticPolicy::new(cmd.hazards, cmd.intensity);
    let mut session = Session::new(
        policy,
        actuator,
        EchoResponder,
        ann_tx,
        text_tx,
        Transcript::DEFAULT_WINDOW,
    );

    info!("live session started on {}", feed_path.display());
    loop {
        while let Some(message) = bus.next() {
            session.handle(message);
        }
        spin_sleep::sleep(Duration::from_millis(10));
    }
}

fn run_replay(args: &SightArgs, gate: DirectionGate, cmd: ReplayCommand) {
    let scenario = match Scenario::from_path(&cmd.infile) {
        Ok(scenario) => scenario,
        Err(error) => {
            eprintln!("failed to read scenario {}: {}", cmd.infile, error);
            process::exit(1);
        }
    };
    info!(
        "replaying \"{}\" ({} records)",
        scenario.name(),
        scenario.records().len()
    );

    let replayer = if cmd.fast {
        Replayer::unpaced(scenario, args.confidence, gate)
    } else {
        Replayer::new(scenario, args.confidence, gate)
    };

    let (ann_tx, ann_rx) = sync_channel(NARRATION_BACKLOG);
    let (text_tx, text_rx) = channel();
    run_component(
        Box::new(NarrationStage::new(TemplateNarrator)),
        ann_rx,
        text_tx.clone(),
    );
    run_sink(Box::new(SpeechStage::new(LogSpeaker)), text_rx);

    let policy = HapticPolicy::new(vec!["person".to_owned()], 150);
    let mut session = Session::new(
        policy,
        NullActuator,
        EchoResponder,
        ann_tx,
        text_tx,
        Transcript::DEFAULT_WINDOW,
    );

    for message in replayer {
        session.handle(message);
    }
    info!("replay complete");
}
