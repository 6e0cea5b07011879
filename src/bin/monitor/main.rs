//! A terminal dashboard over a synthetic feed: per-sector objects, the
//! simulated gaze, belt warn states, and the latest narration. Lets
//! anyone poke at the tracker and the haptic policy with no cameras or
//! serial hardware attached.

mod gui;

use echosight::dummy_feed::DummyFeed;
use echosight::haptics::{HapticPolicy, NullActuator};
use echosight::narration::{NarrationStage, TemplateNarrator};
use echosight::session::Session;
use echosight::transcript::{EchoResponder, Transcript};
use echosight::component::run_component;
use std::sync::mpsc::{channel, sync_channel};

fn main() {
    env_logger::init();

    let mut feed = DummyFeed::builder().tick_millis(400).build();

    let (ann_tx, ann_rx) = sync_channel(8);
    let (text_tx, text_rx) = channel();
    run_component(
        Box::new(NarrationStage::new(TemplateNarrator)),
        ann_rx,
        text_tx.clone(),
    );

    let policy = HapticPolicy::new(vec!["person".to_owned()], 150);
    let session = Session::new(
        policy,
        NullActuator,
        EchoResponder,
        ann_tx,
        text_tx,
        Transcript::DEFAULT_WINDOW,
    );

    let _ = gui::engage_gui(feed.bus(), session, text_rx);

    feed.stop();
}
