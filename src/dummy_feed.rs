//! A synthetic producer that stands in for the detector and face-pose
//! helpers. It fabricates a slowly mutating scene and a sweeping gaze
//! and publishes them onto a [`Bus`], so the monitor and the tests can
//! exercise the whole loop with no cameras, models, or serial hardware
//! in reach.

use crate::bus::Bus;
use crate::detection::{BoundingBox, Detection, DetectionFrame};
use crate::direction::{DirectionGate, PoseAngles};
use crate::message::Message;
use rand::prelude::*;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

enum Signal {
    TickMillis(u64),
    Stop,
}

/// The synthetic feed. Owns its producer thread; drop order does not
/// matter but call [`stop`](DummyFeed::stop) for a clean join.
pub struct DummyFeed {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
    bus: Bus,
}

/// Configuration for a [`DummyFeed`].
pub struct DummyFeedBuilder {
    tick_millis: u64,
    image_width: f32,
    vocabulary: Vec<String>,
    capacity: usize,
}

impl Default for DummyFeedBuilder {
    fn default() -> Self {
        Self {
            tick_millis: 400,
            image_width: 640.0,
            vocabulary: ["person", "chair", "bottle", "dining table"]
                .map(str::to_owned)
                .to_vec(),
            capacity: crate::bus::DEFAULT_CAPACITY,
        }
    }
}

impl DummyFeedBuilder {
    /// Milliseconds between fabricated frames.
    pub fn tick_millis(mut self, tick_millis: u64) -> Self {
        self.tick_millis = tick_millis.max(1);
        self
    }

    /// Width of the pretend scene image.
    pub fn image_width(mut self, image_width: f32) -> Self {
        self.image_width = image_width;
        self
    }

    /// Labels the pretend detector knows about.
    pub fn vocabulary(mut self, vocabulary: Vec<String>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Bus capacity before drop-oldest kicks in.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Spawns the producer thread and starts publishing.
    pub fn build(self) -> DummyFeed {
        let (tx, rx) = mpsc::channel::<Signal>();
        let bus = Bus::new(self.capacity);
        let producer = bus.clone();
        let image_width = self.image_width;
        let vocabulary = self.vocabulary;
        let mut tick_millis = self.tick_millis;

        let handle = thread::spawn(move || {
            let mut rng = thread_rng();
            let gate = DirectionGate::default();
            // Counts mutate slowly so the tracker sees deltas, not a
            // brand-new scene every tick.
            let mut counts: Vec<u32> = vocabulary.iter().map(|_| rng.gen_range(0..=2)).collect();
            let mut sweep: f32 = 0.0;
            let mut running = true;

            while running {
                if let Ok(received) = rx.try_recv() {
                    match received {
                        Signal::TickMillis(new_tick) => tick_millis = new_tick.max(1),
                        Signal::Stop => running = false,
                    }
                }

                for count in counts.iter_mut() {
                    if rng.gen_bool(0.15) {
                        if rng.gen_bool(0.5) {
                            *count += 1;
                        } else {
                            *count = count.saturating_sub(1);
                        }
                    }
                }

                let mut detections = Vec::new();
                for (label, &count) in vocabulary.iter().zip(counts.iter()) {
                    for _ in 0..count {
                        let x1 = rng.gen_range(0.0..image_width - 40.0);
                        detections.push(Detection {
                            label: label.clone(),
                            confidence: rng.gen_range(0.5..1.0),
                            bbox: BoundingBox {
                                x1,
                                y1: 40.0,
                                x2: x1 + 40.0,
                                y2: 160.0,
                            },
                        });
                    }
                }
                producer.publish(Message::Scene(DetectionFrame::from_detections(
                    &detections,
                    image_width,
                    0.0,
                )));

                sweep += 0.15;
                let pose = PoseAngles {
                    pitch: 172.0,
                    yaw: 45.0 * sweep.sin(),
                    roll: 0.0,
                };
                producer.publish(Message::Gaze(gate.classify(pose)));

                spin_sleep::sleep(Duration::from_millis(tick_millis));
            }
        });

        DummyFeed {
            handle: Some(handle),
            tx,
            bus,
        }
    }
}

impl DummyFeed {
    /// Starts configuring a feed.
    pub fn builder() -> DummyFeedBuilder {
        DummyFeedBuilder::default()
    }

    /// A consumer handle onto the feed's bus.
    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    /// Changes the publishing cadence of the running feed.
    pub fn set_tick_millis(&self, tick_millis: u64) {
        // Panic if the producer thread is already gone; that is a bug
        // in the caller's shutdown order.
        self.tx.send(Signal::TickMillis(tick_millis)).unwrap();
    }

    /// Stops the producer thread and joins it.
    pub fn stop(&mut self) {
        self.tx.send(Signal::Stop).unwrap();
        if let Some(thread) = self.handle.take() {
            thread.join().unwrap();
        }
    }
}
