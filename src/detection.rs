//! The snapshot of one detector invocation: every recognized object,
//! partitioned into the three horizontal sectors of the scene image.
//! A [`DetectionFrame`] is built once from the raw detector output and
//! never mutated afterwards; the history tracker and the haptic policy
//! each read it independently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Detections whose normalized horizontal center falls below this value
/// land in the left sector.
pub const LEFT_BOUNDARY: f32 = 0.33;

/// Detections whose normalized horizontal center falls above this value
/// land in the right sector.
pub const RIGHT_BOUNDARY: f32 = 0.66;

/// Object counts for one sector, keyed by detector label.
pub type Counts = BTreeMap<String, u32>;

/// One of the three horizontal zones the scene image is partitioned
/// into. Every detection belongs to exactly one sector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Sector {
    /// Leftmost third of the scene image.
    Left,
    /// Middle third of the scene image.
    Forward,
    /// Rightmost third of the scene image.
    Right,
}

impl Sector {
    /// All sectors, in left-to-right order.
    pub const ALL: [Sector; 3] = [Sector::Left, Sector::Forward, Sector::Right];

    /// A stable index for per-sector arrays.
    pub fn index(self) -> usize {
        match self {
            Sector::Left => 0,
            Sector::Forward => 1,
            Sector::Right => 2,
        }
    }
}

// The uppercase spelling is what goes over the wire to the haptic belt.
impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sector::Left => "LEFT",
            Sector::Forward => "FORWARD",
            Sector::Right => "RIGHT",
        };
        write!(f, "{}", name)
    }
}

/// An axis-aligned box in pixel coordinates, top-left to bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BoundingBox {
    /// The horizontal center of the box, in pixels.
    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    /// Assigns the box to a sector given the width of the image it was
    /// detected in.
    pub fn sector(&self, image_width: f32) -> Sector {
        let center = self.center_x() / image_width;
        if center < LEFT_BOUNDARY {
            Sector::Left
        } else if center > RIGHT_BOUNDARY {
            Sector::Right
        } else {
            Sector::Forward
        }
    }
}

/// One recognized object, as reported by the external detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The detector's class label, e.g. `"person"` or `"dining table"`.
    pub label: String,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
    /// Where the object was seen in the scene image.
    pub bbox: BoundingBox,
}

/// The objects of one sector: label counts plus the bounding boxes in
/// detection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorObjects {
    /// How many of each label were seen in this sector.
    pub counts: Counts,
    /// Boxes for every detection in this sector, in detection order.
    pub boxes: Vec<BoundingBox>,
}

impl SectorObjects {
    fn push(&mut self, detection: &Detection) {
        *self
            .counts
            .entry(detection.label.clone())
            .or_insert(0) += 1;
        self.boxes.push(detection.bbox);
    }
}

/// Everything one detector invocation saw, grouped by sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    left: SectorObjects,
    forward: SectorObjects,
    right: SectorObjects,
}

impl DetectionFrame {
    /// Builds a frame from raw detections. Detections below the
    /// confidence threshold are discarded; the rest are assigned to a
    /// sector by the horizontal center of their box.
    pub fn from_detections(
        detections: &[Detection],
        image_width: f32,
        confidence_threshold: f32,
    ) -> Self {
        let mut frame = DetectionFrame::default();
        for detection in detections {
            if detection.confidence < confidence_threshold {
                continue;
            }
            frame
                .sector_mut(detection.bbox.sector(image_width))
                .push(detection);
        }
        frame
    }

    /// The objects seen in the given sector.
    pub fn sector(&self, sector: Sector) -> &SectorObjects {
        match sector {
            Sector::Left => &self.left,
            Sector::Forward => &self.forward,
            Sector::Right => &self.right,
        }
    }

    fn sector_mut(&mut self, sector: Sector) -> &mut SectorObjects {
        match sector {
            Sector::Left => &mut self.left,
            Sector::Forward => &mut self.forward,
            Sector::Right => &mut self.right,
        }
    }

    /// True when no sector holds any detection.
    pub fn is_empty(&self) -> bool {
        Sector::ALL
            .iter()
            .all(|&s| self.sector(s).counts.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, confidence: f32, x1: f32, x2: f32) -> Detection {
        Detection {
            label: label.to_owned(),
            confidence,
            bbox: BoundingBox {
                x1,
                y1: 0.0,
                x2,
                y2: 100.0,
            },
        }
    }

    #[test]
    fn boxes_fall_into_the_expected_sectors() {
        let width = 300.0;
        // centers at 50, 150, and 280 pixels
        assert_eq!(det("a", 1.0, 0.0, 100.0).bbox.sector(width), Sector::Left);
        assert_eq!(
            det("b", 1.0, 100.0, 200.0).bbox.sector(width),
            Sector::Forward
        );
        assert_eq!(det("c", 1.0, 260.0, 300.0).bbox.sector(width), Sector::Right);
    }

    #[test]
    fn low_confidence_detections_are_discarded() {
        let detections = [det("chair", 0.4, 0.0, 10.0), det("chair", 0.9, 0.0, 10.0)];
        let frame = DetectionFrame::from_detections(&detections, 300.0, 0.5);
        assert_eq!(frame.sector(Sector::Left).counts["chair"], 1);
        assert_eq!(frame.sector(Sector::Left).boxes.len(), 1);
    }

    #[test]
    fn counts_accumulate_per_label() {
        let detections = [
            det("person", 0.9, 120.0, 180.0),
            det("person", 0.8, 130.0, 190.0),
            det("bottle", 0.7, 140.0, 160.0),
        ];
        let frame = DetectionFrame::from_detections(&detections, 300.0, 0.5);
        let forward = frame.sector(Sector::Forward);
        assert_eq!(forward.counts["person"], 2);
        assert_eq!(forward.counts["bottle"], 1);
        assert_eq!(forward.boxes.len(), 3);
        assert!(!frame.is_empty());
    }

    #[test]
    fn an_empty_frame_is_empty() {
        assert!(DetectionFrame::default().is_empty());
    }
}
