//! Per-sector object-count memory and the change-detection step that
//! decides what is worth narrating.
//!
//! The tracker remembers, for each sector, the counts it last announced
//! and diffs every new [`DetectionFrame`](crate::detection::DetectionFrame)
//! sector against that memory. Only the delta is announced; a static
//! scene produces nothing. The diff policy is the full one: a label
//! that drops out of a non-empty frame is reported as removed, even
//! while other labels persist.

use crate::detection::{Counts, Sector};
use std::collections::BTreeMap;
use std::fmt;

/// What changed for one label since the last announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// The label was not tracked before; carries the full count.
    Sighted(u32),
    /// The count grew by this many.
    Added(u32),
    /// The count shrank by this many.
    Removed(u32),
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Sighted(n) => write!(f, "{}", n),
            Delta::Added(n) => write!(f, "added {}", n),
            Delta::Removed(n) => write!(f, "removed {}", n),
        }
    }
}

/// The minimal set of changes worth narrating for one sector.
#[derive(Debug, Clone, PartialEq)]
pub enum Announcement {
    /// The sector was looked at for the first time and held nothing.
    NothingDetected {
        /// The sector that was found empty.
        sector: Sector,
    },
    /// Per-label deltas since the last announcement. Labels with an
    /// unchanged count never appear here.
    Changes {
        /// The sector the deltas apply to.
        sector: Sector,
        /// What changed, keyed by label.
        deltas: BTreeMap<String, Delta>,
    },
}

impl Announcement {
    /// The sector this announcement is about.
    pub fn sector(&self) -> Sector {
        match self {
            Announcement::NothingDetected { sector } => *sector,
            Announcement::Changes { sector, .. } => *sector,
        }
    }
}

// A sector's memory moves through three phases: never announced,
// explicitly announced empty, and holding the last announced counts.
#[derive(Debug, Clone, Default, PartialEq)]
enum SectorHistory {
    #[default]
    Uninitialized,
    Empty,
    Populated(Counts),
}

/// Owns the per-sector history. One value per session, held by whoever
/// drives the reconciliation loop; the sectors never touch each other.
#[derive(Debug, Clone, Default)]
pub struct HistoryTracker {
    sectors: [SectorHistory; 3],
}

impl HistoryTracker {
    /// A tracker with every sector uninitialized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `new_counts` against the sector's memory. Returns the
    /// changes worth narrating, or `None` when nothing changed. Updates
    /// the sector's memory to match `new_counts` exactly; no other
    /// sector is read or written.
    pub fn reconcile(&mut self, sector: Sector, new_counts: &Counts) -> Option<Announcement> {
        let slot = &mut self.sectors[sector.index()];

        // Equality short-circuit: the tracker runs at frame rate and
        // the common case is an unchanged scene.
        match slot {
            SectorHistory::Populated(old) if old == new_counts => return None,
            SectorHistory::Empty if new_counts.is_empty() => return None,
            _ => {}
        }

        if new_counts.is_empty() {
            return match std::mem::replace(slot, SectorHistory::Empty) {
                SectorHistory::Uninitialized => Some(Announcement::NothingDetected { sector }),
                SectorHistory::Populated(old) => {
                    let deltas = old
                        .into_iter()
                        .map(|(label, n)| (label, Delta::Removed(n)))
                        .collect();
                    Some(Announcement::Changes { sector, deltas })
                }
                // Unreachable given the short-circuit above, but an
                // empty-to-empty transition is still not a change.
                SectorHistory::Empty => None,
            };
        }

        let old = match std::mem::replace(slot, SectorHistory::Populated(new_counts.clone())) {
            SectorHistory::Populated(old) => old,
            SectorHistory::Uninitialized | SectorHistory::Empty => Counts::new(),
        };

        let mut deltas = BTreeMap::new();
        for (label, &count) in new_counts {
            match old.get(label) {
                None => {
                    deltas.insert(label.clone(), Delta::Sighted(count));
                }
                Some(&prev) if prev == count => {}
                Some(&prev) if prev < count => {
                    deltas.insert(label.clone(), Delta::Added(count - prev));
                }
                Some(&prev) => {
                    deltas.insert(label.clone(), Delta::Removed(prev - count));
                }
            }
        }
        // Labels that vanished while others persist are still reported.
        for (label, prev) in old {
            if !new_counts.contains_key(&label) {
                deltas.insert(label, Delta::Removed(prev));
            }
        }

        if deltas.is_empty() {
            None
        } else {
            Some(Announcement::Changes { sector, deltas })
        }
    }

    /// A snapshot of the counts last announced for the sector. Empty
    /// for uninitialized and explicitly-empty sectors alike.
    pub fn counts(&self, sector: Sector) -> Counts {
        match &self.sectors[sector.index()] {
            SectorHistory::Populated(counts) => counts.clone(),
            _ => Counts::new(),
        }
    }
}
