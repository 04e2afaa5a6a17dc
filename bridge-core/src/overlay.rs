//! Display state shared between the tick loop and overlay readers.
//!
//! The tick loop is the only writer. It publishes a whole [`DisplayState`]
//! at once, so a reader never sees the count from one scan next to the
//! nearest distance from another.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::constants::{ATTACK_NOW_DISTANCE, PREPARE_ATTACK_DISTANCE};
use crate::scan::{NearestTarget, ScanResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub count: usize,
    pub nearest: Option<NearestTarget>,
}

impl DisplayState {
    pub fn from_scan(scan: &ScanResult) -> Self {
        Self {
            count: scan.count(),
            nearest: scan.nearest.clone(),
        }
    }

    pub fn nearest_distance(&self) -> Option<i32> {
        self.nearest.as_ref().map(|nearest| nearest.distance)
    }

    pub fn is_attack_now(&self) -> bool {
        self.nearest_distance()
            .is_some_and(|distance| distance <= ATTACK_NOW_DISTANCE)
    }

    pub fn recommendation(&self) -> Recommendation {
        Recommendation::for_distance(self.nearest_distance())
    }

    /// Text for the center overlay, or `None` when nothing should be shown.
    pub fn center_overlay_text(&self, marker: &str, only_attack_now: bool) -> Option<String> {
        if self.count == 0 {
            return None;
        }
        let nearest = self.nearest.as_ref()?;

        if self.is_attack_now() {
            return Some(format!("ATTACK {}", nearest.name.to_uppercase()));
        }
        if only_attack_now {
            return None;
        }
        Some(format!(
            "{} NEARBY ({})",
            marker.to_uppercase(),
            nearest.distance
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recommendation {
    NoTarget,
    AttackNow,
    PrepareAttack,
    ApproachTarget,
}

impl Recommendation {
    pub fn for_distance(nearest: Option<i32>) -> Self {
        match nearest {
            None => Self::NoTarget,
            Some(d) if d <= ATTACK_NOW_DISTANCE => Self::AttackNow,
            Some(d) if d <= PREPARE_ATTACK_DISTANCE => Self::PrepareAttack,
            Some(_) => Self::ApproachTarget,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoTarget => "no_target",
            Self::AttackNow => "attack_now",
            Self::PrepareAttack => "prepare_attack",
            Self::ApproachTarget => "approach_target",
        }
    }
}

/// Single-writer publish cell for [`DisplayState`].
#[derive(Debug, Default)]
pub struct DisplayCell {
    current: RwLock<Arc<DisplayState>>,
}

impl DisplayCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, state: DisplayState) {
        *self.current.write() = Arc::new(state);
    }

    pub fn clear(&self) {
        self.publish(DisplayState::default());
    }

    pub fn load(&self) -> Arc<DisplayState> {
        Arc::clone(&self.current.read())
    }
}
