use crate::constants::{
    DEFAULT_MAX_ENTITIES_PER_TICK, DEFAULT_SCAN_RADIUS_TILES, DEFAULT_TARGET_MARKER,
};
use crate::error::BridgeError;
use crate::geometry::Position;
use crate::provider::NpcView;

/// Which entities count as targets and how far the passive scan reaches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanPolicy {
    marker: String,
    radius: i32,
    max_entities: usize,
}

impl ScanPolicy {
    pub fn new(marker: &str, radius: i32, max_entities: usize) -> Result<Self, BridgeError> {
        let marker = marker.trim().to_lowercase();
        if marker.is_empty() {
            return Err(BridgeError::EmptyMarker);
        }
        if radius <= 0 {
            return Err(BridgeError::InvalidRadius { radius });
        }
        if max_entities == 0 {
            return Err(BridgeError::InvalidEntityCap { cap: max_entities });
        }
        Ok(Self {
            marker,
            radius,
            max_entities,
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn max_entities(&self) -> usize {
        self.max_entities
    }

    /// Case-insensitive substring match against the configured marker.
    pub fn matches_name(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.marker)
    }

    /// Distance to `npc` when it is named, on `origin`'s plane and within the
    /// radius.
    pub fn in_range(&self, origin: &Position, npc: &NpcView) -> Option<i32> {
        let name = npc.name.as_deref()?;
        if !self.matches_name(name) {
            return None;
        }
        let distance = origin.chebyshev(&npc.position?)?;
        (distance <= self.radius).then_some(distance)
    }
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            marker: DEFAULT_TARGET_MARKER.to_string(),
            radius: DEFAULT_SCAN_RADIUS_TILES,
            max_entities: DEFAULT_MAX_ENTITIES_PER_TICK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanEntity {
    pub id: i32,
    pub index: u32,
    pub name: String,
    pub position: Position,
    pub distance: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NearestTarget {
    pub distance: i32,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub entities: Vec<ScanEntity>,
    /// `None` when nothing qualified.
    pub nearest: Option<NearestTarget>,
}

impl ScanResult {
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    pub fn nearest_distance(&self) -> Option<i32> {
        self.nearest.as_ref().map(|nearest| nearest.distance)
    }

    pub fn nearest_name(&self) -> Option<&str> {
        self.nearest.as_ref().map(|nearest| nearest.name.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct WorldScanner {
    policy: ScanPolicy,
}

impl WorldScanner {
    pub fn new(policy: ScanPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    /// Single pass over `npcs` in enumeration order. Stops once the per-tick
    /// cap is reached; the truncated list is still a valid result.
    pub fn scan(&self, origin: &Position, npcs: &[NpcView]) -> ScanResult {
        let mut result = ScanResult::default();

        for npc in npcs {
            let Some(distance) = self.policy.in_range(origin, npc) else {
                continue;
            };
            let (Some(name), Some(position)) = (npc.name.as_ref(), npc.position) else {
                continue;
            };

            if result.nearest_distance().map_or(true, |best| distance < best) {
                result.nearest = Some(NearestTarget {
                    distance,
                    name: name.clone(),
                });
            }

            result.entities.push(ScanEntity {
                id: npc.id,
                index: npc.index,
                name: name.clone(),
                position,
                distance,
            });

            if result.entities.len() >= self.policy.max_entities {
                break;
            }
        }

        result
    }
}
