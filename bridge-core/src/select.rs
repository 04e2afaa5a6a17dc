use rand::Rng;

use crate::constants::{FAR_FUZZ_TILES, NEAR_FUZZ_THRESHOLD, NEAR_FUZZ_TILES};
use crate::geometry::Position;
use crate::provider::NpcView;
use crate::scan::ScanPolicy;

/// Extra tiles beyond the nearest distance still considered "nearest".
pub fn fuzz_for(nearest_distance: i32) -> i32 {
    if nearest_distance <= NEAR_FUZZ_THRESHOLD {
        NEAR_FUZZ_TILES
    } else {
        FAR_FUZZ_TILES
    }
}

#[derive(Clone, Debug, Default)]
pub struct TargetSelector {
    policy: ScanPolicy,
}

impl TargetSelector {
    pub fn new(policy: ScanPolicy) -> Self {
        Self { policy }
    }

    /// Picks one target from `npcs`.
    ///
    /// With `explicit_id` the first marker-matching entity carrying that id is
    /// returned regardless of plane or radius. Without it, one entity is drawn
    /// uniformly from every in-range candidate within the fuzz margin of the
    /// nearest.
    pub fn select<'a, R>(
        &self,
        origin: &Position,
        npcs: &'a [NpcView],
        explicit_id: Option<i32>,
        rng: &mut R,
    ) -> Option<&'a NpcView>
    where
        R: Rng + ?Sized,
    {
        if let Some(target_id) = explicit_id {
            return self.find_by_id(npcs, target_id);
        }

        let candidates: Vec<(&NpcView, i32)> = npcs
            .iter()
            .filter_map(|npc| self.policy.in_range(origin, npc).map(|d| (npc, d)))
            .collect();
        let nearest = candidates.iter().map(|(_, distance)| *distance).min()?;
        let limit = nearest + fuzz_for(nearest);

        let viable: Vec<&NpcView> = candidates
            .into_iter()
            .filter(|(_, distance)| *distance <= limit)
            .map(|(npc, _)| npc)
            .collect();
        if viable.is_empty() {
            return None;
        }
        Some(viable[rng.gen_range(0..viable.len())])
    }

    // No plane or radius check: an id request may name something the passive
    // scan left out.
    fn find_by_id<'a>(&self, npcs: &'a [NpcView], target_id: i32) -> Option<&'a NpcView> {
        npcs.iter().find(|npc| {
            npc.id == target_id
                && npc
                    .name
                    .as_deref()
                    .is_some_and(|name| self.policy.matches_name(name))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn scorpion(index: u32, id: i32, x: i32, y: i32, plane: i32) -> NpcView {
        NpcView {
            index,
            id,
            name: Some("Scorpion".to_string()),
            position: Some(Position::new(x, y, plane)),
            composition: None,
            transformed: None,
        }
    }

    #[test]
    fn fuzz_widens_past_five_tiles() {
        assert_eq!(fuzz_for(0), 1);
        assert_eq!(fuzz_for(5), 1);
        assert_eq!(fuzz_for(6), 2);
    }

    #[test]
    fn explicit_id_ignores_plane_and_radius() {
        let origin = Position::new(100, 100, 0);
        let npcs = vec![
            scorpion(0, 10, 101, 100, 0),
            scorpion(1, 77, 400, 400, 2),
        ];
        let mut rng = StdRng::seed_from_u64(1);

        let chosen = TargetSelector::default()
            .select(&origin, &npcs, Some(77), &mut rng)
            .expect("id lookup should find the far entity");
        assert_eq!(chosen.index, 1);
    }

    #[test]
    fn explicit_id_missing_returns_none() {
        let origin = Position::new(100, 100, 0);
        let npcs = vec![scorpion(0, 10, 101, 100, 0)];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(TargetSelector::default()
            .select(&origin, &npcs, Some(11), &mut rng)
            .is_none());
    }

    #[test]
    fn explicit_id_still_requires_marker() {
        let origin = Position::new(0, 0, 0);
        let mut goblin = scorpion(0, 55, 1, 0, 0);
        goblin.name = Some("Goblin".to_string());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(TargetSelector::default()
            .select(&origin, &[goblin], Some(55), &mut rng)
            .is_none());
    }

    #[test]
    fn nearest_path_stays_within_fuzz() {
        let origin = Position::new(0, 0, 0);
        let npcs = vec![
            scorpion(0, 1, 2, 0, 0),
            scorpion(1, 1, 0, 3, 0),
            scorpion(2, 1, 4, 4, 0),
            scorpion(3, 1, 1, 1, 1),
            scorpion(4, 1, 20, 0, 0),
        ];
        let selector = TargetSelector::default();
        let mut rng = StdRng::seed_from_u64(42);

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let chosen = selector.select(&origin, &npcs, None, &mut rng).unwrap();
            seen.insert(chosen.index);
        }
        assert_eq!(seen, HashSet::from([0, 1]));
    }

    #[test]
    fn no_candidates_returns_none() {
        let origin = Position::new(0, 0, 0);
        let npcs = vec![scorpion(0, 1, 30, 0, 0), scorpion(1, 1, 0, 0, 3)];
        let mut rng = StdRng::seed_from_u64(3);
        assert!(TargetSelector::default()
            .select(&origin, &npcs, None, &mut rng)
            .is_none());
    }
}
