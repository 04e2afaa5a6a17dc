//! In-memory stand-in for the game host.
//!
//! A small grid world with one local player and wandering NPCs. The camera
//! stays centered on the player; each NPC's hull is the on-screen square of
//! the tile it stands on. Menu attacks and primary presses that land inside
//! a hull deal one point of damage, and an NPC at zero hit points is
//! removed.

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::constants::{ATTACK_VERB, DEFAULT_TARGET_NAME};
use crate::geometry::{Position, ScreenPoint, ScreenRect};
use crate::provider::{
    CommandSink, EntityProvider, InputDriver, MenuCommand, NpcComposition, NpcView, PlayerState,
};

pub const CANVAS_WIDTH: i32 = 765;
pub const CANVAS_HEIGHT: i32 = 503;
pub const TILE_PX: i32 = 32;
pub const SCORPION_NPC_ID: i32 = 3024;
const SCORPION_HP: i32 = 3;

#[derive(Clone, Debug)]
struct SimNpc {
    view: NpcView,
    hp: i32,
}

#[derive(Debug)]
struct WorldState {
    tick: u32,
    logged_in: bool,
    player: PlayerState,
    npcs: Vec<SimNpc>,
    next_index: u32,
    canvas_origin: Option<ScreenPoint>,
    hulls_visible: bool,
    pointer: ScreenPoint,
    presses: Vec<ScreenPoint>,
    menu_log: Vec<MenuCommand>,
    rng: StdRng,
}

impl WorldState {
    fn player_position(&self) -> Option<Position> {
        self.player.position
    }

    fn hull_for(&self, npc: &NpcView) -> Option<ScreenRect> {
        if !self.hulls_visible {
            return None;
        }
        let player = self.player_position()?;
        let position = npc.position?;
        if position.plane != player.plane {
            return None;
        }
        let x = CANVAS_WIDTH / 2 + (position.x - player.x) * TILE_PX - TILE_PX / 2;
        let y = CANVAS_HEIGHT / 2 - (position.y - player.y) * TILE_PX - TILE_PX / 2;
        let rect = ScreenRect::new(x, y, TILE_PX, TILE_PX);
        let on_canvas = x + TILE_PX > 0 && y + TILE_PX > 0 && x < CANVAS_WIDTH && y < CANVAS_HEIGHT;
        on_canvas.then_some(rect)
    }

    fn damage(&mut self, index: u32) {
        let Some(slot) = self.npcs.iter().position(|npc| npc.view.index == index) else {
            return;
        };
        self.npcs[slot].hp -= 1;
        if self.npcs[slot].hp <= 0 {
            self.npcs.remove(slot);
        }
    }
}

#[derive(Debug)]
pub struct SimulatedWorld {
    state: Mutex<WorldState>,
}

impl SimulatedWorld {
    pub fn new(player_position: Position, seed: u64) -> Self {
        Self {
            state: Mutex::new(WorldState {
                tick: 0,
                logged_in: true,
                player: PlayerState {
                    position: Some(player_position),
                    animation: -1,
                    pose_animation: 808,
                    health_ratio: 30,
                    health_scale: 30,
                },
                npcs: Vec::new(),
                next_index: 0,
                canvas_origin: Some(ScreenPoint::new(0, 0)),
                hulls_visible: true,
                pointer: ScreenPoint::new(CANVAS_WIDTH / 2, CANVAS_HEIGHT / 2),
                presses: Vec::new(),
                menu_log: Vec::new(),
                rng: StdRng::seed_from_u64(seed),
            }),
        }
    }

    /// Adds an attackable NPC and returns its host index.
    pub fn spawn_npc(&self, id: i32, name: Option<&str>, position: Position, hp: i32) -> u32 {
        let mut state = self.state.lock();
        let index = state.next_index;
        state.next_index += 1;
        state.npcs.push(SimNpc {
            view: NpcView {
                index,
                id,
                name: name.map(str::to_string),
                position: Some(position),
                composition: Some(NpcComposition::with_actions([
                    None,
                    Some(ATTACK_VERB),
                    None,
                    None,
                    Some("Examine"),
                ])),
                transformed: None,
            },
            hp,
        });
        index
    }

    /// Scatters `count` scorpions within `spread` tiles of the player.
    pub fn spawn_scorpions(&self, count: usize, spread: i32) {
        let Some(origin) = self.state.lock().player_position() else {
            return;
        };
        for _ in 0..count {
            let (dx, dy) = {
                let mut state = self.state.lock();
                (
                    state.rng.gen_range(-spread..=spread),
                    state.rng.gen_range(-spread..=spread),
                )
            };
            let position = Position::new(origin.x + dx, origin.y + dy, origin.plane);
            self.spawn_npc(SCORPION_NPC_ID, Some(DEFAULT_TARGET_NAME), position, SCORPION_HP);
        }
    }

    /// Advances the tick counter and lets each NPC drift by at most one tile.
    pub fn advance_tick(&self) {
        let mut state = self.state.lock();
        state.tick += 1;
        let WorldState { npcs, rng, .. } = &mut *state;
        for npc in npcs.iter_mut() {
            if !rng.gen_bool(0.5) {
                continue;
            }
            if let Some(position) = npc.view.position.as_mut() {
                position.x += rng.gen_range(-1..=1);
                position.y += rng.gen_range(-1..=1);
            }
        }
    }

    pub fn set_logged_in(&self, logged_in: bool) {
        self.state.lock().logged_in = logged_in;
    }

    pub fn set_player_position(&self, position: Option<Position>) {
        self.state.lock().player.position = position;
    }

    pub fn set_canvas_origin(&self, origin: Option<ScreenPoint>) {
        self.state.lock().canvas_origin = origin;
    }

    pub fn set_hulls_visible(&self, visible: bool) {
        self.state.lock().hulls_visible = visible;
    }

    pub fn npc_hp(&self, index: u32) -> Option<i32> {
        let state = self.state.lock();
        state
            .npcs
            .iter()
            .find(|npc| npc.view.index == index)
            .map(|npc| npc.hp)
    }

    pub fn npc_count(&self) -> usize {
        self.state.lock().npcs.len()
    }

    pub fn menu_log(&self) -> Vec<MenuCommand> {
        self.state.lock().menu_log.clone()
    }

    pub fn presses(&self) -> Vec<ScreenPoint> {
        self.state.lock().presses.clone()
    }
}

impl EntityProvider for SimulatedWorld {
    fn is_logged_in(&self) -> bool {
        self.state.lock().logged_in
    }

    fn tick_count(&self) -> u32 {
        self.state.lock().tick
    }

    fn local_player(&self) -> Option<PlayerState> {
        let state = self.state.lock();
        state.logged_in.then_some(state.player)
    }

    fn npcs(&self) -> Vec<NpcView> {
        self.state
            .lock()
            .npcs
            .iter()
            .map(|npc| npc.view.clone())
            .collect()
    }

    fn npc_screen_bounds(&self, index: u32) -> Option<ScreenRect> {
        let state = self.state.lock();
        let npc = state.npcs.iter().find(|npc| npc.view.index == index)?;
        state.hull_for(&npc.view)
    }

    fn canvas_origin(&self) -> Option<ScreenPoint> {
        self.state.lock().canvas_origin
    }
}

impl CommandSink for SimulatedWorld {
    fn menu_action(&self, command: MenuCommand) {
        let mut state = self.state.lock();
        if command.verb.eq_ignore_ascii_case(ATTACK_VERB) {
            state.damage(command.npc_index);
        }
        state.menu_log.push(command);
    }
}

impl InputDriver for SimulatedWorld {
    fn pointer_position(&self) -> Option<ScreenPoint> {
        Some(self.state.lock().pointer)
    }

    fn move_pointer(&self, point: ScreenPoint) {
        self.state.lock().pointer = point;
    }

    fn press_primary(&self) {
        let mut state = self.state.lock();
        let pointer = state.pointer;
        state.presses.push(pointer);

        let Some(origin) = state.canvas_origin else {
            return;
        };
        let canvas_point = ScreenPoint::new(pointer.x - origin.x, pointer.y - origin.y);
        let hit = state
            .npcs
            .iter()
            .find(|npc| {
                state
                    .hull_for(&npc.view)
                    .is_some_and(|hull| hull.contains(canvas_point))
            })
            .map(|npc| npc.view.index);
        if let Some(index) = hit {
            state.damage(index);
        }
    }

    fn release_primary(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_centers_on_player_tile_offset() {
        let world = SimulatedWorld::new(Position::new(100, 100, 0), 1);
        let index = world.spawn_npc(1, Some("Scorpion"), Position::new(101, 100, 0), 3);

        let hull = world.npc_screen_bounds(index).unwrap();
        assert_eq!(
            hull,
            ScreenRect::new(
                CANVAS_WIDTH / 2 + TILE_PX - TILE_PX / 2,
                CANVAS_HEIGHT / 2 - TILE_PX / 2,
                TILE_PX,
                TILE_PX
            )
        );

        world.set_hulls_visible(false);
        assert!(world.npc_screen_bounds(index).is_none());
    }

    #[test]
    fn menu_attack_damages_and_removes() {
        let world = SimulatedWorld::new(Position::new(0, 0, 0), 1);
        let index = world.spawn_npc(1, Some("Scorpion"), Position::new(1, 0, 0), 2);
        let command = MenuCommand {
            option: crate::provider::NpcOption::Second,
            npc_index: index,
            verb: "Attack".to_string(),
            target_name: "Scorpion".to_string(),
        };

        world.menu_action(command.clone());
        assert_eq!(world.npc_hp(index), Some(1));
        world.menu_action(command);
        assert_eq!(world.npc_hp(index), None);
        assert_eq!(world.menu_log().len(), 2);
    }

    #[test]
    fn press_inside_hull_hits() {
        let world = SimulatedWorld::new(Position::new(0, 0, 0), 1);
        world.set_canvas_origin(Some(ScreenPoint::new(50, 80)));
        let index = world.spawn_npc(1, Some("Scorpion"), Position::new(0, 1, 0), 5);

        let hull = world.npc_screen_bounds(index).unwrap();
        world.move_pointer(ScreenPoint::new(50 + hull.x + 3, 80 + hull.y + 3));
        world.press_primary();
        world.release_primary();
        assert_eq!(world.npc_hp(index), Some(4));

        world.move_pointer(ScreenPoint::new(0, 0));
        world.press_primary();
        assert_eq!(world.npc_hp(index), Some(4));
        assert_eq!(world.presses().len(), 2);
    }

    #[test]
    fn logged_out_world_hides_player() {
        let world = SimulatedWorld::new(Position::new(0, 0, 0), 1);
        world.set_logged_in(false);
        assert!(world.local_player().is_none());
        assert!(!world.is_logged_in());
    }

    #[test]
    fn wandering_keeps_plane_and_bounds_step() {
        let world = SimulatedWorld::new(Position::new(10, 10, 2), 9);
        world.spawn_scorpions(5, 3);
        let before = world.npcs();
        world.advance_tick();
        let after = world.npcs();

        assert_eq!(world.tick_count(), 1);
        for (old, new) in before.iter().zip(after.iter()) {
            let old_pos = old.position.unwrap();
            let new_pos = new.position.unwrap();
            assert_eq!(new_pos.plane, 2);
            assert!(old_pos.chebyshev(&new_pos).unwrap() <= 1);
        }
    }
}
