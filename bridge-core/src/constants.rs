pub const DEFAULT_TARGET_MARKER: &str = "scorpion";
pub const DEFAULT_TARGET_NAME: &str = "Scorpion";
pub const DEFAULT_SCAN_RADIUS_TILES: i32 = 15;
pub const DEFAULT_MAX_ENTITIES_PER_TICK: usize = 20;

/// Interaction verb the direct dispatch path looks for.
pub const ATTACK_VERB: &str = "Attack";
/// Ordinal verb slots an entity composition exposes.
pub const NPC_OPTION_SLOTS: usize = 5;

/// Nearest distance at or below which fuzz is a single tile.
pub const NEAR_FUZZ_THRESHOLD: i32 = 5;
pub const NEAR_FUZZ_TILES: i32 = 1;
pub const FAR_FUZZ_TILES: i32 = 2;

pub const ATTACK_NOW_DISTANCE: i32 = 1;
pub const PREPARE_ATTACK_DISTANCE: i32 = 3;

pub const MIN_MOTION_STEPS: i32 = 12;
pub const MAX_MOTION_STEPS: i32 = 45;
pub const MIN_CURVE_SPREAD: i32 = 12;
pub const MAX_CURVE_SPREAD: i32 = 60;
pub const MOTION_EASE_EXPONENT: f64 = 2.2;
pub const MAX_PATH_JITTER_PX: f64 = 3.0;
pub const SETTLE_JITTER_PX: i32 = 2;
/// Click point inset from the hull bounds edge.
pub const HULL_INSET_PX: i32 = 2;

pub const STEP_DELAY_MS: (u64, u64) = (6, 16);
pub const SETTLE_DELAY_MS: (u64, u64) = (40, 119);
pub const PRESS_HOLD_MS: (u64, u64) = (20, 54);
