use crate::constants::{ATTACK_VERB, DEFAULT_TARGET_NAME, NPC_OPTION_SLOTS};
use crate::provider::{MenuCommand, NpcOption, NpcView};

/// Ordinal slot of the entity's "Attack" verb, defaulting to the first slot.
pub fn resolve_attack_option(npc: &NpcView) -> NpcOption {
    let Some(composition) = npc.transformed.as_ref().or(npc.composition.as_ref()) else {
        return NpcOption::First;
    };

    composition
        .actions
        .iter()
        .take(NPC_OPTION_SLOTS)
        .position(|action| {
            action
                .as_deref()
                .is_some_and(|verb| verb.eq_ignore_ascii_case(ATTACK_VERB))
        })
        .map_or(NpcOption::First, NpcOption::from_slot)
}

/// Direct "Attack" command for when pointer simulation is unavailable.
pub fn attack_command(npc: &NpcView) -> MenuCommand {
    MenuCommand {
        option: resolve_attack_option(npc),
        npc_index: npc.index,
        verb: ATTACK_VERB.to_string(),
        target_name: npc
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_TARGET_NAME.to_string()),
    }
}
