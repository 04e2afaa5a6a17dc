use core::fmt::Write;

use crate::geometry::Position;
use crate::provider::PlayerState;
use crate::scan::{ScanEntity, ScanResult};

/// Minimal JSON string escaping: only `"` and `\` are escaped.
pub fn escape_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `[{"id":..,"name":..,"pos":[x,y],"distance":..}, ...]` in scan order.
pub fn entities_json(entities: &[ScanEntity]) -> String {
    let mut out = String::from("[");
    for (i, entity) in entities.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{{\"id\":{},\"name\":\"{}\",\"pos\":[{},{}],\"distance\":{}}}",
            entity.id,
            escape_json(&entity.name),
            entity.position.x,
            entity.position.y,
            entity.distance
        );
    }
    out.push(']');
    out
}

/// Per-tick telemetry record, built once and handed straight to the exporter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickSnapshot {
    pub tick: u32,
    pub player_position: Position,
    pub animation: i32,
    pub pose_animation: i32,
    pub health_ratio: i32,
    pub health_scale: i32,
    pub nearby_json: String,
}

impl TickSnapshot {
    pub fn new(tick: u32, position: Position, player: &PlayerState, scan: &ScanResult) -> Self {
        Self {
            tick,
            player_position: position,
            animation: player.animation,
            pose_animation: player.pose_animation,
            health_ratio: player.health_ratio,
            health_scale: player.health_scale,
            nearby_json: entities_json(&scan.entities),
        }
    }

    pub fn to_json(&self) -> String {
        format!(
            "{{\"tick\":{},\"player_pos\":[{},{}],\"plane\":{},\"animation\":{},\"pose_animation\":{},\"health_ratio\":{},\"health_scale\":{},\"nearby_scorpions\":{}}}",
            self.tick,
            self.player_position.x,
            self.player_position.y,
            self.player_position.plane,
            self.animation,
            self.pose_animation,
            self.health_ratio,
            self.health_scale,
            self.nearby_json
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads one escaped string body back, stopping at the first unescaped quote.
    fn unescape_until_quote(escaped: &str) -> (String, usize) {
        let mut out = String::new();
        let mut chars = escaped.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, next)) = chars.next() {
                        out.push(next);
                    }
                }
                '"' => return (out, i),
                _ => out.push(c),
            }
        }
        (out, escaped.len())
    }

    #[test]
    fn escape_round_trips() {
        for raw in ["plain", "say \"hi\"", "back\\slash", "\\\"mixed\\\"", ""] {
            let wire = format!("{}\"trailing", escape_json(raw));
            let (recovered, quote_at) = unescape_until_quote(&wire);
            assert_eq!(recovered, raw);
            assert_eq!(&wire[quote_at..], "\"trailing");
        }
    }

    #[test]
    fn escape_leaves_other_characters() {
        assert_eq!(escape_json("a/b\tc"), "a/b\tc");
        assert_eq!(escape_json("\"\\"), "\\\"\\\\");
    }

    #[test]
    fn snapshot_json_has_fixed_shape() {
        let scan = ScanResult {
            entities: vec![ScanEntity {
                id: 3024,
                index: 4,
                name: "Scorpion \"Boss\"".to_string(),
                position: Position::new(101, 100, 0),
                distance: 1,
            }],
            nearest: None,
        };
        let player = PlayerState {
            position: Some(Position::new(100, 100, 0)),
            animation: -1,
            pose_animation: 808,
            health_ratio: 30,
            health_scale: 30,
        };
        let snapshot = TickSnapshot::new(17, Position::new(100, 100, 0), &player, &scan);

        assert_eq!(
            snapshot.to_json(),
            "{\"tick\":17,\"player_pos\":[100,100],\"plane\":0,\"animation\":-1,\"pose_animation\":808,\"health_ratio\":30,\"health_scale\":30,\"nearby_scorpions\":[{\"id\":3024,\"name\":\"Scorpion \\\"Boss\\\"\",\"pos\":[101,100],\"distance\":1}]}"
        );
    }

    #[test]
    fn empty_scan_serializes_empty_array() {
        assert_eq!(entities_json(&[]), "[]");
    }
}
