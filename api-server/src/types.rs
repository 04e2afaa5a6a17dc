use std::fmt;

use actix_web::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ActionKind {
    Attack,
    AutoAttack,
}

impl ActionKind {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "attack" => Some(Self::Attack),
            "auto_attack" => Some(Self::AutoAttack),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::AutoAttack => "auto_attack",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ActionCommand {
    pub(crate) kind: ActionKind,
    pub(crate) target_id: Option<i32>,
}

/// Why an action request was turned away. Each variant is one wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionRejection {
    MethodNotAllowed,
    InvalidToken,
    MissingKind,
    InvalidTargetId,
    UnsupportedKind,
    Internal,
}

impl ActionRejection {
    pub(crate) fn status(self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::MissingKind | Self::InvalidTargetId | Self::UnsupportedKind => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn code(self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::InvalidToken => "invalid_action_token",
            Self::MissingKind => "missing_kind",
            Self::InvalidTargetId => "invalid_target_id",
            Self::UnsupportedKind => "unsupported_kind",
            Self::Internal => "action_error",
        }
    }
}

impl fmt::Display for ActionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl ActionCommand {
    /// Decodes a request body.
    ///
    /// Checks run in wire order: `kind` must be present as a non-empty string, then a
    /// present, non-null `target_id` must be a 32-bit integer, then `kind`
    /// must name a supported action. A body that is not a JSON object carries
    /// no `kind`.
    pub(crate) fn decode(body: &[u8]) -> Result<Self, ActionRejection> {
        let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let fields = parsed.as_object();

        let kind = fields
            .and_then(|fields| fields.get("kind"))
            .and_then(Value::as_str)
            .filter(|kind| !kind.is_empty())
            .ok_or(ActionRejection::MissingKind)?;

        let target_id = match fields.and_then(|fields| fields.get("target_id")) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_i64()
                    .and_then(|id| i32::try_from(id).ok())
                    .ok_or(ActionRejection::InvalidTargetId)?,
            ),
        };

        let kind = ActionKind::parse(kind).ok_or(ActionRejection::UnsupportedKind)?;
        Ok(Self { kind, target_id })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) service: &'static str,
    pub(crate) pending_commands: usize,
    pub(crate) auth_required: bool,
    pub(crate) nearby_count: usize,
    pub(crate) nearest_distance: Option<i32>,
    pub(crate) recommendation: &'static str,
}
