use core::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeError {
    EmptyMarker,
    InvalidRadius { radius: i32 },
    InvalidEntityCap { cap: usize },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMarker => write!(f, "target name marker must not be empty"),
            Self::InvalidRadius { radius } => {
                write!(f, "scan radius must be positive, got {radius}")
            }
            Self::InvalidEntityCap { cap } => {
                write!(f, "per-tick entity cap must be positive, got {cap}")
            }
        }
    }
}

impl std::error::Error for BridgeError {}
