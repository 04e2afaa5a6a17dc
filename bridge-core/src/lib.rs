pub mod constants;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod motion;
pub mod overlay;
pub mod provider;
pub mod scan;
pub mod select;
pub mod sim;
pub mod snapshot;

pub use error::BridgeError;
pub use geometry::{Position, ScreenPoint, ScreenRect};
pub use provider::{
    CommandSink, EntityProvider, GameHost, InputDriver, MenuCommand, NpcComposition, NpcOption,
    NpcView, PlayerState,
};
pub use scan::{ScanEntity, ScanPolicy, ScanResult, WorldScanner};
pub use select::TargetSelector;
pub use snapshot::TickSnapshot;
