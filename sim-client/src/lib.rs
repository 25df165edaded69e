pub mod client;
mod error;
mod protocol;
pub mod subscription;
pub mod types;

pub use client::{Client, Map, RoadNetwork, World, WorldQuery};
pub use error::*;
pub use subscription::{TickSubscription, TickToken};
pub use types::{Actor, Location, Rotation, Timestamp, Transform, Waypoint, WorldInfo};

/// Port the simulator listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 2000;
