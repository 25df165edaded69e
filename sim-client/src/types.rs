use serde::{Deserialize, Serialize};

/// World-space position in simulator units (meters).
/// X = forward/east, Y = right/south, Z = up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub location: Location,
    #[serde(default)]
    pub rotation: Rotation,
}

/// A simulated entity as seen in one world snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: u32,
    /// Blueprint identifier, e.g. `vehicle.tesla.model3` or
    /// `traffic.traffic_light`.
    pub type_id: String,
    pub location: Location,
}

impl Actor {
    pub fn location(&self) -> Location {
        self.location
    }
}

/// Sampled point on a lane centerline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub transform: Transform,
}

/// Server-side timing information attached to every simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timestamp {
    /// Number of frames elapsed since the simulator was launched.
    pub frame: u64,
    /// Simulated seconds since the current episode started.
    pub elapsed_seconds: f64,
    /// Simulated seconds since the previous frame.
    pub delta_seconds: f64,
    /// Wall-clock seconds on the server when the frame was produced.
    pub platform_timestamp: f64,
}

/// Result of the world handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldInfo {
    pub episode_id: u64,
    pub map_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MapInfo {
    pub name: String,
}
