use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::SimError;
use crate::protocol::{Connection, Endpoint, NoParams};
use crate::subscription::{self, TickSubscription};
use crate::types::{Actor, MapInfo, Timestamp, Waypoint, WorldInfo};

/// Road network of the loaded map.
pub trait RoadNetwork {
    /// Map name as reported by the simulator (e.g. `Town01`).
    fn name(&self) -> &str;

    /// Sample lane centerlines every `distance` meters.
    fn generate_waypoints(&self, distance: f64) -> Result<Vec<Waypoint>, SimError>;
}

/// Readonly view into the simulator's world state.
///
/// The visualizer only talks to the world through this trait, so it can be
/// driven by something other than a live connection.
pub trait WorldQuery {
    type Map: RoadNetwork;

    /// Snapshot of every actor currently alive in the world.
    fn actors(&self) -> Result<Vec<Actor>, SimError>;

    /// Handle to the static road map.
    fn map(&self) -> Result<Self::Map, SimError>;

    /// Register `callback` for every server tick.
    ///
    /// The callback runs on a different thread than the caller. It stops
    /// firing once the returned subscription is cancelled or dropped.
    fn on_tick<F>(&self, callback: F) -> Result<TickSubscription, SimError>
    where
        F: FnMut(Timestamp) + Send + 'static;
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, SimError> {
    conn.lock().map_err(|_| SimError::Poisoned)
}

/// Connection to a simulator server.
pub struct Client {
    endpoint: Endpoint,
    conn: Arc<Mutex<Connection>>,
}

impl Client {
    /// Connect to `host:port`. `timeout` bounds the connect itself and every
    /// later query on this connection.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, SimError> {
        let endpoint = Endpoint::resolve(host, port, timeout)?;
        let conn = Connection::open(&endpoint)?;
        info!(address = %endpoint.address, "connected to simulator");
        Ok(Self {
            endpoint,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn address(&self) -> &str {
        &self.endpoint.address
    }

    /// Fetch the world currently running on the server.
    pub fn world(&self) -> Result<World, SimError> {
        let info: WorldInfo = lock(&self.conn)?.call("get_world", NoParams {})?;
        debug!(episode = info.episode_id, map = %info.map_name, "world handshake");
        Ok(World {
            endpoint: self.endpoint.clone(),
            conn: Arc::clone(&self.conn),
            info,
        })
    }
}

/// Handle to the simulated world. Cheap to query repeatedly; nothing is
/// cached between calls.
pub struct World {
    endpoint: Endpoint,
    conn: Arc<Mutex<Connection>>,
    info: WorldInfo,
}

impl World {
    pub fn id(&self) -> u64 {
        self.info.episode_id
    }

    pub fn info(&self) -> &WorldInfo {
        &self.info
    }
}

impl WorldQuery for World {
    type Map = Map;

    fn actors(&self) -> Result<Vec<Actor>, SimError> {
        lock(&self.conn)?.call("get_actors", NoParams {})
    }

    fn map(&self) -> Result<Map, SimError> {
        let info: MapInfo = lock(&self.conn)?.call("get_map", NoParams {})?;
        Ok(Map {
            name: info.name,
            conn: Arc::clone(&self.conn),
        })
    }

    fn on_tick<F>(&self, callback: F) -> Result<TickSubscription, SimError>
    where
        F: FnMut(Timestamp) + Send + 'static,
    {
        subscription::spawn(&self.endpoint, callback)
    }
}

pub struct Map {
    name: String,
    conn: Arc<Mutex<Connection>>,
}

impl RoadNetwork for Map {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_waypoints(&self, distance: f64) -> Result<Vec<Waypoint>, SimError> {
        #[derive(Serialize)]
        struct Params {
            distance: f64,
        }
        lock(&self.conn)?.call("generate_waypoints", Params { distance })
    }
}
