//! Top-down view of the road network and the live actors on it.

use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use sim_client::{Actor, Client, Location, RoadNetwork, TickSubscription, Waypoint, WorldQuery};
use tracing::{debug, info, trace};

use crate::error::ViewerError;
use crate::hud::ServerTick;
use crate::module::{FrameContext, Module};
use crate::surface::{Color, Surface};
use crate::view::ViewState;
use crate::{BASE_HEIGHT, BASE_WIDTH};

/// Waypoint spacing for the map skeleton, in meters.
pub const MAP_WAYPOINT_DISTANCE: f64 = 10.0;
pub const MARKER_RADIUS: f32 = 2.0;
const MARKER_WIDTH: f32 = 1.0;
const MAP_LINE_WIDTH: f32 = 1.0;

/// Actor type substrings and the color their markers are drawn in. Checked
/// in this order; an actor matching several is drawn once per match.
pub const FILTERS: [(&str, Color); 3] = [
    ("vehicle", Color::RED),
    ("traffic_light", Color::GREEN),
    ("speed_limit", Color::BLUE),
];

/// World position to surface pixel. Drops `z` and truncates toward zero.
pub fn project(location: &Location) -> (i32, i32) {
    (location.x as i32, location.y as i32)
}

/// Map skeleton as one polyline, in the order the waypoints were generated.
pub fn map_polyline(waypoints: &[Waypoint]) -> Vec<(i32, i32)> {
    waypoints
        .iter()
        .map(|wp| project(&wp.transform.location))
        .collect()
}

/// Marker color and position for every (filter, actor) match.
pub fn filter_markers(actors: &[Actor]) -> Vec<(Color, (i32, i32))> {
    FILTERS
        .iter()
        .flat_map(|&(filter, color)| {
            actors
                .iter()
                .filter(move |actor| actor.type_id.contains(filter))
                .map(move |actor| (color, project(&actor.location)))
        })
        .collect()
}

/// On-screen size of the world surface under `view`, or `None` when the
/// zoom leaves nothing to draw.
pub fn scaled_size(view: &ViewState) -> Option<(u32, u32)> {
    let (w, h) = view.scaled_size((BASE_WIDTH, BASE_HEIGHT));
    if w <= 0 || h <= 0 {
        return None;
    }
    Some((w as u32, h as u32))
}

pub struct WorldView<W: WorldQuery> {
    name: String,
    world: W,
    surface: Surface,
    subscription: TickSubscription,
}

impl WorldView<sim_client::World> {
    /// Connect to a simulator and subscribe to its ticks. Every failure here
    /// is reported as [`ViewerError::Connect`].
    pub fn connect(
        name: impl Into<String>,
        host: &str,
        port: u16,
        timeout: Duration,
        surface: Surface,
        sink: Sender<ServerTick>,
    ) -> Result<Self, ViewerError> {
        let address = format!("{host}:{port}");
        let connect_error = |source| ViewerError::Connect {
            address: address.clone(),
            source,
        };
        let client = Client::connect(host, port, timeout).map_err(connect_error)?;
        let world = client.world().map_err(connect_error)?;
        info!(
            address = client.address(),
            map = %world.info().map_name,
            "attached to world {}",
            world.id()
        );
        Self::new(name, world, surface, sink).map_err(|e| match e {
            ViewerError::Simulator(source) => connect_error(source),
            other => other,
        })
    }
}

impl<W: WorldQuery> WorldView<W> {
    /// Draw `world` into `surface` and forward its ticks to `sink`.
    pub fn new(
        name: impl Into<String>,
        world: W,
        surface: Surface,
        sink: Sender<ServerTick>,
    ) -> Result<Self, ViewerError> {
        let subscription = world.on_tick(move |timestamp| {
            match sink.try_send(ServerTick::now(timestamp)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => trace!(frame = timestamp.frame, "tick dropped"),
                Err(TrySendError::Disconnected(_)) => {}
            }
        })?;
        Ok(Self {
            name: name.into(),
            world,
            surface,
            subscription,
        })
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    /// The unscaled world surface as of the last render.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    fn draw_world(&mut self) -> Result<(), ViewerError> {
        let actors = self.world.actors()?;
        let map = self.world.map()?;

        self.surface.fill(Color::BLACK);

        let waypoints = map.generate_waypoints(MAP_WAYPOINT_DISTANCE)?;
        let polyline = map_polyline(&waypoints);
        if polyline.len() < 2 {
            debug!(map = map.name(), waypoints = polyline.len(), "map too small to draw");
        } else {
            self.surface.draw_lines(Color::MAGENTA, &polyline, MAP_LINE_WIDTH);
        }

        for (color, center) in filter_markers(&actors) {
            self.surface.draw_circle(color, center, MARKER_RADIUS, MARKER_WIDTH);
        }
        Ok(())
    }
}

impl<W: WorldQuery> Module for WorldView<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, _ctx: &mut FrameContext) {}

    fn render(&mut self, ctx: &FrameContext, surface: &mut Surface) -> Result<(), ViewerError> {
        self.draw_world()?;
        let view = &ctx.view;
        match scaled_size(view) {
            Some(size) => {
                surface.blit_scaled(&self.surface, (view.offset_x, view.offset_y), size)
            }
            None => trace!(scale_x = view.scale_x, scale_y = view.scale_y, "world hidden"),
        }
        Ok(())
    }
}

impl<W: WorldQuery> Drop for WorldView<W> {
    fn drop(&mut self) {
        self.subscription.cancel();
        debug!(module = %self.name, "world view dropped");
    }
}
