//! Frame loop driver: owns the modules, the frame context and the display
//! surface. Presentation is left to the caller.

use crossbeam_channel::Sender;
use sim_client::WorldQuery;
use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::font::HudFont;
use crate::hud::{Hud, ServerTick};
use crate::input::{InputHandler, InputQueue};
use crate::module::{
    FrameContext, MODULE_HUD, MODULE_INPUT, MODULE_WORLD, Module, ModuleRegistry, ShutdownReason,
};
use crate::surface::Surface;
use crate::world::WorldView;
use crate::TARGET_FPS;

/// Outcome of one pass of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The display surface holds a new frame.
    Presented,
    /// A module asked to stop. Nothing was rendered.
    Shutdown(ShutdownReason),
}

pub struct Visualizer {
    registry: ModuleRegistry,
    ctx: FrameContext,
    display: Surface,
    frame_cap: Option<u32>,
}

impl Visualizer {
    /// An empty visualizer drawing into a `width` x `height` display.
    pub fn new(width: u32, height: u32) -> Result<Self, ViewerError> {
        Ok(Self {
            registry: ModuleRegistry::new(),
            ctx: FrameContext::new(),
            display: Surface::new(width, height)?,
            frame_cap: Some(TARGET_FPS),
        })
    }

    /// Connect to the simulator described by `config` and register the
    /// input handler, HUD and world view.
    pub fn connect(config: &ViewerConfig, font: Option<HudFont>) -> Result<Self, ViewerError> {
        let mut visualizer = Self::new(config.width, config.height)?;
        let sink = visualizer.register_overlays(font)?;
        let world = WorldView::connect(
            MODULE_WORLD,
            &config.host,
            config.port,
            config.timeout,
            Surface::new(config.width, config.height)?,
            sink,
        )?;
        visualizer.register(Box::new(world));
        Ok(visualizer)
    }

    /// Like [`Visualizer::connect`], for an already attached world.
    pub fn with_world<W>(
        width: u32,
        height: u32,
        world: W,
        font: Option<HudFont>,
    ) -> Result<Self, ViewerError>
    where
        W: WorldQuery + 'static,
    {
        let mut visualizer = Self::new(width, height)?;
        let sink = visualizer.register_overlays(font)?;
        let world = WorldView::new(MODULE_WORLD, world, Surface::new(width, height)?, sink)?;
        visualizer.register(Box::new(world));
        Ok(visualizer)
    }

    /// Register input and HUD, returning where the world view should send
    /// server ticks.
    fn register_overlays(
        &mut self,
        font: Option<HudFont>,
    ) -> Result<Sender<ServerTick>, ViewerError> {
        let height = self.display.height();
        self.register(Box::new(InputHandler::new(MODULE_INPUT)));
        self.register(Box::new(Hud::new(MODULE_HUD, height, font)?));
        self.registry
            .find(MODULE_HUD)
            .and_then(|hud| hud.server_tick_sink())
            .ok_or(ViewerError::MissingModule(MODULE_HUD))
    }

    pub fn register(&mut self, module: Box<dyn Module>) {
        self.registry.register(module);
    }

    pub fn modules(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Frame rate cap for [`Visualizer::frame`]. `None` runs unthrottled.
    pub fn set_frame_cap(&mut self, cap: Option<u32>) {
        self.frame_cap = cap;
    }

    /// Where the window layer queues input for the next frame.
    pub fn input_mut(&mut self) -> &mut InputQueue {
        &mut self.ctx.input
    }

    pub fn context(&self) -> &FrameContext {
        &self.ctx
    }

    pub fn display(&self) -> &Surface {
        &self.display
    }

    /// Stop at the start of the next frame.
    pub fn interrupt(&mut self) {
        self.ctx.request_shutdown(ShutdownReason::Interrupted);
    }

    /// Run one frame: wait for the frame cap, tick every module, then
    /// render into the display surface unless a shutdown was requested.
    pub fn frame(&mut self) -> Result<FrameStatus, ViewerError> {
        self.ctx.clock.tick(self.frame_cap);
        self.registry.tick_all(&mut self.ctx);
        if let Some(reason) = self.ctx.take_shutdown() {
            debug!(?reason, "shutdown requested");
            return Ok(FrameStatus::Shutdown(reason));
        }
        self.registry.render_all(&self.ctx, &mut self.display)?;
        Ok(FrameStatus::Presented)
    }

    /// Drop every module. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        info!(
            modules = self.registry.len(),
            frames = self.ctx.clock.frames(),
            "shutting down"
        );
        self.registry.clear();
    }
}
