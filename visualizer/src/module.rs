//! Tick/render participants and the registry that drives them.

use crossbeam_channel::Sender;
use tracing::debug;

use crate::clock::FrameClock;
use crate::error::ViewerError;
use crate::hud::ServerTick;
use crate::input::InputQueue;
use crate::surface::{Color, Surface};
use crate::view::ViewState;

pub const MODULE_WORLD: &str = "World";
pub const MODULE_HUD: &str = "Hud";
pub const MODULE_INPUT: &str = "Input";

/// Why the frame loop is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Escape or the window close button.
    UserQuit,
    /// Keyboard interrupt in the controlling terminal.
    Interrupted,
}

/// Per-frame state shared by every module. Owned by the main loop.
#[derive(Debug, Default)]
pub struct FrameContext {
    pub clock: FrameClock,
    pub view: ViewState,
    pub input: InputQueue,
    shutdown: Option<ShutdownReason>,
}

impl FrameContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the main loop to stop after the current tick pass. The first
    /// request wins.
    pub fn request_shutdown(&mut self, reason: ShutdownReason) {
        self.shutdown.get_or_insert(reason);
    }

    pub fn shutdown_requested(&self) -> Option<ShutdownReason> {
        self.shutdown
    }

    pub fn take_shutdown(&mut self) -> Option<ShutdownReason> {
        self.shutdown.take()
    }
}

/// A participant in the frame loop.
pub trait Module {
    fn name(&self) -> &str;

    /// Update state. Runs once per frame before any module renders.
    fn tick(&mut self, ctx: &mut FrameContext);

    /// Draw onto `surface`. Errors abort the frame and stop the loop.
    fn render(&mut self, ctx: &FrameContext, surface: &mut Surface) -> Result<(), ViewerError>;

    /// Where to deliver server tick notifications, for modules that consume
    /// them.
    fn server_tick_sink(&self) -> Option<Sender<ServerTick>> {
        None
    }
}

/// Flat, ordered list of modules.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Box<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: Box<dyn Module>) {
        debug!(module = module.name(), "registered module");
        self.modules.push(module);
    }

    /// Drop every module.
    pub fn clear(&mut self) {
        self.modules.clear();
    }

    pub fn tick_all(&mut self, ctx: &mut FrameContext) {
        for module in &mut self.modules {
            module.tick(ctx);
        }
    }

    /// Clear `surface` to black, then let every module draw in registration
    /// order.
    pub fn render_all(
        &mut self,
        ctx: &FrameContext,
        surface: &mut Surface,
    ) -> Result<(), ViewerError> {
        surface.fill(Color::BLACK);
        for module in &mut self.modules {
            module.render(ctx, surface)?;
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&dyn Module> {
        self.modules
            .iter()
            .find(|m| m.name() == name)
            .map(|m| &**m)
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        fail_render: bool,
    }

    impl Module for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn tick(&mut self, _ctx: &mut FrameContext) {
            self.log.borrow_mut().push(format!("tick {}", self.name));
        }

        fn render(
            &mut self,
            _ctx: &FrameContext,
            _surface: &mut Surface,
        ) -> Result<(), ViewerError> {
            self.log.borrow_mut().push(format!("render {}", self.name));
            if self.fail_render {
                return Err(ViewerError::MissingModule("probe"));
            }
            Ok(())
        }
    }

    fn probe(name: &'static str, log: &Log) -> Box<dyn Module> {
        Box::new(Probe {
            name,
            log: Rc::clone(log),
            fail_render: false,
        })
    }

    #[test]
    fn passes_run_in_registration_order() {
        let log = Log::default();
        let mut registry = ModuleRegistry::new();
        registry.register(probe("Input", &log));
        registry.register(probe("Hud", &log));
        registry.register(probe("World", &log));

        let mut ctx = FrameContext::new();
        let mut surface = Surface::new(4, 4).unwrap();
        surface.fill(Color::WHITE);
        registry.tick_all(&mut ctx);
        registry.render_all(&ctx, &mut surface).unwrap();

        assert_eq!(
            *log.borrow(),
            [
                "tick Input",
                "tick Hud",
                "tick World",
                "render Input",
                "render Hud",
                "render World",
            ]
        );
        assert_eq!(surface.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn render_error_stops_the_pass() {
        let log = Log::default();
        let mut registry = ModuleRegistry::new();
        registry.register(Box::new(Probe {
            name: "World",
            log: Rc::clone(&log),
            fail_render: true,
        }));
        registry.register(probe("Hud", &log));

        let ctx = FrameContext::new();
        let mut surface = Surface::new(4, 4).unwrap();
        assert!(registry.render_all(&ctx, &mut surface).is_err());
        assert_eq!(*log.borrow(), ["render World"]);
    }

    #[test]
    fn find_returns_first_match() {
        let log = Log::default();
        let mut registry = ModuleRegistry::new();
        registry.register(probe("Hud", &log));
        registry.register(probe("Hud", &log));
        registry.register(probe("World", &log));

        assert_eq!(registry.find("World").map(|m| m.name()), Some("World"));
        assert!(registry.find("Input").is_none());
        assert_eq!(registry.names(), ["Hud", "Hud", "World"]);
    }

    #[test]
    fn clear_empties_registry() {
        let log = Log::default();
        let mut registry = ModuleRegistry::new();
        registry.register(probe("Input", &log));
        assert_eq!(registry.len(), 1);
        registry.clear();
        assert!(registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn first_shutdown_request_wins() {
        let mut ctx = FrameContext::new();
        assert_eq!(ctx.shutdown_requested(), None);
        ctx.request_shutdown(ShutdownReason::Interrupted);
        ctx.request_shutdown(ShutdownReason::UserQuit);
        assert_eq!(ctx.take_shutdown(), Some(ShutdownReason::Interrupted));
        assert_eq!(ctx.take_shutdown(), None);
    }
}
