pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod font;
pub mod hud;
pub mod input;
pub mod module;
pub mod surface;
pub mod view;
#[cfg(feature = "window")]
pub mod window;
pub mod world;

/// Size the world surface is scaled from before zoom is applied.
pub const BASE_WIDTH: u32 = 1280;
pub const BASE_HEIGHT: u32 = 720;
/// Upper bound on client frames per second.
pub const TARGET_FPS: u32 = 60;
/// Window caption and `--help` description.
pub const DESCRIPTION: &str = "No Rendering Mode Visualizer";

pub use app::{FrameStatus, Visualizer};
pub use config::ViewerConfig;
pub use error::ViewerError;
pub use module::{FrameContext, Module, ModuleRegistry, ShutdownReason};
pub use surface::{Color, Surface};
pub use view::ViewState;
