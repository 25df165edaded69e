use std::fmt;

use sim_client::SimError;

/// Errors raised while building or driving the visualizer.
#[derive(Debug)]
pub enum ViewerError {
    /// Could not reach the simulator at start-up.
    Connect { address: String, source: SimError },
    /// A world, actor or map query failed mid-session.
    Simulator(SimError),
    /// A drawing surface could not be allocated.
    Surface { width: u32, height: u32 },
    /// HUD font could not be loaded.
    Font(String),
    /// A module another module depends on is not registered.
    MissingModule(&'static str),
    /// A command line value could not be parsed.
    InvalidArgument { name: &'static str, value: String },
    Io(std::io::Error),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { address, source } => {
                write!(f, "failed connecting to simulator server at {address}: {source}")
            }
            Self::Simulator(e) => write!(f, "simulator query failed: {e}"),
            Self::Surface { width, height } => {
                write!(f, "cannot create a {width}x{height} surface")
            }
            Self::Font(msg) => write!(f, "font error: {msg}"),
            Self::MissingModule(name) => write!(f, "module `{name}` is not registered"),
            Self::InvalidArgument { name, value } => {
                write!(f, "invalid value for {name}: `{value}`")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect { source, .. } => Some(source),
            Self::Simulator(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SimError> for ViewerError {
    fn from(e: SimError) -> Self {
        Self::Simulator(e)
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
