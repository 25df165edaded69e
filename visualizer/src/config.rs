use std::path::PathBuf;
use std::time::Duration;

use crate::error::ViewerError;
use crate::{BASE_HEIGHT, BASE_WIDTH};

/// How long to wait for the simulator before giving up.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Visualizer settings, built from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub host: String,
    pub port: u16,
    pub width: u32,
    pub height: u32,
    pub verbose: bool,
    /// Monospace font for the HUD. Searched for in the system font
    /// directories when unset.
    pub font: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: sim_client::DEFAULT_PORT,
            width: BASE_WIDTH,
            height: BASE_HEIGHT,
            verbose: false,
            font: None,
            timeout: CONNECT_TIMEOUT,
        }
    }
}

impl ViewerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the `clap` application describing the command line.
    #[cfg(feature = "bin")]
    pub fn cli() -> clap::App<'static, 'static> {
        use clap::{App, Arg};

        App::new(crate::DESCRIPTION)
            .version(env!("CARGO_PKG_VERSION"))
            .about("Draws the simulator's road map and actors from above without rendering the scene")
            .arg(
                Arg::with_name("HOST")
                    .help("IP of the host server")
                    .long("host")
                    .value_name("H")
                    .takes_value(true)
                    .default_value("127.0.0.1"),
            )
            .arg(
                Arg::with_name("PORT")
                    .help("TCP port to listen to")
                    .short("p")
                    .long("port")
                    .value_name("P")
                    .takes_value(true)
                    .default_value("2000"),
            )
            .arg(
                Arg::with_name("RES")
                    .help("Window resolution")
                    .long("res")
                    .value_name("WIDTHxHEIGHT")
                    .takes_value(true)
                    .default_value("1280x720"),
            )
            .arg(
                Arg::with_name("VERBOSE")
                    .help("Print debug information")
                    .short("v")
                    .long("verbose"),
            )
            .arg(
                Arg::with_name("FONT")
                    .help("Monospace TTF/OTF font used for the HUD")
                    .long("font")
                    .value_name("PATH")
                    .takes_value(true),
            )
    }

    #[cfg(feature = "bin")]
    pub fn from_matches(matches: &clap::ArgMatches<'_>) -> Result<Self, ViewerError> {
        let defaults = Self::default();
        let host = matches
            .value_of("HOST")
            .map(str::to_string)
            .unwrap_or(defaults.host);
        let port = match matches.value_of("PORT") {
            Some(port) => parse_port(port)?,
            None => defaults.port,
        };
        let (width, height) = match matches.value_of("RES") {
            Some(res) => parse_resolution(res)?,
            None => (defaults.width, defaults.height),
        };
        Ok(Self {
            host,
            port,
            width,
            height,
            verbose: matches.is_present("VERBOSE"),
            font: matches.value_of("FONT").map(PathBuf::from),
            timeout: defaults.timeout,
        })
    }
}

pub fn parse_port(value: &str) -> Result<u16, ViewerError> {
    value.trim().parse().map_err(|_| ViewerError::InvalidArgument {
        name: "--port",
        value: value.to_string(),
    })
}

/// Parse `WIDTHxHEIGHT` into two positive integers.
pub fn parse_resolution(value: &str) -> Result<(u32, u32), ViewerError> {
    let invalid = || ViewerError::InvalidArgument {
        name: "--res",
        value: value.to_string(),
    };
    let mut parts = value.split('x');
    let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parses_width_and_height() {
        assert_eq!(parse_resolution("800x600").unwrap(), (800, 600));
        assert_eq!(parse_resolution("1280x720").unwrap(), (1280, 720));
    }

    #[test]
    fn malformed_resolution_is_rejected() {
        for bad in ["800", "800x", "x600", "800x600x2", "0x600", "800x-1", "axb", ""] {
            assert!(
                matches!(
                    parse_resolution(bad),
                    Err(ViewerError::InvalidArgument { name: "--res", .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn port_must_fit_u16() {
        assert_eq!(parse_port("2000").unwrap(), 2000);
        assert!(parse_port("65536").is_err());
        assert!(parse_port("port").is_err());
    }

    #[test]
    fn defaults_match_the_simulator() {
        let config = ViewerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:2000");
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[cfg(feature = "bin")]
    #[test]
    fn command_line_overrides_defaults() {
        let matches = ViewerConfig::cli()
            .get_matches_from_safe(vec![
                "visualizer",
                "--host",
                "10.0.0.5",
                "-p",
                "3000",
                "--res",
                "800x600",
                "-v",
                "--font",
                "/tmp/mono.ttf",
            ])
            .unwrap();
        let config = ViewerConfig::from_matches(&matches).unwrap();
        assert_eq!(config.address(), "10.0.0.5:3000");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(config.verbose);
        assert_eq!(config.font, Some(PathBuf::from("/tmp/mono.ttf")));
    }

    #[cfg(feature = "bin")]
    #[test]
    fn command_line_defaults() {
        let matches = ViewerConfig::cli()
            .get_matches_from_safe(vec!["visualizer"])
            .unwrap();
        assert_eq!(
            ViewerConfig::from_matches(&matches).unwrap(),
            ViewerConfig::default()
        );
    }

    #[cfg(feature = "bin")]
    #[test]
    fn bad_resolution_on_command_line() {
        let matches = ViewerConfig::cli()
            .get_matches_from_safe(vec!["visualizer", "--res", "wide"])
            .unwrap();
        assert!(ViewerConfig::from_matches(&matches).is_err());
    }
}
