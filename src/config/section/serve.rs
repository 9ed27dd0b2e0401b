//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 8000                 # HTTP port number
//! wait = 500                  # Debounce wait before a rebuild, in milliseconds
//! log = true                  # Log each request
//! reload = true               # Watch sources and reload the browser
//! open = true                 # Open the browser after the first build
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Debounce wait in milliseconds.
    pub wait: u64,

    /// Log requests.
    pub log: bool,

    /// Watch sources, rebuild, and reload connected browsers.
    pub reload: bool,

    /// Open the served URL in the system browser.
    pub open: bool,
}

impl ServeConfig {
    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait)
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8000,
            wait: 500,
            log: true,
            reload: true,
            open: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    use std::time::Duration;

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nwait = 250\nreload = false",
        );

        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.wait_duration(), Duration::from_millis(250));
        assert!(!config.serve.reload);
        assert!(config.serve.log);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(config.serve.port, 8000);
        assert_eq!(config.serve.wait, 500);
        assert!(config.serve.log && config.serve.reload && config.serve.open);
    }

    #[test]
    fn test_serve_config_ipv6() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }
}
