use std::net::SocketAddr;

use clap::Parser;

use crate::server::session::{DEFAULT_BROADCAST_CAPACITY, DEFAULT_COMMAND_CAPACITY};
use crate::server::ServerConfig;

/// Process configuration, from flags with environment fallbacks.
#[derive(Debug, Parser)]
#[command(name = "andar-bahar-server", about = "Live Andar Bahar game server")]
pub struct AppConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Command mailbox depth before senders backpressure.
    #[arg(long, env = "COMMAND_CAPACITY", default_value_t = DEFAULT_COMMAND_CAPACITY)]
    pub command_capacity: usize,

    /// Broadcast ring size per subscriber before a forced resync.
    #[arg(long, env = "BROADCAST_CAPACITY", default_value_t = DEFAULT_BROADCAST_CAPACITY)]
    pub broadcast_capacity: usize,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl AppConfig {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            command_capacity: self.command_capacity,
            broadcast_capacity: self.broadcast_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_without_flags() {
        let config = AppConfig::parse_from(["andar-bahar-server"]);
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.command_capacity, DEFAULT_COMMAND_CAPACITY);
        assert!(!config.log_json);
    }

    #[test]
    fn flags_override_defaults() {
        let config = AppConfig::parse_from([
            "andar-bahar-server",
            "--bind",
            "0.0.0.0:9000",
            "--broadcast-capacity",
            "64",
            "--log-json",
        ]);
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.broadcast_capacity, 64);
        assert!(config.log_json);
    }
}
