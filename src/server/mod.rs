//! HTTP/WebSocket surface and the authoritative session task.

pub mod bootstrap;
pub mod commands;
pub mod dto;
pub mod events;
pub mod logging;
pub mod routes;
pub mod session;
pub mod ws;

pub use bootstrap::{run_server, ServerConfig};
pub use commands::{BettorCommand, ClientCommand, DealerCommand};
pub use dto::SessionSnapshot;
pub use events::{CommandReply, EventEnvelope, ServerEvent};
pub use routes::{GameServer, ServerContext};
pub use session::{SessionHandle, SessionServiceConfig};
