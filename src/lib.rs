//! Andar Bahar live game server.
//!
//! A physical dealer drives the table through typed commands; the server
//! owns the authoritative session state machine, the betting ledger, and
//! winner resolution, and streams sequence-numbered events to every
//! connected client.

pub mod cards;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod server;
pub mod store;
