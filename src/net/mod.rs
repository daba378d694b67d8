//! Stream transport: framing, dispatch and fan-out

pub mod broadcast;
pub mod framing;
pub mod handler;
pub mod listener;
pub mod protocol;
pub mod registry;

pub use listener::run_acceptor;
pub use registry::{Connection, ConnectionRegistry, Connections};
