//! Process-wide state shared by the generator, the watcher and the server.

mod publish;
mod state;

pub use publish::PublishGate;
pub use state::{is_shutdown, register_server, request_shutdown, setup_shutdown_handler};
