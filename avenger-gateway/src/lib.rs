pub mod commands;
pub mod discord;
pub mod flush;
pub mod logging;
pub mod render;
pub mod server;
pub mod shutdown;
pub mod state;

pub use state::AppState;
