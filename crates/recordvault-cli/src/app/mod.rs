//! Application context and secret handling for the CLI.

mod context;
pub mod secrets;

pub use context::AppContext;
