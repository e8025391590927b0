pub mod browse;
pub mod cli;
pub mod context;
pub mod sessions_cmd;

pub use cli::{Cli, Command};
pub use context::AppContext;
