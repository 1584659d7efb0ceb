pub mod cli;
pub mod config;
pub mod download;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod reference;
pub mod schema;
pub mod store;
pub mod transform;

pub use cli::{Cli, Commands};
pub use config::MainConfig;
pub use orchestrator::{Orchestrator, RunSummary};
