pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod scanner;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use pipeline::{analyze, ingest, IngestPlan, PipelineKind};
pub use ui::{ConsoleUi, Phase, SilentUi, Ui};
