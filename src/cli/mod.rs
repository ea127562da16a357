pub mod args;
pub mod commands;

pub use args::{AggregateArgs, Cli, Commands, ResolveArgs};
pub use commands::run;
