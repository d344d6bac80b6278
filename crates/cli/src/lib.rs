pub mod client;
pub mod extended;
pub mod status;

#[cfg(test)]
pub(crate) mod fixtures;

pub use client::{CliGateway, CommandOutput, CommandRunner, Elevation, Subcommand, SystemRunner};
pub use extended::extract;
pub use status::parse_status;
