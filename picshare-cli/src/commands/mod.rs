//! Subcommand implementations

pub mod provision;
pub mod serve;

pub use provision::{run_provision, ProvisionArgs};
pub use serve::{run_serve, ServeArgs};
