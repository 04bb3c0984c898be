//! Public library modules for the CLI crate
pub mod records;
pub mod watch;
