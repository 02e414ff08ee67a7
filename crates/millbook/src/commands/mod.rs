//! Command handlers, one module per command group.

pub mod config_cmd;
pub mod records;
pub mod util;
