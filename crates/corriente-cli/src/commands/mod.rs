//! CLI subcommand implementations.

pub mod crc;
pub mod frame;
pub mod modem;
