//! Command implementations

pub mod flash;
pub mod list;
