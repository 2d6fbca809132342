//! Shared conversion helpers.

pub mod filetime;

#[cfg(windows)]
pub mod wstr;
