//! # Storage Layer
//!
//! Files the framework reads on behalf of the user.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `<config dir>/config.toml` |
//! | Aliases | `name = command args...` lines | `<config dir>/aliases` |
//!
//! Both are optional; a missing file means defaults.

pub mod aliases;
mod config;

pub use aliases::Aliases;
pub use config::{Config, ConfigError, ALIASES_ENV, CONFIG_ENV};
