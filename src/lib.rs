//! supercmd - a framework for command-line applications
//!
//! Applications implement [`Command`] for each unit of work and register
//! them with a [`SuperCommand`], which routes `app <command> [args]` to the
//! right one. The dispatcher handles aliases, deprecated and obsolete
//! names, "did you mean" suggestions, help and documentation, `--version`,
//! logging flags and user-defined aliases. [`Output`] renders results as
//! smart text, JSON or YAML.

pub mod cli;
pub mod storage;
pub mod testing;

pub use cli::{
    check_empty, main, CmdError, Command, Context, Deprecation, DeprecationCheck, FlagAdder, FlagSet, Formatters, Info,
    Log, Output, RegistrationError, SuperCommand, SuperCommandParams,
};
