//! # Command-Line Framework
//!
//! Commands, the supercommand dispatcher and output formatting.
//!
//! ## Pieces
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `command` | The [`Command`] trait and flag-parsing delegation to clap |
//! | `table` | Registered commands, aliases and deprecation policies |
//! | `supercommand` | [`SuperCommand`], which dispatches to a table |
//! | `output` | `--format` handling with smart, json and yaml renderers |
//! | `log` | Logging flags and `tracing` subscriber setup |
//! | `entrypoint` | [`main()`], argument vector in, exit code out |
//!
//! ## Exit Codes
//!
//! - `0` success, or help was shown
//! - `1` the command failed (`ERROR <message>` on stderr)
//! - `2` the command line was not understood

pub mod command;
pub mod context;
pub mod entrypoint;
pub mod error;
pub mod help;
pub mod log;
pub mod output;
pub mod supercommand;
pub mod table;
pub mod version;

pub use command::{explicit, explicit_flag, flag_set, parse_args, Command, FlagAdder, FlagSet, Info};
pub use context::{Buffer, Context, Stream};
pub use entrypoint::main;
pub use error::{check_empty, CmdError, RegistrationError};
pub use log::Log;
pub use output::{format_json, format_smart, format_yaml, FormatError, Formatter, Formatters, Output, TypeFormatter};
pub use supercommand::{MissingCallback, NotifyRun, SuperCommand, SuperCommandParams};
pub use table::{CommandTable, Deprecation, DeprecationCheck, Policy};
pub use version::VersionCommand;
