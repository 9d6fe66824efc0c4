//! The command contract and flag-parsing delegation
//!
//! Commands describe their flags on a [`FlagSet`] (a `clap::Command` used
//! purely as a flag specification). The framework owns the parse: it adds
//! `--help`, any inherited global flags and a catch-all for positional
//! arguments, runs clap, and hands the result to [`Command::init`].

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, ColorChoice};

use super::context::Context;
use super::error::{check_empty, CmdError};
use super::help;
use super::supercommand::SuperCommand;

/// A flag specification
pub type FlagSet = clap::Command;

/// Id of the catch-all positional argument
pub const ARGS_ID: &str = "args";

/// Id of the framework-provided `--help` flag
pub const HELP_ID: &str = "help";

/// Descriptive record of a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Info {
    /// Name of the command, unique within its table
    pub name: String,

    /// Positional-argument usage string, e.g. `<something>`
    pub args: String,

    /// One-line summary
    pub purpose: String,

    /// Long-form documentation
    pub doc: String,

    /// Alternative names the command is registered under
    pub aliases: Vec<String>,

    /// What flags are called in messages ("flag" unless set)
    pub flag_known_as: Option<String>,
}

impl Info {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn flag_known_as(&self) -> &str {
        self.flag_known_as.as_deref().unwrap_or("flag")
    }
}

/// A unit of work: describes itself, configures its flags, validates its
/// positional arguments and runs.
pub trait Command {
    /// Describes the command
    fn info(&self) -> Info;

    /// Adds the command's flags to `flags`
    fn set_flags(&mut self, flags: FlagSet) -> FlagSet {
        flags
    }

    /// Receives the parsed flags and the remaining positional arguments.
    ///
    /// The default accepts no positional arguments.
    fn init(&mut self, flags: &ArgMatches, args: Vec<String>) -> Result<()> {
        let _ = flags;
        check_empty(&args)?;
        Ok(())
    }

    /// Executes the command
    fn run(&mut self, ctx: &mut Context) -> Result<()>;

    /// Returns the command as a supercommand, if it is one
    fn as_super(&self) -> Option<&SuperCommand> {
        None
    }

    fn as_super_mut(&mut self) -> Option<&mut SuperCommand> {
        None
    }
}

/// Contributes flags to a supercommand's global flag set.
///
/// Global flags may appear before or after the subcommand, so
/// `apply_flags` can be called once per parse; apply only values that were
/// given on the command line (see [`explicit`]).
pub trait FlagAdder {
    fn add_flags(&mut self, flags: FlagSet) -> FlagSet;

    fn apply_flags(&mut self, flags: &ArgMatches) -> Result<()> {
        let _ = flags;
        Ok(())
    }
}

impl<T: FlagAdder> FlagAdder for Rc<RefCell<T>> {
    fn add_flags(&mut self, flags: FlagSet) -> FlagSet {
        self.borrow_mut().add_flags(flags)
    }

    fn apply_flags(&mut self, flags: &ArgMatches) -> Result<()> {
        self.borrow_mut().apply_flags(flags)
    }
}

/// Creates an empty flag set for the command `name`
pub fn flag_set(name: &str) -> FlagSet {
    FlagSet::new(name.to_string())
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .color(ColorChoice::Never)
}

fn help_arg() -> Arg {
    Arg::new(HELP_ID)
        .short('h')
        .long("help")
        .action(ArgAction::SetTrue)
        .help("Show help on a command or other topic.")
}

fn positional_arg() -> Arg {
    Arg::new(ARGS_ID)
        .num_args(1..)
        .action(ArgAction::Append)
        .hide(true)
}

/// Returns true if `flags` already defines `arg`'s id, long or short name
fn shadows(flags: &FlagSet, arg: &Arg) -> bool {
    flags.get_arguments().any(|existing| {
        existing.get_id() == arg.get_id()
            || (arg.get_long().is_some() && existing.get_long() == arg.get_long())
            || (arg.get_short().is_some() && existing.get_short() == arg.get_short())
    })
}

/// Adds every arg in `inherited` that `flags` does not already define
pub(crate) fn inherit(mut flags: FlagSet, inherited: &[Arg]) -> FlagSet {
    for arg in inherited {
        if !shadows(&flags, arg) {
            flags = flags.arg(arg.clone());
        }
    }
    flags
}

/// Returns `id`'s value only when it was given on the command line
pub fn explicit<T: Any + Clone + Send + Sync + 'static>(flags: &ArgMatches, id: &str) -> Option<T> {
    if !flags.ids().any(|known| known.as_str() == id) {
        return None;
    }
    if flags.value_source(id) != Some(ValueSource::CommandLine) {
        return None;
    }
    flags.try_get_one::<T>(id).ok().flatten().cloned()
}

/// Returns true if the boolean flag `id` was set on the command line
pub fn explicit_flag(flags: &ArgMatches, id: &str) -> bool {
    explicit::<bool>(flags, id).unwrap_or(false)
}

fn positional(flags: &ArgMatches) -> Vec<String> {
    flags
        .try_get_many::<String>(ARGS_ID)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Translates a clap failure into the framework's vocabulary
pub(crate) fn flag_error(err: clap::Error, known_as: &str) -> CmdError {
    if err.kind() == ErrorKind::UnknownArgument {
        if let Some(ContextValue::String(arg)) = err.get(ContextKind::InvalidArg) {
            if arg.starts_with('-') {
                return CmdError::UnknownFlag {
                    known_as: known_as.to_string(),
                    flag: arg.clone(),
                };
            }
            return CmdError::UnrecognizedArgs(vec![arg.clone()]);
        }
    }

    let rendered = err.render().to_string();
    let first = rendered.lines().next().unwrap_or_default();
    CmdError::Flags(first.trim_start_matches("error: ").to_string())
}

/// The flags `cmd` declares, plus `--help` unless it defines its own
pub fn command_flags(cmd: &mut dyn Command) -> FlagSet {
    let flags = cmd.set_flags(flag_set(""));
    with_help(flags.name(cmd.info().name))
}

/// The usage name and flag vocabulary of a command invoked directly
pub(crate) fn invocation(cmd: &dyn Command) -> (String, String) {
    match cmd.as_super() {
        Some(sc) => (sc.full_name(), sc.flag_known_as().to_string()),
        None => {
            let info = cmd.info();
            let known_as = info.flag_known_as().to_string();
            (info.name, known_as)
        }
    }
}

/// Adds `-h/--help` unless `flags` defines its own
pub fn with_help(flags: FlagSet) -> FlagSet {
    if shadows(&flags, &help_arg()) {
        flags
    } else {
        flags.arg(help_arg())
    }
}

/// Parses `args` against `cmd`'s flags plus `inherited` global flags, then
/// initializes the command with the result.
///
/// `usage_name` is the fully qualified name shown if help was requested,
/// in which case [`CmdError::Help`] carries the rendered text.
pub fn parse_args(
    cmd: &mut dyn Command,
    usage_name: &str,
    args: &[String],
    inherited: &[Arg],
    known_as: &str,
) -> Result<ArgMatches> {
    if let Some(sc) = cmd.as_super_mut() {
        sc.inherit_globals(inherited);
    }
    let mut flags = inherit(command_flags(cmd), inherited);
    let info = cmd.info();
    if !flags.get_arguments().any(|arg| arg.get_id() == ARGS_ID) {
        flags = flags.arg(positional_arg());
    }

    let matches = flags
        .try_get_matches_from_mut(args)
        .map_err(|err| flag_error(err, known_as))?;

    if explicit_flag(&matches, HELP_ID) {
        return Err(CmdError::Help(help::render(usage_name, &info, &flags)).into());
    }

    cmd.init(&matches, positional(&matches))?;
    Ok(matches)
}
