//! # Supercommand dispatch
//!
//! A [`SuperCommand`] is a [`Command`] that owns a table of subcommands.
//! Dispatch happens in two parses:
//!
//! 1. The supercommand's own flags (global flags plus a trailing catch-all)
//!    are parsed. The first positional token names the subcommand; the
//!    rest is passed through untouched.
//! 2. The subcommand's flags are parsed with the global flags inherited, so
//!    global flags may appear before or after the subcommand name.
//!
//! ```text
//! juju --debug deploy --to 3 mysql
//!      ├─────┘ ├────┘ └─────────┘
//!      global  name   parsed against `deploy` + globals
//! ```
//!
//! Between the two parses the name goes through user aliases (from the
//! alias file) and then the table's own aliases and deprecation policies.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches};
use serde_json::Value;
use tracing::debug;

use super::command::{
    command_flags, explicit_flag, flag_set, inherit, parse_args, with_help, Command, FlagAdder, FlagSet, Info,
    ARGS_ID,
};
use super::context::Context;
use super::error::{check_empty, CmdError, RegistrationError};
use super::help;
use super::log::Log;
use super::output::selects_serial_format;
use super::table::{CommandTable, Policy};
use super::version::VersionCommand;
use crate::storage::aliases;

/// Called with the unresolved name and the remaining arguments when a
/// subcommand is not found
pub type MissingCallback = Box<dyn FnMut(&mut Context, &str, &[String]) -> Result<()>>;

/// Called with the supercommand's full name before a subcommand runs
pub type NotifyRun = Box<dyn FnMut(&str)>;

/// Configuration of a [`SuperCommand`]
#[derive(Default)]
pub struct SuperCommandParams {
    pub name: String,

    /// Prepended to the name in usage and error messages, e.g. `juju`
    pub usage_prefix: String,

    pub purpose: String,
    pub doc: String,
    pub aliases: Vec<String>,

    /// Enables `--version` and the `version` command
    pub version: Option<String>,

    /// Shown by `version --all`
    pub version_detail: Option<Value>,

    /// Enables the logging flags
    pub log: Option<Log>,

    /// Contributes extra global flags
    pub global_flags: Option<Box<dyn FlagAdder>>,

    /// Enables user aliases and `--no-alias`
    pub user_aliases_file: Option<PathBuf>,

    /// What flags are called in messages, "flag" unless set
    pub flag_known_as: Option<String>,

    pub missing_callback: Option<MissingCallback>,
    pub notify_run: Option<NotifyRun>,
}

#[derive(Debug, Clone, Default)]
enum Selected {
    #[default]
    None,
    Sub(String),
    Help(String),
    Documentation,
    Missing { name: String, args: Vec<String> },
}

/// A command that dispatches to registered subcommands
pub struct SuperCommand {
    name: String,
    usage_prefix: String,
    purpose: String,
    doc: String,
    aliases: Vec<String>,
    version: Option<String>,
    log_template: Option<Log>,
    global_flags: Option<Box<dyn FlagAdder>>,
    user_aliases_file: Option<PathBuf>,
    flag_known_as: Option<String>,
    missing_callback: Option<MissingCallback>,
    notify_run: Option<NotifyRun>,
    table: CommandTable,

    // global flags of enclosing supercommands
    inherited: Vec<Arg>,

    // per-dispatch state
    log: Option<Log>,
    selected: Selected,
    warning: Option<String>,
    show_description: bool,
    show_version: bool,
    no_alias: bool,
    serial: bool,

    // matches of the subcommand parse and of every parse below it
    dispatch_matches: Vec<ArgMatches>,
}

impl SuperCommand {
    pub fn new(params: SuperCommandParams) -> Self {
        let table = match &params.version {
            Some(version) => CommandTable::with_command(Box::new(VersionCommand::new(
                version.clone(),
                params.version_detail.clone(),
            ))),
            None => CommandTable::new(),
        };

        Self {
            name: params.name,
            usage_prefix: params.usage_prefix,
            purpose: params.purpose,
            doc: params.doc,
            aliases: params.aliases,
            version: params.version,
            log: params.log.clone(),
            log_template: params.log,
            global_flags: params.global_flags,
            user_aliases_file: params.user_aliases_file,
            flag_known_as: params.flag_known_as,
            missing_callback: params.missing_callback,
            notify_run: params.notify_run,
            table,
            selected: Selected::None,
            warning: None,
            show_description: false,
            show_version: false,
            no_alias: false,
            serial: false,
            inherited: Vec::new(),
            dispatch_matches: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name qualified by the usage prefix, e.g. `juju jujutest`
    pub fn full_name(&self) -> String {
        if self.usage_prefix.is_empty() || self.usage_prefix == self.name {
            self.name.clone()
        } else {
            format!("{} {}", self.usage_prefix, self.name)
        }
    }

    pub fn set_doc(&mut self, doc: impl Into<String>) {
        self.doc = doc.into();
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Registers a subcommand under its name and aliases
    pub fn register(&mut self, cmd: Box<dyn Command>) -> Result<(), RegistrationError> {
        self.table.register(cmd)
    }

    /// Registers `name` as an alias of the subcommand `target`
    pub fn register_alias(&mut self, name: &str, target: &str, policy: Policy) -> Result<(), RegistrationError> {
        self.table.register_alias(name, target, policy)
    }

    /// Registers `name` as an alias of `sub` in the nested supercommand `parent`
    pub fn register_super_alias(
        &mut self,
        name: &str,
        parent: &str,
        sub: &str,
        policy: Policy,
    ) -> Result<(), RegistrationError> {
        self.table.register_super_alias(name, parent, sub, policy)
    }

    /// Registers a subcommand whose name and aliases follow `policy`.
    /// `None` registers nothing.
    pub fn register_deprecated(&mut self, cmd: Option<Box<dyn Command>>, policy: Policy) -> Result<(), RegistrationError> {
        self.table.register_deprecated(cmd, policy)
    }

    /// Finds the visible subcommand name closest to `name`
    pub fn find_closest_sub_command(&self, name: &str) -> Option<(String, Option<&dyn Command>)> {
        let found = self.table.find_closest(name)?;
        let cmd = self.table.get(&found);
        Some((found, cmd))
    }

    /// What flags are called in messages
    pub fn flag_known_as(&self) -> &str {
        self.flag_known_as.as_deref().unwrap_or("flag")
    }

    fn global_id(&self, flag: &str) -> String {
        format!("{}:{}", self.name, flag)
    }

    /// The flags accepted before or after the subcommand name
    fn global_args(&mut self) -> Vec<Arg> {
        let mut args = vec![Arg::new(self.global_id("description"))
            .long("description")
            .action(ArgAction::SetTrue)
            .help("Show short description of plugin, if any")];

        if self.version.is_some() {
            args.push(
                Arg::new(self.global_id("version"))
                    .long("version")
                    .action(ArgAction::SetTrue)
                    .help("Print the current version"),
            );
        }
        if self.user_aliases_file.is_some() {
            args.push(
                Arg::new(self.global_id("no-alias"))
                    .long("no-alias")
                    .action(ArgAction::SetTrue)
                    .help("Do not process command aliases when running this command"),
            );
        }
        if let Some(log) = &self.log_template {
            args.extend(log.flag_args());
        }
        if let Some(adder) = self.global_flags.as_mut() {
            let probe = adder.add_flags(flag_set("global"));
            args.extend(probe.get_arguments().cloned());
        }
        args
    }

    /// Records the global flags of the supercommand this one is nested in,
    /// so they are also accepted after this one's subcommand name
    pub(crate) fn inherit_globals(&mut self, args: &[Arg]) {
        self.inherited = args.to_vec();
    }

    /// Our global flags plus inherited ones they don't shadow
    fn dispatch_args(&mut self) -> Vec<Arg> {
        let own = self.global_args().into_iter().fold(flag_set("globals"), |flags, arg| flags.arg(arg));
        inherit(own, &self.inherited).get_arguments().cloned().collect()
    }

    /// Global flags plus the catch-all that collects the subcommand and its
    /// arguments
    fn own_flags(&mut self, mut flags: FlagSet) -> FlagSet {
        for arg in self.global_args() {
            flags = flags.arg(arg);
        }
        flags.arg(
            Arg::new(ARGS_ID)
                .num_args(1..)
                .action(ArgAction::Append)
                .trailing_var_arg(true)
                .hide(true),
        )
    }

    fn reset(&mut self) {
        self.log = self.log_template.clone();
        self.selected = Selected::None;
        self.warning = None;
        self.show_description = false;
        self.show_version = false;
        self.no_alias = false;
        self.serial = false;
        self.dispatch_matches.clear();
    }

    fn apply_globals(&mut self, flags: &ArgMatches) -> Result<()> {
        self.show_description |= explicit_flag(flags, &self.global_id("description"));
        self.show_version |= explicit_flag(flags, &self.global_id("version"));
        self.no_alias |= explicit_flag(flags, &self.global_id("no-alias"));
        self.serial |= selects_serial_format(flags);
        if let Some(log) = self.log.as_mut() {
            log.apply_flags(flags);
        }
        if let Some(adder) = self.global_flags.as_mut() {
            adder.apply_flags(flags)?;
        }
        Ok(())
    }

    /// Rewrites `name rest...` through the user alias file
    fn expand_user_alias(&self, name: String, rest: Vec<String>) -> (String, Vec<String>) {
        let Some(path) = self.user_aliases_file.as_deref().filter(|_| !self.no_alias) else {
            return (name, rest);
        };
        let user_aliases = aliases::load(path);
        match user_aliases.get(&name) {
            Some(words) if !words.is_empty() => {
                debug!(alias = %name, expansion = ?words, "expanding user alias");
                let mut args = words[1..].to_vec();
                args.extend(rest);
                (words[0].clone(), args)
            }
            _ => (name, rest),
        }
    }

    fn summary_info(&self) -> Info {
        let listing = self.table.describe();
        let doc = if self.doc.is_empty() {
            listing
        } else {
            format!("{}\n\n{}", self.doc, listing)
        };
        Info {
            name: self.name.clone(),
            args: "<command> ...".to_string(),
            purpose: self.purpose.clone(),
            doc,
            aliases: self.aliases.clone(),
            flag_known_as: self.flag_known_as.clone(),
        }
    }

    /// Renders help for `topic`, a path of subcommand names
    fn help_text(&mut self, topic: &[String]) -> Result<String, CmdError> {
        let full_name = self.full_name();
        let Some((first, rest)) = topic.split_first() else {
            let flags = with_help(self.own_flags(flag_set(&self.name)));
            return Ok(help::render(&full_name, &self.summary_info(), &flags));
        };
        if first == "commands" && rest.is_empty() && !self.table.contains("commands") {
            return Ok(format!("{}\n", self.table.describe()));
        }

        let unknown = || CmdError::UnknownHelpTopic(topic.join(" "));
        let resolved = self.table.resolve(first).ok_or_else(unknown)?;
        let mut path = resolved.args;
        path.extend(rest.iter().cloned());

        let cmd = self.table.get_mut(&resolved.name).ok_or_else(unknown)?;
        if path.is_empty() {
            let flags = command_flags(cmd);
            let usage = format!("{} {}", full_name, resolved.name);
            return Ok(help::render(&usage, &cmd.info(), &flags));
        }
        match cmd.as_super_mut() {
            Some(nested) => nested.help_text(&path),
            None => Err(unknown()),
        }
    }

    /// Markdown for this supercommand and every visible command below it
    pub fn documentation(&mut self) -> String {
        let full_name = self.full_name();
        let flags = with_help(self.own_flags(flag_set(&self.name)));
        let mut out = help::markdown(&full_name, &self.summary_info(), &flags);

        for (name, cmd) in self.table.visible_commands_mut() {
            match cmd.as_super_mut() {
                Some(nested) => out.push_str(&nested.documentation()),
                None => {
                    let flags = command_flags(cmd.as_mut());
                    let usage = format!("{} {}", full_name, name);
                    out.push_str(&help::markdown(&usage, &cmd.info(), &flags));
                }
            }
        }
        out
    }

    fn unrecognized(&self, name: &str) -> CmdError {
        CmdError::UnrecognizedCommand {
            name: format!("{} {}", self.full_name(), name),
            suggestion: self.table.find_closest(name),
        }
    }

    fn select(&mut self, name: String, rest: Vec<String>) -> Result<()> {
        let (name, rest) = self.expand_user_alias(name, rest);

        let Some(resolved) = self.table.resolve(&name) else {
            if name == "help" && !self.table.contains("help") {
                self.selected = Selected::Help(self.help_text(&rest)?);
                return Ok(());
            }
            if name == "documentation" && !self.table.contains("documentation") {
                check_empty(&rest)?;
                self.selected = Selected::Documentation;
                return Ok(());
            }
            if self.missing_callback.is_some() {
                debug!(command = %name, "handing unknown command to callback");
                self.selected = Selected::Missing { name, args: rest };
                return Ok(());
            }
            return Err(self.unrecognized(&name).into());
        };

        debug!(command = %name, resolved = %resolved.name, "dispatching");
        self.warning = resolved.warning;
        self.selected = Selected::Sub(resolved.name.clone());

        let usage = format!("{} {}", self.full_name(), resolved.name);
        let inherited = self.dispatch_args();
        let known_as = self.flag_known_as().to_string();
        let mut args = resolved.args;
        args.extend(rest);

        let cmd = self
            .table
            .get_mut(&resolved.name)
            .ok_or_else(|| CmdError::UnrecognizedCommand {
                name: resolved.name.clone(),
                suggestion: None,
            })?;
        let matches = parse_args(cmd, &usage, &args, &inherited, &known_as)?;

        // flags meant for us may have been given below a nested supercommand
        let mut chain = cmd
            .as_super_mut()
            .map(|nested| std::mem::take(&mut nested.dispatch_matches))
            .unwrap_or_default();
        chain.insert(0, matches);
        for matches in &chain {
            self.apply_globals(matches)?;
        }
        self.dispatch_matches = chain;
        Ok(())
    }
}

impl Command for SuperCommand {
    fn info(&self) -> Info {
        match &self.selected {
            Selected::Sub(name) => {
                let mut info = self.table.get(name).map(|cmd| cmd.info()).unwrap_or_default();
                info.name = format!("{} {}", self.name, name);
                info
            }
            _ => self.summary_info(),
        }
    }

    fn set_flags(&mut self, flags: FlagSet) -> FlagSet {
        self.reset();
        self.own_flags(flags)
    }

    fn init(&mut self, flags: &ArgMatches, args: Vec<String>) -> Result<()> {
        self.apply_globals(flags)?;
        if self.show_description || self.show_version {
            check_empty(&args)?;
            return Ok(());
        }

        let mut args = args.into_iter();
        match args.next() {
            Some(name) => self.select(name, args.collect()),
            None if self.table.contains("help") => Err(CmdError::NoCommand.into()),
            None => {
                self.selected = Selected::Help(self.help_text(&[])?);
                Ok(())
            }
        }
    }

    fn run(&mut self, ctx: &mut Context) -> Result<()> {
        if self.show_description {
            writeln!(ctx.stdout(), "{}", self.purpose)?;
            return Ok(());
        }
        if self.show_version {
            if let Some(version) = &self.version {
                writeln!(ctx.stdout(), "{}", version)?;
            }
            return Ok(());
        }

        if let Some(log) = &self.log {
            log.start(ctx)?;
        }

        let selected = self.selected.clone();
        if let Selected::Missing { name, args } = &selected {
            return match self.missing_callback.as_mut() {
                Some(callback) => callback(ctx, name.as_str(), args.as_slice()),
                None => Err(self.unrecognized(name).into()),
            };
        }
        if matches!(selected, Selected::None) {
            return Err(CmdError::NoCommand.into());
        }

        let full_name = self.full_name();
        if let Some(notify) = self.notify_run.as_mut() {
            notify(full_name.as_str());
        }

        match selected {
            Selected::Sub(name) => {
                if let Some(warning) = self.warning.take() {
                    ctx.warning(&warning)?;
                }
                if self.serial {
                    ctx.set_serialisable(true);
                }
                match self.table.get_mut(&name) {
                    Some(cmd) => cmd.run(ctx),
                    None => Err(self.unrecognized(&name).into()),
                }
            }
            Selected::Help(text) => {
                ctx.stdout().write_all(text.as_bytes())?;
                Ok(())
            }
            Selected::Documentation => {
                let text = self.documentation();
                ctx.stdout().write_all(text.as_bytes())?;
                Ok(())
            }
            Selected::None | Selected::Missing { .. } => Ok(()),
        }
    }

    fn as_super(&self) -> Option<&SuperCommand> {
        Some(self)
    }

    fn as_super_mut(&mut self) -> Option<&mut SuperCommand> {
        Some(self)
    }
}
