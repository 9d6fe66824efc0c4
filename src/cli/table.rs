//! Registered-command table
//!
//! Holds the commands of one supercommand together with their aliases.
//! Entries are keyed by name in a `BTreeMap`, so listings and fuzzy-match
//! tie-breaks follow name order.
//!
//! ## Resolution
//!
//! ```text
//! name ──► obsolete? ──yes──► unrecognized
//!            │no
//!            ▼
//!         deprecated? ──yes──► queue warning
//!            │
//!            ▼
//!         alias? ──yes──► continue with target
//!            │no
//!            ▼
//!         command ──► resolved
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use strsim::levenshtein;
use tracing::debug;

use super::command::Command;
use super::error::RegistrationError;

/// Names the table always answers to unless a registration shadows them
pub const IMPLICIT_COMMANDS: &[(&str, &str)] = &[
    ("documentation", "Generate the documentation for all commands"),
    ("help", "Show help on a command or other topic."),
];

/// Decides whether a command or alias is deprecated or obsolete
pub trait DeprecationCheck {
    /// The replacement to suggest, if the name is deprecated
    fn deprecated(&self) -> Option<String>;

    /// True if the name should behave as if it were never registered
    fn obsolete(&self) -> bool;
}

/// Shared deprecation policy of an entry
pub type Policy = Option<Rc<dyn DeprecationCheck>>;

/// A fixed deprecation policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deprecation {
    replacement: Option<String>,
    obsolete: bool,
}

impl Deprecation {
    /// A policy that warns and points at `replacement`
    pub fn replaced_by(replacement: impl Into<String>) -> Policy {
        Some(Rc::new(Deprecation {
            replacement: Some(replacement.into()),
            obsolete: false,
        }))
    }

    /// A policy that hides the name entirely
    pub fn obsoleted() -> Policy {
        Some(Rc::new(Deprecation {
            replacement: None,
            obsolete: true,
        }))
    }
}

impl DeprecationCheck for Deprecation {
    fn deprecated(&self) -> Option<String> {
        self.replacement.clone()
    }

    fn obsolete(&self) -> bool {
        self.obsolete
    }
}

enum Target {
    Command(Box<dyn Command>),
    Alias(String),
    SuperAlias { parent: String, sub: String },
}

struct Entry {
    target: Target,
    policy: Policy,
}

impl Entry {
    fn obsolete(&self) -> bool {
        self.policy.as_ref().map_or(false, |p| p.obsolete())
    }

    /// Deprecated and obsolete entries are left out of listings and suggestions
    fn visible(&self) -> bool {
        match &self.policy {
            Some(policy) => !policy.obsolete() && policy.deprecated().is_none(),
            None => true,
        }
    }
}

/// Outcome of resolving a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Name of the registered command to run
    pub name: String,

    /// Arguments to place before the user's remaining arguments
    pub args: Vec<String>,

    /// Deprecation warning to emit before running
    pub warning: Option<String>,
}

/// Name-ordered commands and aliases of one supercommand
#[derive(Default)]
pub struct CommandTable {
    entries: BTreeMap<String, Entry>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only `cmd` and its aliases
    pub fn with_command(cmd: Box<dyn Command>) -> Self {
        let mut table = Self::new();
        table.insert(cmd, None);
        table
    }

    fn ensure_free(&self, name: &str) -> Result<(), RegistrationError> {
        if self.entries.contains_key(name) {
            return Err(RegistrationError::AlreadyRegistered(name.to_string()));
        }
        Ok(())
    }

    /// Registers `cmd` under its name and each of its aliases
    pub fn register(&mut self, cmd: Box<dyn Command>) -> Result<(), RegistrationError> {
        self.register_with_policy(cmd, None)
    }

    /// Registers `cmd`, applying `policy` to the command and to each alias
    pub fn register_deprecated(
        &mut self,
        cmd: Option<Box<dyn Command>>,
        policy: Policy,
    ) -> Result<(), RegistrationError> {
        match cmd {
            Some(cmd) => self.register_with_policy(cmd, policy),
            None => Ok(()),
        }
    }

    fn register_with_policy(&mut self, cmd: Box<dyn Command>, policy: Policy) -> Result<(), RegistrationError> {
        let info = cmd.info();
        self.ensure_free(&info.name)?;
        for alias in &info.aliases {
            self.ensure_free(alias)?;
        }
        self.insert(cmd, policy);
        Ok(())
    }

    fn insert(&mut self, cmd: Box<dyn Command>, policy: Policy) {
        let info = cmd.info();
        debug!(command = %info.name, aliases = ?info.aliases, "registering command");
        for alias in &info.aliases {
            self.entries.insert(
                alias.clone(),
                Entry {
                    target: Target::Alias(info.name.clone()),
                    policy: policy.clone(),
                },
            );
        }
        self.entries.insert(
            info.name,
            Entry {
                target: Target::Command(cmd),
                policy,
            },
        );
    }

    /// Registers `name` as an alias of the already registered `target`
    pub fn register_alias(&mut self, name: &str, target: &str, policy: Policy) -> Result<(), RegistrationError> {
        if !self.entries.contains_key(target) {
            return Err(RegistrationError::AliasTargetNotFound(target.to_string()));
        }
        self.ensure_free(name)?;
        self.entries.insert(
            name.to_string(),
            Entry {
                target: Target::Alias(target.to_string()),
                policy,
            },
        );
        Ok(())
    }

    /// Registers `name` as an alias of `sub` inside the supercommand `parent`
    pub fn register_super_alias(
        &mut self,
        name: &str,
        parent: &str,
        sub: &str,
        policy: Policy,
    ) -> Result<(), RegistrationError> {
        let entry = self
            .entries
            .get(parent)
            .ok_or_else(|| RegistrationError::AliasTargetNotFound(parent.to_string()))?;
        let nested = match &entry.target {
            Target::Command(cmd) => cmd.as_super(),
            _ => None,
        }
        .ok_or_else(|| RegistrationError::NotASuperCommand(parent.to_string()))?;
        if !nested.table().contains(sub) {
            return Err(RegistrationError::SubCommandNotFound {
                parent: parent.to_string(),
                sub: sub.to_string(),
            });
        }

        self.ensure_free(name)?;
        self.entries.insert(
            name.to_string(),
            Entry {
                target: Target::SuperAlias {
                    parent: parent.to_string(),
                    sub: sub.to_string(),
                },
                policy,
            },
        );
        Ok(())
    }

    /// Returns true if `name` is registered, whatever its policy
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        match &self.entries.get(name)?.target {
            Target::Command(cmd) => Some(cmd.as_ref()),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn Command> {
        match &mut self.entries.get_mut(name)?.target {
            Target::Command(cmd) => Some(cmd.as_mut()),
            _ => None,
        }
    }

    /// Follows aliases from `name` to a registered command.
    ///
    /// Obsolete names resolve to nothing. A deprecated name anywhere on the
    /// way produces a single warning naming what was typed and the last
    /// replacement seen.
    pub fn resolve(&self, name: &str) -> Option<Resolution> {
        let mut current = name.to_string();
        let mut args = Vec::new();
        let mut warning = None;

        // every hop moves to an entry registered earlier, so this terminates
        for _ in 0..=self.entries.len() {
            let entry = self.entries.get(&current)?;
            if entry.obsolete() {
                debug!(name, "obsolete name");
                return None;
            }
            if let Some(replacement) = entry.policy.as_ref().and_then(|p| p.deprecated()) {
                warning = Some(format!("{:?} is deprecated, please use {:?}", name, replacement));
            }

            match &entry.target {
                Target::Command(_) => {
                    return Some(Resolution {
                        name: current,
                        args,
                        warning,
                    })
                }
                Target::Alias(target) => current = target.clone(),
                Target::SuperAlias { parent, sub } => {
                    args.insert(0, sub.clone());
                    current = parent.clone();
                }
            }
        }
        None
    }

    /// Visible names, including the implicit commands, in name order
    pub fn visible_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.visible())
            .map(|(name, _)| name.clone())
            .collect();
        for (name, _) in IMPLICIT_COMMANDS {
            if !self.entries.contains_key(*name) {
                names.insert(name.to_string());
            }
        }
        names
    }

    /// Finds the visible name closest to `name` by edit distance.
    ///
    /// The smallest Levenshtein distance wins; among equal distances the
    /// first name in sort order wins. Nothing is offered when the best
    /// distance exceeds `max(2, len / 3)` of the query.
    pub fn find_closest(&self, name: &str) -> Option<String> {
        let threshold = (name.chars().count() / 3).max(2);
        let mut best: Option<(String, usize)> = None;

        for candidate in self.visible_names() {
            let distance = levenshtein(name, &candidate);
            if distance > threshold {
                continue;
            }
            match &best {
                Some((_, best_distance)) if distance >= *best_distance => {}
                _ => best = Some((candidate, distance)),
            }
        }

        best.map(|(candidate, _)| candidate)
    }

    fn purpose(&self, name: &str) -> String {
        match self.entries.get(name).map(|entry| &entry.target) {
            Some(Target::Command(cmd)) => cmd.info().purpose,
            Some(Target::Alias(target)) => format!("Alias for '{}'.", target),
            Some(Target::SuperAlias { parent, sub }) => format!("Alias for '{} {}'.", parent, sub),
            None => IMPLICIT_COMMANDS
                .iter()
                .find(|(implicit, _)| *implicit == name)
                .map(|(_, purpose)| purpose.to_string())
                .unwrap_or_default(),
        }
    }

    /// The `commands:` listing shown in a supercommand's help.
    ///
    /// ```text
    /// commands:
    ///     documentation - Generate the documentation for all commands
    ///     flap          - Alias for 'flip'.
    ///     flip          - flip the juju
    /// ```
    pub fn describe(&self) -> String {
        let names = self.visible_names();
        let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);

        let mut out = String::from("commands:");
        for name in &names {
            out.push_str(&format!("\n    {:<width$} - {}", name, self.purpose(name), width = width));
        }
        out
    }

    /// Visible registered commands, mutably, in name order
    pub fn visible_commands_mut(&mut self) -> impl Iterator<Item = (&String, &mut Box<dyn Command>)> {
        self.entries.iter_mut().filter_map(|(name, entry)| {
            let visible = entry.visible();
            match &mut entry.target {
                Target::Command(cmd) if visible => Some((name, cmd)),
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::Info;
    use crate::cli::context::Context;

    struct Named(&'static str, Vec<&'static str>);

    impl Command for Named {
        fn info(&self) -> Info {
            Info {
                purpose: format!("{} the juju", self.0),
                aliases: self.1.iter().map(|a| a.to_string()).collect(),
                ..Info::new(self.0)
            }
        }

        fn run(&mut self, _ctx: &mut Context) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn named(name: &'static str) -> Box<dyn Command> {
        Box::new(Named(name, vec![]))
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut table = CommandTable::new();
        table.register(named("flip")).unwrap();
        table.register(named("flap")).unwrap();
        assert_eq!(
            table.register(named("flap")),
            Err(RegistrationError::AlreadyRegistered("flap".into()))
        );
    }

    #[test]
    fn alias_collision_leaves_table_untouched() {
        let mut table = CommandTable::new();
        table.register(named("flap")).unwrap();
        let err = table.register(Box::new(Named("flip", vec!["flop", "flap"]))).unwrap_err();
        assert_eq!(err, RegistrationError::AlreadyRegistered("flap".into()));
        assert!(!table.contains("flip"));
        assert!(!table.contains("flop"));
    }

    #[test]
    fn seeded_table_accepts_further_commands() {
        let mut table = CommandTable::with_command(Box::new(Named("version", vec!["ver"])));
        assert!(table.contains("version"));
        assert_eq!(table.resolve("ver").map(|r| r.name).as_deref(), Some("version"));

        table.register(named("flip")).unwrap();
        assert_eq!(
            table.register(named("version")),
            Err(RegistrationError::AlreadyRegistered("version".into()))
        );
    }

    #[test]
    fn declared_aliases_are_listed() {
        let mut table = CommandTable::new();
        table.register(Box::new(Named("flip", vec!["flap", "flop"]))).unwrap();
        assert_eq!(
            table.describe(),
            "commands:\n    \
             documentation - Generate the documentation for all commands\n    \
             flap          - Alias for 'flip'.\n    \
             flip          - flip the juju\n    \
             flop          - Alias for 'flip'.\n    \
             help          - Show help on a command or other topic."
        );
    }

    #[test]
    fn alias_target_must_exist() {
        let mut table = CommandTable::new();
        assert_eq!(
            table.register_alias("omg", "unknown", None),
            Err(RegistrationError::AliasTargetNotFound("unknown".into()))
        );
    }

    #[test]
    fn resolution_through_alias_kinds() {
        let mut table = CommandTable::new();
        table.register(named("test")).unwrap();
        table.register_alias("foo", "test", None).unwrap();
        table.register_alias("bar", "test", Deprecation::replaced_by("test")).unwrap();
        table.register_alias("baz", "test", Deprecation::obsoleted()).unwrap();

        assert_eq!(table.resolve("test").unwrap().name, "test");
        assert_eq!(
            table.resolve("foo"),
            Some(Resolution {
                name: "test".into(),
                args: vec![],
                warning: None
            })
        );
        assert_eq!(
            table.resolve("bar").unwrap().warning.as_deref(),
            Some(r#""bar" is deprecated, please use "test""#)
        );
        assert_eq!(table.resolve("baz"), None);
        assert_eq!(table.resolve("nope"), None);
    }

    #[test]
    fn alias_chain_warns_once_with_final_replacement() {
        let mut table = CommandTable::new();
        table.register(named("test")).unwrap();
        table.register_alias("old", "test", Deprecation::replaced_by("test")).unwrap();
        table.register_alias("older", "old", None).unwrap();

        let resolution = table.resolve("older").unwrap();
        assert_eq!(resolution.name, "test");
        assert_eq!(
            resolution.warning.as_deref(),
            Some(r#""older" is deprecated, please use "test""#)
        );
    }

    #[test]
    fn hidden_entries_are_not_listed() {
        let mut table = CommandTable::new();
        table.register(named("test")).unwrap();
        table.register_alias("bar", "test", Deprecation::replaced_by("test")).unwrap();
        table.register_alias("baz", "test", Deprecation::obsoleted()).unwrap();

        let names: Vec<String> = table.visible_names().into_iter().collect();
        assert_eq!(names, vec!["documentation", "help", "test"]);
    }

    #[test]
    fn implicit_entries_can_be_shadowed() {
        let mut table = CommandTable::new();
        table.register(named("help")).unwrap();
        assert!(table.describe().contains("help          - help the juju"));
        assert!(!table.describe().contains("Show help"));
    }

    #[test]
    fn closest_match() {
        let table = CommandTable::new();
        assert_eq!(table.find_closest("halp").as_deref(), Some("help"));
        assert_eq!(table.find_closest("help").as_deref(), Some("help"));
        assert_eq!(table.find_closest("hel").as_deref(), Some("help"));
        assert_eq!(table.find_closest("hlp").as_deref(), Some("help"));
        assert_eq!(table.find_closest("helper").as_deref(), Some("help"));
        assert_eq!(table.find_closest("sillycommand"), None);
    }

    #[test]
    fn closest_match_ties_break_by_name() {
        let mut table = CommandTable::new();
        table.register(named("hxlp")).unwrap();
        table.register(named("hflp")).unwrap();
        assert_eq!(table.find_closest("helper").as_deref(), Some("help"));
        // "hqlp" is one edit away from all three
        assert_eq!(table.find_closest("hqlp").as_deref(), Some("help"));

        table.register(named("haap")).unwrap();
        assert_eq!(table.find_closest("hzzp").as_deref(), Some("haap"));
    }
}
