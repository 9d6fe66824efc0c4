//! The `version` command

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches};
use serde_json::Value;

use super::command::{explicit_flag, Command, FlagSet, Info};
use super::context::Context;
use super::error::check_empty;
use super::output::{Formatters, Output};

const ALL_ID: &str = "all";

/// Prints an application version, or its detail record with `--all`
pub struct VersionCommand {
    version: String,
    detail: Option<Value>,
    out: Output,
    show_all: bool,
}

impl VersionCommand {
    pub fn new(version: impl Into<String>, detail: Option<Value>) -> Self {
        Self {
            version: version.into(),
            detail,
            out: Output::new(),
            show_all: false,
        }
    }
}

impl Command for VersionCommand {
    fn info(&self) -> Info {
        Info {
            purpose: "Print the current version.".into(),
            ..Info::new("version")
        }
    }

    fn set_flags(&mut self, flags: FlagSet) -> FlagSet {
        let flags = self.out.add_flags(flags, "smart", Formatters::defaults());
        if self.detail.is_some() {
            flags.arg(
                Arg::new(ALL_ID)
                    .long("all")
                    .action(ArgAction::SetTrue)
                    .help("Prints all version information"),
            )
        } else {
            flags
        }
    }

    fn init(&mut self, flags: &ArgMatches, args: Vec<String>) -> Result<()> {
        self.out.apply_flags(flags);
        self.show_all = explicit_flag(flags, ALL_ID);
        check_empty(&args)?;
        Ok(())
    }

    fn run(&mut self, ctx: &mut Context) -> Result<()> {
        match (&self.detail, self.show_all) {
            (Some(detail), true) => self.out.write(ctx, detail),
            _ => self.out.write(ctx, &self.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::entrypoint::main;
    use crate::testing;
    use serde_json::json;

    const VERSION: &str = "999.888.777";

    #[test]
    fn prints_version() {
        let mut test = testing::context();
        let code = main(&mut VersionCommand::new(VERSION, None), &mut test.ctx, Vec::<String>::new());
        assert_eq!(code, 0);
        assert_eq!(test.stderr(), "");
        assert_eq!(test.stdout(), "999.888.777\n");
    }

    #[test]
    fn extra_args_are_rejected() {
        let mut test = testing::context();
        let code = main(&mut VersionCommand::new("xxx", None), &mut test.ctx, ["foo"]);
        assert_eq!(code, 2);
        assert_eq!(test.stdout(), "");
        assert!(test.stderr().starts_with("ERROR unrecognized args"));
    }

    #[test]
    fn prints_version_as_json() {
        let mut test = testing::context();
        let code = main(&mut VersionCommand::new(VERSION, None), &mut test.ctx, ["--format", "json"]);
        assert_eq!(code, 0);
        assert_eq!(test.stdout(), "\"999.888.777\"\n");
    }

    #[test]
    fn prints_detail_with_all() {
        let detail = json!({
            "version": VERSION,
            "git-commit-hash": "46f1a0bd5592a2f9244ca321b129902a06b53e03",
            "git-tree-state": "dirty",
        });
        let mut test = testing::context();
        let code = main(
            &mut VersionCommand::new(VERSION, Some(detail)),
            &mut test.ctx,
            ["--all", "--format", "json"],
        );
        assert_eq!(code, 0);
        assert_eq!(test.stderr(), "");
        assert_eq!(
            test.stdout(),
            "{\"version\":\"999.888.777\",\"git-commit-hash\":\"46f1a0bd5592a2f9244ca321b129902a06b53e03\",\"git-tree-state\":\"dirty\"}\n"
        );
    }

    #[test]
    fn all_is_unknown_without_detail() {
        let mut test = testing::context();
        let code = main(&mut VersionCommand::new(VERSION, None), &mut test.ctx, ["--all"]);
        assert_eq!(code, 2);
        assert_eq!(test.stderr(), "ERROR flag provided but not defined: --all\n");
    }
}
