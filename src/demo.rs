//! Commands of the `supercmd` demo tool

use std::collections::BTreeMap;
use std::io::{Read, Write};

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches};
use serde::Serialize;
use serde_json::json;

use supercmd::cli::explicit_flag;
use supercmd::storage::Config;
use supercmd::{
    CmdError, Command, Context, Deprecation, FlagSet, Formatters, Info, Log, Output, RegistrationError, SuperCommand,
    SuperCommandParams,
};

/// Builds the demo application from the user's configuration
pub fn app(config: &Config) -> Result<SuperCommand, RegistrationError> {
    let version = env!("CARGO_PKG_VERSION");
    let mut app = SuperCommand::new(SuperCommandParams {
        name: "supercmd".into(),
        purpose: "Demonstrate the supercmd command framework".into(),
        doc: "Commands are dispatched by name; run 'supercmd help <command>' for details.".into(),
        version: Some(version.into()),
        version_detail: Some(json!({
            "version": version,
            "name": env!("CARGO_PKG_NAME"),
        })),
        log: Some(Log::new()),
        user_aliases_file: config.aliases_file(),
        ..Default::default()
    });

    let format = config.default_format.clone().unwrap_or_else(|| "smart".to_string());

    app.register(Box::new(EchoCommand::default()))?;
    app.register(Box::new(ShowCommand::new(&format)))?;
    app.register(Box::new(config_command(config.clone(), &format)?))?;

    app.register_alias("say", "echo", Deprecation::replaced_by("echo"))?;
    app.register_alias("shout", "echo", Deprecation::obsoleted())?;
    app.register_super_alias("paths", "config", "path", None)?;
    Ok(app)
}

fn config_command(config: Config, format: &str) -> Result<SuperCommand, RegistrationError> {
    let mut cmd = SuperCommand::new(SuperCommandParams {
        name: "config".into(),
        usage_prefix: "supercmd".into(),
        purpose: "Inspect supercmd configuration".into(),
        ..Default::default()
    });
    cmd.register(Box::new(PathCommand::new(config, format)))?;
    Ok(cmd)
}

/// Prints its arguments
#[derive(Default)]
pub struct EchoCommand {
    words: Vec<String>,
    no_newline: bool,
    from_stdin: bool,
}

impl Command for EchoCommand {
    fn info(&self) -> Info {
        Info {
            args: "<word> ...".into(),
            purpose: "Print the given words.".into(),
            doc: "Words are joined with single spaces. With --stdin, standard input is copied instead.".into(),
            aliases: vec!["repeat".into()],
            ..Info::new("echo")
        }
    }

    fn set_flags(&mut self, flags: FlagSet) -> FlagSet {
        flags
            .arg(
                Arg::new("no-newline")
                    .short('n')
                    .long("no-newline")
                    .action(ArgAction::SetTrue)
                    .help("Do not print the trailing newline"),
            )
            .arg(
                Arg::new("stdin")
                    .long("stdin")
                    .action(ArgAction::SetTrue)
                    .help("Copy standard input instead of arguments"),
            )
    }

    fn init(&mut self, flags: &ArgMatches, args: Vec<String>) -> Result<()> {
        self.no_newline = explicit_flag(flags, "no-newline");
        self.from_stdin = explicit_flag(flags, "stdin");
        if self.from_stdin && !args.is_empty() {
            return Err(CmdError::UnrecognizedArgs(args).into());
        }
        self.words = args;
        Ok(())
    }

    fn run(&mut self, ctx: &mut Context) -> Result<()> {
        let mut text = if self.from_stdin {
            let mut input = String::new();
            ctx.stdin().read_to_string(&mut input)?;
            input.trim_end_matches('\n').to_string()
        } else {
            self.words.join(" ")
        };
        if !self.no_newline {
            text.push('\n');
        }
        ctx.stdout().write_all(text.as_bytes())?;
        Ok(())
    }
}

#[derive(Serialize)]
struct Unit {
    machine: u32,
    status: &'static str,
}

#[derive(Serialize)]
struct Status {
    application: &'static str,
    healthy: bool,
    scale: u32,
    units: BTreeMap<String, Unit>,
}

fn sample_status() -> Status {
    let mut units = BTreeMap::new();
    units.insert(
        "mysql/0".to_string(),
        Unit {
            machine: 0,
            status: "active",
        },
    );
    units.insert(
        "mysql/1".to_string(),
        Unit {
            machine: 1,
            status: "waiting",
        },
    );
    Status {
        application: "mysql",
        healthy: true,
        scale: 2,
        units,
    }
}

/// Renders a sample status document in the selected format
pub struct ShowCommand {
    default_format: String,
    out: Output,
}

impl ShowCommand {
    pub fn new(default_format: &str) -> Self {
        Self {
            default_format: default_format.to_string(),
            out: Output::new(),
        }
    }
}

impl Command for ShowCommand {
    fn info(&self) -> Info {
        Info {
            purpose: "Show a sample status document.".into(),
            ..Info::new("show")
        }
    }

    fn set_flags(&mut self, flags: FlagSet) -> FlagSet {
        self.out.add_flags(flags, &self.default_format, Formatters::defaults())
    }

    fn init(&mut self, flags: &ArgMatches, args: Vec<String>) -> Result<()> {
        self.out.apply_flags(flags);
        supercmd::check_empty(&args)?;
        Ok(())
    }

    fn run(&mut self, ctx: &mut Context) -> Result<()> {
        self.out.write(ctx, &sample_status())
    }
}

#[derive(Serialize)]
struct Paths {
    config: Option<String>,
    aliases: Option<String>,
}

/// Prints where configuration is read from
pub struct PathCommand {
    config: Config,
    default_format: String,
    out: Output,
}

impl PathCommand {
    pub fn new(config: Config, default_format: &str) -> Self {
        Self {
            config,
            default_format: default_format.to_string(),
            out: Output::new(),
        }
    }
}

impl Command for PathCommand {
    fn info(&self) -> Info {
        Info {
            purpose: "Print the configuration and alias file locations.".into(),
            ..Info::new("path")
        }
    }

    fn set_flags(&mut self, flags: FlagSet) -> FlagSet {
        self.out.add_flags(flags, &self.default_format, Formatters::defaults())
    }

    fn init(&mut self, flags: &ArgMatches, args: Vec<String>) -> Result<()> {
        self.out.apply_flags(flags);
        supercmd::check_empty(&args)?;
        Ok(())
    }

    fn run(&mut self, ctx: &mut Context) -> Result<()> {
        let paths = Paths {
            config: Config::config_path().map(|p| p.display().to_string()),
            aliases: self.config.aliases_file().map(|p| p.display().to_string()),
        };
        self.out.write(ctx, &paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supercmd::testing;

    #[test]
    fn echo_joins_words() {
        let mut cmd = EchoCommand::default();
        let test = testing::run_command(&mut cmd, &["hello", "world"]).unwrap();
        assert_eq!(test.stdout(), "hello world\n");
    }

    #[test]
    fn echo_without_newline() {
        let mut cmd = EchoCommand::default();
        let test = testing::run_command(&mut cmd, &["-n", "hi"]).unwrap();
        assert_eq!(test.stdout(), "hi");
    }

    #[test]
    fn show_renders_smart_by_default() {
        let mut cmd = ShowCommand::new("smart");
        let test = testing::run_command(&mut cmd, &[]).unwrap();
        assert!(test.stdout().starts_with("application: mysql\nhealthy: True\nscale: 2\nunits:\n  mysql/0:\n"));
    }

    #[test]
    fn app_registers_everything() {
        let app = app(&Config::default()).unwrap();
        for name in ["echo", "repeat", "show", "config", "version", "say", "shout", "paths"] {
            assert!(app.table().contains(name), "{} missing", name);
        }
    }
}
