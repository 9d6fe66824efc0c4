//! Logging flags and subscriber setup
//!
//! A supercommand configured with a [`Log`] gains `--verbose`, `--quiet`,
//! `--debug`, `--show-log` and `--logging-config`. The resulting filter is
//! installed as a `tracing` subscriber writing to the context's stderr.

use anyhow::{Context as _, Result};
use clap::{Arg, ArgAction, ArgMatches};
use tracing_subscriber::EnvFilter;

use super::command::{explicit, explicit_flag};
use super::context::Context;

const VERBOSE_ID: &str = "log-verbose";
const QUIET_ID: &str = "log-quiet";
const DEBUG_ID: &str = "log-debug";
const SHOW_LOG_ID: &str = "log-show-log";
const CONFIG_ID: &str = "log-config";

/// Logging options collected from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    pub verbose: bool,
    pub quiet: bool,
    pub debug: bool,
    pub show_log: bool,

    /// A `tracing_subscriber` filter directive, e.g. `supercmd=trace`
    pub config: Option<String>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// The global flags this logger contributes
    pub fn flag_args(&self) -> Vec<Arg> {
        vec![
            Arg::new(VERBOSE_ID)
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Show more verbose output"),
            Arg::new(QUIET_ID)
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Show no informational output"),
            Arg::new(DEBUG_ID)
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Equivalent to --show-log --logging-config=debug"),
            Arg::new(SHOW_LOG_ID)
                .long("show-log")
                .action(ArgAction::SetTrue)
                .help("If set, write the log file to stderr"),
            Arg::new(CONFIG_ID)
                .long("logging-config")
                .env("SUPERCMD_LOGGING_CONFIG")
                .help("Specify log levels for modules"),
        ]
    }

    /// Records flags given on the command line; repeated calls accumulate
    pub fn apply_flags(&mut self, flags: &ArgMatches) {
        self.verbose |= explicit_flag(flags, VERBOSE_ID);
        self.quiet |= explicit_flag(flags, QUIET_ID);
        self.debug |= explicit_flag(flags, DEBUG_ID);
        self.show_log |= explicit_flag(flags, SHOW_LOG_ID);
        if let Some(config) = explicit::<String>(flags, CONFIG_ID) {
            self.config = Some(config);
        } else if self.config.is_none() {
            self.config = flags.try_get_one::<String>(CONFIG_ID).ok().flatten().cloned();
        }
    }

    /// The filter directive selected by the flags
    pub fn filter(&self) -> String {
        if let Some(config) = self.config.as_deref().filter(|c| !c.is_empty()) {
            return config.to_string();
        }
        if self.debug {
            "debug".to_string()
        } else if self.verbose || self.show_log {
            "info".to_string()
        } else if self.quiet {
            "error".to_string()
        } else {
            "warn".to_string()
        }
    }

    /// Installs a subscriber writing to `ctx`'s stderr for the rest of the
    /// context's life. Does nothing if the context already has one.
    pub fn start(&self, ctx: &mut Context) -> Result<()> {
        if ctx.has_log() {
            return Ok(());
        }

        let filter = self.filter();
        let env_filter = EnvFilter::try_new(&filter).with_context(|| format!("invalid logging config {:?}", filter))?;
        let subscriber = tracing_subscriber::fmt()
            .with_writer(ctx.stderr_handle())
            .with_ansi(false)
            .with_env_filter(env_filter)
            .finish();

        ctx.install_log_guard(tracing::subscriber::set_default(subscriber));
        Ok(())
    }
}
