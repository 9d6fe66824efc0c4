//! Helpers for testing commands
//!
//! ```no_run
//! use supercmd::testing;
//! # fn demo(cmd: &mut dyn supercmd::Command) {
//! let test = testing::run_command(cmd, &["--format", "json"]).unwrap();
//! assert_eq!(test.stdout(), "{}\n");
//! # }
//! ```

use std::io;

use anyhow::Result;

use crate::cli::command::{invocation, parse_args, Command};
use crate::cli::context::{Buffer, Context, Stream};

/// A [`Context`] whose output streams are captured in memory
pub struct TestContext {
    pub ctx: Context,
    stdout: Buffer,
    stderr: Buffer,
}

impl TestContext {
    /// Everything written to stdout so far
    pub fn stdout(&self) -> String {
        self.stdout.contents()
    }

    /// Everything written to stderr so far
    pub fn stderr(&self) -> String {
        self.stderr.contents()
    }
}

/// A context in the current directory with empty stdin and captured output
pub fn context() -> TestContext {
    let dir = std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir());
    context_in(dir)
}

/// Like [`context`], with `dir` as the working directory
pub fn context_in(dir: impl Into<std::path::PathBuf>) -> TestContext {
    let stdout = Buffer::new();
    let stderr = Buffer::new();
    let ctx = Context::new(
        dir,
        Box::new(io::empty()),
        Stream::new(stdout.clone()),
        Stream::new(stderr.clone()),
    );
    TestContext { ctx, stdout, stderr }
}

/// Converts string literals into an argument vector
pub fn args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

/// Parses `args` into `cmd` without running it
pub fn init_command(cmd: &mut dyn Command, args: &[&str]) -> Result<()> {
    let (name, known_as) = invocation(cmd);
    parse_args(cmd, &name, &self::args(args), &[], &known_as)?;
    Ok(())
}

/// Parses `args` into `cmd` and runs it in a fresh [`context`]
pub fn run_command(cmd: &mut dyn Command, args: &[&str]) -> Result<TestContext> {
    let mut test = context();
    init_command(cmd, args)?;
    cmd.run(&mut test.ctx)?;
    Ok(test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::Info;
    use std::io::Write;

    struct Hello;

    impl Command for Hello {
        fn info(&self) -> Info {
            Info::new("hello")
        }

        fn run(&mut self, ctx: &mut Context) -> Result<()> {
            writeln!(ctx.stdout(), "hello")?;
            writeln!(ctx.stderr(), "to stderr")?;
            Ok(())
        }
    }

    #[test]
    fn run_command_captures_streams() {
        let test = run_command(&mut Hello, &[]).unwrap();
        assert_eq!(test.stdout(), "hello\n");
        assert_eq!(test.stderr(), "to stderr\n");
    }

    #[test]
    fn init_command_reports_parse_errors() {
        let err = init_command(&mut Hello, &["extra"]).unwrap_err();
        assert_eq!(err.to_string(), r#"unrecognized args: ["extra"]"#);
    }
}
