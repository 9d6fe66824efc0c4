//! Process entry harness: argument vector in, exit code out

use std::io::Write;

use super::command::{invocation, parse_args, Command};
use super::context::Context;
use super::error::CmdError;
use super::output::selects_serial_format;

/// Exit code for a failed run
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for a bad command line
pub const EXIT_USAGE: i32 = 2;

/// Parses `args` into `cmd`, runs it, and reports any error on `ctx`'s
/// stderr as `ERROR <message>`.
///
/// Returns 0 on success (and when help was requested), 2 when the command
/// line could not be parsed, and 1 when the run failed. A command can pick
/// its own exit code with [`CmdError::RcPassthrough`], or exit 1 without a
/// message with [`CmdError::Silent`].
pub fn main<I, S>(cmd: &mut dyn Command, ctx: &mut Context, args: I) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let (usage, known_as) = invocation(cmd);

    let matches = match parse_args(cmd, &usage, &args, &[], &known_as) {
        Ok(matches) => matches,
        Err(err) => {
            if let Some(CmdError::Help(text)) = err.downcast_ref::<CmdError>() {
                let _ = ctx.stdout().write_all(text.as_bytes());
                return 0;
            }
            let _ = writeln!(ctx.stderr(), "ERROR {:#}", err);
            return EXIT_USAGE;
        }
    };
    if selects_serial_format(&matches) {
        ctx.set_serialisable(true);
    }

    let code = match cmd.run(ctx) {
        Ok(()) => 0,
        Err(err) => match err.downcast_ref::<CmdError>() {
            Some(CmdError::Silent) => EXIT_FAILURE,
            Some(CmdError::RcPassthrough(code)) => *code,
            Some(CmdError::Help(text)) => {
                let _ = ctx.stdout().write_all(text.as_bytes());
                0
            }
            _ => {
                if ctx.is_serial() && ctx.stdout().written() == 0 {
                    let _ = ctx.stdout().write_all(b"{}\n");
                }
                let _ = writeln!(ctx.stderr(), "ERROR {:#}", err);
                tracing::debug!("error stack: {:?}", err);
                EXIT_FAILURE
            }
        },
    };

    let _ = ctx.stdout().flush();
    code
}
