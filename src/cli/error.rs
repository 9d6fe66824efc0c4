//! Error types for command setup and dispatch

use thiserror::Error;

/// Errors raised while wiring commands together.
///
/// These reflect a bug in the embedding application, never user input, so
/// callers are expected to treat them as fatal during startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("command already registered: {0:?}")]
    AlreadyRegistered(String),

    #[error("{0:?} not found when registering alias")]
    AliasTargetNotFound(String),

    #[error("{0:?} is not a SuperCommand")]
    NotASuperCommand(String),

    #[error("{sub:?} not found as a command in {parent:?}")]
    SubCommandNotFound { parent: String, sub: String },
}

/// Errors produced by the framework while parsing and dispatching.
///
/// The entry harness maps these onto exit codes: parse-time failures exit
/// with 2, run-time failures with 1.
#[derive(Debug, Error)]
pub enum CmdError {
    #[error("unrecognized command: {name}{}", suggestion_text(.suggestion))]
    UnrecognizedCommand {
        name: String,
        suggestion: Option<String>,
    },

    #[error("unrecognized args: {}", quote_args(.0))]
    UnrecognizedArgs(Vec<String>),

    #[error("{known_as} provided but not defined: {flag}")]
    UnknownFlag { known_as: String, flag: String },

    #[error("{0}")]
    Flags(String),

    #[error("no command specified")]
    NoCommand,

    #[error("unknown command or topic for {0}")]
    UnknownHelpTopic(String),

    /// Help was requested; carries the rendered help text.
    #[error("help requested")]
    Help(String),

    /// The command failed and already reported why.
    #[error("")]
    Silent,

    /// The command ran a subprocess whose exit code should be passed on.
    #[error("subprocess encountered error code {0}")]
    RcPassthrough(i32),
}

fn suggestion_text(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!("\nDid you mean: {}?", name),
        None => String::new(),
    }
}

fn quote_args(args: &[String]) -> String {
    let quoted: Vec<String> = args.iter().map(|arg| format!("{:?}", arg)).collect();
    format!("[{}]", quoted.join(" "))
}

/// Checks that no positional arguments are left over.
pub fn check_empty(args: &[String]) -> Result<(), CmdError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CmdError::UnrecognizedArgs(args.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_messages() {
        assert_eq!(
            RegistrationError::AlreadyRegistered("flap".into()).to_string(),
            r#"command already registered: "flap""#
        );
        assert_eq!(
            RegistrationError::AliasTargetNotFound("unknown".into()).to_string(),
            r#""unknown" not found when registering alias"#
        );
        assert_eq!(
            RegistrationError::NotASuperCommand("test".into()).to_string(),
            r#""test" is not a SuperCommand"#
        );
        assert_eq!(
            RegistrationError::SubCommandNotFound {
                parent: "bar".into(),
                sub: "unknown".into()
            }
            .to_string(),
            r#""unknown" not found as a command in "bar""#
        );
    }

    #[test]
    fn unrecognized_args_are_quoted() {
        let err = check_empty(&["gibberish".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), r#"unrecognized args: ["gibberish"]"#);

        let err = CmdError::UnrecognizedArgs(vec!["a".into(), "b c".into()]);
        assert_eq!(err.to_string(), r#"unrecognized args: ["a" "b c"]"#);
    }

    #[test]
    fn unrecognized_command_with_suggestion() {
        let err = CmdError::UnrecognizedCommand {
            name: "juju halp".into(),
            suggestion: Some("help".into()),
        };
        assert_eq!(
            err.to_string(),
            "unrecognized command: juju halp\nDid you mean: help?"
        );
    }

    #[test]
    fn check_empty_accepts_no_args() {
        assert!(check_empty(&[]).is_ok());
    }
}
