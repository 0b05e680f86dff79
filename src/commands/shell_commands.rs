//! Command parser for the interactive shell
//!
//! Input lines are split on whitespace; the first word is the command and is
//! matched case-insensitively.

use thiserror::Error;

/// Errors that can occur when parsing shell input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType 'help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },

    /// Command was given arguments it does not take
    #[error("Command {command} takes no arguments\n\nType 'help' to see valid usage")]
    UnexpectedArgument { command: String },
}

/// Commands understood by the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Sign in; the password is prompted for
    Login { email: String },
    /// Sign out and clear the session
    Logout,
    /// Show the current user
    Whoami,
    /// Re-activate the record screen
    Profile,
    /// Show the current view state without re-fetching
    Status,
    /// Show available commands
    Help,
    /// Leave the shell
    Exit,
    /// Blank line
    Empty,
}

/// Parses one line of shell input.
///
/// # Examples
///
/// ```
/// use kampus::commands::shell_commands::{parse_shell_command, ShellCommand};
///
/// assert_eq!(
///     parse_shell_command("login a@x.com").unwrap(),
///     ShellCommand::Login { email: "a@x.com".to_string() }
/// );
/// assert_eq!(parse_shell_command("EXIT").unwrap(), ShellCommand::Exit);
/// ```
pub fn parse_shell_command(input: &str) -> Result<ShellCommand, CommandError> {
    let mut words = input.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(ShellCommand::Empty);
    };
    let command = first.to_lowercase();
    let rest: Vec<&str> = words.collect();

    let no_args = |parsed: ShellCommand| {
        if rest.is_empty() {
            Ok(parsed)
        } else {
            Err(CommandError::UnexpectedArgument {
                command: command.clone(),
            })
        }
    };

    match command.as_str() {
        "login" => match rest.as_slice() {
            [email] => Ok(ShellCommand::Login {
                email: (*email).to_string(),
            }),
            [] => Err(CommandError::MissingArgument {
                command: "login".to_string(),
                usage: "login <email>".to_string(),
            }),
            _ => Err(CommandError::UnexpectedArgument {
                command: "login".to_string(),
            }),
        },
        "logout" => no_args(ShellCommand::Logout),
        "whoami" => no_args(ShellCommand::Whoami),
        "profile" | "refresh" => no_args(ShellCommand::Profile),
        "status" => no_args(ShellCommand::Status),
        "help" | "?" => no_args(ShellCommand::Help),
        "exit" | "quit" => no_args(ShellCommand::Exit),
        _ => Err(CommandError::UnknownCommand(first.to_string())),
    }
}

/// Prints shell help.
pub fn print_help() {
    println!(
        r#"
Shell Commands
==============

  login <email>   - Sign in (password is prompted for)
  logout          - Sign out and clear the cached session
  whoami          - Show the current user and where it came from
  profile         - Reload and show the student record
  refresh         - Same as profile
  status          - Show the last loaded state without reloading
  help, ?         - Show this help
  exit, quit      - Leave the shell

Sign-in and sign-out events from the identity provider are printed as they
happen.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(parse_shell_command("   ").unwrap(), ShellCommand::Empty);
    }

    #[test]
    fn test_parse_login_requires_email() {
        assert_eq!(
            parse_shell_command("login").unwrap_err(),
            CommandError::MissingArgument {
                command: "login".to_string(),
                usage: "login <email>".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_login_keeps_email_case() {
        assert_eq!(
            parse_shell_command("Login Budi@X.com").unwrap(),
            ShellCommand::Login {
                email: "Budi@X.com".to_string()
            }
        );
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(parse_shell_command("refresh").unwrap(), ShellCommand::Profile);
        assert_eq!(parse_shell_command("quit").unwrap(), ShellCommand::Exit);
        assert_eq!(parse_shell_command("?").unwrap(), ShellCommand::Help);
    }

    #[test]
    fn test_parse_rejects_extra_arguments() {
        assert!(matches!(
            parse_shell_command("logout now"),
            Err(CommandError::UnexpectedArgument { .. })
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_shell_command("dance").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("dance".to_string()));
        assert!(err.to_string().contains("help"));
    }
}
