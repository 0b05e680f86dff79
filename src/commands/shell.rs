//! Interactive shell
//!
//! Keeps one [`AppContext`] and one [`StudentView`] alive for the whole
//! session so login, logout, and repeated record activations share the same
//! provider state. A background task prints every sign-in and sign-out the
//! identity provider reports.

use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::Identity;
use crate::commands::password::read_password;
use crate::commands::profile::print_state;
use crate::commands::session::describe_current_user;
use crate::commands::shell_commands::{parse_shell_command, print_help, ShellCommand};
use crate::commands::AppContext;
use crate::error::Result;
use crate::resolver::StudentView;

/// Start the interactive shell
pub async fn run_shell(ctx: AppContext) -> Result<()> {
    let view = Arc::new(StudentView::new(ctx.resolver.clone()));
    let listener = spawn_identity_listener(ctx.provider.subscribe());

    let mut rl = DefaultEditor::new()?;

    println!("{}", "kampus shell".bold());
    println!("Type 'help' for commands, 'exit' to leave.\n");

    view.activate().await;
    print_state(&view.state(), false)?;

    loop {
        match rl.readline("kampus> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_shell_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e.to_string().red());
                        continue;
                    }
                };

                match command {
                    ShellCommand::Login { email } => {
                        let password = match read_password("Password: ") {
                            Ok(password) => password,
                            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                                println!("{}", "Login cancelled.".yellow());
                                continue;
                            }
                            Err(e) => return Err(e.into()),
                        };
                        match ctx.manager.login(&email, &password).await {
                            Ok(_) => {
                                view.activate().await;
                                print_state(&view.state(), false)?;
                            }
                            Err(e) => println!("{} {}", "Login failed:".red(), e),
                        }
                    }
                    ShellCommand::Logout => {
                        ctx.manager.logout().await;
                    }
                    ShellCommand::Whoami => {
                        println!("{}", describe_current_user(&ctx).await);
                    }
                    ShellCommand::Profile => {
                        view.activate().await;
                        print_state(&view.state(), false)?;
                    }
                    ShellCommand::Status => {
                        print_state(&view.state(), false)?;
                    }
                    ShellCommand::Help => print_help(),
                    ShellCommand::Exit => break,
                    ShellCommand::Empty => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(e) => {
                tracing::error!("Readline error: {}", e);
                break;
            }
        }
    }

    listener.abort();
    println!("Goodbye!");
    Ok(())
}

/// Prints a notice for every identity change until the sender is dropped.
pub fn spawn_identity_listener(mut changes: watch::Receiver<Option<Identity>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let current = changes.borrow_and_update().clone();
            match current {
                Some(identity) => println!(
                    "\n{} {}",
                    "[auth] signed in:".green(),
                    identity.email.as_deref().unwrap_or(&identity.uid)
                ),
                None => println!("\n{}", "[auth] signed out".yellow()),
            }
        }
        tracing::debug!("Identity listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FakeIdentityProvider, IdentityProvider};

    #[tokio::test]
    async fn test_identity_listener_stops_when_provider_dropped() {
        let provider = FakeIdentityProvider::new();
        let handle = spawn_identity_listener(provider.subscribe());

        provider.set_current(Some(Identity::new("u1")));
        provider.set_current(None);
        drop(provider);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("listener should finish")
            .expect("listener should not panic");
    }
}
