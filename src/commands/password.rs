//! Masked password prompt
//!
//! Uses a one-off rustyline editor whose highlighter renders every typed
//! character as `*`. The line is never added to history.

use std::borrow::Cow;

use rustyline::completion::Completer;
use rustyline::config::ColorMode;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};

/// Highlighter that hides the input line.
#[derive(Debug, Default)]
pub struct PasswordMask;

impl Highlighter for PasswordMask {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned("*".repeat(line.chars().count()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Completer for PasswordMask {
    type Candidate = String;
}

impl Hinter for PasswordMask {
    type Hint = String;
}

impl Validator for PasswordMask {}

impl Helper for PasswordMask {}

/// Reads a password without echoing it.
///
/// # Errors
///
/// Returns the readline error, including `Interrupted` and `Eof` when the
/// user cancels.
pub fn read_password(prompt: &str) -> rustyline::Result<String> {
    let config = rustyline::Config::builder()
        .color_mode(ColorMode::Forced)
        .auto_add_history(false)
        .build();
    let mut rl: Editor<PasswordMask, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(PasswordMask));

    let password = rl.readline(prompt)?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}
