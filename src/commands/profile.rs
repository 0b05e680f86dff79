//! Student record display

use colored::Colorize;
use prettytable::{format, Table};

use crate::commands::AppContext;
use crate::error::Result;
use crate::resolver::{Resolution, StudentView, ViewState};
use crate::student::StudentRecord;

/// Runs one activation of the record screen and prints the outcome.
pub async fn show_profile(ctx: &AppContext, json: bool) -> Result<()> {
    let view = StudentView::new(ctx.resolver.clone());
    view.activate().await;
    print_state(&view.state(), json)
}

/// Prints a view state, either as a table or as JSON.
pub fn print_state(state: &ViewState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    match &state.resolution {
        Some(Resolution::Ready { record, identity }) => {
            println!();
            record_table(record).printstd();
            println!("Loaded for {} via {}", identity.uid.cyan(), identity.source);
            println!();
        }
        Some(Resolution::FetchError { reason, .. }) => {
            println!("{}", state.error.as_deref().unwrap_or_default().red());
            tracing::debug!(reason = %reason, "Record fetch failed");
        }
        Some(_) => {
            println!("{}", state.error.as_deref().unwrap_or_default().yellow());
        }
        None => println!("{}", "Loading...".dimmed()),
    }
    Ok(())
}

/// Two-column table of a student record.
pub fn record_table(record: &StudentRecord) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    let year = record
        .angkatan
        .map(|year| year.to_string())
        .unwrap_or_else(|| "-".to_string());

    table.add_row(prettytable::row!["Nama".bold(), display_or_dash(&record.nama)]);
    table.add_row(prettytable::row!["NIM".bold(), display_or_dash(&record.nim)]);
    table.add_row(prettytable::row![
        "Jurusan".bold(),
        display_or_dash(&record.jurusan)
    ]);
    table.add_row(prettytable::row!["Angkatan".bold(), year]);
    table
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
