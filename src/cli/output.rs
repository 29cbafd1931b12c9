//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::auth::Session;
use crate::gate::GateState;
use crate::resources::{Resource, ValidationErrors};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Neutral loading indicator
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Format a gate state as a colored label
pub fn format_gate_state(state: &GateState) -> String {
    match state {
        GateState::Allowed => state.label().green().to_string(),
        GateState::Checking => state.label().yellow().to_string(),
        _ => state.label().red().to_string(),
    }
}

/// Print a table of records
pub fn print_resource_table<R: Resource>(items: &[R]) {
    if items.is_empty() {
        info(&format!("No {} found", R::KIND));
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            R::headers()
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );

    for item in items {
        table.add_row(item.row());
    }

    println!("{table}");
}

/// Print one record as label/value pairs
pub fn print_record<R: Resource>(item: &R) {
    println!("{}", format!("{} {}", R::KIND, item.id()).bold().underline());
    println!();
    for (header, value) in R::headers().iter().zip(item.row()) {
        println!("  {} {}", format!("{}:", header).bold(), value);
    }
}

/// Print the logged-in session
pub fn print_session_detail(session: &Session) {
    println!("{}", "Session".bold().underline());
    println!();
    println!("  {} {}", "User:".bold(), session.username());
    if !session.user.email.is_empty() {
        println!("  {} {}", "Email:".bold(), session.user.email);
    }
    println!("  {} {}", "Role:".bold(), session.role().to_string().cyan());
    println!("  {} {}", "Home:".bold(), session.role().home_route());
    if let Some(clinic) = &session.clinic_id {
        println!("  {} {}", "Clinic:".bold(), clinic);
    }
    if session.elevated {
        println!("  {} {}", "Access:".bold(), "super-admin".magenta());
    }
}

/// Print field-level validation errors
pub fn print_validation_errors(errors: &ValidationErrors) {
    error("Please fix the following fields:");
    for (field, message) in errors.iter() {
        eprintln!("    {} {}", format!("{}:", field).bold(), message);
    }
}

/// Confirm an action with the user
pub fn confirm(message: &str) -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Ask for a password without echoing it
pub fn prompt_password(prompt: &str) -> std::io::Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()
        .map_err(std::io::Error::other)
}
