// UI layer: provides a simple interactive menu using `dialoguer`.
// The functions are small and synchronous to make the flow easy to follow.

use crate::api::{ApiClient, Endpoint, Params, Row};
use crate::interpret::{interpret, DisplayInstruction, Session};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::time::Duration;

/// Main interactive menu. Receives an `ApiClient` instance and runs a
/// select loop until the user chooses "Exit". The session identity set
/// by a successful validation lives here, owned by the loop, and is
/// only read afterwards (as a default for student-id prompts).
///
/// Note: `Select::interact()` is keyboard-driven: arrow keys and Enter
/// choose an option.
pub fn main_menu(api: ApiClient) -> Result<()> {
    let mut session: Option<Session> = None;
    loop {
        let mut items: Vec<&str> = Endpoint::ALL.iter().map(|e| e.label()).collect();
        items.push("Exit");
        let selection = Select::new().items(&items).default(0).interact()?;

        let Some(&endpoint) = Endpoint::ALL.get(selection) else {
            break;
        };
        run_operation(&api, endpoint, &mut session)?;
    }
    Ok(())
}

/// Prompt for the endpoint's parameters, dispatch once, and render the
/// interpreted result. The blocking call doubles as the guard against
/// duplicate submissions: no second request can start until this one
/// resolves.
fn run_operation(api: &ApiClient, endpoint: Endpoint, session: &mut Option<Session>) -> Result<()> {
    let params = collect_params(endpoint, session.as_ref())?;
    if let Err(e) = endpoint.check_params(&params) {
        println!("{}", e.to_string().red());
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("{}...", endpoint.label()));

    let outcome = api.dispatch(endpoint, &params);
    spinner.finish_and_clear();

    render(interpret(outcome, endpoint.shape()), session);
    Ok(())
}

/// Collect each required parameter in descriptor order. The password
/// field gets a hidden prompt; student-id prompts default to the
/// signed-in user when a session exists.
fn collect_params(endpoint: Endpoint, session: Option<&Session>) -> Result<Params> {
    let mut params = Params::new();
    for &name in endpoint.required_params() {
        let value = match name {
            "password" => Password::new().with_prompt(prompt_label(name)).interact()?,
            "studentID" => {
                let mut input = Input::<String>::new().with_prompt(prompt_label(name));
                if let Some(session) = session {
                    input = input.default(session.user_id.to_string());
                }
                input.interact_text()?
            }
            _ => Input::<String>::new()
                .with_prompt(prompt_label(name))
                .interact_text()?,
        };
        params = params.set(name, value);
    }
    Ok(params)
}

fn prompt_label(name: &str) -> &'static str {
    match name {
        "username" => "Username",
        "password" => "Password",
        "studentID" => "Student ID",
        "subjectCode" => "Subject code",
        "courseNumber" => "Course number",
        "courseOfferingID" => "Course offering ID",
        _ => "Value",
    }
}

/// Apply one display instruction to the terminal, storing the session
/// on a successful sign-in.
fn render(instruction: DisplayInstruction, session: &mut Option<Session>) {
    match instruction {
        DisplayInstruction::Table(rows) => print_table(&rows),
        DisplayInstruction::Notice(message) => println!("{}", message.green()),
        DisplayInstruction::WarningTable { message, rows } => {
            println!("{}", message.yellow());
            print_table(&rows);
        }
        DisplayInstruction::Failure(message) => println!("{}", message.red()),
        DisplayInstruction::SignedIn {
            session: signed_in,
            message,
        } => {
            println!("{}", message.green());
            *session = Some(signed_in);
        }
    }
}

/// Render rows as an aligned plain-text table. Column order follows the
/// first row's field order (the server's order, preserved by serde).
fn print_table(rows: &[Row]) {
    let Some(first) = rows.first() else {
        return;
    };
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    if columns.is_empty() {
        return;
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell_text(row.get(*c))).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header: Vec<String> = columns
        .iter()
        .zip(widths.iter().copied())
        .map(|(c, w)| format!("{c:<w$}"))
        .collect();
    println!("{}", header.join("  ").bold());
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect();
        println!("{}", line.join("  "));
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
