// Result interpretation: turns a classified dispatch outcome into a
// concrete display instruction. Row-shape semantics differ per endpoint,
// so each endpoint carries a `ResultShape` and the rules live in one
// table here instead of being duplicated at every call site.

use serde_json::Value;

use crate::api::{Outcome, Row};

/// Per-endpoint rule for reading returned rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Row 0 carries `AppUserID` and `FullName`; success establishes the
    /// session identity.
    CredentialCheck,
    /// Rows are a table to render; zero rows means "none found", not an
    /// error.
    Listing,
    /// Zero rows is the positive result (nothing missing); non-empty
    /// rows list the missing items as a warning.
    MembershipCheck,
    /// Row 0 carries a flag deciding success vs failure, with a
    /// companion message field read on failure.
    ActionFlag(FlagRule),
}

/// How an action-flag endpoint encodes its verdict in row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagRule {
    pub kind: FlagKind,
    /// Field holding the server's human-readable explanation.
    pub message_field: &'static str,
    pub success: &'static str,
    /// Prefix for failure messages; the companion message is appended.
    pub failure: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// A boolean field, e.g. `EnrollmentSucceeded`.
    BoolField { field: &'static str },
    /// A status string compared against an expected value, e.g.
    /// `EnrollmentStatus == "Dropped"`.
    StatusEquals {
        field: &'static str,
        expected: &'static str,
    },
}

/// The authenticated user, established once by a credential check and
/// read-only for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub full_name: String,
}

/// What the UI should do with an outcome. The interpreter never talks
/// to the terminal itself.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayInstruction {
    /// Render rows as a table.
    Table(Vec<Row>),
    /// Informational message (empty listings, positive confirmations).
    Notice(String),
    /// A warning line followed by a table of offending rows.
    WarningTable { message: String, rows: Vec<Row> },
    /// Something went wrong; show the message as an error.
    Failure(String),
    /// Credentials accepted: store the session and show the greeting.
    SignedIn { session: Session, message: String },
}

/// Apply the shape rule for one endpoint to a dispatch outcome.
/// Transport and semantic failures map to `Failure` regardless of
/// shape; every shape guards against empty rows before indexing row 0.
pub fn interpret(outcome: Outcome, shape: ResultShape) -> DisplayInstruction {
    match (outcome, shape) {
        (Outcome::TransportFailure { status, detail }, _) => {
            DisplayInstruction::Failure(match status {
                Some(code) => format!("Request failed (HTTP {code}): {detail}"),
                None => format!("Request failed: {detail}"),
            })
        }
        (Outcome::SemanticFailure(reason), _) => DisplayInstruction::Failure(reason),

        (Outcome::Success(rows), ResultShape::CredentialCheck) => credential_check(&rows),
        (Outcome::Empty, ResultShape::CredentialCheck) => {
            DisplayInstruction::Failure("Invalid username or password.".into())
        }

        (Outcome::Success(rows), ResultShape::Listing) => DisplayInstruction::Table(rows),
        (Outcome::Empty, ResultShape::Listing) => {
            DisplayInstruction::Notice("No matching records were found.".into())
        }

        (Outcome::Empty, ResultShape::MembershipCheck) => {
            DisplayInstruction::Notice("All prerequisites met.".into())
        }
        (Outcome::Success(rows), ResultShape::MembershipCheck) => {
            DisplayInstruction::WarningTable {
                message: "Missing prerequisites:".into(),
                rows,
            }
        }

        (Outcome::Success(rows), ResultShape::ActionFlag(rule)) => {
            match flag_verdict(&rows, rule) {
                Ok(message) => DisplayInstruction::Notice(message),
                Err(reason) => interpret(Outcome::SemanticFailure(reason), shape),
            }
        }
        (Outcome::Empty, ResultShape::ActionFlag(rule)) => DisplayInstruction::Failure(format!(
            "{} The server returned no confirmation row.",
            rule.failure
        )),
    }
}

/// Read row 0 of a credential-check result. The dispatcher only yields
/// `Success` for non-empty data, but the guard stays: indexing an empty
/// sequence here was a defect in the original front end.
fn credential_check(rows: &[Row]) -> DisplayInstruction {
    let Some(row) = rows.first() else {
        return DisplayInstruction::Failure("Invalid username or password.".into());
    };
    let user_id = row.get("AppUserID").and_then(as_i64);
    let full_name = row.get("FullName").and_then(Value::as_str);
    match (user_id, full_name) {
        (Some(user_id), Some(full_name)) => DisplayInstruction::SignedIn {
            message: format!("Signed in as {full_name} (user #{user_id})."),
            session: Session {
                user_id,
                full_name: full_name.to_string(),
            },
        },
        _ => DisplayInstruction::Failure(
            "Login response was missing AppUserID or FullName.".into(),
        ),
    }
}

/// Decide success or failure from row 0 of an action-flag result. A
/// missing or unexpected flag value counts as failure, reported with
/// the companion message.
fn flag_verdict(rows: &[Row], rule: FlagRule) -> Result<String, String> {
    let row = rows
        .first()
        .ok_or_else(|| format!("{} The server returned no confirmation row.", rule.failure))?;

    let succeeded = match rule.kind {
        FlagKind::BoolField { field } => row.get(field).and_then(Value::as_bool),
        FlagKind::StatusEquals { field, expected } => {
            row.get(field).and_then(Value::as_str).map(|s| s == expected)
        }
    };

    if succeeded == Some(true) {
        Ok(rule.success.to_string())
    } else {
        Err(format!(
            "{} {}",
            rule.failure,
            companion_message(row, rule.message_field)
        ))
    }
}

fn companion_message(row: &Row, field: &str) -> String {
    match row.get(field) {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => "No details were provided.".into(),
        Some(other) => other.to_string(),
    }
}

/// The server returns user ids as numbers, but a string-typed id should
/// not break login.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
