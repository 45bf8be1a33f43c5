//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use std::time::Duration;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::converge::ConvergeReport;
use crate::identifier::IdentifierKind;
use crate::profiles::{Operation, OperationProfile, ResourceProfile};
use crate::waiter::WaitOutcome;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Profile operation row for table display.
#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Pending")]
    pending: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Poll")]
    poll: String,
    #[tabled(rename = "Timeout")]
    timeout: String,
    #[tabled(rename = "Retry")]
    retry: String,
}

/// Decoded field row for table display.
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats an encoded identifier.
    #[must_use]
    pub fn format_encoded(&self, kind: IdentifierKind, id: &str) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "kind": kind.to_string(),
                "id": id,
            })),
            OutputFormat::Text => id.to_string(),
        }
    }

    /// Formats decoded identifier fields.
    #[must_use]
    pub fn format_decoded(&self, fields: &[(&'static str, String)]) -> String {
        match self.format {
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = fields
                    .iter()
                    .map(|(name, value)| ((*name).to_string(), value.clone().into()))
                    .collect();
                to_json(&map)
            }
            OutputFormat::Text => {
                let rows = fields.iter().map(|(name, value)| FieldRow {
                    field: (*name).to_string(),
                    value: value.clone(),
                });
                Table::new(rows).to_string()
            }
        }
    }

    /// Formats resource profiles.
    #[must_use]
    pub fn format_profiles<'a>(
        &self,
        profiles: impl IntoIterator<Item = &'a ResourceProfile>,
    ) -> String {
        let rows: Vec<ProfileRow> = profiles
            .into_iter()
            .flat_map(|profile| {
                Operation::ALL.into_iter().filter_map(move |operation| {
                    let op = profile.operation(operation);
                    Self::has_behaviour(op).then(|| Self::profile_row(profile, operation, op))
                })
            })
            .collect();

        match self.format {
            OutputFormat::Json => to_json(&rows.iter().map(ProfileJson::from).collect::<Vec<_>>()),
            OutputFormat::Text if rows.is_empty() => "   No profiles.\n".to_string(),
            OutputFormat::Text => format!("{}\n", Table::new(rows)),
        }
    }

    fn has_behaviour(op: &OperationProfile) -> bool {
        op.wait.is_some() || !op.retry.table.is_empty()
    }

    fn profile_row(
        profile: &ResourceProfile,
        operation: Operation,
        op: &OperationProfile,
    ) -> ProfileRow {
        let (pending, target, poll, timeout) = op.wait.as_ref().map_or_else(
            || ("-".to_string(), "-".to_string(), "-".to_string(), "-".to_string()),
            |spec| {
                (
                    spec.pending.iter().cloned().collect::<Vec<_>>().join(", "),
                    spec.target_label(),
                    format_duration(spec.poll_interval),
                    format_duration(spec.timeout),
                )
            },
        );

        let retry = if op.retry.table.is_empty() {
            "-".to_string()
        } else {
            format!(
                "{} rule(s) for {}",
                op.retry.table.rules().len(),
                format_duration(op.retry.max_duration)
            )
        };

        ProfileRow {
            kind: profile.kind.to_string(),
            operation: operation.to_string(),
            pending,
            target,
            poll,
            timeout,
            retry,
        }
    }

    /// Formats the outcome of a wait.
    #[must_use]
    pub fn format_wait_outcome(&self, key: &str, outcome: &WaitOutcome<serde_json::Value>) -> String {
        let (status, state, reason) = match outcome {
            WaitOutcome::Reached(obs) => ("reached", Some(obs.state.as_str()), None),
            WaitOutcome::Unexpected(obs) => (
                "unexpected",
                Some(obs.state.as_str()),
                obs.reason.as_deref(),
            ),
            WaitOutcome::Gone => ("gone", None, None),
        };

        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "id": key,
                "status": status,
                "state": state,
                "reason": reason,
                "resource": outcome.observation().map(|obs| &obs.value),
            })),
            OutputFormat::Text => match outcome {
                WaitOutcome::Reached(obs) => {
                    format!("{} {key} reached {}\n", "✓".green(), obs.state.green())
                }
                WaitOutcome::Gone => format!("{} {key} deleted\n", "✓".green()),
                WaitOutcome::Unexpected(obs) => format!(
                    "{} {key} ended in {}{}\n",
                    "✗".red(),
                    obs.state.red(),
                    reason.map(|r| format!(": {r}")).unwrap_or_default()
                ),
            },
        }
    }

    /// Formats a converge report.
    #[must_use]
    pub fn format_report(&self, report: &ConvergeReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Text => {
                let mut output = format!("{} {report}\n", "✓".green());
                let _ = writeln!(output, "   Started: {}", report.started_at.format("%Y-%m-%d %H:%M:%S"));
                let _ = writeln!(output, "   Finished: {}", report.finished_at.format("%Y-%m-%d %H:%M:%S"));
                output
            }
        }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "valid": result.is_valid(),
                "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "warnings": result.warnings,
            })),
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Configuration is valid\n", "✓".green())
                } else {
                    format!(
                        "{} Configuration has {} error(s)\n",
                        "✗".red(),
                        result.error_count()
                    )
                };

                for error in &result.errors {
                    let _ = writeln!(output, "   - {error}");
                }

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                output
            }
        }
    }

    /// Formats an error message.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                to_json(&serde_json::json!({ "status": "error", "message": message }))
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

// JSON serialization helpers

#[derive(Serialize)]
struct ProfileJson<'a> {
    kind: &'a str,
    operation: &'a str,
    pending: &'a str,
    target: &'a str,
    poll: &'a str,
    timeout: &'a str,
    retry: &'a str,
}

impl<'a> From<&'a ProfileRow> for ProfileJson<'a> {
    fn from(row: &'a ProfileRow) -> Self {
        Self {
            kind: &row.kind,
            operation: &row.operation,
            pending: &row.pending,
            target: &row.target,
            poll: &row.poll,
            timeout: &row.timeout,
            retry: &row.retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{ProfileRegistry, ResourceKind};
    use crate::waiter::Observation;
    use serde_json::json;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(15)), "15s");
        assert_eq!(format_duration(Duration::from_secs(900)), "15m");
        assert_eq!(format_duration(Duration::from_secs(90)), "90s");
    }

    #[test]
    fn test_profiles_json_lists_operations() {
        let registry = ProfileRegistry::builtin();
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_profiles(registry.get(ResourceKind::Registry));

        let rows: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(
            rows,
            json!([{
                "kind": "registry",
                "operation": "delete",
                "pending": "DELETING",
                "target": "<deleted>",
                "poll": "2s",
                "timeout": "2m",
                "retry": "-",
            }])
        );
    }

    #[test]
    fn test_profiles_text_table() {
        colored::control::set_override(false);
        let registry = ProfileRegistry::builtin();
        let output = OutputFormatter::new(OutputFormat::Text).format_profiles(registry.iter());

        assert!(output.contains("dev_endpoint"));
        assert!(output.contains("PROVISIONING"));
        assert!(output.contains("3 rule(s) for 2m"));
    }

    #[test]
    fn test_wait_outcome_json() {
        let outcome = WaitOutcome::Unexpected(
            Observation::new("FAILED", json!({"Status": "FAILED"})).with_reason("bad subnet"),
        );
        let output = OutputFormatter::new(OutputFormat::Json).format_wait_outcome("dev1", &outcome);
        let value: serde_json::Value = serde_json::from_str(&output).expect("json");

        assert_eq!(value["status"], "unexpected");
        assert_eq!(value["reason"], "bad subnet");
        assert_eq!(value["resource"]["Status"], "FAILED");
    }

    #[test]
    fn test_decoded_fields_json() {
        let fields = IdentifierKind::Table
            .decode("111122223333:my_db:my_table")
            .expect("valid id");
        let output = OutputFormatter::new(OutputFormat::Json).format_decoded(&fields);
        let value: serde_json::Value = serde_json::from_str(&output).expect("json");

        assert_eq!(value["catalog_id"], "111122223333");
        assert_eq!(value["table"], "my_table");
    }
}
