use tracing::debug;

use crate::domain::assertion::{Assertion, Operator};
use crate::domain::error::{AssertionFailure, EvaluationFailure, FailureKind};
use crate::domain::report::LighthouseReport;

/// Evaluates every assertion line of `assertions` against `report`.
///
/// Lines are split on `\n` / `\r\n`, trimmed, and blank lines are ignored.
/// A failing line never stops the batch: all failures are collected and
/// returned together in line order. Audits whose score is missing are skipped
/// and count neither as success nor as failure.
///
/// Returns the number of satisfied assertions when nothing failed.
pub fn evaluate(
    report: Option<&LighthouseReport>,
    assertions: Option<&str>,
) -> Result<usize, EvaluationFailure> {
    let empty = LighthouseReport::default();
    let report = report.unwrap_or(&empty);

    let mut success_count = 0;
    let mut failures = Vec::new();

    for (line, text) in assertion_lines(assertions.unwrap_or_default()) {
        match evaluate_line(report, text) {
            Ok(Outcome::Satisfied) => {
                debug!(line, assertion = text, "assertion satisfied");
                success_count += 1;
            }
            Ok(Outcome::Skipped) => {
                debug!(line, assertion = text, "audit has no score, skipping");
            }
            Err((kind, message)) => {
                debug!(line, assertion = text, %kind, "assertion failed");
                failures.push(AssertionFailure {
                    line,
                    assertion: text.to_string(),
                    kind,
                    message,
                });
            }
        }
    }

    match EvaluationFailure::from_failures(failures) {
        Some(failure) => Err(failure),
        None => Ok(success_count),
    }
}

enum Outcome {
    Satisfied,
    Skipped,
}

fn assertion_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn evaluate_line(report: &LighthouseReport, text: &str) -> Result<Outcome, (FailureKind, String)> {
    let assertion =
        Assertion::parse(text).map_err(|err| (FailureKind::MalformedAssertion, err.to_string()))?;

    let Some(audit) = report.audit(&assertion.audit_name) else {
        return Err((
            FailureKind::AuditNotFound,
            format!("Could not find audit \"{}\"", assertion.audit_name),
        ));
    };

    let Some(actual) = audit.score else {
        return Ok(Outcome::Skipped);
    };

    if assertion.operator.holds(actual, assertion.score) {
        return Ok(Outcome::Satisfied);
    }

    let mut message = format!(
        "Expected {}{} for audit \"{}\" score but got {}",
        expectation_prefix(assertion.operator),
        assertion.score,
        assertion.audit_name,
        actual
    );
    if let Some(display_value) = audit.friendly_display_value() {
        message.push_str(", friendly display value: ");
        message.push_str(display_value);
    }
    Err((FailureKind::AssertionFailed, message))
}

fn expectation_prefix(operator: Operator) -> &'static str {
    match operator {
        Operator::Equal => "",
        Operator::Greater => "greater than ",
        Operator::Lower => "lower than ",
    }
}
