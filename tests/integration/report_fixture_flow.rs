use std::fs::File;
use std::path::{Path, PathBuf};

use lhgate::domain::error::FailureKind;
use lhgate::engine::evaluate::evaluate;
use lhgate::io::reader::{read_report, read_report_path, read_text_path};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn fixture_report_loads_scored_and_informative_audits() {
    let report = read_report_path(&fixture_path("report.json")).expect("fixture report");

    assert_eq!(report.audits.len(), 6);
    assert_eq!(report.audit("speed-index").and_then(|a| a.score), Some(0.62));
    assert_eq!(
        report
            .audit("speed-index")
            .and_then(|a| a.friendly_display_value()),
        Some("4.8 s")
    );
    assert_eq!(report.audit("diagnostics").and_then(|a| a.score), None);
    assert_eq!(report.audit("network-requests").and_then(|a| a.score), None);
}

#[test]
fn fixture_assertions_pass_against_fixture_report() {
    let report = read_report(File::open(fixture_path("report.json")).expect("open report"))
        .expect("fixture report");
    let assertions = read_text_path(&fixture_path("passing-assertions.txt")).expect("assertions");

    assert_eq!(evaluate(Some(&report), Some(assertions.as_str())), Ok(3));
}

#[test]
fn categories_are_not_audits() {
    let report = read_report_path(&fixture_path("report.json")).expect("fixture report");
    let failure = evaluate(Some(&report), Some("performance > 0.5")).expect_err("no such audit");
    assert_eq!(failure.failures()[0].kind, FailureKind::AuditNotFound);
}
