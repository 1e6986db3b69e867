use std::collections::BTreeMap;

use lhgate::domain::assertion::{Assertion, Operator};
use lhgate::domain::error::FailureKind;
use lhgate::domain::report::{Audit, LighthouseReport};
use lhgate::engine::evaluate::evaluate;

fn report(entries: Vec<(&str, Audit)>) -> LighthouseReport {
    LighthouseReport {
        audits: entries
            .into_iter()
            .map(|(name, audit)| (name.to_string(), audit))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn parsed_assertions_drive_the_same_comparison_as_evaluate() {
    let assertion: Assertion = "largest-contentful-paint < 0.75".parse().expect("assertion");
    assert_eq!(assertion.operator, Operator::Lower);

    let report = report(vec![("largest-contentful-paint", Audit::scored(0.75))]);
    assert!(assertion.operator.holds(0.75, assertion.score));
    assert_eq!(
        evaluate(Some(&report), Some("largest-contentful-paint < 0.75")),
        Ok(1)
    );
}

#[test]
fn one_malformed_one_failing_one_passing_line() {
    let report = report(vec![
        ("a", Audit::scored(0.5)),
        ("b", Audit::scored(0.95)),
    ]);
    let failure = evaluate(Some(&report), Some("a >> 0.9\na > 0.9\nb > 0.9"))
        .expect_err("two failures");

    let messages: Vec<_> = failure.messages().collect();
    assert_eq!(
        messages,
        vec![
            "Audit assertion \"a >> 0.9\" is malformed.",
            "Expected greater than 0.9 for audit \"a\" score but got 0.5",
        ]
    );
    assert_eq!(failure.failures()[0].kind, FailureKind::MalformedAssertion);
    assert_eq!(failure.failures()[1].kind, FailureKind::AssertionFailed);
}

#[test]
fn evaluation_is_independent_across_calls() {
    let report = report(vec![("a", Audit::scored(1.0))]);
    let first = evaluate(Some(&report), Some("a = 1"));
    let second = evaluate(Some(&report), Some("a = 1\na > 0.5"));
    assert_eq!(first, Ok(1));
    assert_eq!(second, Ok(2));
}

#[test]
fn evaluate_can_run_concurrently() {
    let report = report(vec![("a", Audit::scored(0.8))]);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| evaluate(Some(&report), Some("a > 0.5\na < 0.9"))))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread"), Ok(2));
        }
    });
}
