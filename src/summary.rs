use crate::errors::SweepError;
use crate::types::{HarnessOutput, TestCounts};

const MARKER: &str = "test result:";

/// Extract the pass/fail/ignore counts from libtest-style harness output.
///
/// The first occurrence of
/// `test result: <ok|FAIL>. [<n> failed; ]<n> passed; <n> ignored;` wins.
/// An absent `failed` group means zero failures.
pub fn extract(stdout: &str) -> Result<TestCounts, SweepError> {
    if !stdout.contains(MARKER) {
        return Err(SweepError::MissingSummary);
    }

    for (idx, _) in stdout.match_indices(MARKER) {
        if let Some(counts) = parse_summary_at(&stdout[idx..]) {
            return Ok(counts);
        }
    }

    Err(SweepError::Parse {
        line: first_marker_line(stdout),
    })
}

/// Reject a summary that disagrees with the harness exit status: a failing
/// exit must report failures, and a clean exit must report none.
pub fn check_consistency(
    threshold: u64,
    output: &HarnessOutput,
    counts: &TestCounts,
) -> Result<(), SweepError> {
    if output.success() == (counts.failed == 0) {
        return Ok(());
    }
    Err(SweepError::Consistency {
        threshold,
        status: output.status_display(),
        failed: counts.failed,
    })
}

fn parse_summary_at(text: &str) -> Option<TestCounts> {
    let mut scan = Scanner { rest: text };
    scan.eat(MARKER)?;
    scan.eat(" ")?;
    if scan.eat("FAIL").is_none() {
        scan.eat("ok")?;
    }
    // Any single character other than a newline, normally '.'
    scan.any_char_on_line()?;
    scan.eat(" ")?;

    let first = scan.number()?;
    let (failed, passed) = if scan.eat(" failed; ").is_some() {
        let passed = scan.number()?;
        scan.eat(" passed; ")?;
        (first, passed)
    } else {
        scan.eat(" passed; ")?;
        (0, first)
    };
    let ignored = scan.number()?;
    scan.eat(" ignored;")?;

    Some(TestCounts {
        passed,
        failed,
        ignored,
    })
}

fn first_marker_line(stdout: &str) -> String {
    stdout
        .lines()
        .find(|l| l.contains(MARKER))
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}

struct Scanner<'a> {
    rest: &'a str,
}

impl Scanner<'_> {
    fn eat(&mut self, literal: &str) -> Option<()> {
        self.rest = self.rest.strip_prefix(literal)?;
        Some(())
    }

    fn any_char_on_line(&mut self) -> Option<char> {
        let c = self.rest.chars().next().filter(|&c| c != '\n')?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    fn number(&mut self) -> Option<u64> {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let value = self.rest[..end].parse().ok()?;
        self.rest = &self.rest[end..];
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn output(exit_code: Option<i32>) -> HarnessOutput {
        HarnessOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code,
            elapsed: Duration::from_secs(1),
        }
    }

    fn counts(passed: u64, failed: u64, ignored: u64) -> TestCounts {
        TestCounts {
            passed,
            failed,
            ignored,
        }
    }

    // ---- extract ----

    #[test]
    fn ok_summary_without_failed_group() {
        let parsed = extract("test result: ok. 5 passed; 2 ignored;").unwrap();
        assert_eq!(parsed, counts(5, 0, 2));
    }

    #[test]
    fn fail_summary_with_failed_group() {
        let parsed = extract("test result: FAIL. 3 failed; 7 passed; 1 ignored;").unwrap();
        assert_eq!(parsed, counts(7, 3, 1));
    }

    #[test]
    fn ok_summary_with_explicit_zero_failed() {
        let parsed = extract("test result: ok. 0 failed; 12 passed; 0 ignored;").unwrap();
        assert_eq!(parsed, counts(12, 0, 0));
    }

    #[test]
    fn summary_embedded_in_full_libtest_output() {
        let stdout = "\
running 3 tests
test tests/ui/a.rs ... ok
test tests/ui/b.rs ... FAILED
test tests/ui/c.rs ... ignored

failures:
    tests/ui/b.rs

test result: FAIL. 1 failed; 1 passed; 1 ignored; 0 measured; 0 filtered out; finished in 3.21s

";
        assert_eq!(extract(stdout).unwrap(), counts(1, 1, 1));
    }

    #[test]
    fn first_matching_summary_wins() {
        let stdout = "test result: ok. 4 passed; 0 ignored;\ntest result: ok. 9 passed; 9 ignored;\n";
        assert_eq!(extract(stdout).unwrap(), counts(4, 0, 0));
    }

    #[test]
    fn malformed_marker_followed_by_valid_one() {
        let stdout = "test result: pending\ntest result: ok. 2 passed; 1 ignored;\n";
        assert_eq!(extract(stdout).unwrap(), counts(2, 0, 1));
    }

    #[test]
    fn missing_marker_is_missing_summary() {
        let err = extract("error: could not compile `rpl_driver`\n").unwrap_err();
        assert!(matches!(err, SweepError::MissingSummary));
    }

    #[test]
    fn empty_output_is_missing_summary() {
        assert!(matches!(extract("").unwrap_err(), SweepError::MissingSummary));
    }

    #[test]
    fn missing_punctuation_is_parse_error() {
        let err = extract("test result: ok 5 passed 2 ignored").unwrap_err();
        match err {
            SweepError::Parse { line } => {
                assert_eq!(line, "test result: ok 5 passed 2 ignored")
            }
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn unknown_verdict_is_parse_error() {
        let err = extract("test result: maybe. 5 passed; 2 ignored;").unwrap_err();
        assert!(matches!(err, SweepError::Parse { .. }));
    }

    #[test]
    fn missing_ignored_group_is_parse_error() {
        let err = extract("test result: ok. 5 passed;").unwrap_err();
        assert!(matches!(err, SweepError::Parse { .. }));
    }

    #[test]
    fn newline_in_place_of_separator_is_parse_error() {
        let err = extract("test result: ok\n 5 passed; 2 ignored;").unwrap_err();
        assert!(matches!(err, SweepError::Parse { .. }));
    }

    #[test]
    fn negative_count_is_parse_error() {
        let err = extract("test result: ok. -5 passed; 2 ignored;").unwrap_err();
        assert!(matches!(err, SweepError::Parse { .. }));
    }

    #[test]
    fn overflowing_count_is_parse_error() {
        let err = extract("test result: ok. 99999999999999999999999 passed; 0 ignored;").unwrap_err();
        assert!(matches!(err, SweepError::Parse { .. }));
    }

    #[test]
    fn marker_may_appear_mid_line() {
        let parsed = extract("[stdout] test result: ok. 1 passed; 0 ignored;").unwrap();
        assert_eq!(parsed, counts(1, 0, 0));
    }

    // ---- check_consistency ----

    #[test]
    fn clean_exit_with_no_failures_is_consistent() {
        assert!(check_consistency(0, &output(Some(0)), &counts(4, 0, 0)).is_ok());
    }

    #[test]
    fn failing_exit_with_failures_is_consistent() {
        assert!(check_consistency(10, &output(Some(101)), &counts(3, 1, 0)).is_ok());
    }

    #[test]
    fn failing_exit_without_failures_is_rejected() {
        let err = check_consistency(10, &output(Some(101)), &counts(4, 0, 0)).unwrap_err();
        match err {
            SweepError::Consistency {
                threshold,
                status,
                failed,
            } => {
                assert_eq!(threshold, 10);
                assert_eq!(status, "exit code 101");
                assert_eq!(failed, 0);
            }
            other => panic!("expected Consistency, got {:?}", other),
        }
    }

    #[test]
    fn clean_exit_with_failures_is_rejected() {
        let err = check_consistency(0, &output(Some(0)), &counts(3, 1, 0)).unwrap_err();
        assert!(matches!(err, SweepError::Consistency { failed: 1, .. }));
    }

    #[test]
    fn signal_termination_without_failures_is_rejected() {
        let err = check_consistency(0, &output(None), &counts(4, 0, 0)).unwrap_err();
        assert!(err.to_string().contains("terminated by signal"));
    }
}
