// Copyright (c) The testpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::run::{TestResult, TestRun, TestStatus};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// A fixed timestamp `minutes` minutes after noon UTC on 2024-03-01.
pub(crate) fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + TimeDelta::minutes(minutes)
}

/// A result for the test `name`, defined in `tests/{name}.rs` at line 1.
pub(crate) fn result(name: &str, status: TestStatus) -> TestResult {
    TestResult::new(name, format!("tests/{name}.rs"), 1, status)
}

/// A run with `passed` passing and `failed` failing tests named `t0`, `t1`,
/// ..., timestamped at `at(minutes)` and lasting one second.
pub(crate) fn run_with(minutes: i64, passed: usize, failed: usize) -> TestRun {
    let tests = (0..passed + failed)
        .map(|i| {
            let status = if i < passed {
                TestStatus::Pass
            } else {
                TestStatus::Fail
            };
            let result = result(&format!("t{i}"), status);
            if status == TestStatus::Fail {
                result.with_message(format!("assertion failed at step {i}"))
            } else {
                result
            }
        })
        .collect();
    let start = at(minutes);
    TestRun::from_results(tests)
        .with_times(start, start + TimeDelta::seconds(1))
        .with_timestamp(start)
}
