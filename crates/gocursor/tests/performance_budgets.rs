//! Time-budget regression tests for gocursor.
//!
//! These tests assert that parsing and resolution complete within wall-clock
//! thresholds. They are gated behind `#[cfg(not(debug_assertions))]` because
//! debug-mode timings are not meaningful.
//!
//! Run with: `cargo test --release -p gocursor --features test-support --test performance_budgets`
//!
//! CI adaptation: when the `CI` environment variable is set, thresholds are
//! multiplied by a relaxation factor (default 3×, configurable via
//! `GOCURSOR_PERF_CI_FACTOR`).

#![cfg(not(debug_assertions))]

use std::time::{Duration, Instant};

use gocursor::source::{parse, ParseMode};
use gocursor::test_utils::fixture_workspace::{generate_go_file_content, FixtureConfig};
use gocursor::{Resolver, ResolverConfig};

// ---------------------------------------------------------------------------
// Harness helpers
// ---------------------------------------------------------------------------

/// Run `f` three times and return the median duration.
fn median_of_3<F: FnMut()>(mut f: F) -> Duration {
    let mut times = [Duration::ZERO; 3];
    for t in &mut times {
        let start = Instant::now();
        f();
        *t = start.elapsed();
    }
    times.sort();
    times[1]
}

/// Relaxation factor from explicit env values: the parsed `factor` (default
/// 3.0, never below 1.0) when `ci` is non-empty, 1.0 otherwise.
fn ci_factor_from(ci: Option<&str>, factor: Option<&str>) -> f64 {
    if ci.is_some_and(|v| !v.is_empty()) {
        factor
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&f| f >= 1.0)
            .unwrap_or(3.0)
    } else {
        1.0
    }
}

fn ci_factor() -> f64 {
    ci_factor_from(
        std::env::var("CI").ok().as_deref(),
        std::env::var("GOCURSOR_PERF_CI_FACTOR").ok().as_deref(),
    )
}

fn assert_within_budget(label: &str, measured: Duration, budget_ms: u64) {
    let factor = ci_factor();
    let threshold = Duration::from_secs_f64(budget_ms as f64 * factor / 1000.0);
    assert!(
        measured <= threshold,
        "Time budget exceeded for '{label}': \
         measured {measured:.1?}, threshold {threshold:.1?} \
         (base {budget_ms}ms × {factor:.1})",
    );
}

/// A single Go file of roughly `target_bytes`.
fn go_source_of_size(target_bytes: usize) -> String {
    let mut functions = 1;
    loop {
        let config = FixtureConfig {
            file_count: 1,
            functions_per_file: functions,
            methods_per_file: functions / 4,
            imports_per_file: 3,
            extra_decls_per_file: 0,
        };
        let content = generate_go_file_content(0, &config);
        if content.len() >= target_bytes {
            return content;
        }
        functions *= 2;
    }
}

// ---------------------------------------------------------------------------
// Harness self-tests
// ---------------------------------------------------------------------------

#[test]
fn median_of_3_calls_f_exactly_3_times() {
    let mut count = 0u32;
    let _ = median_of_3(|| count += 1);
    assert_eq!(count, 3);
}

#[test]
fn ci_factor_defaults() {
    assert!((ci_factor_from(None, None) - 1.0).abs() < f64::EPSILON);
    assert!((ci_factor_from(Some("true"), None) - 3.0).abs() < f64::EPSILON);
    assert!((ci_factor_from(Some("true"), Some("5.0")) - 5.0).abs() < f64::EPSILON);
    assert!((ci_factor_from(Some("true"), Some("0.5")) - 3.0).abs() < f64::EPSILON);
    assert!((ci_factor_from(Some("true"), Some("junk")) - 3.0).abs() < f64::EPSILON);
}

#[test]
#[should_panic(expected = "Time budget exceeded")]
fn assert_within_budget_panics_for_slow_op() {
    assert_within_budget("slow_op", Duration::from_secs(1), 5);
}

// ---------------------------------------------------------------------------
// Parse budgets: 10KB < 25ms, 100KB < 250ms
// ---------------------------------------------------------------------------

#[test]
fn budget_parse_10kb() {
    let code = go_source_of_size(10_240);
    let _ = parse(code.as_bytes(), ParseMode::Strict);
    let elapsed = median_of_3(|| {
        let _ = parse(code.as_bytes(), ParseMode::Strict);
    });
    assert_within_budget("parse_10kb", elapsed, 25);
}

#[test]
fn budget_parse_100kb() {
    let code = go_source_of_size(102_400);
    let _ = parse(code.as_bytes(), ParseMode::Strict);
    let elapsed = median_of_3(|| {
        let _ = parse(code.as_bytes(), ParseMode::Strict);
    });
    assert_within_budget("parse_100kb", elapsed, 250);
}

// ---------------------------------------------------------------------------
// Resolve budgets
// ---------------------------------------------------------------------------

/// One uncached resolution (parse included) of a 10KB file under 30ms.
#[test]
fn budget_cold_resolve_10kb() {
    let code = go_source_of_size(10_240);
    let pos = code.rfind("return").unwrap_or(code.len() / 2);
    let elapsed = median_of_3(|| {
        let resolver = Resolver::new();
        let _ = resolver.resolve(code.as_bytes(), pos, None);
    });
    assert_within_budget("cold_resolve_10kb", elapsed, 30);
}

/// Resolving every line end of a 10KB file with a warm parse under 100ms.
#[test]
fn budget_warm_resolve_every_line_10kb() {
    let code = go_source_of_size(10_240);
    let ends: Vec<usize> = code.match_indices('\n').map(|(i, _)| i).collect();
    let elapsed = median_of_3(|| {
        let resolver = Resolver::with_config(ResolverConfig::uniform(ends.len() + 1));
        let _ = resolver.parse(code.as_bytes());
        for &pos in &ends {
            let _ = resolver.resolve(code.as_bytes(), pos, None);
        }
    });
    assert_within_budget("warm_resolve_every_line_10kb", elapsed, 100);
}

/// A memoized lookup is effectively free.
#[test]
fn budget_cached_resolve() {
    let code = go_source_of_size(10_240);
    let resolver = Resolver::new();
    let _ = resolver.resolve(code.as_bytes(), 100, None);
    let elapsed = median_of_3(|| {
        let _ = resolver.resolve(code.as_bytes(), 100, None);
    });
    assert_within_budget("cached_resolve", elapsed, 1);
}
