//! Timing properties of the sliding-window limiter.

use std::time::{Duration, Instant};
use tollgate_rate_limit::{RateLimitConfig, RateLimiter};

/// Largest number of admissions that fall inside any window of `period`
/// starting at an admission.
fn max_in_window(times: &[Instant], period: Duration) -> usize {
    times
        .iter()
        .map(|&start| {
            times
                .iter()
                .filter(|&&t| t >= start && t.duration_since(start) < period)
                .count()
        })
        .max()
        .unwrap_or(0)
}

/// Largest token sum inside any window of `period` starting at an admission.
fn max_tokens_in_window(admissions: &[(Instant, u64)], period: Duration) -> u64 {
    admissions
        .iter()
        .map(|&(start, _)| {
            admissions
                .iter()
                .filter(|&&(t, _)| t >= start && t.duration_since(start) < period)
                .map(|&(_, cost)| cost)
                .sum()
        })
        .max()
        .unwrap_or(0)
}

/// Group admissions into one-period bins counted from the first admission.
fn bins(times: &[Instant], period: Duration) -> Vec<usize> {
    let first = times[0];
    let mut counts: Vec<usize> = Vec::new();
    for &t in times {
        let bin = (t.duration_since(first).as_secs_f64() / period.as_secs_f64()).floor() as usize;
        if counts.len() <= bin {
            counts.resize(bin + 1, 0);
        }
        counts[bin] += 1;
    }
    counts
}

#[test]
fn test_rpm_only_bins_and_stagger() {
    let period = Duration::from_secs(1);
    let limiter = RateLimiter::new(RateLimitConfig::new(period).with_rpm(4)).unwrap();

    let times: Vec<Instant> = (0..10)
        .map(|_| limiter.acquire_blocking(0).admitted_at())
        .collect();

    let counts = bins(&times, period);
    assert_eq!(counts.len(), 3, "bins: {:?}", counts);
    assert!(counts.iter().all(|&c| c <= 4), "bins: {:?}", counts);

    for pair in times.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(250));
    }
    assert!(max_in_window(&times, period) <= 4);
}

#[test]
fn test_tpm_only_bins() {
    let period = Duration::from_secs(1);
    let limiter = RateLimiter::new(RateLimitConfig::new(period).with_tpm(75)).unwrap();

    let admissions: Vec<(Instant, u64)> = (0..10)
        .map(|_| {
            let guard = limiter.acquire_blocking(25);
            (guard.admitted_at(), guard.tokens())
        })
        .collect();
    let times: Vec<Instant> = admissions.iter().map(|&(t, _)| t).collect();

    let counts = bins(&times, period);
    assert_eq!(counts.len(), 4, "bins: {:?}", counts);
    assert!(counts.iter().all(|&c| c <= 3), "bins: {:?}", counts);
    assert!(max_tokens_in_window(&admissions, period) <= 75);
}

#[test]
fn test_mixed_costs_never_exceed_token_budget() {
    let period = Duration::from_millis(400);
    let limiter = RateLimiter::new(RateLimitConfig::new(period).with_tpm(100)).unwrap();

    let costs = [40, 70, 10, 55, 30, 90, 5, 45];
    let admissions: Vec<(Instant, u64)> = costs
        .iter()
        .map(|&cost| {
            let guard = limiter.acquire_blocking(cost);
            (guard.admitted_at(), cost)
        })
        .collect();

    assert!(max_tokens_in_window(&admissions, period) <= 100);
}

#[test]
fn test_oversized_request_gets_window_to_itself() {
    let period = Duration::from_millis(300);
    let limiter = RateLimiter::new(RateLimitConfig::new(period).with_tpm(50)).unwrap();

    let small = limiter.acquire_blocking(10);
    let big = limiter.acquire_blocking(500);
    let after = limiter.acquire_blocking(10);

    assert!(big.admitted_at().duration_since(small.admitted_at()) >= period);
    assert!(after.admitted_at().duration_since(big.admitted_at()) >= period);
}

#[test]
fn test_default_stagger_applies_with_tpm() {
    let limiter = RateLimiter::new(
        RateLimitConfig::new(Duration::from_secs(1))
            .with_tpm(1_000)
            .with_default_stagger(Duration::from_millis(50)),
    )
    .unwrap();

    let first = limiter.acquire_blocking(1);
    let second = limiter.acquire_blocking(1);
    assert!(second.admitted_at().duration_since(first.admitted_at()) >= Duration::from_millis(50));
}

#[test]
fn test_construction_fails_fast() {
    assert!(RateLimiter::new(RateLimitConfig::per_minute()).is_err());
    assert!(RateLimiter::new(RateLimitConfig::per_minute().with_rpm(0)).is_err());
    assert!(RateLimiter::new(RateLimitConfig::new(Duration::ZERO).with_tpm(10)).is_err());
}
