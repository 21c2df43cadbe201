//! Layer order and shared state of composed models.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tollgate::{
    Backoff, CharEstimator, CompletionRequest, Composer, ComposedModel, MemoryCache, Message,
    ModelConfig, ModelParameters, RateLimiterFactory, RetryFactory, RetryMetrics, RetryPolicy,
    RetryStrategyKind, TollgateErrorKind, async_invoke_fn, invoke_fn,
};

fn composer() -> Composer {
    Composer::default().with_estimator(Arc::new(CharEstimator))
}

fn request(text: &str) -> CompletionRequest {
    CompletionRequest::messages(vec![Message::user(text)])
}

/// Base calls that fail `failures` times in total, then answer.
fn flaky(
    config: &ModelConfig,
    failures: u32,
    cache: Option<Arc<MemoryCache>>,
    observer: Option<Arc<RetryMetrics>>,
) -> (ComposedModel<String, String>, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let sync_calls = Arc::clone(&calls);
    let async_calls = Arc::clone(&calls);

    let model = composer()
        .compose(
            config,
            invoke_fn(move |request: &CompletionRequest| {
                let n = sync_calls.fetch_add(1, Ordering::SeqCst);
                if n < failures {
                    Err(format!("503 on call {}", n + 1))
                } else {
                    Ok(request.input().texts().join(" "))
                }
            }),
            async_invoke_fn(move |request: CompletionRequest| {
                let n = async_calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < failures {
                        Err(format!("503 on call {}", n + 1))
                    } else {
                        Ok(request.input().texts().join(" "))
                    }
                }
            }),
            cache.map(|cache| cache as Arc<dyn tollgate::Cache>),
            observer.map(|observer| observer as Arc<dyn tollgate::RetryObserver>),
        )
        .unwrap();
    (model, calls)
}

fn limited_native(max_retries: u32) -> ModelConfig {
    ModelConfig::builder()
        .model("gpt-4o-mini")
        .requests_per_minute(1_000u32)
        .tokens_per_minute(1_000_000u64)
        .retry_strategy(RetryStrategyKind::Native)
        .max_retries(max_retries)
        .build()
        .unwrap()
}

#[test]
fn test_retry_wraps_rate_limiter() {
    let (model, calls) = flaky(&limited_native(3), 2, None, None);

    assert_eq!(model.invoke(&request("hi")), Ok("hi".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Every attempt is admitted separately
    assert_eq!(model.limiter().unwrap().snapshot().requests, 3);
}

#[test]
fn test_cache_wraps_retry() {
    let cache = Arc::new(MemoryCache::default());
    let metrics = Arc::new(RetryMetrics::new());
    let (model, calls) = flaky(&limited_native(3), 1, Some(cache.clone()), Some(metrics.clone()));

    assert_eq!(model.invoke(&request("hi")), Ok("hi".to_string()));
    assert_eq!(model.invoke(&request("hi")), Ok("hi".to_string()));

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(metrics.calls(), 1);
    assert_eq!(model.limiter().unwrap().snapshot().requests, 2);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_streaming_goes_through_every_layer_below_cache() {
    let cache = Arc::new(MemoryCache::default());
    let (model, calls) = flaky(&limited_native(1), 0, Some(cache.clone()), None);

    let streaming = request("hi").with_streaming(true);
    model.invoke(&streaming).unwrap();
    model.invoke(&streaming).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.is_empty());
}

#[test]
fn test_unconfigured_layers_are_skipped() {
    let config = ModelConfig::builder()
        .model("local-model")
        .retry_strategy(RetryStrategyKind::None)
        .build()
        .unwrap();
    let (model, calls) = flaky(&config, 5, None, None);

    assert!(model.limiter().is_none());
    assert!(model.retry_service().is_none());
    assert_eq!(model.invoke(&request("hi")), Err("503 on call 1".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_exhausted_retries_return_last_error() {
    let (model, calls) = flaky(&limited_native(3), 10, None, None);

    assert_eq!(model.invoke(&request("hi")), Err("503 on call 4".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_sync_and_async_share_limiter_and_observer() {
    let config = ModelConfig::builder()
        .model("gpt-4o-mini")
        .requests_per_minute(2u32)
        .tokens_per_minute(1_000_000u64)
        .rate_limit_period_secs(1.0)
        .retry_strategy(RetryStrategyKind::Native)
        .max_retries(1u32)
        .build()
        .unwrap();
    let metrics = Arc::new(RetryMetrics::new());
    let (model, _calls) = flaky(&config, 0, None, Some(metrics.clone()));

    model.invoke(&request("sync")).unwrap();
    model.ainvoke(&request("async")).await.unwrap();
    assert_eq!(model.limiter().unwrap().snapshot().requests, 2);
    assert_eq!(metrics.calls(), 2);

    let third = tokio::time::timeout(Duration::from_millis(100), model.ainvoke(&request("late"))).await;
    assert!(third.is_err());
    assert_eq!(model.limiter().unwrap().snapshot().requests, 2);
}

#[test]
fn test_invalid_settings_fail_at_compose_time() {
    let bad_backoff = ModelConfig::builder()
        .model("m")
        .retry_strategy(RetryStrategyKind::ExponentialBackoff)
        .base_delay(1.0)
        .build()
        .unwrap();
    let err = composer()
        .compose(
            &bad_backoff,
            invoke_fn(|_: &CompletionRequest| Ok::<String, String>(String::new())),
            async_invoke_fn(|_: CompletionRequest| async { Ok::<String, String>(String::new()) }),
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(err.kind(), TollgateErrorKind::Config(_)));

    let unknown_limiter = ModelConfig::builder()
        .model("m")
        .requests_per_minute(10u32)
        .rate_limit_strategy("token_bucket")
        .build()
        .unwrap();
    let err = composer()
        .compose(
            &unknown_limiter,
            invoke_fn(|_: &CompletionRequest| Ok::<String, String>(String::new())),
            async_invoke_fn(|_: CompletionRequest| async { Ok::<String, String>(String::new()) }),
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(err.kind(), TollgateErrorKind::Registry(_)));
}

#[derive(Debug)]
struct Immediate(u32);

impl Backoff for Immediate {
    fn name(&self) -> &str {
        "immediate"
    }

    fn max_retries(&self) -> u32 {
        self.0
    }

    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

#[test]
fn test_registered_strategies_are_resolved_by_name() {
    let mut retries = RetryFactory::default();
    retries
        .register("immediate", |policy: &RetryPolicy| {
            let backoff: Arc<dyn Backoff> = Arc::new(Immediate(*policy.max_retries()));
            Ok(backoff)
        })
        .unwrap();
    let composer = Composer::new(RateLimiterFactory::default(), retries)
        .with_estimator(Arc::new(CharEstimator));

    let config = ModelConfig::builder()
        .model("m")
        .retry_strategy(RetryStrategyKind::from("immediate".to_string()))
        .max_retries(2u32)
        .build()
        .unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let model = composer
        .compose(
            &config,
            invoke_fn(move |_: &CompletionRequest| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<String, String>("down".to_string())
            }),
            async_invoke_fn(|_: CompletionRequest| async { Err::<String, String>("down".to_string()) }),
            None,
            None,
        )
        .unwrap();

    assert_eq!(model.retry_service().unwrap().name(), "immediate");
    assert!(model.invoke(&request("x")).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_configured_completion_budget_is_charged() {
    let config = ModelConfig::builder()
        .model("gpt-4o-mini")
        .tokens_per_minute(100_000u64)
        .max_tokens(1_000u32)
        .retry_strategy(RetryStrategyKind::None)
        .build()
        .unwrap();
    let (model, _calls) = flaky(&config, 0, None, None);

    // "abcd" is one token; the configured budget covers the completion
    model.invoke(&request("abcd")).unwrap();
    assert_eq!(model.limiter().unwrap().snapshot().tokens, 1_001);

    // A request-level budget replaces the configured one
    let capped = request("abcd").with_parameters(ModelParameters::default().with_max_tokens(10));
    model.invoke(&capped).unwrap();
    assert_eq!(model.limiter().unwrap().snapshot().tokens, 1_012);
}
