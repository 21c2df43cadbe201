//! Tests for the retry strategy registry.

use std::sync::Arc;
use std::time::Duration;
use tollgate_core::RetryStrategyKind;
use tollgate_error::{RegistryErrorKind, TollgateErrorKind, TollgateResult};
use tollgate_retry::{Backoff, RetryFactory, RetryPolicy};

#[derive(Debug)]
struct Fibonacci {
    max_retries: u32,
}

impl Backoff for Fibonacci {
    fn name(&self) -> &str {
        "fibonacci"
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn delay(&self, attempt: u32) -> Duration {
        let (mut a, mut b) = (0u64, 1u64);
        for _ in 0..attempt {
            (a, b) = (b, a + b);
        }
        Duration::from_millis(a)
    }
}

#[test]
fn test_default_registry_knows_builtins() {
    let factory = RetryFactory::default();
    assert_eq!(
        factory.names(),
        vec![
            "exponential_backoff",
            "incremental_wait",
            "native",
            "random_wait"
        ]
    );
}

#[test]
fn test_none_disables_retry() {
    let factory = RetryFactory::default();
    let service = factory
        .create(&RetryPolicy::new(RetryStrategyKind::None))
        .unwrap();
    assert!(service.is_none());
}

#[test]
fn test_builtin_validation_surfaces_as_config_error() {
    let factory = RetryFactory::default();
    let policy = RetryPolicy::new(RetryStrategyKind::ExponentialBackoff).with_base_delay(0.5);
    let err = factory.create(&policy).unwrap_err();
    assert!(matches!(err.kind(), TollgateErrorKind::Config(_)));

    let policy = RetryPolicy::new(RetryStrategyKind::Native).with_max_retries(0);
    assert!(factory.create(&policy).is_err());
}

#[test]
fn test_unknown_custom_strategy() {
    let factory = RetryFactory::default();
    let policy = RetryPolicy::new(RetryStrategyKind::Custom("fibonacci".to_string()));
    let err = factory.create(&policy).unwrap_err();
    match err.kind() {
        TollgateErrorKind::Registry(e) => {
            assert_eq!(e.kind(), &RegistryErrorKind::UnknownStrategy("fibonacci".to_string()))
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_registered_strategy_drives_retries() {
    let mut factory = RetryFactory::default();
    factory
        .register("fibonacci", |policy: &RetryPolicy| {
            let backoff: Arc<dyn Backoff> = Arc::new(Fibonacci {
                max_retries: *policy.max_retries(),
            });
            Ok(backoff)
        })
        .unwrap();

    let policy = RetryPolicy::new(RetryStrategyKind::from("fibonacci".to_string())).with_max_retries(4);
    let service = factory.create(&policy).unwrap().unwrap();
    assert_eq!(service.name(), "fibonacci");
    assert_eq!(service.backoff().delay(5), Duration::from_millis(5));

    let mut attempts = 0;
    let _: Result<(), String> = service.retry(|| {
        attempts += 1;
        Err("nope".to_string())
    });
    assert_eq!(attempts, 5);
}

#[test]
fn test_register_rejects_reserved_and_duplicate_names() {
    let mut factory = RetryFactory::default();
    let ctor = |policy: &RetryPolicy| -> TollgateResult<Arc<dyn Backoff>> {
        let backoff: Arc<dyn Backoff> = Arc::new(Fibonacci {
            max_retries: *policy.max_retries(),
        });
        Ok(backoff)
    };
    assert!(factory.register("none", ctor).is_err());
    assert!(factory.register("native", ctor).is_err());
    assert!(!factory.contains("none"));
}
