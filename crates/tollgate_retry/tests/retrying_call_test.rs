//! Tests for the retrying middleware layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tollgate_core::{CompletionRequest, Message};
use tollgate_interface::{AsyncInvoke, Invoke, async_invoke_fn, invoke_fn};
use tollgate_retry::{BuiltinBackoff, RetryMetrics, RetryService, RetryingCall};

fn shared_service(metrics: Arc<RetryMetrics>) -> Arc<RetryService> {
    Arc::new(RetryService::new(Arc::new(BuiltinBackoff::native(2).unwrap())).with_observer(metrics))
}

#[test]
fn test_blocking_layer_retries_inner_call() {
    let metrics = Arc::new(RetryMetrics::new());
    let calls = AtomicU32::new(0);
    let call = RetryingCall::new(
        invoke_fn(|request: &CompletionRequest| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("connection reset".to_string())
            } else {
                Ok(request.input().texts().join(""))
            }
        }),
        shared_service(metrics.clone()),
    );

    let request = CompletionRequest::messages(vec![Message::user("ping")]);
    assert_eq!(Invoke::invoke(&call, &request), Ok("ping".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(metrics.retries(), 1);
}

#[tokio::test]
async fn test_sync_and_async_layers_share_observer() {
    let metrics = Arc::new(RetryMetrics::new());
    let service = shared_service(metrics.clone());

    let blocking = RetryingCall::new(
        invoke_fn(|_: &CompletionRequest| Err::<(), _>("down".to_string())),
        Arc::clone(&service),
    );
    let suspending = RetryingCall::new(
        async_invoke_fn(|_: CompletionRequest| async { Err::<(), _>("down".to_string()) }),
        Arc::clone(&service),
    );

    let request = CompletionRequest::default();
    assert!(Invoke::invoke(&blocking, &request).is_err());
    assert!(AsyncInvoke::invoke(&suspending, &request).await.is_err());

    assert_eq!(metrics.calls(), 2);
    assert_eq!(metrics.retries(), 4);
}
