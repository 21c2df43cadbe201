//! Failure logging of composed models.

use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::Arc;
use tollgate::{
    CharEstimator, CompletionRequest, Composer, Message, ModelConfig, RetryStrategyKind,
    async_invoke_fn, invoke_fn,
};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

fn subscriber(captured: &Captured) -> impl tracing::Subscriber + Send + Sync {
    let writer = captured.clone();
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish()
}

#[derive(Debug, Clone, PartialEq)]
struct ProviderError {
    status: u16,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider returned {}", self.status)
    }
}

fn config() -> ModelConfig {
    ModelConfig::builder()
        .model("gpt-4o")
        .retry_strategy(RetryStrategyKind::Native)
        .max_retries(2u32)
        .build()
        .unwrap()
}

#[test]
fn test_one_event_per_failed_call_and_error_unchanged() {
    let captured = Captured::default();
    let model = Composer::default()
        .with_estimator(Arc::new(CharEstimator))
        .compose(
            &config(),
            invoke_fn(|_: &CompletionRequest| Err::<String, _>(ProviderError { status: 503 })),
            async_invoke_fn(|_: CompletionRequest| async {
                Err::<String, _>(ProviderError { status: 503 })
            }),
            None,
            None,
        )
        .unwrap();

    let request = CompletionRequest::messages(vec![Message::system("s"), Message::user("u")])
        .with_name("summarize_descriptions");
    let result = tracing::subscriber::with_default(subscriber(&captured), || model.invoke(&request));

    assert_eq!(result, Err(ProviderError { status: 503 }));
    let logs = captured.contents();
    assert_eq!(logs.matches("Model call failed").count(), 1);
    assert!(logs.contains("model=gpt-4o"));
    assert!(logs.contains("strategy=native"));
    assert!(logs.contains("summarize_descriptions"));
    assert!(logs.contains("message_count=2"));
    assert!(logs.contains("provider returned 503"));
}

#[tokio::test]
async fn test_successful_async_calls_are_not_logged_as_failures() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(&captured));

    let model = Composer::default()
        .with_estimator(Arc::new(CharEstimator))
        .compose(
            &config(),
            invoke_fn(|_: &CompletionRequest| Ok::<_, ProviderError>("ok".to_string())),
            async_invoke_fn(|_: CompletionRequest| async { Ok::<_, ProviderError>("ok".to_string()) }),
            None,
            None,
        )
        .unwrap();

    let request = CompletionRequest::messages(vec![Message::user("u")]);
    assert_eq!(model.ainvoke(&request).await, Ok("ok".to_string()));
    assert!(!captured.contents().contains("Model call failed"));
}
