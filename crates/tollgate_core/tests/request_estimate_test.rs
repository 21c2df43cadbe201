use tollgate_core::{
    CharEstimator, CompletionRequest, Message, ModelParameters, TiktokenEstimator, TokenEstimator,
};

#[test]
fn test_batch_estimate_sums_every_item() {
    let request = CompletionRequest::batch(vec![
        "aaaaaaaa".to_string(),
        "bbbbbbbbbbbb".to_string(),
        String::new(),
    ]);

    // 2 + 3 + 0, embeddings carry no completion budget
    assert_eq!(CharEstimator.estimate(&request), 5);
}

#[test]
fn test_tiktoken_estimate_adds_completion_budget() {
    let estimator = TiktokenEstimator::cl100k().unwrap();
    let request = CompletionRequest::messages(vec![Message::user("hello world")])
        .with_parameters(ModelParameters::default().with_max_tokens(100));

    let prompt = estimator.count("hello world");
    assert!(prompt > 0);
    assert_eq!(estimator.estimate(&request), prompt + 100);
}

#[test]
fn test_request_survives_json() {
    let request = CompletionRequest::messages(vec![
        Message::system("You extract entities."),
        Message::user("Ada Lovelace met Charles Babbage."),
    ])
    .with_name("entities")
    .with_streaming(true);

    let json = serde_json::to_string(&request).unwrap();
    let parsed: CompletionRequest = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed, request);
}
