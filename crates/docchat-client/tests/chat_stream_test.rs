use docchat_client::{ApiClient, ChatStreamDriver, ClientError, CollectingHandler, DecoderState};
use docchat_types::Citation;
use mockito::Matcher;

const SSE_BODY: &str = concat!(
    "data: {\"type\":\"message\",\"content\":\"Hi\"}\n\n",
    "data: {\"type\":\"message\",\"content\":\" there\"}\n\n",
    "data: {broken\n\n",
    "data: {\"type\":\"citation\",\"citations\":[{\"id\":\"f1\",\"title\":\"Doc\",\"page\":3}]}\n\n",
    "data: {\"type\":\"error\",\"message\":\"retrieval degraded\"}\n\n",
    "data: [DONE]\n\n",
);

#[tokio::test]
async fn test_chat_turn_streams_content_and_citations() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/thread/t1/chat")
        .match_body(Matcher::Json(serde_json::json!({ "message": "Hello" })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(SSE_BODY)
        .create_async()
        .await;

    let client = ApiClient::builder().base_url(server.url()).build().unwrap();
    let stream = client.chat_stream("t1", "Hello").await.unwrap();

    let mut driver = ChatStreamDriver::new(CollectingHandler::default());
    let summary = driver.run(stream).await.unwrap();

    let collected = driver.handler();
    assert_eq!(collected.content, "Hi there");
    assert_eq!(collected.citations, vec![Citation::new("f1", "Doc", 3)]);
    assert_eq!(collected.server_errors, vec!["retrieval degraded".to_string()]);
    assert!(summary.saw_done);
    assert_eq!(driver.state(), DecoderState::Done);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_turn_rejected_by_server() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/thread/t1/chat")
        .with_status(500)
        .with_body(r#"{"detail":"Internal server error"}"#)
        .create_async()
        .await;

    let client = ApiClient::builder().base_url(server.url()).build().unwrap();
    let err = client.chat_stream("t1", "Hello").await.err().unwrap();

    assert!(matches!(err, ClientError::Protocol { .. }));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn test_chat_turn_network_failure() {
    // Nothing listens on this port
    let client = ApiClient::builder().base_url("http://127.0.0.1:9").build().unwrap();
    let err = client.chat_stream("t1", "Hello").await.err().unwrap();

    assert!(matches!(err, ClientError::Network(_)));
}
