use docchat::prelude::*;

#[tokio::test]
async fn test_prelude_drives_a_chat_turn() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/thread/T")
        .with_status(200)
        .with_body(r#"{"thread": {"id": "T", "name": "Q", "messages": []}}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/thread/T/chat")
        .with_status(200)
        .with_body("data: {\"type\":\"message\",\"content\":\"42\"}\n\ndata: [DONE]\n\n")
        .create_async()
        .await;

    let context = AppContext::builder()
        .base_url(server.url())
        .settings(SyncSettings {
            settle_ms: 0,
            ..SyncSettings::default()
        })
        .build()
        .unwrap();
    let chat = context.chat_session();
    chat.open_thread("T").await.unwrap();

    let summary = chat.send("Answer?").await.unwrap();

    assert!(summary.saw_done);
    assert_eq!(summary.content_chars, 2);
}
