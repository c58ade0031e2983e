use std::io::Write;

use docchat_cli::config::CliConfig;
use docchat_cli::handlers::{chat, library};
use docchat_cli::state::CliState;

fn state_for(url: String) -> CliState {
    let mut config = CliConfig::default();
    config.api.base_url = url;
    config.sync.settle_ms = 10;
    CliState::new(config, false).unwrap()
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
        [api]
        base_url = "https://docs.example.com"

        [logging]
        format = "json"
        "#
    )
    .unwrap();

    let config = CliConfig::from_file(file.path()).unwrap();

    assert_eq!(config.api.base_url, "https://docs.example.com");
    assert_eq!(config.api.request_timeout_secs, Some(30));
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.sync.settle_ms, 500);
}

#[tokio::test]
async fn test_create_folder_refreshes_listing() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/folder/")
        .match_query(mockito::Matcher::UrlEncoded("folder_name".into(), "Papers".into()))
        .with_status(200)
        .with_body(r#"{"folder_id": "f1", "name": "Papers"}"#)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/folder/")
        .with_status(200)
        .with_body(r#"[{"folder_id": "f1", "name": "Papers"}]"#)
        .expect(2)
        .create_async()
        .await;

    let state = state_for(server.url());
    library::list_folders(&state).await.unwrap();
    library::create_folder(&state, "Papers").await.unwrap();
    library::list_folders(&state).await.unwrap();

    create.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn test_ask_streams_answer_into_thread() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/thread/T")
        .with_status(200)
        .with_body(r#"{"thread": {"id": "T", "name": "Q", "messages": []}}"#)
        .create_async()
        .await;
    let chat_mock = server
        .mock("POST", "/thread/T/chat")
        .match_body(mockito::Matcher::Json(serde_json::json!({"message": "Hello"})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("data: {\"type\":\"message\",\"content\":\"Hi\"}\n\ndata: [DONE]\n\n")
        .create_async()
        .await;

    let state = state_for(server.url());
    chat::ask(&state, "T", "Hello").await.unwrap();

    chat_mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_thread_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/thread/nope")
        .with_status(404)
        .create_async()
        .await;

    let state = state_for(server.url());
    let err = chat::ask(&state, "nope", "Hello").await.unwrap_err();

    assert!(err.to_string().contains("not found"));
}
