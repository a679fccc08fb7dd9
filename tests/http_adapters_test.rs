use httpmock::prelude::*;
use restaurant_bot::adapters::sheets::{CsvExportSource, ServiceAccountKey, SheetsApiSource};
use restaurant_bot::core::prompt::ChoicePrompt;
use restaurant_bot::domain::ports::{ChatApi, VenueChooser, VenueSource};
use restaurant_bot::{BotError, OpenAiChooser, TelegramClient};
use serde_json::json;
use std::time::Duration;

const TOKEN: &str = "TEST_TOKEN";
const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/sheet123/edit#gid=0";
const TEST_KEY_PEM: &str = include_str!("fixtures/test_service_account_key.pem");

fn prompt() -> ChoicePrompt {
    ChoicePrompt {
        system: "system text".to_string(),
        user: "user text".to_string(),
        candidates: 3,
    }
}

#[tokio::test]
async fn test_telegram_get_updates_passes_offset() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/bot{}/getUpdates", TOKEN))
            .json_body_partial(r#"{"offset": 5, "timeout": 0}"#);
        then.status(200).json_body(json!({
            "ok": true,
            "result": [
                {"update_id": 5, "message": {"message_id": 10, "chat": {"id": 42},
                  "from": {"id": 7, "is_bot": false, "first_name": "Олена"}, "text": "/start"}},
                {"update_id": 6, "edited_message": {"message_id": 10}}
            ]
        }));
    });

    let client = TelegramClient::new(server.base_url(), TOKEN);
    let updates = client.get_updates(Some(5), 0).await.unwrap();

    mock.assert();
    assert_eq!(updates.len(), 2);
    let message = updates[0].message.as_ref().unwrap();
    assert_eq!(message.text.as_deref(), Some("/start"));
    assert_eq!(message.from.as_ref().unwrap().id, 7);
    assert!(updates[1].message.is_none());
}

#[tokio::test]
async fn test_telegram_send_text_with_html() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/bot{}/sendMessage", TOKEN))
            .json_body_partial(r#"{"chat_id": 42, "text": "<b>hi</b>", "parse_mode": "HTML"}"#);
        then.status(200).json_body(json!({
            "ok": true,
            "result": {"message_id": 99, "chat": {"id": 42}, "text": "hi"}
        }));
    });

    let client = TelegramClient::new(server.base_url(), TOKEN);
    let sent = client.send_text(42, "<b>hi</b>", true).await.unwrap();

    mock.assert();
    assert_eq!(sent.message_id, 99);
}

#[tokio::test]
async fn test_telegram_error_response_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(format!("/bot{}/sendPhoto", TOKEN));
        then.status(400).json_body(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: wrong file identifier/HTTP URL specified"
        }));
    });

    let client = TelegramClient::new(server.base_url(), TOKEN);
    let err = client
        .send_photo(42, "https://example.com/missing.jpg", "caption")
        .await
        .unwrap_err();

    match err {
        BotError::TelegramError { code, description } => {
            assert_eq!(code, 400);
            assert!(description.contains("wrong file identifier"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_telegram_drop_pending_and_delete() {
    let server = MockServer::start();
    let webhook = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/bot{}/deleteWebhook", TOKEN))
            .json_body_partial(r#"{"drop_pending_updates": true}"#);
        then.status(200).json_body(json!({"ok": true, "result": true}));
    });
    let delete = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/bot{}/deleteMessage", TOKEN))
            .json_body_partial(r#"{"chat_id": 42, "message_id": 77}"#);
        then.status(200).json_body(json!({"ok": true, "result": true}));
    });

    let client = TelegramClient::new(server.base_url(), TOKEN);
    client.drop_pending_updates().await.unwrap();
    client.delete_message(42, 77).await.unwrap();

    webhook.assert();
    delete.assert();
}

#[tokio::test]
async fn test_openai_chooser_sends_sampling_parameters() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-test")
            .json_body_partial(
                r#"{"model": "gpt-3.5-turbo", "max_tokens": 200,
                    "messages": [{"role": "system", "content": "system text"},
                                 {"role": "user", "content": "user text"}]}"#,
            );
        then.status(200).json_body(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  2  "}}]
        }));
    });

    let chooser = OpenAiChooser::new(server.base_url(), "sk-test", "gpt-3.5-turbo");
    let answer = chooser.choose(&prompt()).await.unwrap();

    mock.assert();
    assert_eq!(answer, "2");
}

#[tokio::test]
async fn test_openai_chooser_reports_upstream_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(429).body("rate limited");
    });

    let chooser = OpenAiChooser::new(server.base_url(), "sk-test", "gpt-3.5-turbo");
    match chooser.choose(&prompt()).await {
        Err(BotError::UpstreamError { status, body, .. }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_csv_export_source_reads_first_sheet() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/spreadsheets/d/sheet123/export")
            .query_param("format", "csv");
        then.status(200)
            .header("Content-Type", "text/csv")
            .body("name,address,menu\nNapoli,\"вул. Хрещатик, 1\",піца\n,,\nTokyo,,суші\n");
    });

    let source = CsvExportSource::new(server.base_url(), SHEET_URL).unwrap();
    let venues = source.fetch().await.unwrap();

    mock.assert();
    assert_eq!(venues.len(), 2);
    assert_eq!(venues[0].field("address"), Some("вул. Хрещатик, 1"));
    assert_eq!(venues[1].name(), "Tokyo");
}

#[tokio::test]
async fn test_csv_export_source_private_sheet() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/spreadsheets/d/sheet123/export");
        then.status(401).body("login required");
    });

    let source = CsvExportSource::new(server.base_url(), SHEET_URL).unwrap();
    assert!(matches!(
        source.fetch().await,
        Err(BotError::UpstreamError { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_sheets_api_source_with_service_account() {
    let server = MockServer::start();
    let token_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body_contains("assertion=");
        then.status(200).json_body(json!({
            "access_token": "ya29.test",
            "expires_in": 3599,
            "token_type": "Bearer"
        }));
    });
    let values_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/sheet123/values/A:Z")
            .header("authorization", "Bearer ya29.test");
        then.status(200).json_body(json!({
            "range": "Sheet1!A1:C3",
            "majorDimension": "ROWS",
            "values": [
                ["name", "vibe", "rating"],
                ["Amore", "романтична"],
                ["Kids", "сімейна", 5]
            ]
        }));
    });

    let key = ServiceAccountKey::from_json(
        &json!({
            "type": "service_account",
            "client_email": "bot@project.iam.gserviceaccount.com",
            "private_key": TEST_KEY_PEM,
            "token_uri": server.url("/token"),
        })
        .to_string(),
    )
    .unwrap();

    let source = SheetsApiSource::new(server.base_url(), SHEET_URL, "A:Z", key).unwrap();
    let venues = source.fetch().await.unwrap();

    token_mock.assert();
    values_mock.assert();
    assert_eq!(venues.len(), 2);
    assert_eq!(venues[0].field("rating"), Some(""));
    assert_eq!(venues[1].field("rating"), Some("5"));
}

#[tokio::test]
async fn test_sheets_api_source_rejected_token() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(400).json_body(json!({"error": "invalid_grant"}));
    });

    let key = ServiceAccountKey {
        client_email: "bot@project.iam.gserviceaccount.com".to_string(),
        private_key: TEST_KEY_PEM.to_string(),
        token_uri: server.url("/token"),
    };
    let source = SheetsApiSource::new(server.base_url(), SHEET_URL, "A:Z", key).unwrap();

    match source.fetch().await {
        Err(BotError::UpstreamError { service, status, .. }) => {
            assert_eq!(service, "Google OAuth");
            assert_eq!(status, 400);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

fn is_timeout(err: &BotError) -> bool {
    matches!(err, BotError::HttpError(e) if e.is_timeout())
}

#[tokio::test]
async fn test_telegram_call_gives_up_on_stalled_server() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(format!("/bot{}/sendMessage", TOKEN));
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({"ok": true, "result": {"message_id": 1, "chat": {"id": 42}}}));
    });

    let client =
        TelegramClient::new(server.base_url(), TOKEN).with_timeout(Duration::from_millis(200));
    let err = client.send_text(42, "hi", false).await.unwrap_err();
    assert!(is_timeout(&err), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_telegram_get_me_reads_username() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(format!("/bot{}/getMe", TOKEN));
        then.status(200).json_body(json!({
            "ok": true,
            "result": {"id": 1, "is_bot": true, "first_name": "Гід", "username": "FoodGuideBot"}
        }));
    });

    let client = TelegramClient::new(server.base_url(), TOKEN);
    let me = client.get_me().await.unwrap();

    mock.assert();
    assert!(me.is_bot);
    assert_eq!(me.username.as_deref(), Some("FoodGuideBot"));
}

#[tokio::test]
async fn test_openai_chooser_gives_up_on_stalled_server() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({"choices": [{"message": {"content": "1"}}]}));
    });

    let chooser = OpenAiChooser::new(server.base_url(), "sk-test", "gpt-3.5-turbo")
        .with_timeout(Duration::from_millis(200));
    let err = chooser.choose(&prompt()).await.unwrap_err();
    assert!(is_timeout(&err), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_csv_export_source_gives_up_on_stalled_server() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/spreadsheets/d/sheet123/export");
        then.status(200).delay(Duration::from_secs(3)).body("name\nNapoli\n");
    });

    let source = CsvExportSource::new(server.base_url(), SHEET_URL)
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let err = source.fetch().await.unwrap_err();
    assert!(is_timeout(&err), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_sheets_api_source_gives_up_on_stalled_token_endpoint() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({"access_token": "ya29.test"}));
    });

    let key = ServiceAccountKey {
        client_email: "bot@project.iam.gserviceaccount.com".to_string(),
        private_key: TEST_KEY_PEM.to_string(),
        token_uri: server.url("/token"),
    };
    let source = SheetsApiSource::new(server.base_url(), SHEET_URL, "A:Z", key)
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let err = source.fetch().await.unwrap_err();
    assert!(is_timeout(&err), "unexpected error: {:?}", err);
}
