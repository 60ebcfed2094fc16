//! End-to-end collection against a mock Slack Web API

use reaction_harvester::cli::harvest::{export_custom_emoji, totalize};
use reaction_harvester::collector::{CollectionOrchestrator, CollectorConfig};
use reaction_harvester::fetcher::slack_http::SlackHttpClient;
use reaction_harvester::resume::{
    ChannelListDocument, EntityStore, ErrorLedger, JsonFileStore, StoragePaths,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_workspace(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/conversations.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "channels": [
                {"id": "C01", "name": "general", "is_archived": false},
                {"id": "C02", "name": "private-ish", "is_archived": false},
                {"id": "C03", "name": "random", "is_archived": true}
            ],
            "response_metadata": {"next_cursor": ""}
        })))
        .mount(server)
        .await;

    Mock::given(path("/conversations.history"))
        .and(query_param("channel", "C01"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "messages": [
                {"ts": "1.0", "reactions": [{"name": "party", "count": 3}]},
                {"ts": "2.0"}
            ],
            "has_more": true,
            "response_metadata": {"next_cursor": "c01-page-2"}
        })))
        .mount(server)
        .await;

    Mock::given(path("/conversations.history"))
        .and(query_param("channel", "C01"))
        .and(query_param("cursor", "c01-page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "messages": [
                {"ts": "3.0", "reactions": [{"name": "party::skin-tone-3", "count": 1}]}
            ],
            "response_metadata": {"next_cursor": ""}
        })))
        .mount(server)
        .await;

    Mock::given(path("/conversations.history"))
        .and(query_param("channel", "C02"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": false, "error": "not_in_channel"})),
        )
        .mount(server)
        .await;

    Mock::given(path("/conversations.history"))
        .and(query_param("channel", "C03"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "messages": [{"ts": "4.0", "reactions": [{"name": "tada", "count": 2}]}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_against_mock_api() {
    let server = MockServer::start().await;
    mount_workspace(&server).await;

    let dir = TempDir::new().unwrap();
    let paths = StoragePaths::new(dir.path().join("channels"), dir.path().join("chats"));
    paths.ensure_dirs().unwrap();

    let client = SlackHttpClient::with_base_url("xoxb-test", server.uri()).unwrap();
    let mut orchestrator = CollectionOrchestrator::new(
        client,
        JsonFileStore::new(paths.chats_dir()),
        ErrorLedger::open(paths.error_ledger_path()).unwrap(),
        ChannelListDocument::new(paths.channel_list_path()),
        CollectorConfig::unthrottled(),
    );

    let channels = orchestrator.load_or_list_channels(false).await.unwrap();
    assert_eq!(channels.len(), 3);
    assert!(paths.channel_list_path().is_file());

    let summary = orchestrator.collect_reactions(&channels, false).await.unwrap();
    assert_eq!(summary.stored, 2);
    assert_eq!(summary.failed_ids, vec!["C02".to_string()]);
    assert!(orchestrator.store().exists("C01").unwrap());
    assert!(orchestrator.store().exists("C03").unwrap());
    assert!(orchestrator.ledger().contains("C02"));

    let report = dir.path().join("result.csv");
    let rows = totalize(&paths, &report).unwrap();
    assert_eq!(rows, 2);

    let content = std::fs::read_to_string(&report).unwrap();
    assert!(content.starts_with("index,name,count\n"));
    assert!(content.contains(",party,4\n"));
    assert!(content.contains(",tada,2\n"));
}

#[tokio::test]
async fn test_export_custom_emoji_against_mock_api() {
    let server = MockServer::start().await;
    Mock::given(path("/emoji.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "emoji": {
                "shipit": "https://example.com/shipit.png",
                "yay": "alias:tada"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = SlackHttpClient::with_base_url("xoxb-test", server.uri()).unwrap();
    let output = dir.path().join("emoji-custom.csv");

    let rows = export_custom_emoji(&client, &output).await.unwrap();

    assert_eq!(rows, 2);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "name,url\nshipit,https://example.com/shipit.png\nyay,alias:tada\n"
    );
}
