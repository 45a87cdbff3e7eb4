//! Integration tests for the locale sync engine
//!
//! These tests drive complete synchronization passes against a mocked content
//! service and a temporary cache directory, then check lookups through the
//! public API.

use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use locale_sync::{
    Config, LocaleStatus, LocaleSync, Lookup, SyncError, SyncMetadata, SyncState,
};

// ==================== Test Helpers ====================

/// Create a test config pointing at the mock server
fn create_test_config(server_uri: &str, temp_dir: &TempDir) -> Config {
    Config {
        languages_url: format!("{}/:project/languages", server_uri),
        translations_url: format!("{}/:project/:lang.json", server_uri),
        locale_dir: temp_dir.path().join("translations"),
        default_locale: "en".to_string(),
        download_retry: 3,
        request_timeout: Duration::from_secs(5),
        retry_delay: Duration::ZERO,
        service_version: "latest".to_string(),
        force_refresh: false,
        debug: false,
    }
}

/// Mount the translation server used by most tests: `en` and `fil`
async fn mock_trans_server(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/test_project/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "languages": ["en", "fil"] }
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test_project/en.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hello": "hi :name" })),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test_project/fil.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hello": "haro :name" })),
        )
        .mount(mock_server)
        .await;
}

async fn synced_engine(config: Config) -> LocaleSync {
    let mut engine = LocaleSync::new(config).expect("valid config");
    engine.use_project("test_project").expect("project");
    engine.sync().await.expect("sync should succeed");
    engine
}

async fn request_count(mock_server: &MockServer) -> usize {
    mock_server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

// ==================== End-to-end ====================

#[tokio::test]
async fn test_end_to_end_lookup_after_sync() {
    let mock_server = MockServer::start().await;
    mock_trans_server(&mock_server).await;
    let temp_dir = TempDir::new().unwrap();

    let engine = synced_engine(create_test_config(&mock_server.uri(), &temp_dir)).await;
    let translator = engine.translator();

    assert_eq!(engine.state(), SyncState::Ready);
    assert_eq!(
        translator.trans_with("hello", [("name", "jennifer")]).unwrap(),
        "hi jennifer"
    );
    assert_eq!(
        translator
            .trans_in_with("fil", "hello", [("name", "jennifer")])
            .unwrap(),
        "haro jennifer"
    );
    assert_eq!(
        translator
            .translate(&Lookup::key("hello").in_locale("fil").var("name", "jennifer"))
            .unwrap(),
        "haro jennifer"
    );
}

#[tokio::test]
async fn test_cache_layout_after_sync() {
    let mock_server = MockServer::start().await;
    mock_trans_server(&mock_server).await;
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &temp_dir);
    let locale_dir = config.locale_dir.clone();

    synced_engine(config).await;

    let mut names: Vec<String> = std::fs::read_dir(&locale_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["en.json", "fil.json", "meta.json"]);

    let meta: SyncMetadata =
        serde_json::from_str(&std::fs::read_to_string(locale_dir.join("meta.json")).unwrap())
            .unwrap();
    assert_eq!(meta.version, "latest");
    assert_eq!(meta.languages, vec!["en", "fil"]);
}

#[tokio::test]
async fn test_unknown_key_returns_key() {
    let mock_server = MockServer::start().await;
    mock_trans_server(&mock_server).await;
    let temp_dir = TempDir::new().unwrap();

    let engine = synced_engine(create_test_config(&mock_server.uri(), &temp_dir)).await;

    assert_eq!(engine.translator().trans("missingKey").unwrap(), "missingKey");
}

// ==================== Cache freshness ====================

#[tokio::test]
async fn test_second_sync_with_current_metadata_makes_no_requests() {
    let mock_server = MockServer::start().await;
    mock_trans_server(&mock_server).await;
    let temp_dir = TempDir::new().unwrap();

    let mut engine = synced_engine(create_test_config(&mock_server.uri(), &temp_dir)).await;
    let after_first = request_count(&mock_server).await;
    assert_eq!(after_first, 3);

    let report = engine.sync().await.expect("second sync");

    assert!(report.fast_path);
    assert_eq!(request_count(&mock_server).await, after_first);
    assert_eq!(engine.state(), SyncState::Ready);
    assert_eq!(
        engine.translator().trans_in("fil", "hello").unwrap(),
        "haro :name"
    );
}

#[tokio::test]
async fn test_fresh_engine_reuses_cache_from_previous_run() {
    let mock_server = MockServer::start().await;
    mock_trans_server(&mock_server).await;
    let temp_dir = TempDir::new().unwrap();

    synced_engine(create_test_config(&mock_server.uri(), &temp_dir)).await;
    let after_first = request_count(&mock_server).await;

    let engine = synced_engine(create_test_config(&mock_server.uri(), &temp_dir)).await;

    assert_eq!(request_count(&mock_server).await, after_first);
    assert_eq!(engine.translator().trans("hello").unwrap(), "hi :name");
}

#[tokio::test]
async fn test_version_mismatch_refetches_everything() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test_project/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "languages": ["en", "fil"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    for (locale, text) in [("en", "hi"), ("fil", "haro")] {
        Mock::given(method("GET"))
            .and(path(format!("/test_project/{}.json", locale)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hello": text,
                "__translation_info": { "language": locale, "version": "v2" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        service_version: "2".to_string(),
        ..create_test_config(&mock_server.uri(), &temp_dir)
    };
    let locale_dir = config.locale_dir.clone();
    std::fs::create_dir_all(&locale_dir).unwrap();
    std::fs::write(
        locale_dir.join("meta.json"),
        r#"{"version": "1", "languages": ["en", "fil"]}"#,
    )
    .unwrap();
    for locale in ["en", "fil"] {
        std::fs::write(
            locale_dir.join(format!("{}.json", locale)),
            format!(
                r#"{{"hello": "old", "__translation_info": {{"language": "{}", "version": "v1"}}}}"#,
                locale
            ),
        )
        .unwrap();
    }

    let engine = synced_engine(config).await;

    assert_eq!(engine.translator().trans("hello").unwrap(), "hi");
    assert_eq!(engine.translator().trans_in("fil", "hello").unwrap(), "haro");
}

#[tokio::test]
async fn test_force_refresh_downloads_despite_current_metadata() {
    let mock_server = MockServer::start().await;
    mock_trans_server(&mock_server).await;
    let temp_dir = TempDir::new().unwrap();

    synced_engine(create_test_config(&mock_server.uri(), &temp_dir)).await;
    let after_first = request_count(&mock_server).await;

    let config = Config {
        force_refresh: true,
        ..create_test_config(&mock_server.uri(), &temp_dir)
    };
    let mut engine = LocaleSync::new(config).unwrap();
    engine.use_project("test_project").unwrap();
    let report = engine.sync().await.unwrap();

    assert!(!report.fast_path);
    assert_eq!(request_count(&mock_server).await, after_first + 3);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.status == LocaleStatus::Downloaded && o.attempts == 1));
}

#[tokio::test]
async fn test_version_placeholder_expands_to_tagged_version() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test_project/v2/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "languages": ["en"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test_project/v2/en.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hello": "hi",
            "__translation_info": { "language": "en", "version": "v2" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let uri = mock_server.uri();
    let config = Config {
        languages_url: format!("{}/:project/:version/languages", uri),
        translations_url: format!("{}/:project/:version/:lang.json", uri),
        service_version: "2".to_string(),
        ..create_test_config(&uri, &temp_dir)
    };

    let engine = synced_engine(config).await;

    assert_eq!(engine.translator().trans("hello").unwrap(), "hi");
}

// ==================== Locale list ====================

#[tokio::test]
async fn test_default_locale_added_when_remote_omits_it() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test_project/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "languages": ["fil"] }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test_project/en.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hello": "hi" })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test_project/fil.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hello": "haro" })))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let mut engine = LocaleSync::new(create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    engine.use_project("test_project").unwrap();
    let report = engine.sync().await.unwrap();

    assert_eq!(report.languages, vec!["fil", "en"]);
    assert_eq!(engine.translator().locales().unwrap(), vec!["en", "fil"]);
}

// ==================== Soft failures ====================

#[tokio::test]
async fn test_invalid_bundle_retried_exactly_download_retry_times() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test_project/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "languages": ["en", "fil"] }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test_project/en.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hello": "hi" })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test_project/fil.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(3)
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let mut engine = LocaleSync::new(create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    engine.use_project("test_project").unwrap();
    let report = engine.sync().await.expect("soft failure must not fail the pass");

    assert_eq!(engine.state(), SyncState::Ready);
    assert_eq!(report.stale_locales(), vec!["fil"]);
    let fil = report.outcomes.iter().find(|o| o.locale == "fil").unwrap();
    assert_eq!(fil.attempts, 3);
    assert_eq!(engine.translator().trans_in("fil", "hello").unwrap(), "hi");
}

#[tokio::test]
async fn test_slow_locale_times_out_without_blocking_others() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test_project/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "languages": ["en", "fil"] }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test_project/en.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hello": "hi" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test_project/fil.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "hello": "haro" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        request_timeout: Duration::from_millis(200),
        download_retry: 2,
        ..create_test_config(&mock_server.uri(), &temp_dir)
    };

    let mut engine = LocaleSync::new(config).unwrap();
    engine.use_project("test_project").unwrap();
    let report = engine.sync().await.unwrap();

    assert_eq!(report.stale_locales(), vec!["fil"]);
    let en = report.outcomes.iter().find(|o| o.locale == "en").unwrap();
    assert_eq!(en.status, LocaleStatus::Downloaded);
}

// ==================== Fatal failures ====================

#[tokio::test]
async fn test_metadata_error_rejects_sync_and_blocks_lookups() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test_project/languages"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let mut engine = LocaleSync::new(create_test_config(&mock_server.uri(), &temp_dir)).unwrap();
    engine.use_project("test_project").unwrap();
    let err = engine.sync().await.unwrap_err();

    assert!(matches!(err, SyncError::Protocol { .. }));
    assert_ne!(engine.state(), SyncState::Ready);
    assert!(matches!(
        engine.translator().trans("hello"),
        Err(SyncError::NotLoaded)
    ));
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let temp_dir = TempDir::new().unwrap();

    let mut engine = LocaleSync::new(create_test_config("http://localhost:1", &temp_dir)).unwrap();
    engine.use_project("test_project").unwrap();
    let err = engine.sync().await.unwrap_err();

    assert!(matches!(err, SyncError::Network { .. }));
    assert_eq!(engine.state(), SyncState::Failed);
}

#[tokio::test]
async fn test_lookup_before_any_sync_is_not_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let engine = LocaleSync::new(create_test_config("http://localhost:1", &temp_dir)).unwrap();

    assert!(matches!(
        engine.translator().trans("hello"),
        Err(SyncError::NotLoaded)
    ));
}
