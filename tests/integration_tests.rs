//! Integration tests for the localized strings runtime
//!
//! These tests drive a full session built from a manifest on disk, with
//! datasets served from files and a mocked HTTP server.

use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use localized_strings::config::Manifest;
use localized_strings::i18n::{
    Direction, FallbackMode, LanguageSession, Node, RecordingPresentation, Rendered,
    SessionBuilder, StringsConfig, SwitchOutcome, Tag, TranslationValidator,
};
use localized_strings::storage::{FileStore, PreferenceStore, LANGUAGE_KEY};

// ==================== Test Helpers ====================

/// Write the default strings and two file-backed languages into `dir`
fn write_datasets(dir: &Path) {
    let en = json!({
        "title": "Welcome",
        "greet": "Hello {{name}}",
        "note": "This is {b{important}}",
        "menu": {"open": "Open", "close": "Close"},
        "days": ["Mon", "Tue", "Wed"]
    });
    let fr = json!({
        "title": "Bienvenue",
        "greet": "Bonjour {{name}}",
        "note": "C'est {b{important}}",
        "menu": {"open": "Ouvrir"},
        "days": ["Lun", "Mar", "Mer"]
    });
    let ar = json!({"default": {"title": "أهلا", "greet": "مرحبا {{name}}"}});

    std::fs::write(dir.join("en.json"), en.to_string()).expect("Failed to write en.json");
    std::fs::write(dir.join("fr.json"), fr.to_string()).expect("Failed to write fr.json");
    std::fs::write(dir.join("ar.json"), ar.to_string()).expect("Failed to write ar.json");
}

/// Build a manifest in `dir`; `de_url` serves German over HTTP
fn write_manifest(dir: &Path, de_url: &str) -> std::path::PathBuf {
    write_datasets(dir);
    let manifest = json!({
        "default": {"code": "en", "path": "en.json"},
        "languages": {
            "fr": {"path": "fr.json"},
            "ar": {"path": "ar.json", "direction": "rtl"},
            "de": {"url": de_url}
        },
        "useStoredPreference": true,
        "fadeDurationMs": 0
    });
    let manifest_path = dir.join("manifest.json");
    std::fs::write(&manifest_path, manifest.to_string()).expect("Failed to write manifest");
    manifest_path
}

async fn load_config(manifest_path: &Path) -> StringsConfig {
    Manifest::from_file(manifest_path)
        .expect("manifest")
        .into_config(&reqwest::Client::new())
        .await
        .expect("config")
}

async fn start_session(config: StringsConfig, prefs: &Path) -> LanguageSession {
    SessionBuilder::new(config)
        .store(Arc::new(FileStore::new(prefs)))
        .start()
        .await
        .expect("session")
}

// ==================== Session Workflow Tests ====================

#[tokio::test]
async fn test_manifest_session_switches_and_persists() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manifest_path = write_manifest(temp_dir.path(), "http://127.0.0.1:9/de.json");
    let prefs = temp_dir.path().join("prefs");

    let session = start_session(load_config(&manifest_path).await, &prefs).await;
    assert_eq!(session.current_language(), "en");
    assert_eq!(
        FileStore::new(&prefs).get(LANGUAGE_KEY).await.unwrap(),
        Some("en".to_string())
    );

    let outcome = session.change_language("fr").await.unwrap();
    assert_eq!(outcome, SwitchOutcome::Applied);

    let vars = json!({"name": "Ana"});
    let strings = session.strings();
    assert_eq!(strings.text("greet", vars.as_object()), "Bonjour Ana");
    assert_eq!(strings.text("menu.open", None), "Ouvrir");
    assert_eq!(strings.text("menu.close", None), "menu.close");
    assert_eq!(session.arrays().get("days").unwrap().len(), 3);

    assert_eq!(
        FileStore::new(&prefs).get(LANGUAGE_KEY).await.unwrap(),
        Some("fr".to_string())
    );
}

#[tokio::test]
async fn test_stored_preference_restores_language() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manifest_path = write_manifest(temp_dir.path(), "http://127.0.0.1:9/de.json");
    let prefs = temp_dir.path().join("prefs");
    FileStore::new(&prefs).set(LANGUAGE_KEY, "ar").await.unwrap();

    let session = start_session(load_config(&manifest_path).await, &prefs).await;
    assert_eq!(session.requested_language(), "ar");

    let state = session.settled().await;
    assert_eq!(state.language, "ar");
    assert_eq!(state.direction, Direction::Rtl);
    assert_eq!(state.strings.text("title", None), "أهلا");
}

#[tokio::test]
async fn test_markup_renders_through_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manifest_path = write_manifest(temp_dir.path(), "http://127.0.0.1:9/de.json");
    let session = start_session(load_config(&manifest_path).await, temp_dir.path()).await;

    let rendered = session.strings().render("note", None).unwrap();
    assert_eq!(
        rendered,
        Rendered::Markup(vec![
            Node::Text("This is ".to_string()),
            Node::Element {
                tag: Tag::Bold,
                children: vec![Node::Text("important".to_string())],
            },
        ])
    );
    assert_eq!(rendered.to_html(), "This is <b>important</b>");
}

// ==================== HTTP Dataset Tests ====================

#[tokio::test]
async fn test_http_language_is_fetched_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/i18n/de.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"title": "Willkommen"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let de_url = format!("{}/i18n/de.json", mock_server.uri());
    let manifest_path = write_manifest(temp_dir.path(), &de_url);
    let session = start_session(load_config(&manifest_path).await, temp_dir.path()).await;

    assert_eq!(session.change_language("de").await.unwrap(), SwitchOutcome::Applied);
    assert_eq!(session.strings().text("title", None), "Willkommen");

    session.change_language("en").await.unwrap();
    session.change_language("de").await.unwrap();

    let report = session.metrics().report();
    assert_eq!(report.loader_calls, 1);
    assert_eq!(report.cache_hits, 2);
}

#[tokio::test]
async fn test_http_failure_falls_back_to_default() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/i18n/de.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let de_url = format!("{}/i18n/de.json", mock_server.uri());
    let manifest_path = write_manifest(temp_dir.path(), &de_url);
    let hook = Arc::new(RecordingPresentation::new());
    let session = SessionBuilder::new(load_config(&manifest_path).await)
        .store(Arc::new(FileStore::new(temp_dir.path())))
        .presentation(hook.clone())
        .start()
        .await
        .unwrap();

    let outcome = session.change_language("de").await.unwrap();

    assert_eq!(outcome, SwitchOutcome::FellBack);
    let state = session.state();
    assert_eq!(state.language, "de");
    assert!(state.fallback);
    assert_eq!(state.strings.text("title", None), "Welcome");
    assert_eq!(hook.last(), Some(("de".to_string(), Direction::Ltr)));
}

// ==================== Fallback Mode Tests ====================

#[tokio::test]
async fn test_fallback_modes_for_missing_keys() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manifest_path = write_manifest(temp_dir.path(), "http://127.0.0.1:9/de.json");
    let vars = json!({"name": "Ana"});

    let dev = start_session(load_config(&manifest_path).await, temp_dir.path()).await;
    dev.change_language("ar").await.unwrap();
    assert_eq!(dev.strings().text("note", None), "note");
    assert!(dev.arrays().get("days").unwrap().is_empty());
    assert_eq!(dev.strings().text("greet", vars.as_object()), "مرحبا Ana");

    let config = load_config(&manifest_path).await.mode(FallbackMode::Production);
    let prod = start_session(config, &temp_dir.path().join("prod")).await;
    prod.change_language("ar").await.unwrap();
    assert_eq!(prod.strings().text("note", None), "This is important");
    assert_eq!(prod.arrays().get("days").unwrap().len(), 3);
}

// ==================== Locking Tests ====================

#[tokio::test]
async fn test_locked_session_never_persists() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manifest_path = write_manifest(temp_dir.path(), "http://127.0.0.1:9/de.json");
    let prefs = temp_dir.path().join("prefs");

    let session = SessionBuilder::new(load_config(&manifest_path).await)
        .store(Arc::new(FileStore::new(&prefs)))
        .lock_language("fr")
        .start()
        .await
        .unwrap();
    session.settled().await;

    assert_eq!(session.current_language(), "fr");
    assert_eq!(session.change_language("en").await.unwrap(), SwitchOutcome::Locked);
    assert_eq!(FileStore::new(&prefs).get(LANGUAGE_KEY).await.unwrap(), None);
}

// ==================== Validation Tests ====================

#[tokio::test]
async fn test_validator_reports_manifest_drift() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manifest_path = write_manifest(temp_dir.path(), "http://127.0.0.1:9/de.json");
    let config = load_config(&manifest_path).await;

    let fr: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp_dir.path().join("fr.json")).unwrap())
            .unwrap();
    let report = TranslationValidator::validate(config.strings.schema.value(), &fr);

    assert!(!report.has_errors());
    assert_eq!(report.warnings, vec!["Missing key: menu.close"]);
}
