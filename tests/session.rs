//! Search session orchestration tests
//!
//! Drive the session the way the console and voice pipeline do, with a
//! stubbed upstream and a recording synthesizer.

mod common;

use std::sync::Arc;

use common::{
    RecordingSynthesizer, UNROUTABLE_URL, settle, spawn_completion_stub, spawn_error_stub,
};
use vox_gateway::capture::{CaptureErrorKind, CaptureEvent, SttCapability};
use vox_gateway::feedback::{SpeechSynthesizer, TtsCapability};
use vox_gateway::session::BannerKind;
use vox_gateway::{InferenceClient, SearchSession, SettingsStore};

struct Harness {
    session: Arc<SearchSession>,
    settings: Arc<SettingsStore>,
    synthesizer: Arc<RecordingSynthesizer>,
}

fn harness(api_url: &str) -> Harness {
    let settings = Arc::new(SettingsStore::in_memory().unwrap());
    let inference = Arc::new(InferenceClient::new(
        api_url.to_string(),
        Some("test-key".to_string()),
    ));
    let synthesizer = RecordingSynthesizer::shared();

    let (session, _capture_rx) = SearchSession::new(
        Arc::clone(&settings),
        inference,
        SttCapability::Unavailable,
        TtsCapability::Available(
            Arc::clone(&synthesizer) as Arc<dyn SpeechSynthesizer>
        ),
    );

    Harness {
        session,
        settings,
        synthesizer,
    }
}

#[tokio::test]
async fn whitespace_only_submit_changes_nothing() {
    let h = harness(UNROUTABLE_URL);

    h.session.submit("   ").await;
    settle().await;

    assert!(h.session.query().is_empty());
    assert!(h.session.response().is_none());
    assert!(h.session.banner().is_none());
    assert!(!h.session.is_processing());
    assert!(h.synthesizer.spoken().is_empty());
}

#[tokio::test]
async fn successful_query_stores_response_and_speaks_interpretation() {
    let upstream = spawn_completion_stub(
        r#"{"interpretation": "Quieres saber el clima", "intent": "question",
            "results": [{"id": "1", "title": "Clima", "description": "Soleado", "url": "https://w.example", "type": "answer"}],
            "suggestions": []}"#,
    )
    .await;
    let h = harness(&upstream);

    h.session.submit("qué tiempo hace").await;
    settle().await;

    let response = h.session.response().expect("response stored");
    assert_eq!(response.intent, "question");

    let banner = h.session.banner().expect("banner shown");
    assert_eq!(banner.kind, BannerKind::Success);
    assert_eq!(banner.message, "¡Resultados listos!");

    let spoken = h.synthesizer.spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].text, "Quieres saber el clima");
    assert!(!h.session.is_processing());
}

#[tokio::test]
async fn custom_command_skips_the_network_and_flags_the_response() {
    // No upstream exists; a network attempt would surface the error banner
    let h = harness(UNROUTABLE_URL);
    h.settings
        .add_command(vox_gateway::settings::CommandDraft {
            phrase: "abrir correo".to_string(),
            action: "Abrir Gmail".to_string(),
            url: Some("https://mail.google.com".to_string()),
            enabled: true,
        })
        .unwrap();

    h.session.submit("por favor abrir correo ahora").await;
    settle().await;

    let response = h.session.response().expect("response stored");
    assert_eq!(response.custom_command_triggered, Some(true));
    assert_eq!(
        response.command_url.as_deref(),
        Some("https://mail.google.com")
    );
    assert_eq!(h.session.banner().unwrap().kind, BannerKind::Success);
}

#[tokio::test]
async fn upstream_failure_shows_and_speaks_the_localized_error() {
    let upstream = spawn_error_stub(503).await;
    let h = harness(&upstream);

    h.session.submit("qué tiempo hace").await;
    settle().await;

    assert!(h.session.response().is_none());
    let banner = h.session.banner().expect("banner shown");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(
        banner.message,
        "No se pudo procesar tu solicitud. Intenta de nuevo."
    );

    let spoken = h.synthesizer.spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].text, banner.message);

    // The session stays usable
    assert!(!h.session.is_processing());
}

#[tokio::test]
async fn voice_feedback_off_means_zero_utterances() {
    let upstream = spawn_completion_stub(
        r#"{"interpretation": "Buscas tacos", "intent": "search", "results": [], "suggestions": []}"#,
    )
    .await;
    let h = harness(&upstream);
    h.settings.update(|s| s.voice_feedback = false).unwrap();

    h.session.submit("tacos").await;
    settle().await;

    assert!(h.session.response().is_some());
    assert!(h.synthesizer.spoken().is_empty());
}

#[tokio::test]
async fn clear_resets_query_and_response() {
    let upstream = spawn_completion_stub(
        r#"{"interpretation": "ok", "intent": "search", "results": [], "suggestions": []}"#,
    )
    .await;
    let h = harness(&upstream);

    h.session.submit("tacos").await;
    assert_eq!(h.session.query(), "tacos");
    assert!(h.session.response().is_some());

    h.session.clear();
    assert!(h.session.query().is_empty());
    assert!(h.session.response().is_none());
}

#[tokio::test]
async fn transcript_event_submits_immediately() {
    let upstream = spawn_completion_stub(
        r#"{"interpretation": "Buscas música", "intent": "search", "results": [], "suggestions": []}"#,
    )
    .await;
    let h = harness(&upstream);

    h.session
        .handle_capture_event(CaptureEvent::Transcript("pon música".to_string()))
        .await;
    settle().await;

    assert_eq!(h.session.query(), "pon música");
    assert!(h.session.response().is_some());
}

#[tokio::test]
async fn listening_start_is_announced_and_spoken() {
    let h = harness(UNROUTABLE_URL);

    h.session
        .handle_capture_event(CaptureEvent::ListeningChanged(true))
        .await;
    settle().await;

    let banner = h.session.banner().expect("banner shown");
    assert_eq!(banner.kind, BannerKind::Info);
    assert_eq!(banner.message, "Escuchando... Habla ahora");
    assert_eq!(h.synthesizer.spoken()[0].text, banner.message);
}

#[tokio::test]
async fn capture_errors_are_surfaced_and_spoken() {
    let h = harness(UNROUTABLE_URL);
    let message = "No se detectó voz. Intenta de nuevo.".to_string();

    h.session
        .handle_capture_event(CaptureEvent::Error {
            kind: CaptureErrorKind::NoSpeech,
            message: message.clone(),
        })
        .await;
    settle().await;

    let banner = h.session.banner().expect("banner shown");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.message, message);
    assert_eq!(h.synthesizer.spoken()[0].text, message);
}

#[tokio::test]
async fn unsupported_capture_surfaces_a_persistent_warning() {
    let h = harness(UNROUTABLE_URL);

    let warning = h.session.support_warning().expect("warning");
    assert!(warning.contains("reconocimiento"));
    assert!(!h.session.is_listening());

    // Text input stays fully functional: an error path still renders
    h.session.submit("hola").await;
    assert!(h.session.banner().is_some());
}

#[tokio::test(start_paused = true)]
async fn banners_expire_after_their_ttl() {
    let h = harness(UNROUTABLE_URL);

    h.session
        .handle_capture_event(CaptureEvent::ListeningChanged(true))
        .await;
    assert!(h.session.banner().is_some());

    tokio::time::sleep(vox_gateway::session::BANNER_TTL + std::time::Duration::from_millis(100))
        .await;
    assert!(h.session.banner().is_none());
}

#[tokio::test(start_paused = true)]
async fn newer_banner_replaces_the_old_and_restarts_the_timer() {
    let h = harness(UNROUTABLE_URL);

    h.session
        .handle_capture_event(CaptureEvent::ListeningChanged(true))
        .await;

    // Halfway through, a new banner arrives
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    h.session
        .handle_capture_event(CaptureEvent::Error {
            kind: CaptureErrorKind::NoSpeech,
            message: "sin voz".to_string(),
        })
        .await;

    // The first banner's timer firing must not clear the newer banner
    tokio::time::sleep(std::time::Duration::from_millis(2000)).await;
    let banner = h.session.banner().expect("newer banner still up");
    assert_eq!(banner.message, "sin voz");

    // But the newer banner's own timer does
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    assert!(h.session.banner().is_none());
}
