//! Contract Invariant Tests
//!
//! End-to-end guarantees of the generation flow.

use std::time::Duration;

use filegen_core::{
    can_submit, synthesize, Config, DirectoryHost, GenerationRequest, InputCollector, InputMode,
    JobRunner, JobState, ProfileId, Rejection, Session, StartOutcome, UploadRef,
};

const LATENCY: Duration = Duration::from_millis(2000);

fn empty_request(mode: InputMode, profile: ProfileId) -> GenerationRequest {
    GenerationRequest {
        mode,
        prompt_text: Some("  ".to_string()),
        literal_text: Some(String::new()),
        upload: None,
        profile,
    }
}

#[tokio::test(start_paused = true)]
async fn invariant_empty_request_never_starts() {
    let runner = JobRunner::new(LATENCY);

    for mode in [InputMode::Prompt, InputMode::Text, InputMode::Upload] {
        let request = empty_request(mode, ProfileId::Mill);
        assert!(!can_submit(&request));
        assert_eq!(
            runner.start(request),
            StartOutcome::Rejected(Rejection::InvalidRequest)
        );
        assert_eq!(runner.state(), JobState::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn invariant_empty_text_for_3d_rejected() {
    let runner = JobRunner::new(LATENCY);
    let outcome = runner.start(GenerationRequest::text("", ProfileId::ThreeD));

    assert!(!outcome.is_started());
    assert_eq!(runner.state(), JobState::Idle);
}

#[test]
fn invariant_unknown_profiles_fall_back_to_laser() {
    for raw in ["", "plasma", "LASER-XL", "4d", "🙂"] {
        let artifact = synthesize(raw, "HELLO");
        assert_eq!(artifact.profile, ProfileId::Laser);
        assert!(!artifact.text_content.is_empty());
        assert!(artifact.text_content.contains("HELLO"));
        assert!(artifact.text_content.contains("</svg>"));
    }

    let defaulted = synthesize("plasma", "");
    assert!(defaulted.text_content.contains("DEMO"));
}

#[test]
fn invariant_synthesize_is_deterministic() {
    for id in ProfileId::ALL {
        let a = synthesize(id.as_str(), "SAME");
        let b = synthesize(id.as_str(), "SAME");
        assert_eq!(a.text_content.as_bytes(), b.text_content.as_bytes());
        assert_eq!(a, b);
    }
}

#[tokio::test(start_paused = true)]
async fn invariant_dismissed_job_never_completes() {
    let runner = JobRunner::new(LATENCY);
    assert!(runner.start(GenerationRequest::text("AVA", ProfileId::Laser)).is_started());
    assert!(runner.dismiss());

    tokio::time::sleep(LATENCY * 2).await;

    assert_eq!(runner.state(), JobState::Idle);
    assert!(runner.artifact().is_none());
    assert!(runner.active_job().is_none());
}

#[tokio::test(start_paused = true)]
async fn invariant_ava_laser_scenario() {
    let runner = JobRunner::new(LATENCY);
    runner.start(GenerationRequest::text("AVA", ProfileId::Laser));
    assert_eq!(runner.state(), JobState::Pending);

    tokio::time::sleep(LATENCY + Duration::from_millis(1)).await;
    assert_eq!(runner.state(), JobState::Complete);

    let artifact = runner.artifact().unwrap();
    assert!(artifact.text_content.contains("AVA"));
    assert_eq!(artifact.suggested_file_name, "AVA-laser.svg");

    let direct = synthesize("laser", "AVA");
    assert_eq!(artifact.text_content, direct.text_content);
    assert_eq!(direct.suggested_file_name, "AVA-laser.svg");
}

#[test]
fn invariant_literal_text_capped_at_twenty() {
    let mut collector = InputCollector::new();
    collector.set_mode(InputMode::Text);

    let exactly_twenty = "12345678901234567890";
    collector.set_literal_text(exactly_twenty);
    assert_eq!(collector.literal_text(), exactly_twenty);

    collector.set_literal_text(&format!("{}X", exactly_twenty));
    assert_eq!(collector.literal_text(), exactly_twenty);
    assert_eq!(
        collector.request().literal_text.as_deref(),
        Some(exactly_twenty)
    );
}

#[tokio::test(start_paused = true)]
async fn invariant_upload_flow_saves_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        generation_latency: Duration::from_millis(50),
        export_latency: Duration::from_millis(10),
        download_dir: dir.path().to_path_buf(),
        ..Config::default()
    };

    let mut session = Session::new(&config);
    let input = session.input_mut();
    input.set_mode(InputMode::Upload);
    input.set_profile(ProfileId::Vinyl);
    input.select_upload("crest.png", 4096).unwrap();

    assert!(session.generate().is_started());
    assert_eq!(session.wait_until_settled().await, JobState::Complete);

    let host = DirectoryHost::new(&config.download_dir);
    let receipt = session.download(&host).await.unwrap();
    assert_eq!(receipt.file_name, "crest-vinyl.svg");

    let saved = std::fs::read_to_string(dir.path().join("crest-vinyl.svg")).unwrap();
    assert!(saved.contains(">crest</text>"));
    assert_eq!(host.live_urls(), 0);
    assert_eq!(session.state(), JobState::Idle);
}

#[test]
fn invariant_upload_rejects_unlisted_types() {
    assert!(UploadRef::new("part.stl", 100).is_err());
    assert!(UploadRef::new("logo.eps", 100).is_ok());
}
