// End-to-end pipeline tests against an in-process backend double.

use async_trait::async_trait;
use audioscribe::gemini::{
    ApiError, FileState, GenerativeBackend, MediaPart, ModelReply, StagedFile, UploadPoller,
    UploadProgress,
};
use audioscribe::media::MediaSource;
use audioscribe::orchestrator::{
    ModelTier, Phase, ProgressEvent, ProgressSink, TranscribeError, TranscribeRequest,
    TranscriptionOrchestrator, LARGE_FILE_THRESHOLD_BYTES,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Upload,
    StateQuery,
    Generate {
        model: String,
        media: Option<&'static str>,
        prompt: String,
    },
}

struct MockBackend {
    replies: Mutex<VecDeque<Result<ModelReply, ApiError>>>,
    poll_states: Mutex<VecDeque<FileState>>,
    poll_default: Mutex<FileState>,
    upload_state: Mutex<FileState>,
    upload_error: Mutex<Option<ApiError>>,
    calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            poll_states: Mutex::new(VecDeque::new()),
            poll_default: Mutex::new(FileState::Active),
            upload_state: Mutex::new(FileState::Active),
            upload_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn reply_text(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ModelReply {
                text: Some(text.to_string()),
            }));
    }

    fn reply_none(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ModelReply { text: None }));
    }

    fn reply_error(&self, error: ApiError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    fn set_upload_state(&self, state: FileState) {
        *self.upload_state.lock().unwrap() = state;
    }

    fn push_poll_state(&self, state: FileState) {
        self.poll_states.lock().unwrap().push_back(state);
    }

    fn set_poll_default(&self, state: FileState) {
        *self.poll_default.lock().unwrap() = state;
    }

    fn fail_upload(&self, error: ApiError) {
        *self.upload_error.lock().unwrap() = Some(error);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn generate_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Generate { .. }))
            .collect()
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate(
        &self,
        model: &str,
        media: Option<&MediaPart>,
        prompt: &str,
    ) -> Result<ModelReply, ApiError> {
        let kind = media.map(|m| match m {
            MediaPart::Inline { .. } => "inline",
            MediaPart::Remote { .. } => "remote",
        });
        self.calls.lock().unwrap().push(Call::Generate {
            model: model.to_string(),
            media: kind,
            prompt: prompt.to_string(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ModelReply { text: None }))
    }

    async fn upload_media(
        &self,
        source: &MediaSource,
        on_progress: UploadProgress,
    ) -> Result<StagedFile, ApiError> {
        self.calls.lock().unwrap().push(Call::Upload);
        if let Some(error) = self.upload_error.lock().unwrap().take() {
            return Err(error);
        }

        let total = source.byte_len();
        on_progress(total / 2, total);
        on_progress(total, total);

        Ok(StagedFile {
            name: "files/mock-1".to_string(),
            mime_type: Some(source.mime_type().to_string()),
            state: self.upload_state.lock().unwrap().clone(),
        })
    }

    async fn file_state(&self, _name: &str) -> Result<FileState, ApiError> {
        self.calls.lock().unwrap().push(Call::StateQuery);
        Ok(self
            .poll_states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.poll_default.lock().unwrap().clone()))
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<ProgressEvent>>);

impl ProgressSink for Recorder {
    fn emit(&self, event: ProgressEvent) {
        self.0.lock().unwrap().push(event);
    }
}

impl Recorder {
    fn events(&self) -> Vec<ProgressEvent> {
        self.0.lock().unwrap().clone()
    }

    fn phases(&self) -> Vec<Phase> {
        self.events().iter().map(|e| e.phase).collect()
    }
}

fn orchestrator(backend: Arc<MockBackend>, threshold: u64) -> TranscriptionOrchestrator {
    TranscriptionOrchestrator::with_limits(
        backend,
        threshold,
        UploadPoller::new(Duration::from_millis(1), Some(Duration::from_millis(200))),
    )
}

fn request(tier: ModelTier, refine: bool) -> TranscribeRequest {
    TranscribeRequest {
        prompt: "Transcribe the spoken audio. Output only the transcription.".to_string(),
        tier,
        refine,
    }
}

fn source_of(len: usize) -> MediaSource {
    MediaSource::from_bytes("take.mp3", "audio/mpeg", vec![0u8; len])
}

#[tokio::test]
async fn small_source_takes_the_inline_path() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("hello world");

    let orchestrator = orchestrator(backend.clone(), 1024);
    let result = orchestrator
        .transcribe(&source_of(512), &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap();

    assert_eq!(result.text, "hello world");
    assert_eq!(result.file_name, "take.mp3");

    let calls = backend.calls();
    assert!(!calls.contains(&Call::Upload));
    assert!(!calls.contains(&Call::StateQuery));
    assert_eq!(
        calls,
        vec![Call::Generate {
            model: "gemini-2.5-flash".to_string(),
            media: Some("inline"),
            prompt: request(ModelTier::Fast, false).prompt,
        }]
    );
}

#[tokio::test]
async fn five_megabytes_stays_inline_at_the_default_threshold() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("verbatim transcript");

    let orchestrator = TranscriptionOrchestrator::new(backend.clone());
    let result = orchestrator
        .transcribe(
            &source_of(5 * 1024 * 1024),
            &request(ModelTier::Fast, false),
            Arc::new(Recorder::default()),
        )
        .await
        .unwrap();

    assert_eq!(result.text, "verbatim transcript");
    assert_eq!(backend.generate_calls().len(), 1);
    assert!(!backend.calls().contains(&Call::Upload));
}

#[tokio::test]
async fn large_source_is_staged_and_transcribed_only_after_active() {
    let backend = Arc::new(MockBackend::new());
    backend.set_upload_state(FileState::Processing);
    backend.push_poll_state(FileState::Processing);
    backend.push_poll_state(FileState::Active);
    backend.reply_text("staged transcript");

    let orchestrator = orchestrator(backend.clone(), 16);
    let result = orchestrator
        .transcribe(&source_of(64), &request(ModelTier::Accurate, false), Arc::new(Recorder::default()))
        .await
        .unwrap();

    assert_eq!(result.text, "staged transcript");
    assert_eq!(
        backend.calls(),
        vec![
            Call::Upload,
            Call::StateQuery,
            Call::StateQuery,
            Call::Generate {
                model: "gemini-2.5-pro".to_string(),
                media: Some("remote"),
                prompt: request(ModelTier::Accurate, false).prompt,
            },
        ]
    );
}

#[tokio::test]
async fn staged_file_already_active_skips_state_queries() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("quick");

    let orchestrator = orchestrator(backend.clone(), 16);
    orchestrator
        .transcribe(&source_of(64), &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap();

    assert!(!backend.calls().contains(&Call::StateQuery));
}

#[tokio::test]
async fn twenty_megabyte_video_staged_with_refinement() {
    let backend = Arc::new(MockBackend::new());
    backend.set_upload_state(FileState::Processing);
    backend.push_poll_state(FileState::Active);
    backend.reply_text("raw transcript");
    backend.reply_text("refined transcript");

    let source = MediaSource::from_bytes("clip.mp4", "video/mp4", vec![0u8; 20 * 1024 * 1024]);
    let orchestrator = TranscriptionOrchestrator::with_limits(
        backend.clone(),
        LARGE_FILE_THRESHOLD_BYTES,
        UploadPoller::new(Duration::from_millis(1), Some(Duration::from_millis(200))),
    );

    let result = orchestrator
        .transcribe(&source, &request(ModelTier::Fast, true), Arc::new(Recorder::default()))
        .await
        .unwrap();

    assert_eq!(result.text, "refined transcript");
    assert!(backend.calls().contains(&Call::Upload));

    let generates = backend.generate_calls();
    assert_eq!(generates.len(), 2);
    match &generates[1] {
        Call::Generate { model, media, prompt } => {
            assert_eq!(model, "gemini-2.5-pro");
            assert!(media.is_none());
            assert!(prompt.contains("raw transcript"));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn refinement_disabled_returns_raw_text_verbatim() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("Raw , unpolished text\n");

    let orchestrator = orchestrator(backend.clone(), 1024);
    let result = orchestrator
        .transcribe(&source_of(10), &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap();

    assert_eq!(result.text, "Raw , unpolished text\n");
    assert_eq!(backend.generate_calls().len(), 1);
}

#[tokio::test]
async fn refinement_error_falls_back_to_raw_transcript() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("raw transcript");
    backend.reply_error(ApiError::Network("connection reset".to_string()));

    let orchestrator = orchestrator(backend.clone(), 1024);
    let result = orchestrator
        .transcribe(&source_of(10), &request(ModelTier::Fast, true), Arc::new(Recorder::default()))
        .await
        .unwrap();

    assert_eq!(result.text, "raw transcript");
    assert_eq!(backend.generate_calls().len(), 2);
}

#[tokio::test]
async fn refinement_empty_reply_falls_back_to_raw_transcript() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("raw transcript");
    backend.reply_none();

    let orchestrator = orchestrator(backend.clone(), 1024);
    let result = orchestrator
        .transcribe(&source_of(10), &request(ModelTier::Fast, true), Arc::new(Recorder::default()))
        .await
        .unwrap();

    assert_eq!(result.text, "raw transcript");
}

#[tokio::test]
async fn successful_refinement_replaces_the_raw_text_and_uses_the_accurate_tier() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("raw transcript");
    backend.reply_text("polished transcript");

    let orchestrator = orchestrator(backend.clone(), 1024);
    let result = orchestrator
        .transcribe(&source_of(10), &request(ModelTier::Fast, true), Arc::new(Recorder::default()))
        .await
        .unwrap();

    assert_eq!(result.text, "polished transcript");

    let generates = backend.generate_calls();
    match (&generates[0], &generates[1]) {
        (
            Call::Generate { model: first, .. },
            Call::Generate { model: second, .. },
        ) => {
            assert_eq!(first, "gemini-2.5-flash");
            assert_eq!(second, "gemini-2.5-pro");
        }
        other => panic!("unexpected calls {:?}", other),
    }
}

#[tokio::test]
async fn missing_reply_text_is_a_hard_failure() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_none();

    let orchestrator = orchestrator(backend.clone(), 1024);
    let err = orchestrator
        .transcribe(&source_of(10), &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::TranscriptionEmpty));
}

#[tokio::test]
async fn empty_reply_text_is_a_hard_failure() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("");

    let orchestrator = orchestrator(backend.clone(), 1024);
    let err = orchestrator
        .transcribe(&source_of(10), &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::TranscriptionEmpty));
}

#[tokio::test]
async fn transport_error_fails_the_attempt_without_a_refinement_call() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_error(ApiError::Network("dns failure".to_string()));

    let orchestrator = orchestrator(backend.clone(), 1024);
    let err = orchestrator
        .transcribe(&source_of(10), &request(ModelTier::Fast, true), Arc::new(Recorder::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::TranscriptionRequestFailed(_)));
    assert_eq!(backend.generate_calls().len(), 1);
}

#[tokio::test]
async fn inline_progress_events_arrive_in_order() {
    let backend = Arc::new(MockBackend::new());
    backend.reply_text("text");

    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator(backend, 1024);
    orchestrator
        .transcribe(&source_of(10), &request(ModelTier::Fast, false), recorder.clone())
        .await
        .unwrap();

    let events = recorder.events();
    assert_eq!(
        recorder.phases(),
        vec![Phase::Preparing, Phase::Transcribing, Phase::Done]
    );
    assert_eq!(events[0].percentage, 0);
    assert_eq!(events.last().unwrap().percentage, 100);
}

#[tokio::test]
async fn staged_progress_covers_upload_processing_and_refinement() {
    let backend = Arc::new(MockBackend::new());
    backend.set_upload_state(FileState::Processing);
    backend.push_poll_state(FileState::Active);
    backend.reply_text("raw");
    backend.reply_text("refined");

    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator(backend, 16);
    orchestrator
        .transcribe(&source_of(64), &request(ModelTier::Fast, true), recorder.clone())
        .await
        .unwrap();

    let observed: Vec<(Phase, u8)> = recorder
        .events()
        .iter()
        .map(|e| (e.phase, e.percentage))
        .collect();
    assert_eq!(
        observed,
        vec![
            (Phase::Preparing, 0),
            (Phase::Uploading, 50),
            (Phase::Uploading, 100),
            (Phase::Processing, 100),
            (Phase::Transcribing, 100),
            (Phase::Refining, 99),
            (Phase::Done, 100),
        ]
    );
}

#[tokio::test]
async fn terminal_failure_state_aborts_the_attempt() {
    let backend = Arc::new(MockBackend::new());
    backend.set_upload_state(FileState::Processing);
    backend.push_poll_state(FileState::Failed);

    let orchestrator = orchestrator(backend.clone(), 16);
    let err = orchestrator
        .transcribe(&source_of(64), &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TranscribeError::RemoteProcessingFailed(FileState::Failed)
    ));
    assert!(backend.generate_calls().is_empty());
}

#[tokio::test]
async fn stuck_processing_times_out() {
    let backend = Arc::new(MockBackend::new());
    backend.set_upload_state(FileState::Processing);
    backend.set_poll_default(FileState::Processing);

    let orchestrator = TranscriptionOrchestrator::with_limits(
        backend.clone(),
        16,
        UploadPoller::new(Duration::from_millis(1), Some(Duration::from_millis(20))),
    );
    let err = orchestrator
        .transcribe(&source_of(64), &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::PollingTimedOut(_)));
    assert!(backend.generate_calls().is_empty());
}

#[tokio::test]
async fn upload_transport_error_surfaces_as_upload_failed() {
    let backend = Arc::new(MockBackend::new());
    backend.fail_upload(ApiError::Network("broken pipe".to_string()));

    let orchestrator = orchestrator(backend.clone(), 16);
    let err = orchestrator
        .transcribe(&source_of(64), &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::UploadFailed(_)));
    assert!(backend.generate_calls().is_empty());
}

#[tokio::test]
async fn unreadable_file_surfaces_as_encoding_failed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.mp3");
    std::fs::write(&path, b"bytes").unwrap();
    let source = MediaSource::from_file(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    let backend = Arc::new(MockBackend::new());
    let orchestrator = orchestrator(backend.clone(), 1024);
    let err = orchestrator
        .transcribe(&source, &request(ModelTier::Fast, false), Arc::new(Recorder::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::EncodingFailed(_)));
    assert!(backend.calls().is_empty());
}
