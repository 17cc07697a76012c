//! Intent dispatch: one generation protocol per classified prompt.
//!
//! A submission becomes a session with pending artifact(s), announced
//! through the sink before any network call so the shell can render cards
//! immediately. Progress flows back as artifact patches; streaming branches
//! always carry the cumulative full-so-far text. A failed submission turns
//! the whole session into error cards, except in variations mode where each
//! concurrent task marks only its own artifact.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use atelier_core::config::StudioConfig;
use atelier_core::error::{Result, StudioError};
use atelier_core::intent::{Intent, classify};
use atelier_core::session::{
    Artifact, ArtifactKind, ArtifactMetadata, ArtifactPatch, GroundingChunk, Session,
    new_session_id,
};
use atelier_interaction::{
    AttachmentData, GeneratedPart, GenerationBackend, GenerationRequest, GroundingTool,
    ImageParams, KeyGate, VideoParams,
};

use crate::updates::UpdateSink;

/// Style presets fanned out per session in variations mode.
pub const VARIATION_PRESETS: [&str; 3] = ["Minimalist", "Glassmorphism", "Neo-Brutalist"];

const TITLE_UI: &str = "Architecting...";
const TITLE_DEFAULT: &str = "Thinking...";

const LABEL_VIDEO: &str = "Veo 3.1";
const LABEL_IMAGE_EDIT: &str = "Gemini 2.5 Flash Image";
const LABEL_IMAGE_GEN: &str = "Gemini 3 Pro Image";
const LABEL_ANALYZE: &str = "Gemini 3 Pro";
const LABEL_MAPS: &str = "Gemini 2.5 Flash";
const LABEL_SEARCH: &str = "Gemini 3 Flash";
const LABEL_UI: &str = "Gemini 3 Flash";
const LABEL_CHAT: &str = "Gemini 2.5 Flash Lite";

/// Builds a fresh backend client; invoked again after key selection.
pub type BackendFactory = dyn Fn() -> Arc<dyn GenerationBackend> + Send + Sync;

/// Classifies prompts and drives the matching generation protocol.
pub struct Dispatcher {
    backend: RwLock<Arc<dyn GenerationBackend>>,
    make_backend: Box<BackendFactory>,
    key_gate: Arc<dyn KeyGate>,
    sink: UpdateSink,
    config: StudioConfig,
    api_key: String,
}

impl Dispatcher {
    pub fn new(
        make_backend: Box<BackendFactory>,
        key_gate: Arc<dyn KeyGate>,
        sink: UpdateSink,
        config: StudioConfig,
        api_key: impl Into<String>,
    ) -> Arc<Self> {
        let backend = RwLock::new(make_backend());
        Arc::new(Self {
            backend,
            make_backend,
            key_gate,
            sink,
            config,
            api_key: api_key.into(),
        })
    }

    /// Runs one submission end to end.
    ///
    /// Intended to be spawned; the shell stays interactive while it runs.
    /// Returns the new session's id, or `None` when the prompt was blank.
    pub async fn submit(
        self: Arc<Self>,
        prompt: String,
        attachment: Option<AttachmentData>,
    ) -> Option<String> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return None;
        }

        let intent = classify(trimmed, attachment.is_some());
        let session_id = new_session_id();
        tracing::info!(
            "[Dispatcher] Submission classified: intent={:?}, session_id={}",
            intent,
            session_id
        );

        let variations = intent == Intent::UiGen && self.config.generation.variations;
        let artifacts = if variations {
            VARIATION_PRESETS
                .into_iter()
                .enumerate()
                .map(|(index, preset)| {
                    Artifact::pending(Artifact::scoped_id(&session_id, index), preset)
                })
                .collect()
        } else {
            let title = if intent == Intent::UiGen {
                TITLE_UI
            } else {
                TITLE_DEFAULT
            };
            vec![Artifact::pending(Artifact::scoped_id(&session_id, 0), title)]
        };
        self.sink
            .session_started(Session::with_id(&session_id, prompt.clone(), artifacts));

        if variations {
            self.run_ui_variations(&session_id, trimmed).await;
        } else {
            let artifact_id = Artifact::scoped_id(&session_id, 0);
            if let Err(err) = self
                .run_single(intent, &session_id, &artifact_id, trimmed, attachment)
                .await
            {
                tracing::warn!(
                    "[Dispatcher] Generation failed: session_id={}, error={}",
                    session_id,
                    err
                );
                self.sink
                    .session_failed(&session_id, &err.artifact_message());
            }
        }
        Some(session_id)
    }

    async fn run_single(
        &self,
        intent: Intent,
        session_id: &str,
        artifact_id: &str,
        prompt: &str,
        attachment: Option<AttachmentData>,
    ) -> Result<()> {
        match intent {
            Intent::VideoGen => {
                self.run_video(session_id, artifact_id, prompt, attachment)
                    .await
            }
            Intent::ImageEdit => {
                self.run_image_edit(session_id, artifact_id, prompt, attachment)
                    .await
            }
            Intent::ImageGen => self.run_image_gen(session_id, artifact_id, prompt).await,
            Intent::Analyze => {
                self.run_analysis(session_id, artifact_id, prompt, attachment)
                    .await
            }
            // An attached file turns plain chat into analysis.
            Intent::Chat if attachment.is_some() => {
                self.run_analysis(session_id, artifact_id, prompt, attachment)
                    .await
            }
            Intent::Maps => {
                self.run_grounded(
                    session_id,
                    artifact_id,
                    prompt,
                    &self.config.models.maps,
                    LABEL_MAPS,
                    GroundingTool::Maps,
                )
                .await
            }
            Intent::Search => {
                self.run_grounded(
                    session_id,
                    artifact_id,
                    prompt,
                    &self.config.models.search,
                    LABEL_SEARCH,
                    GroundingTool::WebSearch,
                )
                .await
            }
            Intent::UiGen => self.run_ui(session_id, artifact_id, prompt, None).await,
            Intent::Chat => self.run_chat(session_id, artifact_id, prompt).await,
        }
    }

    async fn run_video(
        &self,
        session_id: &str,
        artifact_id: &str,
        prompt: &str,
        attachment: Option<AttachmentData>,
    ) -> Result<()> {
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::waiting(
                ArtifactKind::Video,
                Some(ArtifactMetadata::for_model(LABEL_VIDEO)),
            ),
        );

        if !self.key_gate.has_selected_key().await {
            self.key_gate.open_select_key().await?;
            // The selection may have changed the effective key.
            self.rebuild_backend().await;
        }

        let video = &self.config.generation.video;
        let request = GenerationRequest::text(&self.config.models.video, prompt)
            .with_attachment(attachment)
            .with_video_params(VideoParams {
                number_of_videos: video.number_of_videos,
                resolution: video.resolution.clone(),
                aspect_ratio: video.aspect_ratio.clone(),
            });

        let backend = self.backend().await;
        let mut job = backend.submit_video_job(request).await?;
        tracing::debug!("[Dispatcher] Video job submitted: name={}", job.name);

        let interval = Duration::from_secs(self.config.polling.interval_secs);
        let mut polls: u32 = 0;
        while !job.done {
            if polls >= self.config.polling.max_polls {
                return Err(StudioError::missing_payload("Video generation timed out."));
            }
            tokio::time::sleep(interval).await;
            job = backend.poll_video_job(&job).await?;
            polls += 1;
        }

        let uri = job.uri.ok_or_else(|| {
            StudioError::missing_payload("Video generation failed to return a URI.")
        })?;
        // The serving endpoint authenticates via a key query parameter.
        let content = format!("{}&key={}", uri, self.api_key);
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::complete(
                content,
                ArtifactKind::Video,
                Some(ArtifactMetadata::for_model(LABEL_VIDEO)),
            ),
        );
        Ok(())
    }

    async fn run_image_edit(
        &self,
        session_id: &str,
        artifact_id: &str,
        prompt: &str,
        attachment: Option<AttachmentData>,
    ) -> Result<()> {
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::waiting(
                ArtifactKind::Image,
                Some(ArtifactMetadata::for_model(LABEL_IMAGE_EDIT)),
            ),
        );
        let attachment =
            attachment.ok_or_else(|| StudioError::invalid_input("Image required for editing."))?;

        let request = GenerationRequest::text(&self.config.models.image_edit, prompt)
            .with_attachment(Some(attachment));
        let parts = self.backend().await.generate_content(request).await?;
        let content = first_inline_image(parts)
            .ok_or_else(|| StudioError::missing_payload("No image returned from edit request."))?;

        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::complete(
                content,
                ArtifactKind::Image,
                Some(ArtifactMetadata::for_model(LABEL_IMAGE_EDIT)),
            ),
        );
        Ok(())
    }

    async fn run_image_gen(&self, session_id: &str, artifact_id: &str, prompt: &str) -> Result<()> {
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::waiting(
                ArtifactKind::Image,
                Some(ArtifactMetadata::for_model(LABEL_IMAGE_GEN)),
            ),
        );

        let request = GenerationRequest::text(&self.config.models.image_gen, prompt)
            .with_image_params(ImageParams {
                size: self.config.generation.image_size.as_str().to_string(),
                aspect_ratio: "1:1".to_string(),
            });
        let parts = self.backend().await.generate_content(request).await?;
        let content = first_inline_image(parts)
            .ok_or_else(|| StudioError::missing_payload("No image generated."))?;

        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::complete(
                content,
                ArtifactKind::Image,
                Some(ArtifactMetadata::for_model(LABEL_IMAGE_GEN)),
            ),
        );
        Ok(())
    }

    async fn run_analysis(
        &self,
        session_id: &str,
        artifact_id: &str,
        prompt: &str,
        attachment: Option<AttachmentData>,
    ) -> Result<()> {
        let request =
            GenerationRequest::text(&self.config.models.analyze, prompt).with_attachment(attachment);
        let (text, metadata) = self
            .stream_to_artifact(
                session_id,
                artifact_id,
                request,
                ArtifactKind::Text,
                LABEL_ANALYZE,
            )
            .await?;
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::complete(text, ArtifactKind::Text, Some(metadata)),
        );
        Ok(())
    }

    async fn run_grounded(
        &self,
        session_id: &str,
        artifact_id: &str,
        prompt: &str,
        model: &str,
        label: &str,
        tool: GroundingTool,
    ) -> Result<()> {
        let request = GenerationRequest::text(model, prompt).with_tool(tool);
        let (text, metadata) = self
            .stream_to_artifact(session_id, artifact_id, request, ArtifactKind::Text, label)
            .await?;
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::complete(text, ArtifactKind::Text, Some(metadata)),
        );
        Ok(())
    }

    async fn run_ui(
        &self,
        session_id: &str,
        artifact_id: &str,
        prompt: &str,
        style: Option<&str>,
    ) -> Result<()> {
        let request = GenerationRequest::text(&self.config.models.ui, ui_prompt(prompt, style));
        let (raw, metadata) = self
            .stream_to_artifact(
                session_id,
                artifact_id,
                request,
                ArtifactKind::Html,
                LABEL_UI,
            )
            .await?;
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::complete(strip_code_fences(&raw), ArtifactKind::Html, Some(metadata)),
        );
        Ok(())
    }

    async fn run_chat(&self, session_id: &str, artifact_id: &str, prompt: &str) -> Result<()> {
        let request = GenerationRequest::text(&self.config.models.chat, prompt);
        let (text, metadata) = self
            .stream_to_artifact(
                session_id,
                artifact_id,
                request,
                ArtifactKind::Text,
                LABEL_CHAT,
            )
            .await?;
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::complete(text, ArtifactKind::Text, Some(metadata)),
        );
        Ok(())
    }

    /// Fans out the three style variations concurrently. A failed variation
    /// marks only its own artifact.
    async fn run_ui_variations(self: &Arc<Self>, session_id: &str, prompt: &str) {
        let mut tasks = JoinSet::new();
        for (index, preset) in VARIATION_PRESETS.into_iter().enumerate() {
            let dispatcher = Arc::clone(self);
            let session_id = session_id.to_string();
            let prompt = prompt.to_string();
            tasks.spawn(async move {
                let artifact_id = Artifact::scoped_id(&session_id, index);
                if let Err(err) = dispatcher
                    .run_ui(&session_id, &artifact_id, &prompt, Some(preset))
                    .await
                {
                    tracing::warn!(
                        "[Dispatcher] Variation failed: preset={}, session_id={}, error={}",
                        preset,
                        session_id,
                        err
                    );
                    dispatcher.sink.artifact(
                        &session_id,
                        &artifact_id,
                        ArtifactPatch::error(err.artifact_message()),
                    );
                }
            });
        }
        while tasks.join_next().await.is_some() {}
    }

    /// Streams one request into an artifact: an empty streaming patch first,
    /// then the cumulative text per chunk. Returns the final text and
    /// metadata; the caller sends the terminal update.
    async fn stream_to_artifact(
        &self,
        session_id: &str,
        artifact_id: &str,
        request: GenerationRequest,
        kind: ArtifactKind,
        label: &str,
    ) -> Result<(String, ArtifactMetadata)> {
        self.sink.artifact(
            session_id,
            artifact_id,
            ArtifactPatch::streaming("", kind, Some(ArtifactMetadata::for_model(label))),
        );

        let mut stream = self.backend().await.stream_generate(request).await?;
        let mut text = String::new();
        let mut grounding: Option<Vec<GroundingChunk>> = None;
        let mut usage = None;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            text.push_str(&chunk.text);
            // The latest grounding set supersedes earlier ones.
            if chunk.grounding.is_some() {
                grounding = chunk.grounding;
            }
            if chunk.usage.is_some() {
                usage = chunk.usage;
            }
            self.sink.artifact(
                session_id,
                artifact_id,
                ArtifactPatch::streaming(
                    text.clone(),
                    kind,
                    Some(ArtifactMetadata {
                        model: Some(label.to_string()),
                        grounding_chunks: grounding.clone(),
                        usage_metadata: usage.clone(),
                    }),
                ),
            );
        }

        let metadata = ArtifactMetadata {
            model: Some(label.to_string()),
            grounding_chunks: grounding,
            usage_metadata: usage,
        };
        Ok((text, metadata))
    }

    async fn backend(&self) -> Arc<dyn GenerationBackend> {
        self.backend.read().await.clone()
    }

    async fn rebuild_backend(&self) {
        let fresh = (self.make_backend)();
        *self.backend.write().await = fresh;
        tracing::debug!("[Dispatcher] Backend client rebuilt after key selection");
    }
}

/// Wraps a raw prompt in the component-generation instruction.
fn ui_prompt(prompt: &str, style: Option<&str>) -> String {
    match style {
        Some(style) => format!(
            "Create a production-grade, interactive React-style (Vanilla JS) component for: \"{prompt}\". Apply a {style} visual style. Use dark mode, responsive design, and mock data. Return ONLY RAW HTML."
        ),
        None => format!(
            "Create a production-grade, interactive React-style (Vanilla JS) component for: \"{prompt}\". Use dark mode, responsive design, and mock data. Return ONLY RAW HTML."
        ),
    }
}

/// Extracts the first inline image part as a data URL.
fn first_inline_image(parts: Vec<GeneratedPart>) -> Option<String> {
    parts.into_iter().find_map(|part| match part {
        GeneratedPart::InlineImage { data, .. } => Some(format!("data:image/png;base64,{data}")),
        GeneratedPart::Text(_) => None,
    })
}

/// Strips a surrounding markdown code fence from generated HTML.
fn strip_code_fences(raw: &str) -> String {
    let mut clean = raw.trim();
    if let Some(rest) = clean.strip_prefix("```html") {
        clean = rest.trim_start();
    }
    if let Some(rest) = clean.strip_prefix("```") {
        clean = rest.trim_start();
    }
    if let Some(rest) = clean.strip_suffix("```") {
        clean = rest.trim_end();
    }
    clean.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::UnboundedReceiver;

    use atelier_core::session::{ArtifactStatus, ArtifactUpdate, WebSource};
    use atelier_interaction::{ChunkStream, StreamChunk, VideoJob};

    use crate::updates::StudioUpdate;

    #[derive(Default)]
    struct BackendScript {
        chunks: Vec<StreamChunk>,
        parts: Vec<GeneratedPart>,
        submitted_job: Option<VideoJob>,
        polled_job: Option<VideoJob>,
        fail_prompts_containing: Option<&'static str>,
    }

    struct ScriptedBackend {
        script: BackendScript,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedBackend {
        fn with_script(script: BackendScript) -> Arc<Self> {
            Arc::new(Self {
                script,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn stream_generate(&self, request: GenerationRequest) -> Result<ChunkStream> {
            let prompt = request.prompt.clone();
            self.seen.lock().unwrap().push(request);
            if let Some(marker) = self.script.fail_prompts_containing {
                if prompt.contains(marker) {
                    return Err(StudioError::upstream(500, "scripted stream failure", true));
                }
            }
            let chunks: Vec<Result<StreamChunk>> =
                self.script.chunks.clone().into_iter().map(Ok).collect();
            Ok(stream::iter(chunks).boxed())
        }

        async fn generate_content(&self, request: GenerationRequest) -> Result<Vec<GeneratedPart>> {
            self.seen.lock().unwrap().push(request);
            Ok(self.script.parts.clone())
        }

        async fn submit_video_job(&self, request: GenerationRequest) -> Result<VideoJob> {
            self.seen.lock().unwrap().push(request);
            Ok(self.script.submitted_job.clone().unwrap_or(VideoJob {
                name: "operations/video-1".to_string(),
                done: false,
                uri: None,
            }))
        }

        async fn poll_video_job(&self, job: &VideoJob) -> Result<VideoJob> {
            Ok(self.script.polled_job.clone().unwrap_or_else(|| job.clone()))
        }
    }

    struct ScriptedKeyGate {
        selected: bool,
        opened: AtomicUsize,
    }

    impl ScriptedKeyGate {
        fn new(selected: bool) -> Arc<Self> {
            Arc::new(Self {
                selected,
                opened: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl KeyGate for ScriptedKeyGate {
        async fn has_selected_key(&self) -> bool {
            self.selected
        }

        async fn open_select_key(&self) -> Result<()> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        dispatcher: Arc<Dispatcher>,
        backend: Arc<ScriptedBackend>,
        key_gate: Arc<ScriptedKeyGate>,
        updates: UnboundedReceiver<StudioUpdate>,
        factory_calls: Arc<AtomicUsize>,
    }

    fn harness(script: BackendScript, config: StudioConfig, key_selected: bool) -> Harness {
        let backend = ScriptedBackend::with_script(script);
        let key_gate = ScriptedKeyGate::new(key_selected);
        let (sink, updates) = UpdateSink::channel();
        let factory_calls = Arc::new(AtomicUsize::new(0));

        let factory_backend = backend.clone();
        let factory_counter = factory_calls.clone();
        let make_backend: Box<BackendFactory> = Box::new(move || {
            factory_counter.fetch_add(1, Ordering::SeqCst);
            factory_backend.clone() as Arc<dyn GenerationBackend>
        });

        let dispatcher = Dispatcher::new(make_backend, key_gate.clone(), sink, config, "test-key");
        Harness {
            dispatcher,
            backend,
            key_gate,
            updates,
            factory_calls,
        }
    }

    /// Polling sleeps are zero-length so video tests finish immediately.
    fn fast_config() -> StudioConfig {
        let mut config = StudioConfig::default();
        config.polling.interval_secs = 0;
        config
    }

    fn drain(updates: &mut UnboundedReceiver<StudioUpdate>) -> Vec<StudioUpdate> {
        let mut collected = Vec::new();
        while let Ok(update) = updates.try_recv() {
            collected.push(update);
        }
        collected
    }

    fn artifact_patches(updates: &[StudioUpdate]) -> Vec<ArtifactUpdate> {
        updates
            .iter()
            .filter_map(|update| match update {
                StudioUpdate::Artifact(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }

    fn failure_message(updates: &[StudioUpdate]) -> Option<String> {
        updates.iter().find_map(|update| match update {
            StudioUpdate::SessionFailed { message, .. } => Some(message.clone()),
            _ => None,
        })
    }

    fn text_chunk(text: &str) -> StreamChunk {
        StreamChunk {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn chat_streams_cumulative_content() {
        let script = BackendScript {
            chunks: vec![text_chunk("Hel"), text_chunk("lo")],
            ..Default::default()
        };
        let mut harness = harness(script, StudioConfig::default(), true);

        let session_id = harness
            .dispatcher
            .clone()
            .submit("hello world".to_string(), None)
            .await
            .unwrap();
        let updates = drain(&mut harness.updates);

        let StudioUpdate::SessionStarted(session) = &updates[0] else {
            panic!("expected SessionStarted first, got {:?}", updates[0]);
        };
        assert_eq!(session.id, session_id);
        assert_eq!(session.artifacts[0].title, "Thinking...");
        assert_eq!(session.artifacts[0].status, ArtifactStatus::Streaming);

        let patches = artifact_patches(&updates);
        let contents: Vec<&str> = patches.iter().map(|p| p.patch.content.as_str()).collect();
        assert_eq!(contents, vec!["", "Hel", "Hello", "Hello"]);

        let last = patches.last().unwrap();
        assert_eq!(last.patch.status, ArtifactStatus::Complete);
        assert_eq!(
            last.patch.metadata.as_ref().unwrap().model.as_deref(),
            Some("Gemini 2.5 Flash Lite")
        );
        assert_eq!(
            harness.backend.requests()[0].model,
            "gemini-2.5-flash-lite-latest"
        );
    }

    #[tokio::test]
    async fn ui_generation_strips_fences_and_marks_html() {
        let script = BackendScript {
            chunks: vec![text_chunk("```html\n<div>"), text_chunk("</div>\n```")],
            ..Default::default()
        };
        let mut harness = harness(script, StudioConfig::default(), true);

        harness
            .dispatcher
            .clone()
            .submit("a pricing dashboard".to_string(), None)
            .await;
        let updates = drain(&mut harness.updates);

        let StudioUpdate::SessionStarted(session) = &updates[0] else {
            panic!("expected SessionStarted first");
        };
        assert_eq!(session.artifacts[0].title, "Architecting...");

        let patches = artifact_patches(&updates);
        // In-flight updates carry the raw, unstripped stream.
        assert_eq!(patches[1].patch.content, "```html\n<div>");
        assert_eq!(patches[1].patch.kind, ArtifactKind::Html);

        let last = patches.last().unwrap();
        assert_eq!(last.patch.content, "<div></div>");
        assert_eq!(last.patch.kind, ArtifactKind::Html);
        assert_eq!(last.patch.status, ArtifactStatus::Complete);

        let request = &harness.backend.requests()[0];
        assert!(request.prompt.contains("\"a pricing dashboard\""));
        assert!(request.prompt.ends_with("Return ONLY RAW HTML."));
    }

    #[tokio::test]
    async fn image_generation_returns_a_data_url() {
        let script = BackendScript {
            parts: vec![
                GeneratedPart::Text("here you go".to_string()),
                GeneratedPart::InlineImage {
                    mime_type: "image/png".to_string(),
                    data: "QUJD".to_string(),
                },
            ],
            ..Default::default()
        };
        let mut harness = harness(script, StudioConfig::default(), true);

        harness
            .dispatcher
            .clone()
            .submit("generate a sunset over water".to_string(), None)
            .await;
        let updates = drain(&mut harness.updates);
        let patches = artifact_patches(&updates);

        assert_eq!(patches[0].patch.status, ArtifactStatus::Waiting);
        assert_eq!(patches[0].patch.kind, ArtifactKind::Image);

        let last = patches.last().unwrap();
        assert_eq!(last.patch.content, "data:image/png;base64,QUJD");
        assert_eq!(
            last.patch.metadata.as_ref().unwrap().model.as_deref(),
            Some("Gemini 3 Pro Image")
        );

        let request = &harness.backend.requests()[0];
        let image = request.image.as_ref().unwrap();
        assert_eq!(image.size, "1K");
        assert_eq!(image.aspect_ratio, "1:1");
    }

    #[tokio::test]
    async fn image_edit_requires_an_attachment() {
        let harness = harness(BackendScript::default(), StudioConfig::default(), true);

        let err = harness
            .dispatcher
            .run_single(Intent::ImageEdit, "s1", "s1_0", "remove the background", None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Image required for editing.");
    }

    #[tokio::test]
    async fn image_edit_reports_a_missing_image_payload() {
        let script = BackendScript {
            parts: vec![GeneratedPart::Text("no can do".to_string())],
            ..Default::default()
        };
        let harness = harness(script, StudioConfig::default(), true);

        let attachment = AttachmentData::new("Zm9v", "image/png");
        let err = harness
            .dispatcher
            .run_single(
                Intent::ImageEdit,
                "s1",
                "s1_0",
                "remove the background",
                Some(attachment),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "No image returned from edit request.");
    }

    #[tokio::test]
    async fn failed_generation_turns_into_session_failure() {
        let script = BackendScript {
            fail_prompts_containing: Some("hello"),
            ..Default::default()
        };
        let mut harness = harness(script, StudioConfig::default(), true);

        let session_id = harness
            .dispatcher
            .clone()
            .submit("hello".to_string(), None)
            .await
            .unwrap();
        let updates = drain(&mut harness.updates);

        let failure = updates
            .iter()
            .find_map(|update| match update {
                StudioUpdate::SessionFailed {
                    session_id,
                    message,
                } => Some((session_id.clone(), message.clone())),
                _ => None,
            })
            .expect("session failure update");
        assert_eq!(failure.0, session_id);
        assert_eq!(
            failure.1,
            "Generation API error (500): scripted stream failure"
        );
    }

    #[tokio::test]
    async fn video_success_appends_the_api_key() {
        let script = BackendScript {
            submitted_job: Some(VideoJob {
                name: "operations/v1".to_string(),
                done: false,
                uri: None,
            }),
            polled_job: Some(VideoJob {
                name: "operations/v1".to_string(),
                done: true,
                uri: Some("https://videos.example/v1?alt=media".to_string()),
            }),
            ..Default::default()
        };
        let mut harness = harness(script, fast_config(), true);

        harness
            .dispatcher
            .clone()
            .submit("animate a paper crane".to_string(), None)
            .await;
        let updates = drain(&mut harness.updates);
        let patches = artifact_patches(&updates);

        assert_eq!(patches[0].patch.status, ArtifactStatus::Waiting);
        assert_eq!(patches[0].patch.kind, ArtifactKind::Video);
        assert_eq!(
            patches[0].patch.metadata.as_ref().unwrap().model.as_deref(),
            Some("Veo 3.1")
        );

        let last = patches.last().unwrap();
        assert_eq!(last.patch.status, ArtifactStatus::Complete);
        assert_eq!(
            last.patch.content,
            "https://videos.example/v1?alt=media&key=test-key"
        );

        let request = &harness.backend.requests()[0];
        let video = request.video.as_ref().unwrap();
        assert_eq!(video.number_of_videos, 1);
        assert_eq!(video.resolution, "720p");
        assert_eq!(video.aspect_ratio, "16:9");
    }

    #[tokio::test]
    async fn video_polling_gives_up_after_max_polls() {
        let script = BackendScript {
            polled_job: Some(VideoJob {
                name: "operations/v1".to_string(),
                done: false,
                uri: None,
            }),
            ..Default::default()
        };
        let mut config = fast_config();
        config.polling.max_polls = 2;
        let mut harness = harness(script, config, true);

        harness
            .dispatcher
            .clone()
            .submit("make a movie of rain".to_string(), None)
            .await;
        let updates = drain(&mut harness.updates);

        assert_eq!(
            failure_message(&updates).as_deref(),
            Some("Video generation timed out.")
        );
    }

    #[tokio::test]
    async fn video_without_uri_reports_the_missing_payload() {
        let script = BackendScript {
            submitted_job: Some(VideoJob {
                name: "operations/v1".to_string(),
                done: true,
                uri: None,
            }),
            ..Default::default()
        };
        let mut harness = harness(script, fast_config(), true);

        harness
            .dispatcher
            .clone()
            .submit("video of a comet".to_string(), None)
            .await;
        let updates = drain(&mut harness.updates);

        assert_eq!(
            failure_message(&updates).as_deref(),
            Some("Video generation failed to return a URI.")
        );
    }

    #[tokio::test]
    async fn video_opens_the_key_selector_and_rebuilds_the_client() {
        let script = BackendScript {
            submitted_job: Some(VideoJob {
                name: "operations/v1".to_string(),
                done: true,
                uri: Some("https://videos.example/v1?alt=media".to_string()),
            }),
            ..Default::default()
        };
        let harness = harness(script, fast_config(), false);

        harness
            .dispatcher
            .clone()
            .submit("animate this scene".to_string(), None)
            .await;

        assert_eq!(harness.key_gate.opened.load(Ordering::SeqCst), 1);
        // Once at construction, once after key selection.
        assert_eq!(harness.factory_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn search_carries_grounding_chunks_into_metadata() {
        let sources = vec![GroundingChunk {
            web: Some(WebSource {
                uri: "https://example.com/a".to_string(),
                title: Some("A".to_string()),
            }),
            maps: None,
        }];
        let script = BackendScript {
            chunks: vec![StreamChunk {
                text: "Top stories".to_string(),
                grounding: Some(sources),
                usage: Some(serde_json::json!({ "totalTokenCount": 7 })),
            }],
            ..Default::default()
        };
        let mut harness = harness(script, StudioConfig::default(), true);

        harness
            .dispatcher
            .clone()
            .submit("latest robotics breakthroughs".to_string(), None)
            .await;
        let updates = drain(&mut harness.updates);
        let patches = artifact_patches(&updates);

        let metadata = patches.last().unwrap().patch.metadata.clone().unwrap();
        assert_eq!(metadata.model.as_deref(), Some("Gemini 3 Flash"));
        assert_eq!(metadata.grounding_chunks.unwrap().len(), 1);
        assert!(metadata.usage_metadata.is_some());

        let request = &harness.backend.requests()[0];
        assert_eq!(request.tool, Some(GroundingTool::WebSearch));
        assert_eq!(request.model, "gemini-3-flash-preview");
    }

    #[tokio::test]
    async fn maps_prompts_use_the_maps_tool() {
        let script = BackendScript {
            chunks: vec![text_chunk("Nearby: ...")],
            ..Default::default()
        };
        let mut harness = harness(script, StudioConfig::default(), true);

        harness
            .dispatcher
            .clone()
            .submit("coffee nearby".to_string(), None)
            .await;
        let updates = drain(&mut harness.updates);

        let request = &harness.backend.requests()[0];
        assert_eq!(request.tool, Some(GroundingTool::Maps));
        assert_eq!(request.model, "gemini-2.5-flash");

        let patches = artifact_patches(&updates);
        assert_eq!(
            patches.last().unwrap().patch.metadata.as_ref().unwrap().model.as_deref(),
            Some("Gemini 2.5 Flash")
        );
    }

    #[tokio::test]
    async fn attachment_reroutes_chat_to_analysis() {
        let script = BackendScript {
            chunks: vec![text_chunk("A cat.")],
            ..Default::default()
        };
        let mut harness = harness(script, StudioConfig::default(), true);

        let attachment = AttachmentData::new("Zm9v", "image/png");
        harness
            .dispatcher
            .clone()
            .submit("tell me about this".to_string(), Some(attachment))
            .await;
        let updates = drain(&mut harness.updates);

        let request = &harness.backend.requests()[0];
        assert_eq!(request.model, "gemini-3-pro-preview");
        assert!(request.attachment.is_some());

        let patches = artifact_patches(&updates);
        assert_eq!(
            patches.last().unwrap().patch.metadata.as_ref().unwrap().model.as_deref(),
            Some("Gemini 3 Pro")
        );
    }

    #[tokio::test]
    async fn variations_fan_out_and_isolate_failures() {
        let script = BackendScript {
            chunks: vec![text_chunk("<section/>")],
            fail_prompts_containing: Some("Glassmorphism"),
            ..Default::default()
        };
        let mut config = StudioConfig::default();
        config.generation.variations = true;
        let mut harness = harness(script, config, true);

        let session_id = harness
            .dispatcher
            .clone()
            .submit("a metrics dashboard".to_string(), None)
            .await
            .unwrap();
        let updates = drain(&mut harness.updates);

        let StudioUpdate::SessionStarted(session) = &updates[0] else {
            panic!("expected SessionStarted first");
        };
        let titles: Vec<&str> = session.artifacts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Minimalist", "Glassmorphism", "Neo-Brutalist"]);

        // One bad variation never takes down the session.
        assert!(failure_message(&updates).is_none());

        let patches = artifact_patches(&updates);
        let failed_id = Artifact::scoped_id(&session_id, 1);
        let failed = patches
            .iter()
            .filter(|p| p.artifact_id == failed_id)
            .next_back()
            .unwrap();
        assert_eq!(failed.patch.status, ArtifactStatus::Error);
        assert_eq!(failed.patch.kind, ArtifactKind::Error);

        for index in [0usize, 2] {
            let id = Artifact::scoped_id(&session_id, index);
            let terminal = patches
                .iter()
                .filter(|p| p.artifact_id == id)
                .next_back()
                .unwrap();
            assert_eq!(terminal.patch.status, ArtifactStatus::Complete);
            assert_eq!(terminal.patch.content, "<section/>");
        }
    }

    #[tokio::test]
    async fn blank_prompts_are_ignored() {
        let mut harness = harness(BackendScript::default(), StudioConfig::default(), true);

        let outcome = harness
            .dispatcher
            .clone()
            .submit("   ".to_string(), None)
            .await;

        assert!(outcome.is_none());
        assert!(drain(&mut harness.updates).is_empty());
    }

    #[test]
    fn strip_code_fences_handles_fenced_and_bare_output() {
        assert_eq!(strip_code_fences("```html\n<p>hi</p>\n```"), "<p>hi</p>");
        assert_eq!(strip_code_fences("```\n<p>hi</p>\n```"), "<p>hi</p>");
        assert_eq!(strip_code_fences("  <p>hi</p>  "), "<p>hi</p>");
        assert_eq!(strip_code_fences("no fences"), "no fences");
    }

    #[test]
    fn ui_prompt_carries_the_style_directive() {
        let base = ui_prompt("a pricing table", None);
        assert!(base.starts_with("Create a production-grade"));
        assert!(base.contains("\"a pricing table\""));
        assert!(!base.contains("visual style"));

        let styled = ui_prompt("a pricing table", Some("Minimalist"));
        assert!(styled.contains("Apply a Minimalist visual style."));
    }
}
