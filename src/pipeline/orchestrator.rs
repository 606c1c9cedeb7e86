use futures::StreamExt;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use crate::ai::{response_fragments, ModelClient, ModelRequest, Prompt};
use crate::config::Settings;
use crate::document::{DocumentContext, Position, TextSink};
use crate::pipeline::{Notifier, PipelineError};
use crate::prompts::{TemplateResolver, TemplateStore};

/// Stages of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ResolvingPrompt,
    Invoking,
    StreamingInsertion,
    SingleInsertion,
    Done,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// "Generate Text": the filled template alone.
    Text { stream: bool },
    /// "Generate Text with File": the note's `url` attachment plus the
    /// filled template. Never streamed.
    WithFile,
}

impl GenerationMode {
    pub fn is_streaming(self) -> bool {
        matches!(self, GenerationMode::Text { stream: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub template: String,
    pub mode: GenerationMode,
}

impl Invocation {
    pub fn new(template: impl Into<String>, mode: GenerationMode) -> Self {
        Self {
            template: template.into(),
            mode,
        }
    }
}

/// Summary of a run that reached [`RunState::Done`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Where the cursor was when the run started.
    pub start: Position,
    /// The anchor after the last insert.
    pub end: Position,
    pub fragments: usize,
    pub inserted_chars: usize,
    pub trace: Vec<RunState>,
}

struct Insertion {
    start: Position,
    end: Position,
    fragments: usize,
    chars: usize,
}

struct Run {
    id: Uuid,
    trace: Vec<RunState>,
    progress_shown: bool,
}

impl Run {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            trace: vec![RunState::Idle],
            progress_shown: false,
        }
    }

    fn state(&self) -> RunState {
        self.trace.last().copied().unwrap_or(RunState::Idle)
    }

    fn enter(&mut self, next: RunState) {
        debug!("run {}: {:?} -> {:?}", self.id, self.state(), next);
        self.trace.push(next);
    }
}

/// Runs the generate pipeline against injected collaborators.
///
/// Runs on one orchestrator are serialized: a second run waits until the
/// first one has finished inserting.
pub struct Orchestrator {
    resolver: TemplateResolver,
    client: Arc<dyn ModelClient>,
    notifier: Arc<dyn Notifier>,
    run_lock: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        client: Arc<dyn ModelClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver: TemplateResolver::new(store),
            client,
            notifier,
            run_lock: Mutex::new(()),
        }
    }

    /// Template names for the picker; a missing folder yields a notice and
    /// no names.
    pub fn list_templates(&self, settings: &Settings) -> Vec<String> {
        self.resolver
            .list_or_notify(&settings.prompt_folder, self.notifier.as_ref())
    }

    /// Generates text for `invocation` and inserts it into `sink` at the
    /// sink's cursor as of the start of the run.
    ///
    /// Any failure is reported through the notifier before it is returned.
    pub async fn run(
        &self,
        settings: &Settings,
        invocation: &Invocation,
        document: Option<&DocumentContext>,
        sink: Option<&mut dyn TextSink>,
    ) -> Result<RunReport, PipelineError> {
        let _guard = self.run_lock.lock().await;

        let mut run = Run::new();
        info!(
            "run {}: template '{}' ({:?})",
            run.id, invocation.template, invocation.mode
        );

        let result = self
            .execute(&mut run, settings, invocation, document, sink)
            .await;

        if run.progress_shown {
            self.notifier.end_progress();
        }

        match result {
            Ok(insertion) => {
                run.enter(RunState::Done);
                info!(
                    "run {}: inserted {} chars in {} fragments",
                    run.id, insertion.chars, insertion.fragments
                );
                Ok(RunReport {
                    run_id: run.id,
                    start: insertion.start,
                    end: insertion.end,
                    fragments: insertion.fragments,
                    inserted_chars: insertion.chars,
                    trace: run.trace,
                })
            }
            Err(e) => {
                warn!("run {}: aborted during {:?}: {e}", run.id, run.state());
                run.enter(RunState::Aborted);
                self.notifier.notice(&e.to_string());
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run: &mut Run,
        settings: &Settings,
        invocation: &Invocation,
        document: Option<&DocumentContext>,
        sink: Option<&mut dyn TextSink>,
    ) -> Result<Insertion, PipelineError> {
        run.enter(RunState::ResolvingPrompt);
        let text = self
            .resolver
            .resolve(&settings.prompt_folder, &invocation.template, document)?;

        let prompt = match invocation.mode {
            GenerationMode::Text { .. } => Prompt::Text(text),
            GenerationMode::WithFile => Prompt::WithAttachment {
                url: attachment_url(document)?,
                text,
            },
        };

        let sink = sink.ok_or(PipelineError::NoActiveView)?;
        let start = sink.cursor();
        let mut anchor = start;

        run.enter(RunState::Invoking);
        let streaming = invocation.mode.is_streaming();
        if !streaming {
            self.notifier.begin_progress("Generating text...");
            run.progress_shown = true;
        }

        let request = ModelRequest::new(settings.model_name.clone(), prompt);
        let mut fragments = response_fragments(self.client.as_ref(), &request, streaming).await?;

        run.enter(if streaming {
            RunState::StreamingInsertion
        } else {
            RunState::SingleInsertion
        });

        let mut count = 0;
        let mut chars = 0;
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            let len = fragment.chars().count();

            sink.insert_at(&fragment, anchor);
            anchor.column += len;

            count += 1;
            chars += len;
        }

        Ok(Insertion {
            start,
            end: anchor,
            fragments: count,
            chars,
        })
    }
}

fn attachment_url(document: Option<&DocumentContext>) -> Result<Url, PipelineError> {
    let document = document.ok_or(PipelineError::NoActiveDocument)?;
    let raw = document.front_matter.url().ok_or_else(|| {
        PipelineError::AttachmentUnavailable("note has no 'url' front-matter field".to_string())
    })?;

    Url::parse(raw)
        .map_err(|e| PipelineError::AttachmentUnavailable(format!("invalid url '{raw}': {e}")))
}
