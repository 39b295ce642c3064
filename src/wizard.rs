//! The wizard: one object holding every stage's dependencies.
//!
//! The HTTP handlers and the CLI both go through [`Wizard`]. It owns nothing
//! mutable; each call borrows the shared HTTP client, model and renderer, so
//! one instance behind an `Arc` serves any number of concurrent requests.

use crate::config::WizardConfig;
use crate::error::WizardError;
use crate::llm::{resolve_chat_model, ChatModel};
use crate::pipeline::compose::{self, ComposeRequest};
use crate::pipeline::extract::{self, ExtractRequest};
use crate::pipeline::pdf::{ChromiumEngine, PdfEngine};
use crate::pipeline::render::{AssembledDocument, DocumentRenderer, RenderRequest};
use crate::pipeline::review::{self, ReviewRequest};
use crate::pipeline::text::TitleCleaner;
use crate::types::{Draft, ExtractedData, RenderedPdf, ReviewReport};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

enum ModelSlot {
    Ready(Arc<dyn ChatModel>),
    Missing { what: String, hint: String },
}

/// Options for [`Wizard::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub template_type: Option<String>,
    pub language: Option<String>,
    /// Also run the compliance review.
    pub review: bool,
}

/// Everything [`Wizard::run`] produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: ExtractedData,
    pub draft: Draft,
    pub review: Option<ReviewReport>,
    pub pdf: RenderedPdf,
}

pub struct Wizard {
    config: WizardConfig,
    http: reqwest::Client,
    model: ModelSlot,
    titles: TitleCleaner,
    renderer: DocumentRenderer,
    pdf: Arc<dyn PdfEngine>,
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("config", &self.config)
            .field("model_ready", &matches!(self.model, ModelSlot::Ready(_)))
            .finish_non_exhaustive()
    }
}

impl Wizard {
    /// Build a wizard with the configured LLM provider and headless Chromium.
    ///
    /// An unresolvable provider is not fatal: extraction and rendering keep
    /// working, and compose/review report `UpstreamUnavailable`.
    pub fn from_config(config: WizardConfig) -> Result<Self, WizardError> {
        let model = match resolve_chat_model(&config) {
            Ok(model) => {
                info!("LLM ready: {}", config.model_id());
                ModelSlot::Ready(model)
            }
            Err(e) => {
                warn!("LLM provider unavailable, compose/review will fail: {}", e);
                model_missing(e)
            }
        };
        let pdf = Arc::new(ChromiumEngine::new(config.chrome_executable.clone()));
        Self::assemble_parts(config, model, pdf)
    }

    /// Build a wizard from explicit parts. `model: None` behaves like a
    /// missing credential.
    pub fn with_parts(
        config: WizardConfig,
        model: Option<Arc<dyn ChatModel>>,
        pdf: Arc<dyn PdfEngine>,
    ) -> Result<Self, WizardError> {
        let slot = match model {
            Some(m) => ModelSlot::Ready(m),
            None => ModelSlot::Missing {
                what: "LLM provider".to_string(),
                hint: "No chat model was configured; set OPENAI_API_KEY or EDGEQUAKE_LLM_PROVIDER."
                    .to_string(),
            },
        };
        Self::assemble_parts(config, slot, pdf)
    }

    fn assemble_parts(
        config: WizardConfig,
        model: ModelSlot,
        pdf: Arc<dyn PdfEngine>,
    ) -> Result<Self, WizardError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| WizardError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            titles: TitleCleaner::new(&config.brand_name),
            renderer: DocumentRenderer::new(
                &config.template_path,
                &config.logo_path,
                &config.brand_name,
            ),
            config,
            http,
            model,
            pdf,
        })
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    fn model(&self) -> Result<&dyn ChatModel, WizardError> {
        match self.model {
            ModelSlot::Ready(ref m) => Ok(m.as_ref()),
            ModelSlot::Missing { ref what, ref hint } => Err(WizardError::UpstreamUnavailable {
                what: what.clone(),
                hint: hint.clone(),
            }),
        }
    }

    /// Fetch structured course facts for a URL.
    pub async fn extract(&self, req: &ExtractRequest) -> Result<ExtractedData, WizardError> {
        extract::extract(&self.http, &self.config.extractor_url, req).await
    }

    /// Draft a whitepaper from extracted facts.
    pub async fn compose(&self, req: &ComposeRequest) -> Result<Draft, WizardError> {
        let model = self.model()?;
        compose::compose(model, &self.titles, req, self.config.draft_max_tokens).await
    }

    /// Critique a draft without rewriting it.
    pub async fn review(&self, req: &ReviewRequest) -> Result<ReviewReport, WizardError> {
        let model = self.model()?;
        review::review(model, req, self.config.review_max_tokens).await
    }

    /// Build the HTML document without printing it.
    pub fn assemble(&self, req: &RenderRequest) -> Result<AssembledDocument, WizardError> {
        self.renderer.assemble(req)
    }

    /// Render a draft to a PDF.
    pub async fn render(&self, req: &RenderRequest) -> Result<RenderedPdf, WizardError> {
        let doc = self.renderer.assemble(req)?;
        let bytes = self.pdf.html_to_pdf(&doc.html).await?;
        Ok(RenderedPdf {
            bytes,
            filename: doc.filename,
        })
    }

    /// Render a draft and write the PDF into `dir` under its suggested name.
    pub async fn render_to_dir(
        &self,
        req: &RenderRequest,
        dir: impl AsRef<Path>,
    ) -> Result<std::path::PathBuf, WizardError> {
        let pdf = self.render(req).await?;
        let path = dir.as_ref().join(&pdf.filename);
        tokio::fs::write(&path, &pdf.bytes)
            .await
            .map_err(|e| WizardError::Internal(format!("Writing {}: {e}", path.display())))?;
        info!("Wrote {} ({} bytes)", path.display(), pdf.bytes.len());
        Ok(path)
    }

    /// Extract → compose → (review) → render for one course page.
    pub async fn run(&self, url: &str, opts: &RunOptions) -> Result<RunOutput, WizardError> {
        let start = Instant::now();
        let data = self.extract(&ExtractRequest::for_url(url)).await?;

        let draft = self
            .compose(&ComposeRequest {
                extracted_data: Some(data.clone()),
                template_type: opts.template_type.clone(),
                language: opts.language.clone(),
            })
            .await?;

        let review = if opts.review {
            let facts = serde_json::to_value(&data)
                .map_err(|e| WizardError::Internal(format!("Could not serialise extracted data: {e}")))?;
            Some(
                self.review(&ReviewRequest {
                    markdown: draft.markdown.clone(),
                    extracted_json: Some(facts),
                })
                .await?,
            )
        } else {
            None
        };

        let pdf = self
            .render(&RenderRequest {
                markdown: draft.markdown.clone(),
                course_name: data.title.clone(),
                title: None,
                template_type: Some(
                    opts.template_type
                        .clone()
                        .unwrap_or_else(|| compose::DEFAULT_COMPOSE_TEMPLATE.to_string()),
                ),
                language: opts.language.clone(),
            })
            .await?;

        info!("Wizard finished for {} in {:?}", url, start.elapsed());
        Ok(RunOutput {
            data,
            draft,
            review,
            pdf,
        })
    }
}

fn model_missing(e: WizardError) -> ModelSlot {
    match e {
        WizardError::UpstreamUnavailable { what, hint } => ModelSlot::Missing { what, hint },
        other => ModelSlot::Missing {
            what: "LLM provider".to_string(),
            hint: other.to_string(),
        },
    }
}
