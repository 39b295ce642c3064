//! # whitepaper-factory
//!
//! Turn a course page into a reviewed, branded whitepaper PDF.
//!
//! A marketer pastes a course URL; an external extraction service returns
//! structured facts; an LLM drafts a Markdown whitepaper from those facts
//! only; an optional second LLM pass critiques the draft for unsupported
//! claims; the draft is split into fixed sections, poured into an HTML
//! template and printed to PDF by headless Chromium.
//!
//! ## Pipeline Overview
//!
//! ```text
//! course URL
//!  │
//!  ├─ 1. Extract  POST {extractor}/extract → ExtractedData
//!  ├─ 2. Compose  one chat completion → Markdown + LayoutSpec
//!  ├─ 3. Review   optional chat completion → report (never a rewrite)
//!  ├─ 4. Render   sections → HTML template (cover, problem, solution,
//!  │              what-you-get, faq, cta, extras)
//!  └─ 5. Print    headless Chromium → A4 PDF + suggested file name
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whitepaper_factory::{RunOptions, Wizard, WizardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / EDGEQUAKE_LLM_PROVIDER
//!     let wizard = Wizard::from_config(WizardConfig::from_env()?)?;
//!     let out = wizard
//!         .run("https://example.org/course", &RunOptions::default())
//!         .await?;
//!     std::fs::write(&out.pdf.filename, &out.pdf.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `whitepaper` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod types;
pub mod wizard;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Language, TemplateType, WizardConfig, WizardConfigBuilder};
pub use error::WizardError;
pub use llm::{ChatModel, ProviderChatModel};
pub use pipeline::compose::{layout_spec, ComposeRequest};
pub use pipeline::extract::ExtractRequest;
pub use pipeline::pdf::{ChromiumEngine, PdfEngine};
pub use pipeline::render::{AssembledDocument, RenderRequest};
pub use pipeline::review::ReviewRequest;
pub use pipeline::sections::{parse_sections, CanonicalSection, ParsedSections};
pub use pipeline::text::sanitize_filename;
pub use types::{
    ContentSection, CourseFacts, Draft, ExtractedData, LayoutSection, LayoutSpec, RenderedPdf,
    ReviewReport,
};
pub use wizard::{RunOptions, RunOutput, Wizard};
