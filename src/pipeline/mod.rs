//! Pipeline stages for turning a course page into a whitepaper PDF.
//!
//! Each submodule is one step; the [`crate::Wizard`] facade wires them
//! together with the shared HTTP client, chat model and renderer.
//!
//! ## Data Flow
//!
//! ```text
//! URL ──▶ extract ──▶ compose ──▶ (review) ──▶ render ──▶ pdf
//!        (service)    (LLM)        (LLM)      (HTML)    (Chromium)
//! ```
//!
//! 1. [`extract`]  forward the URL to the extraction service
//! 2. [`compose`]  one LLM call drafts Markdown; [`postprocess`] cleans it
//! 3. [`review`]   optional compliance critique of the draft
//! 4. [`render`]   split the Markdown into [`sections`], convert and fill
//!    the HTML template
//! 5. [`pdf`]      print the HTML to A4 in a headless browser
//!
//! [`text`] holds the title, emoji and file-name helpers shared by stages.

pub mod compose;
pub mod extract;
pub mod pdf;
pub mod postprocess;
pub mod render;
pub mod review;
pub mod sections;
pub mod text;
