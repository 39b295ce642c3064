//! HTML → PDF printing through headless Chromium.
//!
//! Each call launches a fresh browser, prints one A4 document and shuts the
//! browser down again, on the error path too. Nothing is shared between
//! requests, so concurrent renders never see each other's pages.

use crate::error::WizardError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A4 in inches.
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;

/// 20 mm page margin on every side.
const MARGIN_IN: f64 = 0.7874;

/// Turns a complete HTML document into PDF bytes.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn html_to_pdf(&self, html: &str) -> Result<Vec<u8>, WizardError>;
}

/// [`PdfEngine`] backed by a headless Chrome/Chromium launched per call.
#[derive(Debug, Clone, Default)]
pub struct ChromiumEngine {
    executable: Option<PathBuf>,
}

impl ChromiumEngine {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn browser_config(&self) -> Result<BrowserConfig, WizardError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");
        if let Some(ref exe) = self.executable {
            builder = builder.chrome_executable(exe);
        }
        builder
            .build()
            .map_err(|e| WizardError::RenderFailure(format!("Browser configuration failed: {e}")))
    }

    fn print_params() -> PrintToPdfParams {
        PrintToPdfParams {
            print_background: Some(true),
            paper_width: Some(A4_WIDTH_IN),
            paper_height: Some(A4_HEIGHT_IN),
            margin_top: Some(MARGIN_IN),
            margin_bottom: Some(MARGIN_IN),
            margin_left: Some(MARGIN_IN),
            margin_right: Some(MARGIN_IN),
            ..Default::default()
        }
    }
}

async fn print_page(browser: &Browser, html: &str) -> Result<Vec<u8>, WizardError> {
    let fail = |step: &str, e: chromiumoxide::error::CdpError| {
        WizardError::RenderFailure(format!("PDF generation failed while {step}: {e}"))
    };

    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| fail("opening a page", e))?;
    page.set_content(html)
        .await
        .map_err(|e| fail("loading the document", e))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| fail("waiting for the document", e))?;
    page.pdf(ChromiumEngine::print_params())
        .await
        .map_err(|e| fail("printing", e))
}

#[async_trait]
impl PdfEngine for ChromiumEngine {
    async fn html_to_pdf(&self, html: &str) -> Result<Vec<u8>, WizardError> {
        let start = Instant::now();
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| WizardError::RenderFailure(format!("Could not launch browser: {e}")))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = print_page(&browser, html).await;

        if let Err(e) = browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        if let Err(e) = browser.wait().await {
            debug!("Waiting for browser exit failed: {}", e);
        }
        events.abort();

        let bytes = result?;
        info!(
            "Printed PDF: {} bytes from {} bytes of HTML in {:?}",
            bytes.len(),
            html.len(),
            start.elapsed()
        );
        Ok(bytes)
    }
}
