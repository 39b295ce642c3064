//! Configuration types for the whitepaper wizard.
//!
//! All process-level knobs live in [`WizardConfig`], built via its
//! [`WizardConfigBuilder`] or read from the environment with
//! [`WizardConfig::from_env`]. Per-request choices (template type, language)
//! are the small enums at the bottom of this file.

use crate::error::WizardError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default base URL of the extraction backend.
pub const DEFAULT_EXTRACTOR_URL: &str = "http://127.0.0.1:8000";

/// Default chat model for drafting and reviewing.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Organization whose name is stripped from course titles.
pub const DEFAULT_BRAND: &str = "Lindenhaeghe";

/// Configuration for the wizard service, CLI and library entry points.
///
/// # Example
/// ```rust
/// use whitepaper_factory::WizardConfig;
///
/// let config = WizardConfig::builder()
///     .extractor_url("http://localhost:8000")
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.draft_max_tokens, 4000);
/// ```
#[derive(Clone)]
pub struct WizardConfig {
    /// Base URL of the extraction service; `/extract` is appended.
    pub extractor_url: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Response budget for the drafting call. Default: 4000.
    pub draft_max_tokens: usize,

    /// Response budget for the review call. Default: 1000.
    pub review_max_tokens: usize,

    /// Sampling temperature. None leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Organization name stripped from titles and used as the logo alt text.
    pub brand_name: String,

    /// HTML template with `{{PLACEHOLDER}}` tokens.
    pub template_path: PathBuf,

    /// Logo image inlined into the cover. Missing file means no logo.
    pub logo_path: PathBuf,

    /// Socket address for `whitepaper serve`.
    pub bind_addr: String,

    /// Chrome/Chromium binary. None lets the browser crate find one.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            extractor_url: DEFAULT_EXTRACTOR_URL.to_string(),
            provider_name: None,
            model: None,
            provider: None,
            draft_max_tokens: 4000,
            review_max_tokens: 1000,
            temperature: None,
            brand_name: DEFAULT_BRAND.to_string(),
            template_path: PathBuf::from("assets/whitepaper-template.html"),
            logo_path: PathBuf::from("assets/logo.svg"),
            bind_addr: "127.0.0.1:3000".to_string(),
            chrome_executable: None,
        }
    }
}

impl fmt::Debug for WizardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardConfig")
            .field("extractor_url", &self.extractor_url)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("draft_max_tokens", &self.draft_max_tokens)
            .field("review_max_tokens", &self.review_max_tokens)
            .field("temperature", &self.temperature)
            .field("brand_name", &self.brand_name)
            .field("template_path", &self.template_path)
            .field("logo_path", &self.logo_path)
            .field("bind_addr", &self.bind_addr)
            .field("chrome_executable", &self.chrome_executable)
            .finish()
    }
}

impl WizardConfig {
    /// Create a new builder for `WizardConfig`.
    pub fn builder() -> WizardConfigBuilder {
        WizardConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from `WHITEPAPER_*` / `EDGEQUAKE_*` variables.
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, WizardError> {
        let mut builder = Self::builder();
        if let Some(url) = env_var("WHITEPAPER_EXTRACTOR_URL") {
            builder = builder.extractor_url(url);
        }
        if let Some(name) = env_var("EDGEQUAKE_LLM_PROVIDER") {
            builder = builder.provider_name(name);
        }
        if let Some(model) = env_var("EDGEQUAKE_MODEL") {
            builder = builder.model(model);
        }
        if let Some(brand) = env_var("WHITEPAPER_BRAND") {
            builder = builder.brand_name(brand);
        }
        if let Some(path) = env_var("WHITEPAPER_TEMPLATE") {
            builder = builder.template_path(path);
        }
        if let Some(path) = env_var("WHITEPAPER_LOGO") {
            builder = builder.logo_path(path);
        }
        if let Some(addr) = env_var("WHITEPAPER_BIND") {
            builder = builder.bind_addr(addr);
        }
        if let Some(chrome) = env_var("WHITEPAPER_CHROME") {
            builder = builder.chrome_executable(chrome);
        }
        builder.build()
    }

    /// Reopen this configuration for changes, e.g. CLI flags over env values.
    pub fn into_builder(self) -> WizardConfigBuilder {
        WizardConfigBuilder { config: self }
    }

    /// Model id used for both LLM calls.
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`WizardConfig`].
#[derive(Debug)]
pub struct WizardConfigBuilder {
    config: WizardConfig,
}

impl WizardConfigBuilder {
    pub fn extractor_url(mut self, url: impl Into<String>) -> Self {
        self.config.extractor_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn draft_max_tokens(mut self, n: usize) -> Self {
        self.config.draft_max_tokens = n;
        self
    }

    pub fn review_max_tokens(mut self, n: usize) -> Self {
        self.config.review_max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn brand_name(mut self, brand: impl Into<String>) -> Self {
        self.config.brand_name = brand.into().trim().to_string();
        self
    }

    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template_path = path.into();
        self
    }

    pub fn logo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.logo_path = path.into();
        self
    }

    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WizardConfig, WizardError> {
        let c = &self.config;
        if !(c.extractor_url.starts_with("http://") || c.extractor_url.starts_with("https://")) {
            return Err(WizardError::InvalidConfig(format!(
                "extractor URL must be http(s), got '{}'",
                c.extractor_url
            )));
        }
        if c.draft_max_tokens == 0 || c.review_max_tokens == 0 {
            return Err(WizardError::InvalidConfig(
                "token budgets must be ≥ 1".into(),
            ));
        }
        if c.brand_name.is_empty() {
            return Err(WizardError::InvalidConfig("brand name must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The fixed output formats the wizard can draft and render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateType {
    /// Short download-for-email piece. (default)
    #[default]
    LeadMagnet,
    /// Longer piece walking through one course in detail.
    ProductDeepDive,
    /// Explains a change or regulation update.
    UpdateExplainer,
}

/// Length targets for one template type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateBudget {
    pub pages: u32,
    pub word_budget: u32,
}

/// Budget used for template strings that are not a known [`TemplateType`].
pub const FALLBACK_BUDGET: TemplateBudget = TemplateBudget {
    pages: 3,
    word_budget: 900,
};

const TEMPLATE_TABLE: &[(TemplateType, &str, TemplateBudget, &str)] = &[
    (
        TemplateType::LeadMagnet,
        "lead-magnet",
        TemplateBudget { pages: 2, word_budget: 600 },
        "Lead magnet (2 pages)",
    ),
    (
        TemplateType::ProductDeepDive,
        "product-deep-dive",
        TemplateBudget { pages: 4, word_budget: 1200 },
        "Product deep-dive (4 pages)",
    ),
    (
        TemplateType::UpdateExplainer,
        "update-explainer",
        TemplateBudget { pages: 3, word_budget: 900 },
        "Update / regulation explainer (3 pages)",
    ),
];

impl TemplateType {
    /// Parse the wire name (`lead-magnet`, …). Unknown names return None.
    pub fn parse(s: &str) -> Option<Self> {
        TEMPLATE_TABLE
            .iter()
            .find(|(_, id, _, _)| *id == s.trim())
            .map(|(t, _, _, _)| *t)
    }

    fn row(self) -> &'static (TemplateType, &'static str, TemplateBudget, &'static str) {
        TEMPLATE_TABLE
            .iter()
            .find(|(t, _, _, _)| *t == self)
            .unwrap_or(&TEMPLATE_TABLE[0])
    }

    pub fn as_str(self) -> &'static str {
        self.row().1
    }

    pub fn budget(self) -> TemplateBudget {
        self.row().2
    }

    /// Human-readable label shown on the PDF cover.
    pub fn label(self) -> &'static str {
        self.row().3
    }

    /// Budget for a raw template string, falling back to [`FALLBACK_BUDGET`].
    pub fn budget_for(raw: &str) -> TemplateBudget {
        Self::parse(raw).map(Self::budget).unwrap_or(FALLBACK_BUDGET)
    }

    /// Cover label for a raw template string; unknown strings label themselves.
    pub fn label_for(raw: &str) -> String {
        Self::parse(raw)
            .map(|t| t.label().to_string())
            .unwrap_or_else(|| raw.to_string())
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output language of the drafted and rendered whitepaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Dutch. (default)
    #[default]
    Nl,
    /// English.
    En,
}

impl Language {
    /// `"en"` selects English; anything else, including None, is Dutch.
    pub fn from_param(s: Option<&str>) -> Self {
        match s {
            Some("en") => Language::En,
            _ => Language::Nl,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Nl => "nl",
            Language::En => "en",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = WizardConfig::default();
        assert_eq!(c.extractor_url, DEFAULT_EXTRACTOR_URL);
        assert_eq!(c.draft_max_tokens, 4000);
        assert_eq!(c.review_max_tokens, 1000);
        assert_eq!(c.model_id(), DEFAULT_MODEL);
        assert_eq!(c.brand_name, "Lindenhaeghe");
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let c = WizardConfig::builder()
            .extractor_url("http://extract.local:9000/ ")
            .build()
            .unwrap();
        assert_eq!(c.extractor_url, "http://extract.local:9000");
    }

    #[test]
    fn builder_rejects_non_http_extractor() {
        let err = WizardConfig::builder()
            .extractor_url("ftp://nope")
            .build()
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_budget() {
        assert!(WizardConfig::builder().review_max_tokens(0).build().is_err());
    }

    #[test]
    fn template_budgets() {
        assert_eq!(TemplateType::budget_for("lead-magnet").pages, 2);
        assert_eq!(TemplateType::budget_for("lead-magnet").word_budget, 600);
        assert_eq!(TemplateType::budget_for("product-deep-dive").word_budget, 1200);
        assert_eq!(TemplateType::budget_for("update-explainer").pages, 3);
        assert_eq!(TemplateType::budget_for("something-else"), FALLBACK_BUDGET);
    }

    #[test]
    fn template_labels() {
        assert_eq!(TemplateType::label_for("lead-magnet"), "Lead magnet (2 pages)");
        assert_eq!(TemplateType::label_for("whitepaper"), "whitepaper");
    }

    #[test]
    fn template_type_serde_is_kebab_case() {
        let json = serde_json::to_string(&TemplateType::ProductDeepDive).unwrap();
        assert_eq!(json, "\"product-deep-dive\"");
    }

    #[test]
    fn language_normalisation() {
        assert_eq!(Language::from_param(Some("en")), Language::En);
        assert_eq!(Language::from_param(Some("nl")), Language::Nl);
        assert_eq!(Language::from_param(Some("de")), Language::Nl);
        assert_eq!(Language::from_param(None), Language::Nl);
    }
}
