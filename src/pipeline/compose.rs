//! Draft composition: extracted facts → Markdown whitepaper.

use crate::config::Language;
use crate::error::WizardError;
use crate::llm::ChatModel;
use crate::pipeline::postprocess::{clean_draft, first_line};
use crate::pipeline::sections::CanonicalSection;
use crate::pipeline::text::{TitleCleaner, FALLBACK_TITLE};
use crate::prompts::{draft_system_prompt, draft_user_message};
use crate::types::{Draft, ExtractedData, LayoutSection, LayoutSpec};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Template id used when a compose request names none.
pub const DEFAULT_COMPOSE_TEMPLATE: &str = "lead-magnet";

/// Body of a compose request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    #[serde(default)]
    pub extracted_data: Option<ExtractedData>,
    #[serde(default)]
    pub template_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl ComposeRequest {
    pub fn template_type(&self) -> &str {
        self.template_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_COMPOSE_TEMPLATE)
    }
}

/// The advisory layout returned next to every draft.
///
/// Identical for all template types and never compared with the Markdown.
pub fn layout_spec() -> LayoutSpec {
    let sections = CanonicalSection::ALL
        .iter()
        .map(|&section| {
            let id = section.id();
            LayoutSection {
                id: id.to_string(),
                title: title_case(&id.replace('-', " ")),
                recommended_imagery: match section {
                    CanonicalSection::Cover => "Hero image or course visual",
                    _ => "Supporting graphic or icon",
                }
                .to_string(),
                icon_suggestion: match section {
                    CanonicalSection::Problem => "lightbulb",
                    CanonicalSection::Solution => "check-circle",
                    _ => "file-text",
                }
                .to_string(),
                callout: (section == CanonicalSection::Cta)
                    .then(|| "Primary CTA button or form".to_string()),
            }
        })
        .collect();

    LayoutSpec {
        section_order: CanonicalSection::ALL.iter().map(|s| s.id().to_string()).collect(),
        sections,
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ask the model for a draft and clean up its reply.
pub async fn compose(
    model: &dyn ChatModel,
    titles: &TitleCleaner,
    req: &ComposeRequest,
    max_tokens: usize,
) -> Result<Draft, WizardError> {
    let data = match req.extracted_data {
        Some(ref d) if !d.source_url.trim().is_empty() => d,
        _ => return Err(WizardError::invalid_input("extractedData is required")),
    };
    let template_type = req.template_type();
    let language = Language::from_param(req.language.as_deref());

    let raw_title = data
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(FALLBACK_TITLE);
    let cover_title = titles.course_title(raw_title);

    let system = draft_system_prompt(template_type, language);
    let user = draft_user_message(data, template_type, &cover_title)
        .map_err(|e| WizardError::Internal(format!("Could not serialise extracted data: {e}")))?;
    debug!(
        "Draft prompt: {} system chars, {} user chars",
        system.len(),
        user.len()
    );

    info!(
        "Composing '{}' ({}, {}) from {}",
        cover_title,
        template_type,
        language.as_str(),
        data.source_url
    );
    let start = Instant::now();
    let reply = model.complete(&system, &user, max_tokens).await?;
    let markdown = clean_draft(reply.trim());

    let title_matches = first_line(&markdown) == cover_title;
    if !title_matches {
        warn!(
            "Draft first line {:?} does not match requested cover title {:?}",
            first_line(&markdown),
            cover_title
        );
    }
    info!(
        "Draft ready: {} chars in {:?}",
        markdown.len(),
        start.elapsed()
    );

    Ok(Draft {
        markdown,
        layout_spec: layout_spec(),
        title_matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: String,
        seen: Mutex<Vec<(String, String, usize)>>,
    }

    impl Canned {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for Canned {
        async fn complete(&self, system: &str, user: &str, max_tokens: usize) -> Result<String, WizardError> {
            self.seen
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string(), max_tokens));
            Ok(self.reply.clone())
        }
    }

    fn data(title: Option<&str>) -> ExtractedData {
        ExtractedData {
            source_url: "https://www.lindenhaeghe.nl/bhv".into(),
            title: title.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn layout_spec_is_fixed() {
        let spec = layout_spec();
        assert_eq!(
            spec.section_order,
            vec!["cover", "problem", "solution", "what-you-get", "faq", "cta"]
        );
        assert_eq!(spec.sections[0].recommended_imagery, "Hero image or course visual");
        assert_eq!(spec.sections[1].icon_suggestion, "lightbulb");
        assert_eq!(spec.sections[2].icon_suggestion, "check-circle");
        assert_eq!(spec.sections[3].title, "What You Get");
        assert_eq!(spec.sections[3].icon_suggestion, "file-text");
        assert_eq!(spec.sections[5].callout.as_deref(), Some("Primary CTA button or form"));
        assert!(spec.sections[..5].iter().all(|s| s.callout.is_none()));
    }

    #[tokio::test]
    async fn compose_builds_prompt_and_cleans_reply() {
        let model = Canned::new("  ```markdown\nBHV Basis\nVeilig werken\n## Probleem\nTekst\n```  ");
        let titles = TitleCleaner::new("Lindenhaeghe");
        let req = ComposeRequest {
            extracted_data: Some(data(Some("BHV Basis | Lindenhaeghe"))),
            template_type: Some("product-deep-dive".into()),
            language: Some("en".into()),
        };
        let draft = compose(&model, &titles, &req, 4000).await.unwrap();
        assert_eq!(draft.markdown, "BHV Basis\nVeilig werken\n## Probleem\nTekst");
        assert!(draft.title_matches);

        let seen = model.seen.lock().unwrap();
        let (system, user, max) = &seen[0];
        assert!(system.contains("about 4 pages"));
        assert!(system.contains("in English"));
        assert!(user.ends_with("must be exactly: BHV Basis"));
        assert_eq!(*max, 4000);
    }

    #[tokio::test]
    async fn compose_defaults_and_mismatch() {
        let model = Canned::new("Iets anders\nSub");
        let titles = TitleCleaner::new("Lindenhaeghe");
        let req = ComposeRequest {
            extracted_data: Some(data(None)),
            template_type: Some("  ".into()),
            language: Some("fr".into()),
        };
        let draft = compose(&model, &titles, &req, 10).await.unwrap();
        assert!(!draft.title_matches);
        let seen = model.seen.lock().unwrap();
        assert!(seen[0].0.contains("Dutch (Nederlands)"));
        assert!(seen[0].0.contains("about 2 pages"));
        assert!(seen[0].1.contains("Template type: lead-magnet."));
        assert!(seen[0].1.ends_with("must be exactly: Whitepaper"));
    }

    #[tokio::test]
    async fn compose_requires_source_url() {
        let model = Canned::new("x");
        let titles = TitleCleaner::new("Lindenhaeghe");
        let missing = ComposeRequest::default();
        let err = compose(&model, &titles, &missing, 10).await.unwrap_err();
        assert_eq!(err.to_string(), "extractedData is required");

        let blank = ComposeRequest {
            extracted_data: Some(ExtractedData::default()),
            ..Default::default()
        };
        assert!(matches!(
            compose(&model, &titles, &blank, 10).await,
            Err(WizardError::InvalidInput(_))
        ));
        assert!(model.seen.lock().unwrap().is_empty());
    }
}
