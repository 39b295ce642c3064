//! Data passed between the wizard stages.
//!
//! Field names are camelCase on the wire because the extraction service and
//! the browser UI both speak that dialect.

use serde::{Deserialize, Serialize};

/// Structured course facts returned by the extraction service.
///
/// Produced once per extraction and never mutated afterwards; the composer
/// consumes it and the reviewer may receive it as fact-checking context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub summary_bullets: Vec<String>,
    #[serde(default)]
    pub key_benefits: Vec<String>,
    #[serde(default)]
    pub content_sections: Vec<ContentSection>,
    #[serde(default)]
    pub facts: CourseFacts,
    #[serde(default)]
    pub disclaimers: Vec<String>,
}

/// One heading with its bullet points, as found on the course page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

/// Hard facts; every field is null when the page did not state it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFacts {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub study_load_hours: Option<f64>,
    #[serde(default)]
    pub availability_period: Option<String>,
    #[serde(default)]
    pub locations_count: Option<u32>,
}

/// Advisory layout hint returned next to a draft.
///
/// Derived from the template type alone; it is never checked against the
/// Markdown the model actually produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpec {
    pub section_order: Vec<String>,
    pub sections: Vec<LayoutSection>,
}

/// Layout hint for one canonical section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSection {
    pub id: String,
    pub title: String,
    pub recommended_imagery: String,
    pub icon_suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callout: Option<String>,
}

/// Result of the drafting stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub markdown: String,
    pub layout_spec: LayoutSpec,
    /// Whether the first non-blank line equals the requested cover title.
    #[serde(default)]
    pub title_matches: bool,
}

/// Result of the review stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub report: String,
}

/// A rendered whitepaper.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    /// Suggested download name, always ending in `.pdf`.
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_data_parses_service_payload() {
        let json = r#"{
            "sourceUrl": "https://example.org/course",
            "title": "Basiscursus | Lindenhaeghe",
            "label": "Lindenhaeghe",
            "summaryBullets": ["12 uur"],
            "keyBenefits": ["Certificaat"],
            "contentSections": [{"heading": "Inhoud", "bullets": ["a", "b"]}],
            "facts": {"price": 279.0, "studyLoadHours": 12, "availabilityPeriod": null, "locationsCount": null},
            "disclaimers": []
        }"#;
        let data: ExtractedData = serde_json::from_str(json).unwrap();
        assert_eq!(data.source_url, "https://example.org/course");
        assert_eq!(data.facts.price, Some(279.0));
        assert_eq!(data.facts.study_load_hours, Some(12.0));
        assert_eq!(data.content_sections[0].bullets.len(), 2);
    }

    #[test]
    fn extracted_data_tolerates_missing_fields() {
        let data: ExtractedData = serde_json::from_str(r#"{"sourceUrl": "x"}"#).unwrap();
        assert!(data.title.is_none());
        assert!(data.facts.price.is_none());
    }

    #[test]
    fn layout_section_omits_missing_callout() {
        let s = LayoutSection {
            id: "faq".into(),
            title: "Faq".into(),
            recommended_imagery: "Supporting graphic or icon".into(),
            icon_suggestion: "file-text".into(),
            callout: None,
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("callout"));
        assert!(json.contains("recommendedImagery"));
    }
}
