//! System prompts for drafting and reviewing whitepapers.
//!
//! Every instruction sent to the model lives here so the wording can change
//! without touching request handling, and so tests can inspect the exact
//! text without a live model.

use crate::config::{Language, TemplateType};
use crate::types::ExtractedData;

/// System prompt for the compliance review pass.
///
/// The reviewer critiques only; it must never return rewritten content.
pub const REVIEW_SYSTEM_PROMPT: &str = r#"You are a compliance and quality reviewer for marketing whitepapers. Review the provided whitepaper content and produce a short report. Do NOT rewrite the content.

Your report must include:
1. **Unsupported claims**: List any claims that are not clearly backed by the source data or that could be misleading.
2. **Tone / brand**: Note if the tone is consistent and professional; flag any off-brand or risky language.
3. **Suggestions**: Concrete improvement suggestions (e.g. "Add a disclaimer under the pricing section"). Never auto-rewrite; only suggest.

Format the report in clear sections. Be concise. If nothing major is wrong, say so."#;

/// Returned when the reviewer answers with empty content.
pub const EMPTY_REVIEW_PLACEHOLDER: &str = "No report generated.";

/// Build the drafting system prompt for a template and language.
///
/// Fixes the section order, forbids invented facts and emoji, and pins the
/// first two lines of the document to title and subtitle.
pub fn draft_system_prompt(template_type: &str, language: Language) -> String {
    let budget = TemplateType::budget_for(template_type);
    let lang_instruction = match language {
        Language::En => "Write the entire whitepaper in English.",
        Language::Nl => "Write the entire whitepaper in Dutch (Nederlands).",
    };
    format!(
        "You are a marketing copywriter. Generate whitepaper content in Markdown using ONLY the \
provided extracted course data. Do not invent facts. Do not use emojis. {lang_instruction} \
Use these sections in order: cover (title + one-line subtitle), problem, solution, what-you-get, \
faq, cta. For the cover: the FIRST line must be exactly the course title (short, no repetition). \
The SECOND line must be one short subtitle only. Do not repeat the same phrase or idea in both \
lines. Keep total length suitable for about {pages} pages (roughly {words} words). Write in a \
professional, compliant tone.",
        pages = budget.pages,
        words = budget.word_budget,
    )
}

/// Build the drafting user message: the facts plus the required first line.
pub fn draft_user_message(
    data: &ExtractedData,
    template_type: &str,
    cover_title: &str,
) -> Result<String, serde_json::Error> {
    let facts = serde_json::to_string_pretty(data)?;
    Ok(format!(
        "Extracted data (use only this):\n{facts}\n\nTemplate type: {template_type}. Produce \
Markdown with headings ## for each section. The first line of the document (cover title) must \
be exactly: {cover_title}"
    ))
}

/// Build the review user message, appending the source facts when given.
pub fn review_user_message(markdown: &str, extracted_json: Option<&str>) -> String {
    let mut content = format!("Whitepaper content to review:\n\n{markdown}");
    if let Some(json) = extracted_json.filter(|j| !j.trim().is_empty()) {
        content.push_str("\n\nOriginal extracted data (for fact-checking):\n");
        content.push_str(json);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_prompt_carries_budget() {
        let p = draft_system_prompt("product-deep-dive", Language::En);
        assert!(p.contains("about 4 pages"));
        assert!(p.contains("roughly 1200 words"));
        assert!(p.contains("in English"));
    }

    #[test]
    fn draft_prompt_defaults_to_dutch() {
        let p = draft_system_prompt("lead-magnet", Language::Nl);
        assert!(p.contains("Dutch (Nederlands)"));
        assert!(p.contains("roughly 600 words"));
    }

    #[test]
    fn draft_prompt_fixes_order_and_bans_emoji() {
        let p = draft_system_prompt("update-explainer", Language::Nl);
        assert!(p.contains("cover (title + one-line subtitle), problem, solution, what-you-get, faq, cta"));
        assert!(p.contains("Do not use emojis"));
        assert!(p.contains("Do not invent facts"));
    }

    #[test]
    fn unknown_template_uses_fallback_budget() {
        let p = draft_system_prompt("brochure", Language::Nl);
        assert!(p.contains("about 3 pages"));
        assert!(p.contains("roughly 900 words"));
    }

    #[test]
    fn draft_user_message_pins_first_line() {
        let data = ExtractedData {
            source_url: "https://example.org/c".into(),
            ..Default::default()
        };
        let msg = draft_user_message(&data, "lead-magnet", "Basiscursus BHV").unwrap();
        assert!(msg.contains("\"sourceUrl\": \"https://example.org/c\""));
        assert!(msg.ends_with("must be exactly: Basiscursus BHV"));
    }

    #[test]
    fn review_message_with_and_without_facts() {
        let plain = review_user_message("# Doc", None);
        assert_eq!(plain, "Whitepaper content to review:\n\n# Doc");

        let with = review_user_message("# Doc", Some("{\"a\":1}"));
        assert!(with.ends_with("Original extracted data (for fact-checking):\n{\"a\":1}"));

        let blank = review_user_message("# Doc", Some("  "));
        assert_eq!(blank, plain);
    }

    #[test]
    fn review_prompt_forbids_rewriting() {
        assert!(REVIEW_SYSTEM_PROMPT.contains("Do NOT rewrite the content"));
        assert!(REVIEW_SYSTEM_PROMPT.contains("Unsupported claims"));
        assert!(REVIEW_SYSTEM_PROMPT.contains("Tone / brand"));
        assert!(REVIEW_SYSTEM_PROMPT.contains("Suggestions"));
    }
}
