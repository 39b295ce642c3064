//! Assemble the whitepaper HTML from drafted Markdown.
//!
//! ## Steps
//!
//! 1. Strip emoji, then [`parse_sections`] into cover + named sections.
//! 2. Convert each canonical section body to HTML on its own and drop the
//!    body's first `<h1>`–`<h3>`; the template adds a localised heading.
//! 3. Omit sections with no visible text. The call-to-action always renders,
//!    falling back to a localised default sentence.
//! 4. Fill the template placeholders in a single pass, so inserted text is
//!    never scanned for placeholders again.
//!
//! Plain text (titles, headings, labels) is HTML-escaped; Markdown output
//! from pulldown-cmark is inserted as-is.

use crate::config::{Language, TemplateType};
use crate::error::WizardError;
use crate::pipeline::sections::{parse_sections, CanonicalSection, ParsedSections};
use crate::pipeline::text::{
    escape_html, sanitize_filename, strip_emoji, strip_emoji_keep_lines, TitleCleaner,
    FALLBACK_TITLE,
};
use base64::Engine as _;
use once_cell::sync::{Lazy, OnceCell};
use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Template id used when a render request names none.
pub const DEFAULT_RENDER_TEMPLATE: &str = "whitepaper";

/// Localised section headings and the default call-to-action.
#[derive(Debug, Clone, Copy)]
pub struct SectionLabels {
    pub problem: &'static str,
    pub solution: &'static str,
    pub what_you_get: &'static str,
    pub faq: &'static str,
    pub cta: &'static str,
    /// HTML used when the document has no call-to-action text.
    pub default_cta: &'static str,
}

const NL_LABELS: SectionLabels = SectionLabels {
    problem: "Probleem",
    solution: "Oplossing",
    what_you_get: "Wat krijg je",
    faq: "Veelgestelde vragen",
    cta: "Volgende stappen",
    default_cta: "<p>Neem contact op voor meer informatie over deze opleiding of bekijk het aanbod op de website.</p>",
};

const EN_LABELS: SectionLabels = SectionLabels {
    problem: "Problem",
    solution: "Solution",
    what_you_get: "What you get",
    faq: "FAQ",
    cta: "Next steps",
    default_cta: "<p>Contact us for more information about this course or view the offer on the website.</p>",
};

impl SectionLabels {
    pub fn for_language(language: Language) -> &'static SectionLabels {
        match language {
            Language::Nl => &NL_LABELS,
            Language::En => &EN_LABELS,
        }
    }

    fn heading(&self, section: CanonicalSection) -> &'static str {
        match section {
            CanonicalSection::Problem => self.problem,
            CanonicalSection::Solution => self.solution,
            CanonicalSection::WhatYouGet => self.what_you_get,
            CanonicalSection::Faq => self.faq,
            CanonicalSection::Cta => self.cta,
            CanonicalSection::Cover => "",
        }
    }
}

/// Body of a render request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub markdown: String,
    /// Preferred cover title.
    #[serde(default)]
    pub course_name: Option<String>,
    /// Used when `course_name` is absent.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Filled-in HTML plus the suggested PDF file name.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub html: String,
    pub filename: String,
    pub cover_title: String,
    pub cover_subtitle: String,
}

static RE_FIRST_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*<h[123](?:\s[^>]*)?>.*?</h[123]>").unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([A-Z_]+)\}\}").unwrap());

/// Convert Markdown to HTML (GFM tables, strikethrough, task lists).
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Remove a leading `<h1>`, `<h2>` or `<h3>` element.
pub fn strip_first_heading(html: &str) -> String {
    RE_FIRST_HEADING.replace(html, "").trim().to_string()
}

/// True when the HTML contains no visible text.
pub fn is_section_empty(html: &str) -> bool {
    RE_TAG.replace_all(html, "").trim().is_empty()
}

/// Replace every `{{NAME}}` whose name is in `values`; leave others intact.
pub fn fill_template(template: &str, values: &HashMap<&str, String>) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(v) => v.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Renders the fixed sections and extras of a parsed document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SectionHtml {
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub what_you_get: Option<String>,
    pub faq: Option<String>,
    pub cta: String,
    pub extras: String,
}

/// Turn parsed sections into the HTML blocks the template expects.
pub fn render_sections(parsed: &ParsedSections, labels: &SectionLabels) -> SectionHtml {
    let fixed = |section: CanonicalSection| -> Option<String> {
        let body = strip_first_heading(&markdown_to_html(parsed.body(section)));
        if is_section_empty(&body) {
            return None;
        }
        Some(format!(
            r#"<div id="{id}" class="section"><h2>{heading}</h2>{body}</div>"#,
            id = section.id(),
            heading = escape_html(labels.heading(section)),
        ))
    };

    let cta_raw = parsed.body(CanonicalSection::Cta).trim();
    let cta_body = if cta_raw.is_empty() {
        labels.default_cta.to_string()
    } else {
        strip_first_heading(&markdown_to_html(cta_raw))
    };
    let cta = format!(
        r#"<div id="cta" class="section cta"><h2>{}</h2>{}</div>"#,
        escape_html(labels.cta),
        cta_body
    );

    let extras = parsed
        .extras()
        .map(|s| {
            format!(
                r#"<div class="section"><h2>{}</h2>{}</div>"#,
                escape_html(&s.heading),
                markdown_to_html(&s.body)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    SectionHtml {
        problem: fixed(CanonicalSection::Problem),
        solution: fixed(CanonicalSection::Solution),
        what_you_get: fixed(CanonicalSection::WhatYouGet),
        faq: fixed(CanonicalSection::Faq),
        cta,
        extras,
    }
}

/// Loads the template and logo once and assembles documents from them.
#[derive(Debug)]
pub struct DocumentRenderer {
    template_path: PathBuf,
    logo_path: PathBuf,
    brand: String,
    titles: TitleCleaner,
    template: OnceCell<String>,
    logo_img: OnceCell<String>,
}

impl DocumentRenderer {
    pub fn new(template_path: impl Into<PathBuf>, logo_path: impl Into<PathBuf>, brand: &str) -> Self {
        Self {
            template_path: template_path.into(),
            logo_path: logo_path.into(),
            brand: brand.to_string(),
            titles: TitleCleaner::new(brand),
            template: OnceCell::new(),
            logo_img: OnceCell::new(),
        }
    }

    /// The HTML template, read on first use.
    ///
    /// A failed read is not cached; the next call tries again.
    pub fn template(&self) -> Result<&str, WizardError> {
        self.template
            .get_or_try_init(|| {
                std::fs::read_to_string(&self.template_path).map_err(|source| {
                    WizardError::TemplateMissing {
                        path: self.template_path.clone(),
                        source,
                    }
                })
            })
            .map(String::as_str)
    }

    /// `<img>` tag with the inlined logo, or empty when the logo is unreadable.
    pub fn logo_img(&self) -> &str {
        self.logo_img.get_or_init(|| match load_logo_data_uri(&self.logo_path) {
            Some(uri) => format!(
                r#"<img src="{}" alt="{}" class="cover-logo" />"#,
                uri,
                escape_html(&self.brand)
            ),
            None => String::new(),
        })
    }

    /// Build the full HTML document and file name for a render request.
    pub fn assemble(&self, req: &RenderRequest) -> Result<AssembledDocument, WizardError> {
        if req.markdown.trim().is_empty() {
            return Err(WizardError::invalid_input("markdown is required"));
        }

        let language = Language::from_param(req.language.as_deref());
        let labels = SectionLabels::for_language(language);

        let raw_course = [req.course_name.as_deref(), req.title.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(FALLBACK_TITLE);
        let course_name = {
            let cleaned = strip_emoji(&self.titles.strip_brand(raw_course));
            if cleaned.is_empty() {
                FALLBACK_TITLE.to_string()
            } else {
                cleaned
            }
        };

        let template_type = req
            .template_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_RENDER_TEMPLATE);
        let template_label = TemplateType::label_for(template_type);

        let parsed = parse_sections(&strip_emoji_keep_lines(&req.markdown));

        let cover_title = if course_name != FALLBACK_TITLE {
            course_name.clone()
        } else {
            let parsed_title = strip_emoji(&parsed.cover_title);
            if parsed_title.is_empty() {
                FALLBACK_TITLE.to_string()
            } else {
                parsed_title
            }
        };
        let cover_subtitle = if parsed.cover_subtitle.is_empty() {
            template_label
        } else {
            format!("{} · {}", template_label, parsed.cover_subtitle)
        };

        let sections = render_sections(&parsed, labels);

        let mut values: HashMap<&str, String> = HashMap::new();
        values.insert("LANG", language.as_str().to_string());
        values.insert("TITLE", escape_html(&cover_title));
        values.insert("COVER_TITLE", escape_html(&cover_title));
        values.insert("COVER_SUBTITLE", escape_html(&cover_subtitle));
        values.insert("LOGO_IMG", self.logo_img().to_string());
        values.insert("PROBLEM_SECTION", sections.problem.unwrap_or_default());
        values.insert("SOLUTION_SECTION", sections.solution.unwrap_or_default());
        values.insert("WHAT_YOU_GET_SECTION", sections.what_you_get.unwrap_or_default());
        values.insert("FAQ_SECTION", sections.faq.unwrap_or_default());
        values.insert("CTA_SECTION", sections.cta);
        values.insert("EXTRA_SECTIONS_HTML", sections.extras);

        let html = fill_template(self.template()?, &values);
        let filename = format!(
            "{}-{}.pdf",
            sanitize_filename(&course_name),
            sanitize_filename(template_type)
        );

        info!(
            "Assembled whitepaper '{}' ({}, {}): {} bytes of HTML",
            cover_title,
            template_type,
            language.as_str(),
            html.len()
        );

        Ok(AssembledDocument {
            html,
            filename,
            cover_title,
            cover_subtitle,
        })
    }
}

/// Read an image and encode it as a `data:` URI.
fn load_logo_data_uri(path: &Path) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!("Logo '{}' not readable, rendering without it: {}", path.display(), e);
            return None;
        }
    };
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/svg+xml",
    };
    debug!("Inlined logo {} ({} bytes, {})", path.display(), bytes.len(), mime);
    Some(format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEMPLATE: &str = r#"<html lang="{{LANG}}"><title>{{TITLE}}</title>
<div id="cover">{{LOGO_IMG}}<h1>{{COVER_TITLE}}</h1><p>{{COVER_SUBTITLE}}</p></div>
{{PROBLEM_SECTION}}{{SOLUTION_SECTION}}{{WHAT_YOU_GET_SECTION}}{{FAQ_SECTION}}{{CTA_SECTION}}
{{EXTRA_SECTIONS_HTML}}</html>"#;

    fn renderer_with(template: &str) -> (DocumentRenderer, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.html");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(template.as_bytes())
            .unwrap();
        let renderer = DocumentRenderer::new(&path, dir.path().join("no-logo.svg"), "Lindenhaeghe");
        (renderer, dir)
    }

    fn request(markdown: &str) -> RenderRequest {
        RenderRequest {
            markdown: markdown.to_string(),
            ..Default::default()
        }
    }

    fn div_ids(html: &str) -> Vec<String> {
        let re = Regex::new(r#"<div id="([^"]+)""#).unwrap();
        re.captures_iter(html).map(|c| c[1].to_string()).collect()
    }

    #[test]
    fn strip_first_heading_only_leading() {
        assert_eq!(strip_first_heading("<h2 class=\"x\">Dup</h2>\n<p>Body</p>"), "<p>Body</p>");
        assert_eq!(strip_first_heading("<p>Intro</p><h2>Later</h2>"), "<p>Intro</p><h2>Later</h2>");
        assert_eq!(strip_first_heading("<h4>Deep</h4><p>x</p>"), "<h4>Deep</h4><p>x</p>");
    }

    #[test]
    fn empty_detection() {
        assert!(is_section_empty(""));
        assert!(is_section_empty("<p> </p>\n<ul></ul>"));
        assert!(!is_section_empty("<p>x</p>"));
    }

    #[test]
    fn fill_template_is_single_pass() {
        let mut values = HashMap::new();
        values.insert("A", "{{B}}".to_string());
        values.insert("B", "b".to_string());
        assert_eq!(fill_template("{{A}}|{{B}}|{{C}}", &values), "{{B}}|b|{{C}}");
    }

    #[test]
    fn all_canonical_sections_in_order() {
        let (r, _dir) = renderer_with(TEMPLATE);
        let md = "Titel\nSub\n\n## Problem\nP\n\n## Solution\nS\n\n## What you get\nW\n\n## FAQ\nF\n\n## CTA\nC";
        let doc = r.assemble(&request(md)).unwrap();
        assert_eq!(
            div_ids(&doc.html),
            vec!["cover", "problem", "solution", "what-you-get", "faq", "cta"]
        );
        assert!(!doc.html.contains(r#"<div class="section">"#), "no extras expected");
    }

    #[test]
    fn empty_problem_omitted_and_cta_defaulted() {
        let (r, _dir) = renderer_with(TEMPLATE);
        let doc = r
            .assemble(&request("T\n\n## Problem\n\n## Solution\nS\n\n## CTA\n"))
            .unwrap();
        assert!(!doc.html.contains(r#"id="problem""#));
        assert!(doc.html.contains(r#"id="solution""#));
        assert!(doc.html.contains("Neem contact op voor meer informatie"));
        assert!(doc.html.contains("<h2>Volgende stappen</h2>"));
    }

    #[test]
    fn english_labels_and_default_cta() {
        let (r, _dir) = renderer_with(TEMPLATE);
        let mut req = request("T\n\n## Problem\nP");
        req.language = Some("en".into());
        let doc = r.assemble(&req).unwrap();
        assert!(doc.html.contains("<h2>Problem</h2><p>P</p>"));
        assert!(doc.html.contains("Contact us for more information"));
        assert!(doc.html.contains(r#"lang="en""#));
    }

    #[test]
    fn body_heading_not_duplicated() {
        let (r, _dir) = renderer_with(TEMPLATE);
        let doc = r
            .assemble(&request("T\n\n## Probleem\n### Probleem\nTekst"))
            .unwrap();
        assert!(doc.html.contains("<h2>Probleem</h2><p>Tekst</p>"));
    }

    #[test]
    fn extras_escaped_and_appended() {
        let (r, _dir) = renderer_with(TEMPLATE);
        let doc = r
            .assemble(&request("T\n\n## Prijs <& data>\n**€ 279**\n\n## Problem\nP"))
            .unwrap();
        assert!(doc
            .html
            .contains(r#"<div class="section"><h2>Prijs &lt;&amp; data&gt;</h2><p><strong>€ 279</strong></p>"#));
        let extra_pos = doc.html.find("Prijs").unwrap();
        let cta_pos = doc.html.find(r#"id="cta""#).unwrap();
        assert!(extra_pos > cta_pos);
    }

    #[test]
    fn course_name_wins_and_subtitle_gets_label() {
        let (r, _dir) = renderer_with(TEMPLATE);
        let req = RenderRequest {
            markdown: "Parsed title\nParsed sub\n\n## Problem\nP".into(),
            course_name: Some("🔥 VCA Basis | Lindenhaeghe".into()),
            template_type: Some("lead-magnet".into()),
            ..Default::default()
        };
        let doc = r.assemble(&req).unwrap();
        assert_eq!(doc.cover_title, "VCA Basis");
        assert_eq!(doc.cover_subtitle, "Lead magnet (2 pages) · Parsed sub");
        assert_eq!(doc.filename, "VCA-Basis-lead-magnet.pdf");
        assert!(doc.html.contains("<title>VCA Basis</title>"));
    }

    #[test]
    fn parsed_title_used_without_course_name() {
        let (r, _dir) = renderer_with(TEMPLATE);
        let doc = r.assemble(&request("Parsed <title>\n\n## Problem\nP")).unwrap();
        assert_eq!(doc.cover_title, "Parsed <title>");
        assert_eq!(doc.cover_subtitle, "whitepaper");
        assert!(doc.html.contains("<h1>Parsed &lt;title&gt;</h1>"));
        assert_eq!(doc.filename, "Whitepaper-whitepaper.pdf");
    }

    #[test]
    fn missing_template_is_template_missing() {
        let r = DocumentRenderer::new("/definitely/not/here.html", "/nope.svg", "Lindenhaeghe");
        let err = r.assemble(&request("T")).unwrap_err();
        assert!(matches!(err, WizardError::TemplateMissing { .. }));
    }

    #[test]
    fn empty_markdown_rejected() {
        let (r, _dir) = renderer_with(TEMPLATE);
        let err = r.assemble(&request("  \n")).unwrap_err();
        assert!(matches!(err, WizardError::InvalidInput(_)));
    }

    #[test]
    fn logo_is_inlined_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = dir.path().join("t.html");
        std::fs::write(&tpl, "{{LOGO_IMG}}").unwrap();
        let logo = dir.path().join("logo.svg");
        std::fs::write(&logo, "<svg/>").unwrap();
        let r = DocumentRenderer::new(&tpl, &logo, "Lindenhaeghe");
        let doc = r.assemble(&request("T")).unwrap();
        assert!(doc.html.starts_with(r#"<img src="data:image/svg+xml;base64,PHN2Zy8+""#));
        assert!(doc.html.contains(r#"alt="Lindenhaeghe""#));
    }

    #[test]
    fn missing_logo_renders_nothing() {
        let (r, _dir) = renderer_with("[{{LOGO_IMG}}]");
        let doc = r.assemble(&request("T")).unwrap();
        assert_eq!(doc.html, "[]");
    }
}
