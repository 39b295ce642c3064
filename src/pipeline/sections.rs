//! Split a drafted Markdown document into named whitepaper sections.
//!
//! ## Document shape
//!
//! ```text
//! Course title                 ┐ cover block (before the first ##)
//! One-line subtitle            ┘
//!
//! ## Probleem                  → problem
//! ## Oplossing                 → solution
//! ## Wat krijg je              → what-you-get
//! ## Veelgestelde vragen       → faq
//! ## Volgende stappen          → cta
//! ## Anything else             → extra section "anything-else"
//! ```
//!
//! Headings are matched through [`HEADING_ALIASES`] (English and Dutch).
//! Add a locale by extending the table, not by adding branches.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use super::text::FALLBACK_TITLE;

/// Cover lines longer than this are split into title + subtitle.
pub const COVER_SPLIT_MIN_LEN: usize = 72;
/// A `": "` must start before this character index to split there.
pub const COVER_COLON_MAX_IDX: usize = 60;
/// A word-boundary split must fall after this character index.
pub const COVER_SPACE_MIN_IDX: usize = 24;

/// The sections the HTML template knows natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalSection {
    Cover,
    Problem,
    Solution,
    WhatYouGet,
    Faq,
    Cta,
}

impl CanonicalSection {
    /// Template order.
    pub const ALL: [CanonicalSection; 6] = [
        CanonicalSection::Cover,
        CanonicalSection::Problem,
        CanonicalSection::Solution,
        CanonicalSection::WhatYouGet,
        CanonicalSection::Faq,
        CanonicalSection::Cta,
    ];

    /// Stable id, used as the HTML `id` attribute.
    pub fn id(self) -> &'static str {
        match self {
            CanonicalSection::Cover => "cover",
            CanonicalSection::Problem => "problem",
            CanonicalSection::Solution => "solution",
            CanonicalSection::WhatYouGet => "what-you-get",
            CanonicalSection::Faq => "faq",
            CanonicalSection::Cta => "cta",
        }
    }
}

impl fmt::Display for CanonicalSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Normalised heading → canonical section.
pub const HEADING_ALIASES: &[(&str, CanonicalSection)] = &[
    ("cover", CanonicalSection::Cover),
    ("problem", CanonicalSection::Problem),
    ("probleem", CanonicalSection::Problem),
    ("solution", CanonicalSection::Solution),
    ("oplossing", CanonicalSection::Solution),
    ("what you get", CanonicalSection::WhatYouGet),
    ("what-you-get", CanonicalSection::WhatYouGet),
    ("wat krijg je", CanonicalSection::WhatYouGet),
    ("wat je krijgt", CanonicalSection::WhatYouGet),
    ("wat je get", CanonicalSection::WhatYouGet),
    ("faq", CanonicalSection::Faq),
    ("veelgestelde vragen", CanonicalSection::Faq),
    ("cta", CanonicalSection::Cta),
    ("next steps", CanonicalSection::Cta),
    ("volgende stappen", CanonicalSection::Cta),
    ("call to action", CanonicalSection::Cta),
];

static ALIAS_MAP: Lazy<HashMap<&'static str, CanonicalSection>> =
    Lazy::new(|| HEADING_ALIASES.iter().copied().collect());

/// Where a `##` block ends up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionKey {
    Canonical(CanonicalSection),
    /// Slug of an unrecognised heading.
    Extra(String),
}

impl SectionKey {
    pub fn as_str(&self) -> &str {
        match self {
            SectionKey::Canonical(c) => c.id(),
            SectionKey::Extra(slug) => slug,
        }
    }
}

/// One `##` block in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedSection {
    pub key: SectionKey,
    /// Heading text as written, trimmed.
    pub heading: String,
    pub body: String,
}

/// Result of [`parse_sections`]; lives for one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSections {
    /// Accumulated Markdown body per canonical section (cover excluded).
    pub bodies: HashMap<CanonicalSection, String>,
    /// Every non-cover block in document order, duplicates included.
    pub ordered: Vec<OrderedSection>,
    pub cover_title: String,
    pub cover_subtitle: String,
}

impl ParsedSections {
    /// Markdown body of a canonical section, empty when absent.
    pub fn body(&self, section: CanonicalSection) -> &str {
        self.bodies.get(&section).map(String::as_str).unwrap_or("")
    }

    /// Blocks whose heading did not map to a canonical section.
    pub fn extras(&self) -> impl Iterator<Item = &OrderedSection> {
        self.ordered
            .iter()
            .filter(|s| matches!(s.key, SectionKey::Extra(_)))
    }
}

// A `##` glued to preceding text ("…end of paragraph## Solution") but not a
// `###` or deeper heading.
static RE_INLINE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\n#])##[ \t]+").unwrap());

static RE_HEADING_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##[ \t]+").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RE_SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());

static RE_SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?\.)\s+(\S.+)$").unwrap());

/// Move every `##` heading marker onto its own line.
pub fn normalize_headings(markdown: &str) -> String {
    RE_INLINE_HEADING
        .replace_all(markdown, "$1\n\n## ")
        .into_owned()
}

/// Lowercase and collapse internal whitespace.
pub fn normalize_heading(heading: &str) -> String {
    RE_WHITESPACE
        .replace_all(&heading.trim().to_lowercase(), " ")
        .into_owned()
}

/// Map a heading to its section key.
pub fn classify_heading(heading: &str) -> SectionKey {
    let normalized = normalize_heading(heading);
    match ALIAS_MAP.get(normalized.as_str()) {
        Some(&section) => SectionKey::Canonical(section),
        None => SectionKey::Extra(slugify(&normalized)),
    }
}

/// Lowercase, spaces to hyphens, everything outside `[A-Za-z0-9_-]` dropped.
pub fn slugify(heading: &str) -> String {
    let lowered = normalize_heading(heading).replace(' ', "-");
    RE_SLUG_STRIP.replace_all(&lowered, "").into_owned()
}

/// Parse a Markdown document into cover and sections.
pub fn parse_sections(markdown: &str) -> ParsedSections {
    let normalized = normalize_headings(markdown);
    let mut parts = RE_HEADING_SPLIT.split(&normalized);

    let mut cover_title = FALLBACK_TITLE.to_string();
    let mut cover_subtitle = String::new();

    let before_first = parts.next().unwrap_or("").trim();
    if !before_first.is_empty() {
        let (first, rest) = split_first_line(before_first);
        let (title, subtitle) = if rest.is_empty() {
            split_cover_line(first)
        } else {
            (first.to_string(), rest.to_string())
        };
        cover_title = title;
        cover_subtitle = subtitle;
    }

    let mut bodies: HashMap<CanonicalSection, String> = HashMap::new();
    let mut ordered = Vec::new();

    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (heading, body) = split_first_line(part);
        let key = classify_heading(heading);

        if key == SectionKey::Canonical(CanonicalSection::Cover) {
            let (title, subtitle) = split_first_line(body);
            cover_title = (if title.is_empty() { heading } else { title }).to_string();
            cover_subtitle = subtitle.to_string();
            continue;
        }

        if let SectionKey::Canonical(section) = &key {
            bodies
                .entry(*section)
                .and_modify(|existing| {
                    existing.push_str("\n\n");
                    existing.push_str(body);
                })
                .or_insert_with(|| body.to_string());
        }
        ordered.push(OrderedSection {
            key,
            heading: heading.to_string(),
            body: body.to_string(),
        });
    }

    debug!(
        "Parsed sections: [{}], cover title {:?}",
        ordered
            .iter()
            .map(|s| s.key.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        cover_title
    );

    ParsedSections {
        bodies,
        ordered,
        cover_title,
        cover_subtitle,
    }
}

/// First line (trimmed) and the trimmed remainder.
fn split_first_line(s: &str) -> (&str, &str) {
    match s.split_once('\n') {
        Some((first, rest)) => (first.trim(), rest.trim()),
        None => (s.trim(), ""),
    }
}

/// Split a single long cover line into title and subtitle.
///
/// Only lines over [`COVER_SPLIT_MIN_LEN`] characters are split. Tried in
/// order: `": "` before [`COVER_COLON_MAX_IDX`] (title keeps the colon), the
/// first sentence end followed by more text, the last space at or before
/// [`COVER_SPLIT_MIN_LEN`] if it lies past [`COVER_SPACE_MIN_IDX`].
pub fn split_cover_line(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= COVER_SPLIT_MIN_LEN {
        return (line.to_string(), String::new());
    }

    if let Some(idx) = find_char_seq(&chars, &[':', ' ']) {
        if idx > 0 && idx < COVER_COLON_MAX_IDX {
            let title: String = chars[..=idx].iter().collect();
            let subtitle: String = chars[idx + 2..].iter().collect();
            return (title.trim().to_string(), subtitle.trim().to_string());
        }
    }

    if let Some(caps) = RE_SENTENCE_SPLIT.captures(line) {
        return (caps[1].trim().to_string(), caps[2].trim().to_string());
    }

    let search_end = COVER_SPLIT_MIN_LEN.min(chars.len() - 1);
    if let Some(idx) = chars[..=search_end].iter().rposition(|&c| c == ' ') {
        if idx > COVER_SPACE_MIN_IDX {
            let title: String = chars[..idx].iter().collect();
            let subtitle: String = chars[idx + 1..].iter().collect();
            return (title.trim().to_string(), subtitle.trim().to_string());
        }
    }

    (line.to_string(), String::new())
}

fn find_char_seq(haystack: &[char], needle: &[char]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
