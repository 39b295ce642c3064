//! Small text transforms shared by the composer and the renderer.
//!
//! Titles come from scraped `<title>` tags and model output, so they carry
//! organization suffixes ("Course | Brand") and the occasional emoji that
//! must not reach the PDF cover, the prompt or a download file name.

use once_cell::sync::Lazy;
use regex::Regex;

/// Title used when nothing better is available.
pub const FALLBACK_TITLE: &str = "Whitepaper";

/// File stem used when sanitising leaves nothing.
pub const FALLBACK_FILENAME: &str = "whitepaper";

const MAX_FILENAME_LEN: usize = 80;

// Misc symbols, dingbats, variation selectors, the zero-width joiner that
// glues ZWJ sequences together and the supplementary emoji planes.
const EMOJI_CLASS: &str =
    r"[\x{200D}\x{2600}-\x{26FF}\x{2700}-\x{27BF}\x{FE00}-\x{FE0F}\x{1F000}-\x{1FAFF}]";

static RE_EMOJI: Lazy<Regex> = Lazy::new(|| Regex::new(EMOJI_CLASS).unwrap());

static RE_EMOJI_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"([ \t]*){EMOJI_CLASS}+[ \t]*")).unwrap());

static RE_MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

static RE_UNSAFE_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s/\\:*?"<>|]+"#).unwrap());

static RE_NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9-]+").unwrap());

static RE_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Remove emoji from a single-line string and collapse whitespace runs.
pub fn strip_emoji(s: &str) -> String {
    let s = RE_EMOJI.replace_all(s, "");
    RE_MULTI_SPACE.replace_all(&s, " ").trim().to_string()
}

/// Remove emoji from a multi-line document without touching line structure.
///
/// An emoji run and the blanks around it become one space inside a line,
/// so `"## 🎯Probleem"` and `"## 🎯 Probleem"` both become `"## Probleem"`.
/// At the start of a line the indentation is kept; at the end nothing is
/// left behind.
pub fn strip_emoji_keep_lines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for caps in RE_EMOJI_RUN.captures_iter(s) {
        let (Some(run), Some(lead)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&s[last..run.start()]);
        let rest = &s[run.end()..];
        let line_start = out.is_empty() || out.ends_with('\n');
        let line_end = rest.is_empty() || rest.starts_with('\n');
        if line_start {
            if !line_end {
                out.push_str(lead.as_str());
            }
        } else if !line_end {
            out.push(' ');
        }
        last = run.end();
    }
    out.push_str(&s[last..]);
    out
}

/// Strips an organization name from the start or end of a title.
#[derive(Debug, Clone)]
pub struct TitleCleaner {
    suffix: Regex,
    prefix: Regex,
}

impl TitleCleaner {
    pub fn new(brand: &str) -> Self {
        let brand = regex::escape(brand.trim());
        // Brand names are escaped literals, so these patterns always compile.
        let suffix = Regex::new(&format!(r"(?i)\s*[|\-–—]\s*{brand}\s*$")).unwrap();
        let prefix = Regex::new(&format!(r"(?i)^\s*{brand}\s*[|\-–—]\s*")).unwrap();
        Self { suffix, prefix }
    }

    /// `"Course | Brand"` → `"Course"`, `"Brand - Course"` → `"Course"`.
    ///
    /// Returns the trimmed input when stripping would leave nothing.
    pub fn strip_brand(&self, s: &str) -> String {
        let s1 = self.suffix.replace(s, "");
        let s2 = self.prefix.replace(&s1, "");
        let out = s2.trim();
        if out.is_empty() {
            s.trim().to_string()
        } else {
            out.to_string()
        }
    }

    /// Brand and emoji stripped; falls back to the emoji-stripped raw title,
    /// then to [`FALLBACK_TITLE`].
    pub fn course_title(&self, raw: &str) -> String {
        let cleaned = strip_emoji(&self.strip_brand(raw));
        if !cleaned.is_empty() {
            return cleaned;
        }
        let plain = strip_emoji(raw);
        if !plain.is_empty() {
            return plain;
        }
        FALLBACK_TITLE.to_string()
    }
}

/// Turn a course name or template id into a safe ASCII file-name fragment.
///
/// The result only contains `[A-Za-z0-9-]`, has no leading, trailing or
/// doubled hyphens, is at most 80 characters, and is never empty.
pub fn sanitize_filename(s: &str) -> String {
    let s = RE_UNSAFE_FILENAME.replace_all(s, "-");
    let s: String = s.chars().filter(char::is_ascii).collect();
    let s = RE_NON_SLUG.replace_all(&s, "-");
    let s = RE_HYPHENS.replace_all(&s, "-");
    let s: String = s.trim_matches('-').chars().take(MAX_FILENAME_LEN).collect();
    let s = s.trim_end_matches('-');
    if s.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        s.to_string()
    }
}

/// Escape `&`, `<`, `>` and `"` for HTML text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_emoji_collapses_spaces() {
        assert_eq!(strip_emoji("🚀 Snel  starten ✅"), "Snel starten");
        assert_eq!(strip_emoji("🎉"), "");
    }

    #[test]
    fn strip_emoji_keep_lines_preserves_structure() {
        let md = "## 🎯 Probleem\n\nTekst 🎉 hier.\n\n    - ingesprongen";
        assert_eq!(
            strip_emoji_keep_lines(md),
            "## Probleem\n\nTekst hier.\n\n    - ingesprongen"
        );
    }

    #[test]
    fn emoji_glued_to_heading_keeps_marker_space() {
        assert_eq!(strip_emoji_keep_lines("## 🎯Oplossing"), "## Oplossing");
        assert_eq!(strip_emoji_keep_lines("Klaar ✅\n🎉Start\n  🚀 - item"), "Klaar\nStart\n  - item");

        let parsed = crate::pipeline::sections::parse_sections(&strip_emoji_keep_lines(
            "Titel\nSub\n\n## Probleem\nA\n\n## 🎯Oplossing\nB",
        ));
        use crate::pipeline::sections::CanonicalSection;
        assert_eq!(parsed.body(CanonicalSection::Problem), "A");
        assert_eq!(parsed.body(CanonicalSection::Solution), "B");
    }

    #[test]
    fn zero_width_joiner_sequences_removed() {
        assert_eq!(strip_emoji("👨\u{200D}💻 Developer"), "Developer");
        assert_eq!(strip_emoji_keep_lines("Team 👨\u{200D}💻\nx"), "Team\nx");
        assert_eq!(sanitize_filename(&strip_emoji("Code 👩\u{200D}🔬 Lab")), "Code-Lab");
    }

    #[test]
    fn brand_suffix_and_prefix() {
        let c = TitleCleaner::new("Lindenhaeghe");
        assert_eq!(c.strip_brand("BHV Basis | Lindenhaeghe"), "BHV Basis");
        assert_eq!(c.strip_brand("BHV Basis – lindenhaeghe "), "BHV Basis");
        assert_eq!(c.strip_brand("Lindenhaeghe - BHV Basis"), "BHV Basis");
        assert_eq!(c.strip_brand("Lindenhaeghe"), "Lindenhaeghe");
    }

    #[test]
    fn course_title_fallbacks() {
        let c = TitleCleaner::new("Lindenhaeghe");
        assert_eq!(c.course_title("🔥 VCA Basis | Lindenhaeghe"), "VCA Basis");
        assert_eq!(c.course_title("🔥"), "Whitepaper");
        assert_eq!(c.course_title(""), "Whitepaper");
    }

    #[test]
    fn brand_with_regex_metacharacters() {
        let c = TitleCleaner::new("A+B (NL)");
        assert_eq!(c.strip_brand("Cursus | A+B (NL)"), "Cursus");
    }

    #[test]
    fn sanitize_filename_strips_non_ascii_and_unsafe() {
        let out = sanitize_filename("Café 🎉 Déjà Vu / Report");
        assert_eq!(out, "Caf-Dj-Vu-Report");
        assert!(out.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        assert!(out.len() <= 80);
    }

    #[test]
    fn sanitize_filename_caps_length() {
        let long = "word ".repeat(40);
        let out = sanitize_filename(&long);
        assert!(out.len() <= 80);
        assert!(!out.ends_with('-'));
    }

    #[test]
    fn sanitize_filename_fallback() {
        assert_eq!(sanitize_filename("🎉 / ✨"), "whitepaper");
        assert_eq!(sanitize_filename(""), "whitepaper");
    }

    #[test]
    fn sanitize_filename_ascii_punctuation() {
        assert_eq!(sanitize_filename("Q&A: v2.0 (final)"), "Q-A-v2-0-final");
    }

    #[test]
    fn escape_html_four_chars() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;"
        );
    }
}
