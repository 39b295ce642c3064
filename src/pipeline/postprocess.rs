//! Deterministic cleanup of model-drafted Markdown.
//!
//! The drafting prompt already asks for plain Markdown without emoji, but
//! models still wrap replies in code fences, emit CRLF or pad lines. These
//! rules fix formatting only; wording and Markdown structure are never
//! changed.
//!
//! Rules run in a fixed order: fences come off before anything else, and
//! emoji go last so a heading like `## 🎯 Probleem` is still recognised.

use crate::pipeline::text::strip_emoji_keep_lines;
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a drafted document.
///
/// 1. Strip outer ```` ```markdown ```` fences
/// 2. CRLF / CR → LF
/// 3. Trim trailing whitespace per line, keeping hard breaks and code blocks
/// 4. Collapse runs of 3+ blank lines
/// 5. Remove invisible Unicode (zero-width, joiners, BOM, soft hyphen)
/// 6. Remove emoji, keeping line structure
/// 7. Trim the whole document
pub fn clean_draft(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    let s = strip_emoji_keep_lines(&s);
    s.trim().to_string()
}

/// First non-blank line of a document, trimmed.
pub fn first_line(markdown: &str) -> &str {
    markdown
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Two trailing spaces after paragraph text are a Markdown hard break and
/// survive as exactly two spaces. Lines inside fenced code are left as they
/// are.
fn trim_trailing_whitespace(input: &str) -> String {
    let mut in_code = false;
    input
        .split('\n')
        .map(|line| {
            if is_fence(line) {
                in_code = !in_code;
                return line.trim_end().to_string();
            }
            if in_code {
                return line.to_string();
            }
            let body = line.trim_end();
            let hard_break = !body.is_empty()
                && !body.trim_start().starts_with('#')
                && line[body.len()..].ends_with("  ");
            if hard_break {
                format!("{body}  ")
            } else {
                body.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").into_owned()
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}'],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_markdown_fences("```markdown\nTitel\n## Probleem\n```"), "Titel\n## Probleem");
        assert_eq!(strip_markdown_fences("```\nTitel\n```\n"), "Titel");
        assert_eq!(strip_markdown_fences("Titel\n```x```"), "Titel\n```x```");
    }

    #[test]
    fn line_endings_and_trailing_space() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(trim_trailing_whitespace("  a \nb\t\n## Kop   "), "  a\nb\n## Kop");
    }

    #[test]
    fn blank_lines_collapse() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn hard_breaks_and_code_blocks_survive() {
        let md = "Regel een  \nRegel twee \t\n   \n```bash\necho hi   \n# comment\n```  \nEinde";
        assert_eq!(
            trim_trailing_whitespace(md),
            "Regel een  \nRegel twee\n\n```bash\necho hi   \n# comment\n```\nEinde"
        );
    }

    #[test]
    fn invisible_chars_removed() {
        assert_eq!(remove_invisible_chars("a\u{200B}b\u{FEFF}c\u{00AD}d\u{200D}e"), "abcde");
    }

    #[test]
    fn clean_draft_end_to_end() {
        let raw = "```markdown\r\nBHV Basis 🚒\r\nVeilig werken\r\n## 🎯 Probleem   \r\nTekst\r\n\r\n\r\n\r\n\r\n## CTA\r\nBel ons\r\n```";
        let out = clean_draft(raw);
        assert_eq!(
            out,
            "BHV Basis\nVeilig werken\n## Probleem\nTekst\n\n\n## CTA\nBel ons"
        );
        assert_eq!(first_line(&out), "BHV Basis");
    }

    #[test]
    fn clean_draft_keeps_markdown_structure() {
        let raw = "Titel\nSub\n\nRegel een  \nRegel twee\n\n![Schema](schema.png)\n\n```bash\necho hi\n# comment\n```";
        assert_eq!(clean_draft(raw), raw);
    }

    #[test]
    fn clean_draft_keeps_heading_marker_next_to_emoji() {
        let out = clean_draft("Titel\nSub\n\n## Probleem\nA\n\n## 🎯Oplossing\nB");
        assert_eq!(out, "Titel\nSub\n\n## Probleem\nA\n\n## Oplossing\nB");
    }

    #[test]
    fn first_line_skips_blanks() {
        assert_eq!(first_line("\n  \n  Titel \nx"), "Titel");
        assert_eq!(first_line(""), "");
    }
}
