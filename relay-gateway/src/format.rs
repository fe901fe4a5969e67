//! Reply formatter for provider output.
//!
//! Rewrites the provider's asterisk bullets and single-asterisk emphasis into
//! double-asterisk bold. This is line-oriented text rewriting, not a Markdown
//! parser.
//!
//! # Rules (applied in order)
//!
//! | Input         | Output        |
//! |---------------|---------------|
//! | `* item`      | `**item**`    |
//! | `*word*`      | `**word**`    |
//! | `**word**`    | `**word**`    |

use regex::Regex;
use std::sync::LazyLock;

static BULLET_LINE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\* (.+)$").unwrap());

/// Apply both rewrite rules to a reply.
///
/// Bullet lines are rewritten first; the emphasis pass skips any marker that
/// touches another `*`, so the bold produced by the bullet pass survives.
pub fn format_response(text: &str) -> String {
    let bulleted = bold_bullet_lines(text);
    bold_single_emphasis(&bulleted)
}

/// `* content` at the start of a line becomes `**content**`.
fn bold_bullet_lines(text: &str) -> String {
    BULLET_LINE_PATTERN.replace_all(text, "**$1**").into_owned()
}

/// `*span*` becomes `**span**` unless either marker is adjacent to another `*`.
///
/// The span is one or more non-`*` characters and may cross line breaks.
/// Adjacency is judged against the input, and scanning resumes right after a
/// rewritten span.
fn bold_single_emphasis(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let opens = bytes[i] == b'*' && (i == 0 || bytes[i - 1] != b'*');
        if opens {
            if let Some(offset) = bytes[i + 1..].iter().position(|&b| b == b'*') {
                let close = i + 1 + offset;
                if offset > 0 && bytes.get(close + 1) != Some(&b'*') {
                    out.push_str(&text[copied..i]);
                    out.push_str("**");
                    out.push_str(&text[i + 1..close]);
                    out.push_str("**");
                    i = close + 1;
                    copied = i;
                    continue;
                }
            }
        }
        i += 1;
    }

    out.push_str(&text[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_line_becomes_bold() {
        assert_eq!(format_response("* hello"), "**hello**");
    }

    #[test]
    fn single_emphasis_becomes_bold() {
        assert_eq!(format_response("*hello*"), "**hello**");
    }

    #[test]
    fn double_emphasis_is_unchanged() {
        assert_eq!(format_response("**hello**"), "**hello**");
        assert_eq!(
            format_response("**a** and **b**"),
            "**a** and **b**"
        );
    }

    #[test]
    fn formatting_is_idempotent() {
        let samples = [
            "* hello",
            "*hello*",
            "Our services:\n* Chatbots\n* ML models\nAsk *anything*.",
            "plain text without markers",
        ];
        for sample in samples {
            let once = format_response(sample);
            assert_eq!(format_response(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn bullets_apply_per_line() {
        let input = "Services:\n* Chatbots\n* Consulting\nThanks";
        assert_eq!(
            format_response(input),
            "Services:\n**Chatbots**\n**Consulting**\nThanks"
        );
    }

    #[test]
    fn bullet_requires_line_start_and_space() {
        assert_eq!(format_response("  * indented"), "  * indented");
        assert_eq!(format_response("*no space"), "*no space");
        assert_eq!(format_response("*"), "*");
        assert_eq!(format_response("* "), "* ");
    }

    #[test]
    fn emphasis_inside_sentence() {
        assert_eq!(
            format_response("We offer *custom* AI and *chatbots* too"),
            "We offer **custom** AI and **chatbots** too"
        );
    }

    #[test]
    fn emphasis_inside_bullet_is_left_alone() {
        // The bullet pass produces "**item with *emph***"; the trailing marker
        // touches the new bold, so the emphasis pass leaves it.
        assert_eq!(
            format_response("* item with *emph*"),
            "**item with *emph***"
        );
    }

    #[test]
    fn empty_emphasis_is_not_rewritten() {
        assert_eq!(format_response("a ** b"), "a ** b");
        assert_eq!(format_response(""), "");
    }

    #[test]
    fn unmatched_marker_is_kept() {
        assert_eq!(format_response("5 * 3 = 15"), "5 * 3 = 15");
    }

    #[test]
    fn emphasis_may_span_lines() {
        assert_eq!(format_response("*one\ntwo*"), "**one\ntwo**");
    }

    #[test]
    fn non_ascii_content_is_preserved() {
        assert_eq!(format_response("*café* ☕"), "**café** ☕");
        assert_eq!(format_response("* naïve résumé"), "**naïve résumé**");
    }
}
