//! Markup sanitizer for user-supplied text.
//!
//! Book descriptions and review texts may carry a small set of inline and
//! list tags. Everything else is removed: script and style blocks with their
//! contents, comments, and any other tag (its text content is kept).
//! Attributes are dropped even from allowed tags. Any `<` or `>` left over
//! that is not part of an allowed tag is escaped, so unterminated tags such
//! as `<img src=x onerror=…` reach the page as text.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Tags that survive sanitization, attribute-free.
pub const ALLOWED_TAGS: &[&str] = &[
    "a",
    "abbr",
    "acronym",
    "b",
    "blockquote",
    "code",
    "em",
    "i",
    "li",
    "ol",
    "strong",
    "ul",
];

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<\s*(?:script|style)\b[^>]*>.*?<\s*/\s*(?:script|style)\s*>")
            .expect("valid script/style block regex")
    })
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?(?:-->|$)").expect("valid comment regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<\s*(/?)\s*([a-z][a-z0-9]*)\b[^>]*>")
            .expect("valid tag regex")
    })
}

/// Exactly the tags [`sanitize_pass`] emits.
fn allowed_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("</?(?:{})>", ALLOWED_TAGS.join("|")))
            .expect("valid allowed tag regex")
    })
}

/// Strip disallowed markup from `input` and trim surrounding whitespace.
///
/// Passes repeat until nothing changes, so fragments such as
/// `<scr<b>ipt>` cannot reassemble into a tag after one removal.
pub fn sanitize_markup(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    escape_stray_brackets(&current).trim().to_string()
}

/// Escape every `<` and `>` outside the allowed tags.
fn escape_stray_brackets(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for tag in allowed_tag_re().find_iter(input) {
        push_escaped(&mut out, &input[last..tag.start()]);
        out.push_str(tag.as_str());
        last = tag.end();
    }
    push_escaped(&mut out, &input[last..]);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn sanitize_pass(input: &str) -> String {
    let without_blocks = block_re().replace_all(input, "");
    let without_comments = comment_re().replace_all(&without_blocks, "");
    tag_re()
        .replace_all(&without_comments, |caps: &Captures<'_>| {
            let name = caps[2].to_ascii_lowercase();
            if ALLOWED_TAGS.contains(&name.as_str()) {
                format!("<{}{}>", &caps[1], name)
            } else {
                String::new()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(sanitize_markup("  A quiet novel.  "), "A quiet novel.");
    }

    #[test]
    fn script_and_style_blocks_are_removed_with_content() {
        let input = "Hi<script type=\"text/javascript\">alert('x')</script> there<STYLE>p{}</STYLE>";
        assert_eq!(sanitize_markup(input), "Hi there");
    }

    #[test]
    fn allowed_tags_survive_without_attributes() {
        let input = r#"<b onclick="steal()">bold</b> and <a href="javascript:x">link</a>"#;
        assert_eq!(sanitize_markup(input), "<b>bold</b> and <a>link</a>");
    }

    #[test]
    fn unknown_tags_are_stripped_keeping_text() {
        let input = "<div><p>First</p><img src=x onerror=y><ul><LI>item</LI></ul></div>";
        assert_eq!(sanitize_markup(input), "First<ul><li>item</li></ul>");
    }

    #[test]
    fn comments_are_removed() {
        assert_eq!(sanitize_markup("a<!-- hidden -->b"), "ab");
        assert_eq!(sanitize_markup("a<!-- never closed"), "a");
    }

    #[test]
    fn fragments_cannot_reassemble_into_tags() {
        assert_eq!(sanitize_markup("<<div>p>text"), "text");
        assert_eq!(sanitize_markup("<scr<i>ipt>x"), "ipt&gt;x");
    }

    #[test]
    fn unterminated_tags_are_escaped() {
        let out = sanitize_markup("x <img src=x onerror=alert(1)");
        assert_eq!(out, "x &lt;img src=x onerror=alert(1)");
        assert_eq!(
            sanitize_markup("<svg/onload=alert(1)"),
            "&lt;svg/onload=alert(1)"
        );
        let trailing = sanitize_markup("Nice book <img src=x onerror=alert(document.cookie) ");
        assert!(!trailing.contains("<img"));
        assert!(trailing.starts_with("Nice book &lt;img"));
    }

    #[test]
    fn stray_brackets_are_escaped_but_allowed_tags_kept() {
        assert_eq!(sanitize_markup("1 < 2 and <b>3 > 2</b>"), "1 &lt; 2 and <b>3 &gt; 2</b>");
        assert_eq!(sanitize_markup("<em>ok</em><"), "<em>ok</em>&lt;");
    }

    #[test]
    fn markup_only_input_becomes_empty() {
        assert_eq!(sanitize_markup("<script>x</script><br/>"), "");
    }

    proptest! {
        #[test]
        fn output_never_contains_script_tag(prefix in "[a-z0-9 ]{0,20}", body in "[a-z ]{0,20}") {
            let input = format!("{prefix}<script>{body}</script>{prefix}");
            let out = sanitize_markup(&input).to_ascii_lowercase();
            prop_assert!(!out.contains("<script"));
        }

        #[test]
        fn only_allowed_tags_carry_brackets(input in "[a-zA-Z<>/ =\"!-]{0,40}") {
            let out = sanitize_markup(&input);
            let rest = allowed_tag_re().replace_all(&out, "");
            prop_assert!(!rest.contains('<'));
            prop_assert!(!rest.contains('>'));
        }

        #[test]
        fn sanitizing_is_idempotent(input in "[a-zA-Z<>/ =\"!-]{0,40}") {
            let once = sanitize_markup(&input);
            prop_assert_eq!(sanitize_markup(&once), once.clone());
        }
    }
}
