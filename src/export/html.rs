//! Rich-text (HTML) to Markdown conversion.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::export::ports::{ConvertError, HtmlConverter};

static SECRET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<section[^>]*\bclass\s*=\s*["'][^"']*\bsecret\b[^"']*["'][^>]*>.*?</section>"#)
        .unwrap()
});

static WIKI_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").unwrap());

static ESCAPED_WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\[\\\[(.*?)\\\]\\\]").unwrap());

static ESCAPED_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([[:punct:]])").unwrap());

/// Structural converter built on `html2md`.
///
/// Produces ATX `#` headings, fenced code and GFM tables. The parser is
/// not panic-free on malformed input, so panics are reported as errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl HtmlConverter for Html2MdConverter {
    fn convert(&self, html: &str) -> Result<String, ConvertError> {
        panic::catch_unwind(AssertUnwindSafe(|| html2md::parse_html(html))).map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "converter panicked".to_string());
            ConvertError(reason)
        })
    }
}

/// Removes `<section class="secret">` blocks.
pub fn strip_secrets(html: &str) -> Cow<'_, str> {
    SECRET_RE.replace_all(html, "")
}

/// Undoes the converter's Markdown escaping inside wiki links.
///
/// The converter sees `[[Note|Label]]` as text and backslash-escapes the
/// punctuation it contains (brackets, `_`, `*`, `~`, `<`, `>` and so on).
pub fn unescape_wiki_links(markdown: &str) -> String {
    let unescape = |inner: &str| ESCAPED_PUNCT_RE.replace_all(inner, "$1").into_owned();

    let unbracketed = ESCAPED_WIKI_LINK_RE.replace_all(markdown, |caps: &Captures| {
        format!("[[{}]]", unescape(&caps[1]))
    });
    WIKI_LINK_RE
        .replace_all(&unbracketed, |caps: &Captures| format!("[[{}]]", unescape(&caps[1])))
        .into_owned()
}

/// Escapes the label separator of wiki links on table rows.
///
/// A bare `|` inside `[[Note|Label]]` would split the cell in two.
pub fn escape_table_links(markdown: &str) -> String {
    markdown
        .split_inclusive('\n')
        .map(|line| {
            if line.trim_start().starts_with('|') {
                WIKI_LINK_RE
                    .replace_all(line, |caps: &Captures| {
                        format!("[[{}]]", caps[1].replace("\\|", "|").replace('|', "\\|"))
                    })
                    .into_owned()
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// Runs the HTML pipeline for one field.
///
/// In order: strip secrets (unless `include_gm_only`), rewrite references,
/// convert structurally, unescape wiki links, substitute assets. A
/// converter failure is logged and yields `None`.
pub fn convert_html(
    html: &str,
    include_gm_only: bool,
    converter: &dyn HtmlConverter,
    rewrite_links: impl FnOnce(&str) -> String,
    rewrite_images: impl FnOnce(&str) -> String,
) -> Option<String> {
    let visible = if include_gm_only {
        Cow::Borrowed(html)
    } else {
        strip_secrets(html)
    };
    let linked = rewrite_links(&visible);

    let markdown = match converter.convert(&linked) {
        Ok(markdown) => markdown,
        Err(err) => {
            tracing::warn!(error = %err, "skipping field that failed to convert");
            return None;
        }
    };

    let markdown = unescape_wiki_links(&markdown);
    Some(rewrite_images(&markdown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Failing;

    impl HtmlConverter for Failing {
        fn convert(&self, _html: &str) -> Result<String, ConvertError> {
            Err(ConvertError("boom".into()))
        }
    }

    /// Echoes its input with the escaping the real converter applies.
    struct Escaping;

    impl HtmlConverter for Escaping {
        fn convert(&self, html: &str) -> Result<String, ConvertError> {
            Ok(html
                .replace('[', "\\[")
                .replace(']', "\\]")
                .replace('_', "\\_"))
        }
    }

    #[test]
    fn strips_secret_sections() {
        let html = r#"<p>open</p><section class="secret" id="s1"><p>hidden</p></section><p>end</p>"#;
        assert_eq!(strip_secrets(html), "<p>open</p><p>end</p>");
    }

    #[test]
    fn keeps_other_sections() {
        let html = r#"<section class="boxed">x</section>"#;
        assert_eq!(strip_secrets(html), html);
    }

    #[test]
    fn unescapes_inside_links_only() {
        let md = r"\[\[my\_note|The \*Keep\*\]\] and a\_b";
        assert_eq!(unescape_wiki_links(md), r"[[my_note|The *Keep*]] and a\_b");
    }

    #[test]
    fn unescapes_any_punctuation_inside_links() {
        let md = r"\[\[Note\~x|Sir \<K\> \~1\~\]\]";
        assert_eq!(unescape_wiki_links(md), "[[Note~x|Sir <K> ~1~]]");
    }

    #[test]
    fn html2md_link_names_survive_unescaping() {
        let md = Html2MdConverter
            .convert("<p>[[my_note~x|Sir &lt;K&gt; ~1~]]</p>")
            .unwrap();
        let out = unescape_wiki_links(&md);
        let out = out.trim();
        assert!(!out.contains('\\'), "{out}");
        assert!(out.starts_with("[[my_note~x|Sir "), "{out}");
        assert!(out.ends_with(" ~1~]]"), "{out}");
    }

    #[test]
    fn escapes_link_pipes_on_table_rows_only() {
        let md = "[[A|a]]\n| 1 | [[B|b]] and [[C]] |\n  |[[D\\|d]]|\n";
        assert_eq!(
            escape_table_links(md),
            "[[A|a]]\n| 1 | [[B\\|b]] and [[C]] |\n  |[[D\\|d]]|\n"
        );
    }

    #[test]
    fn html2md_table_links_keep_their_cell() {
        let html = "<table><thead><tr><th>Roll</th><th>Result</th></tr></thead>\
                    <tbody><tr><td>1</td><td>[[Goblin|A goblin]]</td></tr></tbody></table>";
        let md = Html2MdConverter.convert(html).unwrap();
        let md = escape_table_links(&unescape_wiki_links(&md));
        let row = md
            .lines()
            .find(|line| line.contains("Goblin"))
            .unwrap_or_else(|| panic!("no goblin row in {md}"));
        assert!(row.trim_start().starts_with('|'), "{md}");
        assert!(row.contains(r"[[Goblin\|A goblin]]"), "{md}");
    }

    #[test]
    fn pipeline_applies_steps_in_order() {
        let html = r#"<p>@Item[x]</p><section class="secret">gm</section>"#;
        let out = convert_html(
            html,
            false,
            &Escaping,
            |text| text.replace("@Item[x]", "[[Item_x]]"),
            |md| format!("{md}!"),
        )
        .unwrap();
        assert_eq!(out, "<p>[[Item_x]]</p>!");
    }

    #[test]
    fn secrets_survive_when_gm_content_is_included() {
        let html = r#"<section class="secret">gm</section>"#;
        let out = convert_html(html, true, &Escaping, str::to_string, str::to_string).unwrap();
        assert!(out.contains("gm"));
    }

    #[test]
    fn converter_failure_yields_none() {
        assert_eq!(convert_html("<p>x</p>", true, &Failing, str::to_string, str::to_string), None);
    }

    #[test]
    fn html2md_converts_headings_and_emphasis() {
        let md = Html2MdConverter.convert("<h2>Keep</h2><p>A <strong>big</strong> wall</p>").unwrap();
        assert!(md.contains("Keep"));
        assert!(md.contains("**big**"));
    }
}
