//! `page.mdx` rendering.
//!
//! MDX reads `{` and `}` as JSX expressions and `<` as the start of a JSX
//! tag, so all three are backslash-escaped in prose. Fenced code blocks and
//! inline code spans are left alone. The page opens with the cover image.

const FENCE: &str = "```";

fn map_outside_fences(text: &str, f: impl Fn(&str) -> String) -> String {
    let mut in_fence = false;
    text.lines()
        .map(|line| {
            if line.trim_start().starts_with(FENCE) {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                line.to_string()
            } else {
                map_outside_code_spans(line, &f)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Apply `f` to the parts of `line` that are not inside a backtick span.
/// A span closes on the next run of the same number of backticks; an
/// unclosed run is treated as prose.
fn map_outside_code_spans(line: &str, f: &impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find('`') {
        let ticks = rest[start..].len() - rest[start..].trim_start_matches('`').len();
        let run = &rest[start..start + ticks];
        let Some(len) = rest[start + ticks..].find(run) else {
            break;
        };
        let close = start + ticks + len + ticks;
        out.push_str(&f(&rest[..start]));
        out.push_str(&rest[start..close]);
        rest = &rest[close..];
    }
    out.push_str(&f(rest));
    out
}

fn escape_prose(text: &str) -> String {
    text.replace('{', "\\{")
        .replace('}', "\\}")
        .replace('<', "\\<")
}

fn unescape_prose(text: &str) -> String {
    text.replace("\\{", "{")
        .replace("\\}", "}")
        .replace("\\<", "<")
}

pub fn escape_mdx(text: &str) -> String {
    map_outside_fences(text, escape_prose)
}

pub fn unescape_mdx(text: &str) -> String {
    map_outside_fences(text, unescape_prose)
}

fn cover_line(title: &str, cover_file: &str) -> String {
    let alt = escape_prose(&title.replace(['[', ']'], ""));
    format!("![{alt}](./{cover_file})")
}

/// Render the page body with the cover image on top.
///
/// # Arguments
///
/// * `title` - Newsletter title, used as the cover's alt text
/// * `cover_file` - Cover file name inside the newsletter directory, if any
/// * `content` - Markdown body
///
/// # Returns
///
/// The MDX page, ending with a newline.
pub fn render_page(title: &str, cover_file: Option<&str>, content: &str) -> String {
    let mut page = String::new();
    if let Some(cover) = cover_file {
        page.push_str(&cover_line(title, cover));
        page.push_str("\n\n");
    }
    page.push_str(&escape_mdx(content.trim()));
    page.push('\n');
    page
}

/// Recover the Markdown body from a rendered page.
pub fn parse_page(page: &str) -> String {
    let body = match page.split_once("\n\n") {
        Some((first, rest)) if first.starts_with("![") && first.contains("](./cover.") => rest,
        _ => page,
    };
    unescape_mdx(body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braces_escaped_outside_code() {
        let content = "Use {curly} prose.\n\n```rust\nfn main() {}\n```\nAfter {x}";
        let page = render_page("T", Some("cover.png"), content);
        assert!(page.starts_with("![T](./cover.png)\n\n"));
        assert!(page.contains("Use \\{curly\\} prose."));
        assert!(page.contains("fn main() {}"));
        assert!(page.contains("After \\{x\\}"));
    }

    #[test]
    fn test_angle_brackets_escaped_outside_code() {
        let content = "Median latency <5ms, see `Vec<u8>` and ``a ` <b>``.\n\n```\nlet v: Vec<u8> = vec![];\n```";
        let page = render_page("Sub <10ms {inference}", Some("cover.png"), content);
        assert!(page.starts_with("![Sub \\<10ms \\{inference\\}](./cover.png)\n\n"));
        assert!(page.contains("latency \\<5ms"));
        assert!(page.contains("`Vec<u8>`"));
        assert!(page.contains("``a ` <b>``"));
        assert!(page.contains("let v: Vec<u8> = vec![];"));
        assert_eq!(parse_page(&page), content);
    }

    #[test]
    fn test_unclosed_backtick_is_prose() {
        assert_eq!(escape_mdx("a ` <b"), "a ` \\<b");
    }

    #[test]
    fn test_page_round_trip() {
        let content = "## Section\n\nA {b} c.\n\n```\n{raw}\n```";
        let page = render_page("The [Big] Week", Some("cover.svg"), content);
        assert!(page.starts_with("![The Big Week](./cover.svg)"));
        assert_eq!(parse_page(&page), content);
        let bare = render_page("T", None, content);
        assert_eq!(parse_page(&bare), content);
    }
}
