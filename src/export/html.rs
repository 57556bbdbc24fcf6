use crate::config::MarkupConfig;
use crate::dom::{Element, inner_html};
use crate::inline::escape;

/// Stylesheet of the standalone markup export. Also defines the size-tier and
/// alignment classes so exported images keep their placement.
pub const STYLESHEET: &str = r#"body {
  font-family: Georgia, serif;
  line-height: 1.6;
  max-width: 850px;
  margin: 40px auto;
  color: #1a202c;
  padding: 0 40px;
}
h1 {
  font-family: 'Segoe UI', sans-serif;
  font-size: 2.5em;
  font-weight: 800;
  border-bottom: 2px solid #edf2f7;
  padding-bottom: 0.3em;
}
h2 { font-size: 2em; font-weight: 700; margin-top: 1.5em; }
h3 { font-size: 1.5em; font-weight: 600; color: #4a5568; }
p { margin: 1.2em 0; font-size: 18px; }
img { max-width: 100%; height: auto; border-radius: 8px; }
.img-align-center { display: block; margin-left: auto; margin-right: auto; }
.img-align-right { display: block; margin-left: auto; margin-right: 0; }
.img-align-left { display: block; margin-left: 0; margin-right: auto; }
.img-size-25 { width: 25%; }
.img-size-50 { width: 50%; }
.img-size-75 { width: 75%; }
.img-size-100 { width: 100%; }
table { border-collapse: collapse; width: 100%; margin: 2em 0; }
th, td { border: 1px solid #e2e8f0; padding: 12px; text-align: left; }
th { background: #f8fafc; font-weight: 700; }
pre { background: #f7fafc; padding: 1em; border-radius: 6px; overflow-x: auto; font-family: Consolas, monospace; }
code { background: #f1f5f9; color: #4f46e5; padding: 0.1em 0.3em; border-radius: 4px; font-family: Consolas, monospace; }
blockquote { border-left: 5px solid #4f46e5; margin: 2em 0; padding: 1em 1.5em; font-style: italic; background: #f8fafc; }
.quote-gap { height: 0.6em; }
hr { border: 0; border-top: 2px solid #edf2f7; margin: 3em 0; }
"#;

/// Wrap the tree's inner markup in a standalone document.
pub fn write_html(root: &Element, config: &MarkupConfig) -> String {
    let body = inner_html(root);
    let mut out = String::with_capacity(STYLESHEET.len() + body.len() + 256);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape(&config.title)));
    out.push_str("<style>\n");
    out.push_str(STYLESHEET);
    out.push_str("</style>\n</head>\n<body>\n");
    out.push_str(&body);
    out.push_str("\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_fragment;

    #[test]
    fn embeds_inner_markup_verbatim() {
        let root = parse_fragment(r#"<h1>T</h1><img src="x.png" class="img-size-50 img-align-center" />"#)
            .unwrap();
        let html = write_html(&root, &MarkupConfig::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(
            "<body>\n<h1>T</h1><img src=\"x.png\" class=\"img-size-50 img-align-center\" />\n</body>"
        ));
        assert!(!html.contains("<root>"));
    }

    #[test]
    fn stylesheet_defines_tier_and_alignment_classes() {
        let html = write_html(&Element::new("root"), &MarkupConfig::default());
        for class in ["img-size-25", "img-size-75", "img-align-right", "img-align-center"] {
            assert!(html.contains(&format!(".{class} ")), "missing {class}");
        }
    }

    #[test]
    fn title_is_escaped() {
        let config = MarkupConfig {
            title: "Q&A <draft>".to_string(),
        };
        let html = write_html(&Element::new("root"), &config);
        assert!(html.contains("<title>Q&amp;A &lt;draft&gt;</title>"));
    }
}
