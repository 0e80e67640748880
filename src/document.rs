//! Full HTML document around a composed body: reset stylesheet, inlined
//! `@font-face` rules and the page container.

use std::collections::HashSet;

use crate::assets::FontAsset;
use crate::model::{Element, ElementKind, Page, TextRun};
use crate::style::css::{escape_attr, px, StyleMap};

pub const RESET_CSS: &str = "* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
  -webkit-font-smoothing: antialiased;
  -moz-osx-font-smoothing: grayscale;
  text-rendering: optimizeLegibility;
}
body {
  margin: 0;
  padding: 0;
  width: 100% !important;
  height: 100% !important;
}
img {
  display: block;
}
a {
  color: inherit;
  text-decoration: none;
}
p {
  margin: 0;
  padding: 0;
}";

const DEFAULT_BACKGROUND: &str = "#ffffff";

fn push_font(
    fonts: &mut Vec<(String, String)>,
    seen: &mut HashSet<String>,
    family: Option<&str>,
    source: Option<&str>,
) {
    if let (Some(family), Some(source)) = (family, source) {
        if !family.is_empty() && !source.is_empty() && seen.insert(family.to_string()) {
            fonts.push((family.to_string(), source.to_string()));
        }
    }
}

fn push_run(fonts: &mut Vec<(String, String)>, seen: &mut HashSet<String>, run: &TextRun) {
    push_font(fonts, seen, run.font_family.as_deref(), run.font_source.as_deref());
}

fn walk(elements: &[Element], fonts: &mut Vec<(String, String)>, seen: &mut HashSet<String>) {
    for el in elements {
        match el.kind() {
            ElementKind::Text => {
                push_font(fonts, seen, el.font_family.as_deref(), el.font_source.as_deref());
                for line in &el.rich_text_arr {
                    for run in line.chars() {
                        push_run(fonts, seen, run);
                    }
                }
                for run in &el.value_list {
                    push_run(fonts, seen, run);
                }
            }
            ElementKind::Group => walk(&el.group_children, fonts, seen),
            _ => {}
        }
    }
}

/// Distinct `(family, source)` pairs used by text anywhere on the page, in
/// document order. The first source seen for a family wins.
pub fn collect_fonts(elements: &[Element]) -> Vec<(String, String)> {
    let mut fonts = Vec::new();
    let mut seen = HashSet::new();
    walk(elements, &mut fonts, &mut seen);
    fonts
}

pub fn font_face_css(fonts: &[FontAsset]) -> String {
    fonts
        .iter()
        .map(|font| {
            format!(
                "@font-face {{\n  font-family: '{}';\n  src: url('{}') format('{}');\n  font-weight: normal;\n  font-style: normal;\n}}",
                font.family.replace('\'', "\\'"),
                font.data_uri,
                font.format
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Page container. Previews are clipped to the viewport; exports keep the
/// page's natural height.
pub fn container_style(page: &Page, is_exporting: bool) -> StyleMap {
    let mut styles = StyleMap::new()
        .with("margin", "0 auto")
        .with("width", px(page.width))
        .with("position", "relative");
    if is_exporting {
        let height = if page.height > 0.0 { px(page.height) } else { "auto".to_string() };
        styles.set("height", height).set("overflow", "unset");
    } else {
        styles.set("height", "100%").set("overflow", "hidden");
    }
    styles.set(
        "background",
        page.background
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BACKGROUND),
    );
    styles
}

pub fn build_document(page: &Page, body: &str, fonts: &[FontAsset], is_exporting: bool) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head>\n",
            "<meta charset=\"UTF-8\">\n",
            "<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
            "<meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">\n",
            "<style>\n{reset}\n</style>\n",
            "<style>\n{fonts}\n</style>\n",
            "</head>\n",
            "<body>\n",
            "<div style=\"{container}\">{body}</div>\n",
            "</body>\n",
            "</html>\n"
        ),
        reset = RESET_CSS,
        fonts = font_face_css(fonts),
        container = escape_attr(&container_style(page, is_exporting).to_css()),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(json: serde_json::Value) -> Page {
        Page::from_value(json).unwrap()
    }

    #[test]
    fn fonts_are_deduplicated_by_family() {
        let p = page(serde_json::json!({
            "width": 100, "height": 100,
            "children": [
                {"type": "text", "fontFamily": "Inter", "s3FilePath": "https://f/inter.ttf"},
                {"type": "text", "fontFamily": "Inter", "fontSource": "https://f/other.ttf",
                 "valueList": [{"text": "a", "fontFamily": "Lora", "fontSource": "https://f/lora.woff2"}]},
                {"elementType": "image", "fontFamily": "Ignored", "fontSource": "https://f/x.ttf"},
                {"elementType": "group", "groupChildren": [
                    {"type": "text", "richTextArr": [{"words": [{"chars": [
                        {"text": "b", "fontFamily": "Mono", "s3FilePath": "https://f/mono.otf"}
                    ]}]}]}
                ]},
                {"type": "text", "fontFamily": "NoSource"}
            ]
        }));
        let fonts = collect_fonts(&p.children);
        let families: Vec<&str> = fonts.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(families, ["Inter", "Lora", "Mono"]);
        assert_eq!(fonts[0].1, "https://f/inter.ttf");
    }

    #[test]
    fn export_mode_keeps_natural_height() {
        let p = page(serde_json::json!({"width": 600, "height": 800, "background": "#000"}));
        assert_eq!(
            container_style(&p, true).to_css(),
            "margin: 0 auto; width: 600px; position: relative; height: 800px; overflow: unset; background: #000"
        );
        let preview = container_style(&p, false).to_css();
        assert!(preview.contains("height: 100%; overflow: hidden"));

        let sizeless = page(serde_json::json!({"width": 600}));
        assert!(container_style(&sizeless, true).to_css().contains("height: auto"));
        assert!(container_style(&sizeless, true).to_css().ends_with("background: #ffffff"));
    }

    #[test]
    fn document_embeds_reset_and_fonts() {
        let p = page(serde_json::json!({"width": 10, "height": 10}));
        let fonts = [FontAsset {
            family: "Inter".into(),
            data_uri: "data:font/ttf;base64,AA==".into(),
            format: "truetype",
        }];
        let html = build_document(&p, "<p>x</p>", &fonts, false);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("text-rendering: optimizeLegibility;"));
        assert!(html.contains("src: url('data:font/ttf;base64,AA==') format('truetype');"));
        assert!(html.contains("<p>x</p></div>"));
    }
}
