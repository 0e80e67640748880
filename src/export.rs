//! Helpers for packaging a rendered document: image discovery for upload and
//! inline-style minification.

use scraper::{Html, Selector};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// An `<img>` of the rendered document that can be externalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub ref_id: String,
    pub src: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Content-addressed name for the uploaded copy.
    pub file_name: String,
}

/// Image type of a source, `png` unless a data URI says otherwise.
pub fn export_type(src: &str) -> &'static str {
    if src.starts_with("data:image/jpeg") || src.starts_with("data:image/jpg") {
        "jpeg"
    } else if src.starts_with("data:image/gif") {
        "gif"
    } else if src.starts_with("data:image/webp") {
        "webp"
    } else {
        "png"
    }
}

pub fn export_file_name(src: &str) -> String {
    let digest = hex::encode(Sha256::digest(src.as_bytes()));
    format!("{}.{}", &digest[..16], export_type(src))
}

/// Every `<img>` carrying an `id`, in document order.
pub fn extract_image_descriptors(html: &str) -> Result<Vec<ImageDescriptor>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img[id]").map_err(|e| Error::Other(format!("bad selector: {:?}", e)))?;
    let dimension = |value: Option<&str>| value.and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok());
    Ok(document
        .select(&selector)
        .filter_map(|img| {
            let attrs = img.value();
            let src = attrs.attr("src").filter(|s| !s.is_empty())?;
            Some(ImageDescriptor {
                ref_id: attrs.attr("id").unwrap_or_default().to_string(),
                src: src.to_string(),
                width: dimension(attrs.attr("width")),
                height: dimension(attrs.attr("height")),
                file_name: export_file_name(src),
            })
        })
        .collect())
}

/// Split a declaration list on `;` outside parentheses, so data URIs inside
/// `url(...)` stay whole.
fn declarations(style: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in style.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                out.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&style[start..]);
    out
}

fn minify_style(style: &str) -> String {
    declarations(style)
        .into_iter()
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let (prop, value) = (prop.trim(), value.trim());
            (!prop.is_empty() && !value.is_empty()).then(|| format!("{}:{}", prop, value))
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Rewrite every `style="..."` attribute to `prop:value;prop:value`.
pub fn minify_inline_styles(html: &str) -> String {
    const ATTR: &str = " style=\"";
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(pos) = rest.find(ATTR) {
        let value_start = pos + ATTR.len();
        let Some(len) = rest[value_start..].find('"') else { break };
        out.push_str(&rest[..value_start]);
        out.push_str(&minify_style(&rest[value_start..value_start + len]));
        out.push('"');
        rest = &rest[value_start + len + 1..];
    }
    out.push_str(rest);
    out
}
