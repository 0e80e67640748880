//! SVG markup rewriting on top of a streaming XML parser.
//!
//! Nothing here needs a DOM: every transformation is an attribute-map edit
//! applied to each element as it streams past, with the rest of the markup
//! copied through unchanged.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::style::css::num;
use crate::{Error, Result};

/// Paint values that are left alone when recoloring.
const KEEP_PAINTS: &[&str] = &["none", "transparent", "rgba(0,0,0,0)", "rgba(255,255,255,0)"];

/// An element's name and attributes, open for editing.
#[derive(Debug, Clone)]
pub struct SvgNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// Nesting depth; the document element is at 0.
    pub depth: usize,
}

impl SvgNode {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn set_if_absent(&mut self, key: &str, value: impl Into<String>) {
        if self.get(key).is_none() {
            self.set(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn is_root_svg(&self) -> bool {
        self.depth == 0 && self.name == "svg"
    }
}

fn svg_err(e: impl std::fmt::Display) -> Error {
    Error::SvgError(e.to_string())
}

/// Stream `markup` through `edit`, which may mutate every element's
/// attributes. Text, comments and declarations are copied verbatim.
pub fn rewrite_svg<F>(markup: &str, mut edit: F) -> Result<String>
where
    F: FnMut(&mut SvgNode),
{
    let mut reader = Reader::from_str(markup);
    let mut writer = Writer::new(Vec::with_capacity(markup.len()));
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let start = edited_start(&e, depth, &mut edit)?;
                writer.write_event(Event::Start(start)).map_err(svg_err)?;
                depth += 1;
            }
            Event::Empty(e) => {
                let start = edited_start(&e, depth, &mut edit)?;
                writer.write_event(Event::Empty(start)).map_err(svg_err)?;
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e)).map_err(svg_err)?;
            }
            Event::Eof => break,
            other => writer.write_event(other).map_err(svg_err)?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(svg_err)
}

fn edited_start<F>(e: &BytesStart<'_>, depth: usize, edit: &mut F) -> Result<BytesStart<'static>>
where
    F: FnMut(&mut SvgNode),
{
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(svg_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    let mut node = SvgNode { name, attrs, depth };
    edit(&mut node);

    let mut start = BytesStart::new(node.name);
    for (k, v) in &node.attrs {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    Ok(start)
}

fn parse_length(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").trim().parse().ok()
}

/// Let an SVG stretch to its container: drop the root `width`/`height`,
/// derive a `viewBox` from them when missing and default
/// `preserveAspectRatio` to `none`.
pub fn stretchy_svg(markup: &str) -> Result<String> {
    rewrite_svg(markup, |node| {
        if !node.is_root_svg() {
            return;
        }
        let width = node.remove("width").as_deref().and_then(parse_length);
        let height = node.remove("height").as_deref().and_then(parse_length);
        if node.get("viewBox").is_none() {
            if let (Some(w), Some(h)) = (width, height) {
                node.set("viewBox", format!("0 0 {} {}", num(w), num(h)));
            }
        }
        node.set_if_absent("preserveAspectRatio", "none");
    })
}

/// Whether an existing paint should survive recoloring.
fn keeps_paint(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("url(") || KEEP_PAINTS.contains(&compact.as_str())
}

fn recolor_style(style: &str, props: &[&str], color: &str) -> String {
    style
        .split(';')
        .filter(|decl| !decl.trim().is_empty())
        .map(|decl| match decl.split_once(':') {
            Some((prop, value)) if props.contains(&prop.trim()) && !keeps_paint(value) => {
                Cow::Owned(format!("{}: {}", prop.trim(), color))
            }
            _ => Cow::Borrowed(decl.trim()),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Repaint every `fill`/`stroke` (attribute or inline style) and gradient
/// `stop-color` with `color`. Transparent paints and paint-server references
/// are kept. A transparent `color` leaves the markup untouched.
pub fn recolor_svg_markup(markup: &str, color: &str) -> Result<String> {
    if keeps_paint(color) || crate::style::color::is_transparent(color) {
        return rewrite_svg(markup, |_| {});
    }
    rewrite_svg(markup, |node| {
        for key in ["fill", "stroke"] {
            if let Some(v) = node.get(key) {
                if !keeps_paint(v) {
                    node.set(key, color);
                }
            }
        }
        if node.name == "stop" {
            if let Some(v) = node.get("stop-color") {
                if !keeps_paint(v) {
                    node.set("stop-color", color);
                }
            }
        }
        if let Some(style) = node.get("style") {
            let props: &[&str] = if node.name == "stop" {
                &["fill", "stroke", "stop-color"]
            } else {
                &["fill", "stroke"]
            };
            let rewritten = recolor_style(style, props, color);
            node.set("style", rewritten);
        }
        if node.is_root_svg() {
            node.set_if_absent("fill", color);
        }
    })
}

/// [`recolor_svg_markup`] packaged as a base64 data URI.
pub fn recolor_svg(markup: &str, color: &str) -> Result<String> {
    Ok(svg_data_uri(&recolor_svg_markup(markup, color)?))
}

pub fn svg_data_uri(markup: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(markup.as_bytes()))
}

/// Heuristic used to decide whether a source needs SVG treatment.
pub fn looks_like_svg(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.starts_with("data:image/svg")
        || lower.split(['?', '#']).next().map_or(false, |p| p.ends_with(".svg"))
        || lower.trim_start().starts_with("<svg")
}
