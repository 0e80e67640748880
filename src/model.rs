//! Page and element model decoded from the design JSON.
//!
//! The JSON produced upstream is loose: most fields are optional, numbers may
//! be `null`, and element variants share one flat object shape. Elements are
//! therefore decoded into a single flat [`Element`] struct and classified with
//! [`Element::kind`], which plays the role of the tagged union.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::style::css::num;
use crate::style::geometry::Rect;
use crate::Result;

/// Root of one rendering pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub width: f64,
    /// Zero means "auto"
    pub height: f64,
    pub background: Option<String>,
    #[serde(deserialize_with = "lenient_elements")]
    pub children: Vec<Element>,
}

impl Page {
    /// Decode a page, treating explicit `null`s as absent fields.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self> {
        strip_nulls(&mut value);
        Ok(serde_json::from_value(value)?)
    }

    /// The page's own frame, used as the root for top-level elements.
    pub fn frame(&self) -> Rect {
        Rect {
            x: 0.0,
            y: 0.0,
            width: self.width,
            height: self.height,
        }
    }
}

/// Decode either a bare page or an API envelope `{ "data": [page, ...] }`.
pub fn pages_from_json(json: &str) -> Result<Vec<Page>> {
    let value: Value = serde_json::from_str(json)?;
    match value.get("data") {
        Some(Value::Array(items)) => items.iter().cloned().map(Page::from_value).collect(),
        _ => Ok(vec![Page::from_value(value)?]),
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for v in map.values_mut() {
                strip_nulls(v);
            }
        }
        Value::Array(items) => {
            for v in items {
                strip_nulls(v);
            }
        }
        _ => {}
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Decode an element list one entry at a time, dropping entries that fail to
/// decode so a single malformed element cannot take down its siblings.
fn lenient_elements<'de, D>(deserializer: D) -> std::result::Result<Vec<Element>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            warn!("expected an element list, got {}", other);
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let id = item.get("id").map(|v| v.to_string()).unwrap_or_default();
            match serde_json::from_value::<Element>(item) {
                Ok(el) => Some(el),
                Err(e) => {
                    warn!("skipping malformed element #{} {}: {}", i, id, e);
                    None
                }
            }
        })
        .collect())
}

/// What an element renders as, derived from `type` / `elementType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Logo,
    Line,
    StarRating,
    Shape,
    Image,
    Group,
    Unknown,
}

impl ElementKind {
    /// Kinds whose renderer already accounts for the stroke outset.
    pub fn draws_own_outset(self) -> bool {
        matches!(self, ElementKind::Image | ElementKind::Line)
    }
}

/// Padding as it appears in element JSON.
///
/// Boxed elements use `vertical`/`horizontal` pixel amounts. Logos reuse the
/// same key with boolean anchor flags instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Padding {
    pub vertical: f64,
    pub horizontal: f64,
    pub padding_top: bool,
    pub padding_right: bool,
    pub padding_bottom: bool,
    pub padding_left: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

/// Linear gradient overlay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gradient {
    pub configs: Vec<GradientStop>,
    pub rotation: f64,
    pub opacity: Option<f64>,
}

impl Gradient {
    pub fn is_visible(&self) -> bool {
        !self.configs.is_empty() && self.opacity.unwrap_or(1.0) > 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SvgPrimitive {
    #[serde(rename = "type")]
    pub kind: String,
    pub d: Option<String>,
}

/// Vector primitive embedded in a shape element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SvgElement {
    pub svg_string: String,
    pub children: Vec<SvgPrimitive>,
    pub view_box_width: f64,
    pub view_box_height: f64,
}

impl SvgElement {
    /// `rect`, `ellipse`, `path`, ... of the first child, if any.
    pub fn primitive(&self) -> Option<&str> {
        self.children.first().map(|c| c.kind.as_str())
    }
}

/// A CSS value that upstream sends either as a number or a keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssNumber {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for CssNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CssNumber::Number(n) => f.write_str(&num(*n)),
            CssNumber::Text(s) => f.write_str(s),
        }
    }
}

/// A styled run of text: one rich-text character or one value-list entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextRun {
    pub text: String,
    pub fill: Option<String>,
    pub font_family: Option<String>,
    #[serde(alias = "s3FilePath")]
    pub font_source: Option<String>,
    pub font_size: Option<f64>,
    pub font_style: Option<String>,
    pub letter_spacing: Option<f64>,
    pub line_height: Option<CssNumber>,
    pub text_decoration: Option<String>,
    pub paragraph_spacing: f64,
}

impl TextRun {
    /// Explicit paragraph break sentinel in value lists
    pub fn is_break(&self) -> bool {
        self.text == "\n"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RichTextWord {
    pub chars: Vec<TextRun>,
}

/// One laid-out line of rich text. `x`/`width`/`height` are present when the
/// editor measured the line; they drive background path synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RichTextLine {
    pub words: Vec<RichTextWord>,
    pub x: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl RichTextLine {
    pub fn chars(&self) -> impl Iterator<Item = &TextRun> {
        self.words.iter().flat_map(|w| w.chars.iter())
    }

    pub fn ends_with_break(&self) -> bool {
        self.chars().last().map(|c| c.text.ends_with('\n')).unwrap_or(false)
    }
}

/// A visual element. See [`ElementKind`] for the variants sharing this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Element {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub element_type: Option<String>,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub opacity: Option<f64>,
    pub index: f64,
    pub padding: Padding,

    pub stroke_width: f64,
    pub stroke_bg_width: f64,
    pub stroke: Option<String>,
    pub stroke_background: Option<String>,

    pub corner_radius_top_left: f64,
    pub corner_radius_top_right: f64,
    pub corner_radius_bottom_left: f64,
    pub corner_radius_bottom_right: f64,

    pub shadow_enabled: bool,
    pub shadow_color: Option<String>,
    pub shadow_blur: f64,
    pub shadow_opacity: Option<f64>,
    pub shadow_offset_x: f64,
    pub shadow_offset_y: f64,

    pub overlay_fill: Option<String>,
    pub alpha: f64,
    pub gradient: Option<Gradient>,
    pub hyperlink: Option<String>,
    pub fill: Option<String>,

    // image / svg
    pub src: Option<String>,
    pub image_width: f64,
    pub image_height: f64,
    pub crop_x: f64,
    pub crop_y: f64,
    pub crop_width: Option<f64>,
    pub crop_height: Option<f64>,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,

    // shape
    pub svg_element: Option<SvgElement>,

    // logo
    pub padding_ratio: f64,
    pub logo_scale: Option<f64>,

    // line
    pub points: Vec<f64>,
    pub dash: Option<Vec<f64>>,

    // text
    pub text: Option<String>,
    pub rich_text_arr: Vec<RichTextLine>,
    pub value_list: Vec<TextRun>,
    pub align: Option<String>,
    pub vertical_align: Option<String>,
    pub text_transform: Option<String>,
    pub text_decoration: Option<String>,
    pub text_fill: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    #[serde(alias = "s3FilePath")]
    pub font_source: Option<String>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
    pub letter_spacing: f64,
    pub line_height: Option<CssNumber>,
    pub auto_fit_background_enabled: bool,

    // group
    pub element_ids: Vec<String>,
    #[serde(deserialize_with = "lenient_elements")]
    pub group_children: Vec<Element>,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        let type_name = self.type_name.as_deref();
        let element_type = self.element_type.as_deref();
        if type_name == Some("text") {
            return ElementKind::Text;
        }
        if type_name == Some("group")
            || element_type == Some("group")
            || !self.element_ids.is_empty()
            || !self.group_children.is_empty()
        {
            return ElementKind::Group;
        }
        match element_type {
            Some("logo") => ElementKind::Logo,
            Some("line") | Some("line_outline") => ElementKind::Line,
            Some("star_rating") => ElementKind::StarRating,
            Some("graphicShape") => ElementKind::Shape,
            Some("image") | Some("svg") | Some("complex_svg") => ElementKind::Image,
            _ => ElementKind::Unknown,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn opacity(&self) -> f64 {
        self.opacity.unwrap_or(1.0)
    }

    /// Background stroke when present, shape stroke otherwise.
    pub fn outline_width(&self) -> f64 {
        if self.stroke_bg_width != 0.0 {
            self.stroke_bg_width
        } else {
            self.stroke_width
        }
    }

    pub fn has_rich_text(&self) -> bool {
        !self.rich_text_arr.is_empty() || !self.value_list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_behave_like_missing_fields() {
        let page = Page::from_json(
            r#"{"width": 600, "height": null, "children": [
                {"id": 7, "elementType": "image", "rotation": null, "cropWidth": null}
            ]}"#,
        )
        .unwrap();
        assert_eq!(page.height, 0.0);
        let el = &page.children[0];
        assert_eq!(el.id, "7");
        assert_eq!(el.rotation, 0.0);
        assert_eq!(el.crop_width, None);
        assert_eq!(el.kind(), ElementKind::Image);
    }

    #[test]
    fn text_type_wins_over_element_type() {
        let el: Element =
            serde_json::from_str(r#"{"type": "text", "elementType": "logo"}"#).unwrap();
        assert_eq!(el.kind(), ElementKind::Text);
    }

    #[test]
    fn classifies_known_and_unknown_kinds() {
        let kind = |t: &str| {
            let el: Element =
                serde_json::from_value(serde_json::json!({ "elementType": t })).unwrap();
            el.kind()
        };
        assert_eq!(kind("line_outline"), ElementKind::Line);
        assert_eq!(kind("complex_svg"), ElementKind::Image);
        assert_eq!(kind("graphicShape"), ElementKind::Shape);
        assert_eq!(kind("star_rating"), ElementKind::StarRating);
        assert_eq!(kind("sticker"), ElementKind::Unknown);
    }

    #[test]
    fn group_detected_from_element_ids() {
        let el: Element = serde_json::from_str(r#"{"elementIds": ["a", "b"]}"#).unwrap();
        assert_eq!(el.kind(), ElementKind::Group);
    }

    #[test]
    fn font_source_accepts_s3_alias_and_line_height_keyword() {
        let run: TextRun = serde_json::from_str(
            r#"{"text": "a", "s3FilePath": "fonts/a.ttf", "lineHeight": "normal"}"#,
        )
        .unwrap();
        assert_eq!(run.font_source.as_deref(), Some("fonts/a.ttf"));
        assert_eq!(run.line_height, Some(CssNumber::Text("normal".into())));
    }

    #[test]
    fn malformed_element_is_dropped_without_its_siblings() {
        let page = Page::from_value(serde_json::json!({
            "width": 100,
            "children": [
                {"id": "bad", "elementType": "line", "points": "oops"},
                {"id": "ok", "elementType": "image", "x": 5},
                {"id": "str", "elementType": "image", "x": "10"},
                {"id": "g", "elementIds": ["m"], "groupChildren": [
                    {"id": "m", "type": "text", "text": "hi"},
                    {"id": "pad", "type": "text", "padding": 0}
                ]}
            ]
        }))
        .unwrap();
        let ids: Vec<&str> = page.children.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["ok", "g"]);
        assert_eq!(page.children[0].x, 5.0);
        let nested: Vec<&str> = page.children[1].group_children.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(nested, ["m"]);
    }

    #[test]
    fn non_list_children_decode_as_empty() {
        let page = Page::from_value(serde_json::json!({"width": 10, "children": {"id": "x"}})).unwrap();
        assert!(page.children.is_empty());
    }

    #[test]
    fn envelope_yields_all_pages() {
        let pages = pages_from_json(r#"{"data": [{"width": 1}, {"width": 2}]}"#).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].width, 2.0);
    }
}
