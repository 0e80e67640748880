//! Text elements: plain text, value lists and per-character rich text.
//!
//! Rich runs draw their own underline and strike-through as SVG segments
//! placed from each run's font size, so mixed sizes on one line still line
//! up. Auto-fit backgrounds of wrapped multi-line text are drawn as a single
//! rounded SVG path hugging every line instead of a rectangle.

use crate::model::{Element, RichTextLine, TextRun};
use crate::rendering::effects::{border_radius, drop_shadow};
use crate::rendering::ElementContext;
use crate::style::css::{escape_attr, escape_text, num, px, StyleMap};
use crate::Result;

const DEFAULT_FONT_SIZE: f64 = 16.0;
/// Ascent as a fraction of the font size, used to locate the baseline.
const ASCENT: f64 = 0.8;
const UNDERLINE_OFFSET: f64 = 0.1;
const STRIKE_OFFSET: f64 = -0.3;

/// CSS flex alignment for `verticalAlign`.
const VERTICAL_ALIGN: &[(&str, &str)] = &[("top", "start"), ("middle", "center"), ("bottom", "end")];

const FONT_WEIGHTS: &[(&str, u32)] = &[
    ("Light", 300),
    ("Regular", 400),
    ("Medium", 500),
    ("Bold", 700),
    ("Black", 900),
];

pub fn vertical_align_to_flex(value: &str) -> &'static str {
    VERTICAL_ALIGN
        .iter()
        .find(|(k, _)| *k == value)
        .map(|(_, v)| *v)
        .unwrap_or("center")
}

/// Named or numeric font weight to a CSS weight.
pub fn map_font_weight(weight: &str) -> Option<u32> {
    let weight = weight.trim();
    FONT_WEIGHTS
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(weight))
        .map(|(_, v)| *v)
        .or_else(|| weight.parse().ok())
}

/// Apply `uppercase`, `titleCase` or `sentenceCase` to plain text.
pub fn apply_text_transform(text: &str, transform: Option<&str>) -> String {
    match transform {
        Some("uppercase") => text.to_uppercase(),
        Some("titleCase") => text
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" "),
        Some("sentenceCase") => text
            .split('.')
            .map(|sentence| match sentence.find(|c: char| c.is_alphabetic()) {
                Some(pos) => {
                    let (prefix, rest) = sentence.split_at(pos);
                    let mut chars = rest.chars();
                    let mut out = prefix.to_string();
                    if let Some(first) = chars.next() {
                        out.extend(first.to_uppercase());
                    }
                    out.extend(chars.flat_map(char::to_lowercase));
                    out
                }
                None => sentence.to_lowercase(),
            })
            .collect::<Vec<String>>()
            .join("."),
        _ => text.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Decorations {
    underline: bool,
    strike: bool,
}

impl Decorations {
    fn parse(value: Option<&str>) -> Self {
        let value = value.unwrap_or("").to_ascii_lowercase();
        Self {
            underline: value.contains("underline"),
            strike: value.contains("line-through") || value.contains("strike"),
        }
    }

    fn any(&self) -> bool {
        self.underline || self.strike
    }
}

fn font_style_props(styles: &mut StyleMap, font_style: Option<&str>) {
    let Some(font_style) = font_style else { return };
    for token in font_style.split_whitespace() {
        match token {
            "italic" | "oblique" => {
                styles.set("fontStyle", token);
            }
            "bold" => {
                styles.set("fontWeight", "700");
            }
            t => {
                if let Some(w) = map_font_weight(t) {
                    styles.set("fontWeight", w.to_string());
                }
            }
        }
    }
}

fn run_style(run: &TextRun) -> StyleMap {
    let mut styles = StyleMap::new();
    styles.set_opt("color", run.fill.clone());
    if let Some(ls) = run.letter_spacing.filter(|v| *v != 0.0) {
        styles.set("letterSpacing", px(ls));
    }
    styles.set_opt("lineHeight", run.line_height.as_ref().map(|l| l.to_string()));
    styles.set_opt("fontSize", run.font_size.map(px));
    styles.set_opt("fontFamily", run.font_family.as_ref().map(|f| format!("'{}'", f)));
    font_style_props(&mut styles, run.font_style.as_deref());
    styles.set("whiteSpace", "pre");
    styles
}

/// Horizontal SVG segments over the span at the run's own baseline.
fn decoration_svg(decorations: Decorations, font_size: f64) -> String {
    let baseline = ASCENT * font_size;
    let thickness = (font_size / 15.0).max(1.0);
    let mut lines = String::new();
    let mut push = |y: f64| {
        lines.push_str(&format!(
            r#"<line x1="0" y1="{y}" x2="100%" y2="{y}" stroke="currentColor" stroke-width="{t}" />"#,
            y = num(y),
            t = num(thickness)
        ));
    };
    if decorations.underline {
        push(baseline + UNDERLINE_OFFSET * font_size);
    }
    if decorations.strike {
        push(baseline + STRIKE_OFFSET * font_size);
    }
    let style = StyleMap::new()
        .with("position", "absolute")
        .with("left", "0")
        .with("top", "0")
        .with("width", "100%")
        .with("height", "100%")
        .with("overflow", "visible")
        .with("pointerEvents", "none");
    format!(
        r#"<svg style="{}" xmlns="http://www.w3.org/2000/svg" aria-hidden="true">{}</svg>"#,
        style.to_css(),
        lines
    )
}

fn text_markup(text: &str) -> String {
    escape_text(text).replace('\n', "<br />")
}

/// One styled span. `default_size` stands in for runs without a font size.
fn render_span(text: &str, run: &TextRun, default_size: f64) -> String {
    let mut styles = run_style(run);
    let decorations = Decorations::parse(run.text_decoration.as_deref());
    let mut inner = text_markup(text);
    if decorations.any() && !text.trim().is_empty() {
        styles.set("position", "relative");
        inner.push_str(&decoration_svg(decorations, run.font_size.unwrap_or(default_size)));
    }
    format!(r#"<span style="{}">{}</span>"#, styles.to_css(), inner)
}

/// Spans for a sequence of runs, merging neighbours that render identically.
fn render_runs<'a>(runs: impl Iterator<Item = &'a TextRun>, default_size: f64) -> String {
    let renders_alike = |a: &TextRun, b: &TextRun| {
        run_style(a) == run_style(b)
            && Decorations::parse(a.text_decoration.as_deref()) == Decorations::parse(b.text_decoration.as_deref())
    };
    let mut merged: Vec<(String, &TextRun)> = Vec::new();
    for run in runs {
        if let Some((text, last)) = merged.last_mut() {
            if renders_alike(*last, run) {
                text.push_str(&run.text);
                continue;
            }
        }
        merged.push((run.text.clone(), run));
    }
    merged
        .iter()
        .map(|(text, run)| render_span(text, run, default_size))
        .collect()
}

fn paragraph(spacing: f64, body: &str) -> String {
    format!(r#"<p style="margin-bottom: {}">{}</p>"#, px(spacing), body)
}

/// Value-list text: paragraphs end at `"\n"` runs, each spaced by the largest
/// `paragraphSpacing` among its runs. The last paragraph gets no spacing.
pub fn value_list_html(runs: &[TextRun], default_size: f64) -> String {
    let mut paragraphs: Vec<&[TextRun]> = Vec::new();
    let mut start = 0;
    for (i, run) in runs.iter().enumerate() {
        if run.is_break() {
            paragraphs.push(&runs[start..=i]);
            start = i + 1;
        }
    }
    if start < runs.len() {
        paragraphs.push(&runs[start..]);
    }

    let last = paragraphs.len().saturating_sub(1);
    paragraphs
        .iter()
        .enumerate()
        .map(|(i, para)| {
            let spacing = if i == last {
                0.0
            } else {
                para.iter()
                    .filter(|r| !r.is_break())
                    .map(|r| r.paragraph_spacing)
                    .fold(0.0, f64::max)
            };
            paragraph(spacing, &render_runs(para.iter(), default_size))
        })
        .collect()
}

/// Rich text: one paragraph per line. When some lines end in an explicit
/// break, only those lines are followed by paragraph spacing; otherwise
/// every line but the last is.
pub fn rich_text_html(lines: &[RichTextLine], default_size: f64) -> String {
    let explicit_breaks = lines.iter().any(RichTextLine::ends_with_break);
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let spaced = i != last && (!explicit_breaks || line.ends_with_break());
            let spacing = if spaced {
                line.chars().map(|c| c.paragraph_spacing).fold(0.0, f64::max)
            } else {
                0.0
            };
            paragraph(spacing, &render_runs(line.chars(), default_size))
        })
        .collect()
}

/// Measured extent of one rendered line, relative to the content box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBox {
    pub x: f64,
    pub width: f64,
    pub height: f64,
}

/// Line boxes for auto-fit backgrounds, when every line is measured and the
/// widths actually differ.
pub fn measured_lines(el: &Element) -> Option<Vec<LineBox>> {
    if !el.auto_fit_background_enabled || el.rich_text_arr.len() < 2 {
        return None;
    }
    let align = el.align.as_deref().unwrap_or("left");
    let mut boxes = Vec::with_capacity(el.rich_text_arr.len());
    for line in &el.rich_text_arr {
        let (width, height) = (line.width?, line.height?);
        let x = line.x.unwrap_or(match align {
            "center" => (el.width - width) / 2.0,
            "right" => el.width - width,
            _ => 0.0,
        });
        boxes.push(LineBox { x, width, height });
    }
    let min = boxes.iter().map(|b| b.width).fold(f64::INFINITY, f64::min);
    let max = boxes.iter().map(|b| b.width).fold(f64::NEG_INFINITY, f64::max);
    (max - min > 0.5).then_some(boxes)
}

fn arc(r: f64, sweep: u8, x: f64, y: f64) -> String {
    format!("A {r} {r} 0 0 {sweep} {x} {y}", r = num(r), sweep = sweep, x = num(x), y = num(y))
}

fn point(cmd: char, x: f64, y: f64) -> String {
    format!("{} {} {}", cmd, num(x), num(y))
}

/// Closed outline around stacked line boxes grown by the padding, traced
/// clockwise: down the right edges, back up the left edges. Convex corners
/// sweep 1, concave corners sweep 0. Each corner radius is capped by half the
/// adjacent heights and half the width step so arcs never cross.
pub fn background_path(lines: &[LineBox], pad_h: f64, pad_v: f64, radius: f64) -> String {
    let n = lines.len();
    if n == 0 {
        return String::new();
    }
    let left: Vec<f64> = lines.iter().map(|l| l.x).collect();
    let right: Vec<f64> = lines.iter().map(|l| l.x + l.width + 2.0 * pad_h).collect();
    // row boundaries: the first and last rows carry the vertical padding
    let mut bounds = Vec::with_capacity(n + 1);
    bounds.push(0.0);
    let mut y = pad_v;
    for (i, line) in lines.iter().enumerate() {
        y += line.height;
        bounds.push(if i == n - 1 { y + pad_v } else { y });
    }
    let height = |i: usize| bounds[i + 1] - bounds[i];
    let corner = |i: usize| radius.min(height(i) / 2.0).min((right[i] - left[i]) / 2.0).max(0.0);
    let step = |i: usize, delta: f64| radius.min(height(i) / 2.0).min(height(i + 1) / 2.0).min(delta.abs() / 2.0).max(0.0);

    let mut d = Vec::new();
    let r0 = corner(0);
    d.push(point('M', left[0] + r0, bounds[0]));
    d.push(point('L', right[0] - r0, bounds[0]));
    d.push(arc(r0, 1, right[0], bounds[0] + r0));

    for i in 0..n - 1 {
        let yb = bounds[i + 1];
        let delta = right[i + 1] - right[i];
        if delta.abs() <= 0.5 {
            continue;
        }
        let r = step(i, delta);
        d.push(point('L', right[i], yb - r));
        if delta > 0.0 {
            d.push(arc(r, 0, right[i] + r, yb));
            d.push(point('L', right[i + 1] - r, yb));
            d.push(arc(r, 1, right[i + 1], yb + r));
        } else {
            d.push(arc(r, 1, right[i] - r, yb));
            d.push(point('L', right[i + 1] + r, yb));
            d.push(arc(r, 0, right[i + 1], yb + r));
        }
    }

    let rl = corner(n - 1);
    let bottom = bounds[n];
    d.push(point('L', right[n - 1], bottom - rl));
    d.push(arc(rl, 1, right[n - 1] - rl, bottom));
    d.push(point('L', left[n - 1] + rl, bottom));
    d.push(arc(rl, 1, left[n - 1], bottom - rl));

    for i in (1..n).rev() {
        let yb = bounds[i];
        let delta = left[i - 1] - left[i];
        if delta.abs() <= 0.5 {
            continue;
        }
        let r = step(i - 1, delta);
        d.push(point('L', left[i], yb + r));
        if delta < 0.0 {
            d.push(arc(r, 0, left[i] - r, yb));
            d.push(point('L', left[i - 1] + r, yb));
            d.push(arc(r, 1, left[i - 1], yb - r));
        } else {
            d.push(arc(r, 1, left[i] + r, yb));
            d.push(point('L', left[i - 1] - r, yb));
            d.push(arc(r, 0, left[i - 1], yb - r));
        }
    }

    d.push(point('L', left[0], bounds[0] + r0));
    d.push(arc(r0, 1, left[0] + r0, bounds[0]));
    d.push("Z".to_string());
    d.join(" ")
}

fn background_svg(el: &Element, lines: &[LineBox], stroke_width: f64) -> String {
    let (pad_h, pad_v) = (el.padding.horizontal, el.padding.vertical);
    let width = lines.iter().map(|l| l.x + l.width).fold(el.width, f64::max) + 2.0 * pad_h;
    let height = lines.iter().map(|l| l.height).sum::<f64>() + 2.0 * pad_v;
    let d = background_path(lines, pad_h, pad_v, el.corner_radius_top_left);
    let fill = el.fill.as_deref().unwrap_or("transparent");
    let stroke = match el.stroke_background.as_deref() {
        Some(color) if stroke_width > 0.0 => format!(
            r#" stroke="{}" stroke-width="{}""#,
            escape_attr(color),
            num(stroke_width)
        ),
        _ => String::new(),
    };
    let style = StyleMap::new()
        .with("position", "absolute")
        .with("left", px(-pad_h))
        .with("top", px(-pad_v))
        .with("zIndex", "-1")
        .with("overflow", "visible");
    format!(
        r#"<svg style="{}" width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg"><path d="{}" fill="{}"{} /></svg>"#,
        style.to_css(),
        d,
        escape_attr(fill),
        stroke,
        w = num(width),
        h = num(height)
    )
}

pub fn render_text(el: &Element, ctx: &ElementContext) -> Result<String> {
    let outset = ctx.stroke_outset;
    let (pad_h, pad_v) = (el.padding.horizontal, el.padding.vertical);
    let radius = border_radius(el);
    let fill = el.fill.as_deref().unwrap_or("inherit");
    let stroke_bg = el.stroke_background.as_deref().unwrap_or("transparent");
    let font_size = el.font_size.unwrap_or(DEFAULT_FONT_SIZE);
    let path_lines = measured_lines(el);

    let mut container = StyleMap::new()
        .with("position", "relative")
        .with("display", "flex")
        .with("width", "100%")
        .with("height", "100%")
        .with("top", px(-pad_v - outset))
        .with("left", px(-pad_h - outset));
    let container_bg = if el.auto_fit_background_enabled && path_lines.is_none() {
        fill
    } else {
        "transparent"
    };
    container
        .set("backgroundColor", container_bg)
        .set("borderRadius", radius.clone())
        .set("alignItems", vertical_align_to_flex(el.vertical_align.as_deref().unwrap_or("middle")))
        .set("padding", format!("{} {}", px(pad_v), px(pad_h)))
        .set("opacity", num(el.opacity()));
    if outset > 0.0 && path_lines.is_none() {
        container.set("border", format!("{} solid {}", px(outset), stroke_bg));
    }

    let mut align = StyleMap::new()
        .with("textAlign", el.align.clone().unwrap_or_else(|| "left".to_string()))
        .with("width", "100%")
        .with("height", "fit-content")
        .with("backgroundColor", if el.auto_fit_background_enabled { "transparent" } else { fill });
    let decoration = if el.has_rich_text() {
        "none".to_string()
    } else {
        el.text_decoration.clone().unwrap_or_else(|| "none".to_string())
    };
    align
        .set("textDecoration", decoration)
        .set("color", el.text_fill.clone().unwrap_or_else(|| "black".to_string()))
        .set("fontSize", px(font_size))
        .set("letterSpacing", px(el.letter_spacing))
        .set(
            "lineHeight",
            el.line_height.as_ref().map(|l| l.to_string()).unwrap_or_else(|| "normal".to_string()),
        )
        .set_opt("filter", drop_shadow(el, ctx)?)
        .set("fontFamily", format!("'{}'", el.font_family.as_deref().unwrap_or("inherit")));
    if let Some(weight) = el.font_weight.as_deref().and_then(map_font_weight) {
        align.set("fontWeight", weight.to_string());
    }
    font_style_props(&mut align, el.font_style.as_deref());

    let background = match &path_lines {
        Some(lines) => {
            align.set("position", "relative").set("zIndex", "0");
            background_svg(el, lines, outset * 2.0)
        }
        None => String::new(),
    };

    let content = if !el.rich_text_arr.is_empty() {
        rich_text_html(&el.rich_text_arr, font_size)
    } else if !el.value_list.is_empty() {
        value_list_html(&el.value_list, font_size)
    } else {
        let text = apply_text_transform(el.text.as_deref().unwrap_or(""), el.text_transform.as_deref());
        format!(r#"<span style="white-space: pre-wrap">{}</span>"#, text_markup(&text))
    };

    Ok(format!(
        r#"<div style="{}"><div style="{}">{}{}</div></div>"#,
        container.to_css(),
        align.to_css(),
        background,
        content
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, spacing: f64) -> TextRun {
        TextRun {
            text: text.to_string(),
            paragraph_spacing: spacing,
            ..Default::default()
        }
    }

    fn text_element(json: serde_json::Value) -> Element {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn text_transforms() {
        assert_eq!(apply_text_transform("hello big world", Some("titleCase")), "Hello Big World");
        assert_eq!(apply_text_transform("abc", Some("uppercase")), "ABC");
        assert_eq!(
            apply_text_transform("hello THERE. \"quoted\" text", Some("sentenceCase")),
            "Hello there. \"Quoted\" text"
        );
        assert_eq!(apply_text_transform("As Is", None), "As Is");
    }

    #[test]
    fn font_weights_map_names_and_numbers() {
        assert_eq!(map_font_weight("Black"), Some(900));
        assert_eq!(map_font_weight("600"), Some(600));
        assert_eq!(map_font_weight("normal"), None);
    }

    #[test]
    fn value_list_spacing_skips_last_paragraph() {
        let runs = vec![run("a", 4.0), run("b", 10.0), run("\n", 99.0), run("c", 7.0)];
        let html = value_list_html(&runs, 16.0);
        assert_eq!(html.matches("<p ").count(), 2);
        assert!(html.starts_with(r#"<p style="margin-bottom: 10px">"#));
        assert!(html.contains(r#"<p style="margin-bottom: 0px">"#));
        assert!(html.contains("<br />"));
    }

    #[test]
    fn identical_neighbours_merge_into_one_span() {
        let runs = vec![run("a", 0.0), run("b", 0.0)];
        let html = value_list_html(&runs, 16.0);
        assert!(html.contains(r#"<span style="white-space: pre">ab</span>"#));
    }

    #[test]
    fn rich_text_spacing_follows_explicit_breaks() {
        let line = |text: &str, spacing: f64| RichTextLine {
            words: vec![crate::model::RichTextWord { chars: vec![run(text, spacing)] }],
            ..Default::default()
        };
        let lines = vec![line("one", 5.0), line("two\n", 8.0), line("three", 3.0)];
        let html = rich_text_html(&lines, 16.0);
        let spacings: Vec<&str> = html.match_indices("margin-bottom: ").map(|(i, _)| &html[i + 15..i + 18]).collect();
        assert_eq!(spacings, ["0px", "8px", "0px"]);

        let soft = vec![line("one", 5.0), line("two", 8.0)];
        let html = rich_text_html(&soft, 16.0);
        assert!(html.starts_with(r#"<p style="margin-bottom: 5px">"#));
    }

    #[test]
    fn decorations_are_svg_segments_at_run_metrics() {
        let mut r = run("under", 0.0);
        r.font_size = Some(30.0);
        r.text_decoration = Some("underline line-through".into());
        let html = render_span(&r.text, &r, 16.0);
        assert!(html.contains("position: relative"));
        assert!(html.contains(r#"y1="27""#));
        assert!(html.contains(r#"y1="15""#));
        assert!(html.contains(r#"stroke-width="2""#));
    }

    #[test]
    fn background_path_for_two_lines() {
        let lines = [
            LineBox { x: 0.0, width: 100.0, height: 20.0 },
            LineBox { x: 0.0, width: 60.0, height: 20.0 },
        ];
        let d = background_path(&lines, 0.0, 0.0, 4.0);
        assert!(d.starts_with("M 4 0 L 96 0 A 4 4 0 0 1 100 4"));
        // step inward at y=20: convex then concave
        assert!(d.contains("L 100 16 A 4 4 0 0 1 96 20 L 64 20 A 4 4 0 0 0 60 24"));
        assert!(d.ends_with("L 0 4 A 4 4 0 0 1 4 0 Z"));
    }

    #[test]
    fn plain_text_uses_transform_and_css_decoration() {
        let el = text_element(serde_json::json!({
            "type": "text", "text": "hi <b>", "textTransform": "uppercase",
            "textDecoration": "underline", "fontWeight": "Bold"
        }));
        let html = render_text(&el, &ElementContext::default()).unwrap();
        assert!(html.contains("HI &lt;B&gt;"));
        assert!(html.contains("text-decoration: underline"));
        assert!(html.contains("font-weight: 700"));
        assert!(html.contains("align-items: center"));
    }

    #[test]
    fn auto_fit_with_uneven_lines_draws_path_background() {
        let el = text_element(serde_json::json!({
            "type": "text", "width": 100, "autoFitBackgroundEnabled": true, "fill": "#eee",
            "align": "center", "padding": {"vertical": 2, "horizontal": 3},
            "richTextArr": [
                {"width": 100, "height": 20, "words": [{"chars": [{"text": "long line"}]}]},
                {"width": 40, "height": 20, "words": [{"chars": [{"text": "short"}]}]}
            ]
        }));
        let html = render_text(&el, &ElementContext::default()).unwrap();
        assert!(html.contains("<path d=\"M "));
        assert!(html.contains(r##"fill="#eee""##));
        assert!(html.contains("left: -3px; top: -2px; z-index: -1"));
    }
}
