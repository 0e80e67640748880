//! Straight lines. The SVG viewport encodes the length; the wrapper's rotation
//! (set by the layout composer) encodes the angle.

use crate::model::Element;
use crate::rendering::effects::{drop_shadow, full_layer, overlay_element};
use crate::rendering::ElementContext;
use crate::style::color::to_rgba;
use crate::style::css::{num, StyleMap};
use crate::style::geometry::line_length;
use crate::{Error, Result};

/// `transform-origin` pivoting on the stroke center of the start point.
pub fn line_origin(el: &Element) -> String {
    format!("left {}px", num(el.stroke_width / 2.0))
}

pub fn render_line(el: &Element, ctx: &ElementContext) -> Result<String> {
    let length = line_length(&el.points).ok_or_else(|| {
        Error::InvalidElement(format!("line {} needs four points, got {}", el.id, el.points.len()))
    })?;
    let sw = el.stroke_width;
    let color = to_rgba(el.stroke.as_deref().unwrap_or("#000000"), el.opacity())?;

    let mut svg_style = StyleMap::new()
        .with("color", color)
        .with("position", "absolute")
        .with("left", "0")
        .with("top", "0")
        .with("overflow", "visible")
        .with("zIndex", "0");
    svg_style.set_opt("filter", drop_shadow(el, ctx)?);

    let dash = match el.dash.as_deref() {
        Some(d) if !d.is_empty() => format!(
            r#" stroke-dasharray="{}""#,
            d.iter().map(|v| num(*v)).collect::<Vec<_>>().join(",")
        ),
        _ => String::new(),
    };
    let container = StyleMap::new()
        .with("width", "100%")
        .with("height", "100%")
        .with("position", "relative");

    Ok(format!(
        concat!(
            r#"<div style="{container}">"#,
            r#"<svg style="{svg}" width="{len}" height="{sw}" viewBox="0 0 {len} {sw}" fill="currentColor" stroke="currentColor" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<line x1="0" y1="{mid}" x2="{len}" y2="{mid}" stroke-width="{sw}"{dash} />"#,
            r#"</svg>{overlay}</div>"#
        ),
        container = container.to_css(),
        svg = svg_style.to_css(),
        len = num(length),
        sw = num(sw),
        mid = num(sw / 2.0),
        dash = dash,
        overlay = overlay_element(el, full_layer(1))?,
    ))
}
