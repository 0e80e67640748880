//! Five-star rating element drawn from a fixed SVG template.

use crate::model::Element;
use crate::rendering::effects::{drop_shadow, full_layer, mask, overlay_background};
use crate::rendering::ElementContext;
use crate::style::css::{num, StyleMap};
use crate::style::svg::{rewrite_svg, stretchy_svg, svg_data_uri};
use crate::Result;

pub const STAR_RATING_SVG: &str = concat!(
    r#"<svg style="width: 100%; height: 100%; mix-blend-mode: multiply;" preserveAspectRatio="none" width="500" height="100" viewBox="0 0 500 90" xmlns="http://www.w3.org/2000/svg">"#,
    r#"<defs><path id="a" d="m50 5 11.8 30H95L67.6 55l9.6 30L50 65 22.8 85l9.6-30L5 35h33.2Z" fill="none" opacity="" stroke="" stroke-width=""/></defs>"#,
    r##"<use href="#a"/><use href="#a" x="100"/><use href="#a" x="200"/><use href="#a" x="300"/><use href="#a" x="400"/></svg>"##
);

/// The template painted with the element's fill and, when both are set, its
/// stroke color and width.
fn painted_stars(el: &Element) -> Result<String> {
    let fill = el.fill.clone().unwrap_or_else(|| "none".to_string());
    let stroke = el
        .stroke
        .as_deref()
        .filter(|s| !s.is_empty() && el.stroke_width != 0.0)
        .map(str::to_string);
    let painted = rewrite_svg(STAR_RATING_SVG, |node| {
        if node.get("fill").is_some() {
            node.set("fill", fill.clone());
        }
        if let Some(stroke) = &stroke {
            if node.get("stroke").is_some() {
                node.set("stroke", stroke.clone());
            }
            if node.get("stroke-width").is_some() {
                node.set("stroke-width", num(el.stroke_width));
            }
        }
    })?;
    stretchy_svg(&painted)
}

pub fn render_star(el: &Element, ctx: &ElementContext) -> Result<String> {
    let stars = painted_stars(el)?;
    let mask_src = svg_data_uri(&stars);

    let mut svg_style = full_layer(0);
    svg_style.set_opt("filter", drop_shadow(el, ctx)?);
    let svg_style = svg_style.to_css();
    let id = (!el.id.is_empty()).then(|| format!("star-{}", el.id));
    let sized = rewrite_svg(&stars, |node| {
        if node.is_root_svg() {
            node.set("width", num(el.width));
            node.set("height", num(el.height));
            if let Some(id) = &id {
                node.set("id", id.clone());
            }
            node.set("style", svg_style.clone());
        }
    })?;

    let container = StyleMap::new()
        .with("width", "100%")
        .with("height", "100%")
        .with("overflow", "hidden")
        .with("position", "relative")
        .with("opacity", num(el.opacity()))
        .with("objectFit", "fill");

    let overlay = match overlay_background(el)? {
        Some(bg) => {
            let mut styles = full_layer(1);
            mask(&mut styles, &mask_src);
            styles.merge(&bg);
            format!(r#"<div style="{}"></div>"#, styles.to_css())
        }
        None => String::new(),
    };

    Ok(format!(
        r#"<div style="{}">{}{}</div>"#,
        container.to_css(),
        sized,
        overlay
    ))
}
