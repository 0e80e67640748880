//! Vector shapes, optionally filled with a cropped raster image.
//!
//! The shape's own SVG is turned into a silhouette that is shown as the fill
//! and reused as a CSS mask for the image, overlay and stroke layers.

use crate::model::Element;
use crate::rendering::effects::{border_radius, drop_shadow, full_layer, mask, overlay_element};
use crate::rendering::image::crop_box;
use crate::rendering::ElementContext;
use crate::style::color::{is_transparent, normalize};
use crate::style::css::{num, px, StyleMap};
use crate::style::svg::{rewrite_svg, stretchy_svg, svg_data_uri};
use crate::{Error, Result};

const PRIMITIVES: &[&str] = &["path", "rect", "ellipse", "circle", "polygon", "polyline", "line"];

/// Paint every primitive with `color` and drop strokes.
pub fn silhouette(markup: &str, color: &str) -> Result<String> {
    rewrite_svg(markup, |node| {
        if node.is_root_svg() || PRIMITIVES.contains(&node.name.as_str()) {
            node.set("fill", color);
            node.set("stroke", "none");
            node.remove("stroke-width");
            if let Some(style) = node.get("style") {
                let kept = style
                    .split(';')
                    .filter(|decl| {
                        let prop = decl.split(':').next().unwrap_or("").trim();
                        !prop.is_empty() && !matches!(prop, "fill" | "stroke" | "stroke-width")
                    })
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join("; ");
                node.set("style", kept);
            }
        }
    })
}

/// Crop origin for ellipses, whose silhouette is anchored at its center.
fn recentered(el: &Element, is_ellipse: bool) -> Element {
    let mut el = el.clone();
    if is_ellipse {
        el.crop_x = 0.5 + el.crop_x - 0.5 * el.crop_width.unwrap_or(1.0);
        el.crop_y = 0.5 + el.crop_y - 0.5 * el.crop_height.unwrap_or(1.0);
    }
    el
}

fn stroke_layer(el: &Element, primitive: Option<&str>, mask_src: &str) -> Result<String> {
    let color = match el.stroke.as_deref() {
        Some(c) if el.stroke_width > 0.0 && !is_transparent(c) => normalize(c)?,
        _ => return Ok(String::new()),
    };
    let sw = el.stroke_width;
    let mut styles = full_layer(3);
    match primitive {
        Some("rect") | Some("ellipse") => {
            let radius = if primitive == Some("ellipse") {
                "50%".to_string()
            } else {
                border_radius(el)
            };
            styles
                .set("border", format!("{} solid {}", px(sw), color))
                .set("borderRadius", radius)
                .set("boxSizing", "border-box");
            mask(&mut styles, mask_src);
        }
        _ => {
            // outer silhouette minus a centered copy shrunk by the stroke
            let url = format!("url({})", mask_src);
            let images = format!("{}, {}", url, url);
            let inset = format!("calc(100% - {})", px(2.0 * sw));
            let sizes = format!("100% 100%, {} {}", inset, inset);
            styles
                .set("backgroundColor", color)
                .set("-webkit-mask-image", images.clone())
                .set("maskImage", images)
                .set("-webkit-mask-size", sizes.clone())
                .set("maskSize", sizes)
                .set("-webkit-mask-position", "0 0, center")
                .set("maskPosition", "0 0, center")
                .set("-webkit-mask-repeat", "no-repeat")
                .set("maskRepeat", "no-repeat")
                .set("-webkit-mask-composite", "source-out")
                .set("maskComposite", "subtract");
        }
    }
    Ok(format!(r#"<div style="{}"></div>"#, styles.to_css()))
}

/// Render a `graphicShape` element: silhouette (z 0), masked image (z 1),
/// masked overlay (z 2) and stroke ring (z 3).
pub fn render_shape(el: &Element, ctx: &ElementContext) -> Result<String> {
    let svg = el
        .svg_element
        .as_ref()
        .filter(|s| !s.svg_string.trim().is_empty())
        .ok_or_else(|| Error::InvalidElement(format!("shape {} has no svgString", el.id)))?;
    let primitive = svg.primitive();
    let stretchy = stretchy_svg(&svg.svg_string)?;
    let fill = el.fill.as_deref().unwrap_or("transparent");
    let fill = if is_transparent(fill) { "transparent".to_string() } else { normalize(fill)? };
    let visible_src = svg_data_uri(&silhouette(&stretchy, &fill)?);
    let mask_src = svg_data_uri(&silhouette(&stretchy, "#000000")?);
    let radius = border_radius(el);

    let mut container = StyleMap::new()
        .with("width", "100%")
        .with("height", "100%")
        .with("overflow", "hidden")
        .with("position", "relative")
        .with("opacity", num(el.opacity()));
    container.set_opt("filter", drop_shadow(el, ctx)?);

    let shape_style = full_layer(0).with("objectFit", "fill");
    let mut html = format!(
        r#"<div style="{}"><img style="{}" src="{}" alt="" />"#,
        container.to_css(),
        shape_style.to_css(),
        visible_src
    );

    if let Some(src) = el.src.as_deref().filter(|s| !s.is_empty()) {
        let mut holder = full_layer(1).with("overflow", "hidden");
        mask(&mut holder, &mask_src);
        let cropped = recentered(el, primitive == Some("ellipse"));
        html.push_str(&format!(
            r#"<div style="{}">{}</div>"#,
            holder.to_css(),
            crop_box(&cropped, &ctx.root, &format!("shape-image-{}", el.id), src, &StyleMap::new())
        ));
    }

    let mut overlay_layer = full_layer(2).with("borderRadius", radius);
    mask(&mut overlay_layer, &mask_src);
    html.push_str(&overlay_element(el, overlay_layer)?);
    html.push_str(&stroke_layer(el, primitive, &mask_src)?);
    html.push_str("</div>");
    Ok(html)
}
