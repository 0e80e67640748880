//! Image and SVG elements.
//!
//! The crop is done in CSS: an oversized `<img>` offset by negative
//! percentages inside an `overflow: hidden` clip box, so no pixels are ever
//! decoded or resampled here.

use crate::model::Element;
use crate::rendering::effects::{border_radius, drop_shadow, full_layer, overlay_element};
use crate::rendering::{ElementContext, RenderEnv};
use crate::style::color::{is_transparent, normalize};
use crate::style::css::{escape_attr, num, percent, px, StyleMap};
use crate::style::geometry::{crop_window, RootFrame};
use crate::style::svg::looks_like_svg;
use crate::{Error, Result};

/// Clip box holding the cropped `<img>`.
///
/// The box covers the part of the element left visible by the root frame;
/// flips mirror the box so the mirrored source window lands in place.
pub fn crop_box(el: &Element, root: &RootFrame, img_id: &str, src: &str, extra: &StyleMap) -> String {
    let crop = crop_window(el, root);
    let mut clip = StyleMap::new();
    clip.set("position", "absolute");
    if crop.is_clamped(el) && el.width > 0.0 && el.height > 0.0 {
        clip.set("left", percent(crop.visible.x / el.width * 100.0))
            .set("top", percent(crop.visible.y / el.height * 100.0))
            .set("width", percent(crop.visible.width / el.width * 100.0))
            .set("height", percent(crop.visible.height / el.height * 100.0));
    } else {
        clip.set("left", "0").set("top", "0").set("width", "100%").set("height", "100%");
    }
    clip.set("overflow", "hidden");
    let flips: Vec<&str> = [
        el.flip_horizontal.then_some("scaleX(-1)"),
        el.flip_vertical.then_some("scaleY(-1)"),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !flips.is_empty() {
        clip.set("transform", flips.join(" "));
    }
    clip.merge(extra);

    let (w, h, left, top) = crop.image_percentages();
    let img = StyleMap::new()
        .with("position", "absolute")
        .with("maxWidth", "none")
        .with("width", percent(w))
        .with("height", percent(h))
        .with("left", percent(left))
        .with("top", percent(top));

    format!(
        r#"<div style="{}"><img id="{}" src="{}" width="{}" height="{}" alt="" style="{}" /></div>"#,
        clip.to_css(),
        escape_attr(img_id),
        escape_attr(src),
        num(el.width),
        num(el.height),
        img.to_css()
    )
}

/// Render an `image`, `svg` or `complex_svg` element.
///
/// Layers from bottom to top: cropped image (z 1), tint or gradient (z 2),
/// stroke ring (z 3). SVG sources are inlined recolored with `fill`; raster
/// sources get `fill` as a backdrop instead.
pub async fn render_image(el: &Element, ctx: &ElementContext, env: RenderEnv<'_>) -> Result<String> {
    let src = el
        .src
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidElement(format!("image {} has no src", el.id)))?;
    let fill = el.fill.as_deref().unwrap_or("transparent");
    let is_svg = looks_like_svg(src);
    let img_src = if is_svg {
        env.recolored_svg(src, fill).await
    } else {
        env.resolve(src)
    };
    let radius = border_radius(el);

    let mut container = StyleMap::new()
        .with("width", "100%")
        .with("height", "100%")
        .with("position", "relative")
        .with("borderRadius", radius.clone())
        .with("opacity", num(el.opacity()));
    container.set_opt("filter", drop_shadow(el, ctx)?);

    let mut image_layer = full_layer(1)
        .with("borderRadius", radius.clone())
        .with("overflow", "hidden");
    if !is_svg && !is_transparent(fill) {
        image_layer.set("backgroundColor", normalize(fill)?);
    }
    let clip = crop_box(el, &ctx.root, &format!("image-{}", el.id), &img_src, &StyleMap::new());

    let overlay = overlay_element(el, full_layer(2).with("borderRadius", radius.clone()))?;

    let stroke = match el.stroke.as_deref() {
        Some(color) if el.stroke_width > 0.0 && !is_transparent(color) => {
            let styles = full_layer(3)
                .with("borderRadius", radius)
                .with("border", format!("{} solid {}", px(el.stroke_width), normalize(color)?))
                .with("boxSizing", "border-box");
            format!(r#"<div style="{}"></div>"#, styles.to_css())
        }
        _ => String::new(),
    };

    Ok(format!(
        r#"<div style="{}"><div style="{}">{}</div>{}{}</div>"#,
        container.to_css(),
        image_layer.to_css(),
        clip,
        overlay,
        stroke
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryFetcher;
    use crate::style::geometry::Rect;
    use crate::RenderConfig;

    fn element(json: serde_json::Value) -> Element {
        serde_json::from_value(json).unwrap()
    }

    fn ctx() -> ElementContext {
        ElementContext {
            root: Rect::new(0.0, 0.0, 600.0, 600.0),
            ..Default::default()
        }
    }

    #[test]
    fn crop_box_offsets_image_by_percentages() {
        let el = element(serde_json::json!({
            "id": "a", "width": 100, "height": 100, "imageWidth": 200, "imageHeight": 100,
            "cropX": 0.25, "cropWidth": 0.5
        }));
        let html = crop_box(&el, &ctx().root, "image-a", "https://x/p.png", &StyleMap::new());
        assert!(html.contains("width: 200%; height: 100%; left: -50%; top: 0%"));
        assert!(html.contains(r#"id="image-a""#));
        assert!(html.contains("left: 0; top: 0; width: 100%; height: 100%"));
    }

    #[test]
    fn clamped_crop_moves_the_clip_box() {
        let el = element(serde_json::json!({
            "id": "a", "x": -50, "width": 100, "height": 100, "imageWidth": 100, "imageHeight": 100
        }));
        let html = crop_box(&el, &ctx().root, "i", "s", &StyleMap::new());
        assert!(html.contains("left: 50%; top: 0%; width: 50%; height: 100%"));
    }

    #[tokio::test]
    async fn raster_image_layers() {
        let el = element(serde_json::json!({
            "id": 3, "elementType": "image", "src": "https://x/p.png", "width": 50, "height": 40,
            "fill": "#00ff00", "stroke": "#000", "strokeWidth": 2,
            "overlayFill": "#ff0000", "alpha": 0.3, "flipHorizontal": true
        }));
        let cfg = RenderConfig::default();
        let fetcher = MemoryFetcher::new();
        let html = render_image(&el, &ctx(), RenderEnv::new(&cfg, &fetcher)).await.unwrap();
        assert!(html.contains(r#"src="https://x/p.png""#));
        assert!(html.contains("background-color: rgba(0, 255, 0, 1)"));
        assert!(html.contains("z-index: 2; border-radius: 0px; background-color: rgba(255, 0, 0, 0.3)"));
        assert!(html.contains("border: 2px solid rgba(0, 0, 0, 1)"));
        assert!(html.contains("transform: scaleX(-1)"));
    }

    #[tokio::test]
    async fn svg_source_is_inlined_and_recolored() {
        let el = element(serde_json::json!({
            "id": "s", "elementType": "svg", "src": "https://x/icon.svg", "width": 10, "height": 10,
            "fill": "#ff0000"
        }));
        let cfg = RenderConfig::default();
        let fetcher = MemoryFetcher::new().with("https://x/icon.svg", r##"<svg><path fill="#000"/></svg>"##);
        let html = render_image(&el, &ctx(), RenderEnv::new(&cfg, &fetcher)).await.unwrap();
        assert!(html.contains(r#"src="data:image/svg+xml;base64,"#));
        assert!(!html.contains("background-color"));
    }

    #[tokio::test]
    async fn unreachable_svg_falls_back_to_url() {
        let el = element(serde_json::json!({"id": "s", "src": "https://x/gone.svg", "width": 1, "height": 1}));
        let cfg = RenderConfig::default();
        let fetcher = MemoryFetcher::new();
        let html = render_image(&el, &ctx(), RenderEnv::new(&cfg, &fetcher)).await.unwrap();
        assert!(html.contains(r#"src="https://x/gone.svg""#));
    }

    #[tokio::test]
    async fn missing_src_is_an_input_error() {
        let cfg = RenderConfig::default();
        let fetcher = MemoryFetcher::new();
        let res = render_image(&Element::default(), &ctx(), RenderEnv::new(&cfg, &fetcher)).await;
        assert!(matches!(res, Err(Error::InvalidElement(_))));
    }
}
