//! Style fragments shared by several renderers: shadow filters, corner radii,
//! tint/gradient overlays and full-size layers.

use crate::model::{Element, Gradient};
use crate::rendering::ElementContext;
use crate::style::color::{normalize, to_rgba};
use crate::style::css::{num, px, StyleMap};
use crate::Result;

const DEFAULT_SHADOW_COLOR: &str = "rgba(0, 0, 0, 0.5)";

/// `drop-shadow(...)` using the context's pre-rotated offsets, or `None` when
/// the element has no shadow.
pub fn drop_shadow(el: &Element, ctx: &ElementContext) -> Result<Option<String>> {
    if !el.shadow_enabled {
        return Ok(None);
    }
    let color = el.shadow_color.as_deref().unwrap_or(DEFAULT_SHADOW_COLOR);
    let color = to_rgba(color, el.shadow_opacity.unwrap_or(1.0))?;
    let (dx, dy) = ctx.shadow_offset;
    Ok(Some(format!(
        "drop-shadow({} {} {} {})",
        px(dx),
        px(dy),
        px(el.shadow_blur / 2.0),
        color
    )))
}

/// `border-radius` value, collapsed to one length when all corners agree.
pub fn border_radius(el: &Element) -> String {
    let corners = [
        el.corner_radius_top_left,
        el.corner_radius_top_right,
        el.corner_radius_bottom_right,
        el.corner_radius_bottom_left,
    ];
    if corners.iter().all(|c| *c == corners[0]) {
        px(corners[0])
    } else {
        corners.iter().map(|c| px(*c)).collect::<Vec<_>>().join(" ")
    }
}

/// A layer covering its positioned parent.
pub fn full_layer(z_index: i32) -> StyleMap {
    StyleMap::new()
        .with("width", "100%")
        .with("height", "100%")
        .with("position", "absolute")
        .with("zIndex", z_index.to_string())
}

pub fn linear_gradient(gradient: &Gradient) -> Result<String> {
    let mut stops = Vec::with_capacity(gradient.configs.len());
    for stop in &gradient.configs {
        stops.push(format!("{} {}%", normalize(&stop.color)?, num(stop.offset * 100.0)));
    }
    Ok(format!(
        "linear-gradient({}deg, {})",
        num(gradient.rotation + 90.0),
        stops.join(", ")
    ))
}

/// Background for the tint layer: the gradient when it is visible, else the
/// flat `overlayFill` at `alpha`, else nothing.
pub fn overlay_background(el: &Element) -> Result<Option<StyleMap>> {
    if let Some(gradient) = el.gradient.as_ref().filter(|g| g.is_visible()) {
        let mut styles = StyleMap::new();
        styles
            .set("background", linear_gradient(gradient)?)
            .set("opacity", num(gradient.opacity.unwrap_or(1.0)));
        return Ok(Some(styles));
    }
    match el.overlay_fill.as_deref() {
        Some(fill) if !fill.is_empty() && el.alpha > 0.0 => {
            Ok(Some(StyleMap::new().with("backgroundColor", to_rgba(fill, el.alpha)?)))
        }
        _ => Ok(None),
    }
}

/// The overlay `<div>` merged onto `layer`, or an empty string.
pub fn overlay_element(el: &Element, layer: StyleMap) -> Result<String> {
    Ok(match overlay_background(el)? {
        Some(bg) => {
            let mut styles = layer;
            styles.merge(&bg);
            format!(r#"<div style="{}"></div>"#, styles.to_css())
        }
        None => String::new(),
    })
}

/// `mask-image` plus its `-webkit-` twin and stretch settings.
pub fn mask(styles: &mut StyleMap, image: &str) {
    let url = format!("url({})", image);
    styles
        .set("-webkit-mask-image", url.clone())
        .set("maskImage", url)
        .set("-webkit-mask-size", "100% 100%")
        .set("maskSize", "100% 100%")
        .set("-webkit-mask-repeat", "no-repeat")
        .set("maskRepeat", "no-repeat");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GradientStop;

    fn element(json: serde_json::Value) -> Element {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn shadow_uses_context_offsets() {
        let el = element(serde_json::json!({
            "shadowEnabled": true, "shadowColor": "#000000", "shadowBlur": 8, "shadowOpacity": 0.5
        }));
        let ctx = ElementContext {
            shadow_offset: (0.0, -10.0),
            ..Default::default()
        };
        assert_eq!(
            drop_shadow(&el, &ctx).unwrap().as_deref(),
            Some("drop-shadow(0px -10px 4px rgba(0, 0, 0, 0.5))")
        );
        assert_eq!(drop_shadow(&Element::default(), &ctx).unwrap(), None);
    }

    #[test]
    fn default_shadow_color_takes_shadow_opacity() {
        let el = element(serde_json::json!({"shadowEnabled": true}));
        let shadow = drop_shadow(&el, &ElementContext::default()).unwrap().unwrap();
        assert!(shadow.ends_with("rgba(0, 0, 0, 1))"), "{}", shadow);
    }

    #[test]
    fn bad_shadow_color_fails_the_element() {
        let el = element(serde_json::json!({"shadowEnabled": true, "shadowColor": "nope"}));
        assert!(drop_shadow(&el, &ElementContext::default()).is_err());
    }

    #[test]
    fn radius_collapses_when_uniform() {
        let mut el = Element::default();
        assert_eq!(border_radius(&el), "0px");
        el.corner_radius_top_left = 4.0;
        assert_eq!(border_radius(&el), "4px 0px 0px 0px");
    }

    #[test]
    fn gradient_wins_over_flat_overlay() {
        let mut el = element(serde_json::json!({"overlayFill": "#ff0000", "alpha": 0.5}));
        let flat = overlay_background(&el).unwrap().unwrap();
        assert_eq!(flat.get("backgroundColor"), Some("rgba(255, 0, 0, 0.5)"));

        el.gradient = Some(Gradient {
            configs: vec![
                GradientStop { offset: 0.0, color: "#000".into() },
                GradientStop { offset: 1.0, color: "#fff".into() },
            ],
            rotation: 0.0,
            opacity: Some(0.8),
        });
        let g = overlay_background(&el).unwrap().unwrap();
        assert_eq!(
            g.get("background"),
            Some("linear-gradient(90deg, rgba(0, 0, 0, 1) 0%, rgba(255, 255, 255, 1) 100%)")
        );
        assert_eq!(g.get("opacity"), Some("0.8"));
    }

    #[test]
    fn no_overlay_without_alpha() {
        let el = element(serde_json::json!({"overlayFill": "#ff0000"}));
        assert_eq!(overlay_element(&el, full_layer(2)).unwrap(), "");
    }
}
