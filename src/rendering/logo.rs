//! Logos: recolored SVGs padded inside their box according to anchor flags.

use crate::model::{Element, Padding};
use crate::rendering::effects::drop_shadow;
use crate::rendering::{ElementContext, RenderEnv};
use crate::style::color::{is_transparent, to_rgba};
use crate::style::css::{escape_attr, num, px, StyleMap};
use crate::style::geometry::{layout_logo, LogoLayout};
use crate::{Error, Result};

/// `(justify-content, align-items)` for the padding flags. A flag marks the
/// side that receives padding, pushing the logo away from it.
pub fn anchor_alignment(padding: &Padding) -> (&'static str, &'static str) {
    let justify = if padding.padding_left && padding.padding_right {
        "center"
    } else if padding.padding_left {
        "end"
    } else {
        "start"
    };
    let align = if padding.padding_top && padding.padding_bottom {
        "center"
    } else if padding.padding_top {
        "end"
    } else {
        "start"
    };
    (justify, align)
}

/// Horizontal and vertical padding of the flex container.
///
/// Corner anchors take the whole slack of the padded box on every side; edge
/// and center anchors split it evenly.
pub fn anchor_padding(padding: &Padding, layout: &LogoLayout) -> (f64, f64) {
    let is_corner = (padding.padding_left != padding.padding_right)
        && (padding.padding_top != padding.padding_bottom);
    let slack_x = layout.container_width - layout.logo_width;
    let slack_y = layout.container_height - layout.logo_height;
    if is_corner {
        (slack_x.max(0.0), slack_y.max(0.0))
    } else {
        ((slack_x / 2.0).max(0.0), (slack_y / 2.0).max(0.0))
    }
}

/// Fill applied to the SVG: the fill itself, with the element opacity folded
/// into its alpha when it is not opaque.
fn logo_fill(el: &Element) -> Result<Option<String>> {
    match el.fill.as_deref() {
        Some(fill) if !is_transparent(fill) => {
            if el.opacity() != 1.0 {
                Ok(Some(to_rgba(fill, el.opacity())?))
            } else {
                Ok(Some(fill.to_string()))
            }
        }
        _ => Ok(None),
    }
}

pub async fn render_logo(el: &Element, ctx: &ElementContext, env: RenderEnv<'_>) -> Result<String> {
    let src = el
        .src
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidElement(format!("logo {} has no src", el.id)))?;

    // natural size unknown: treat the element box as the logo
    let (natural_w, natural_h) = if el.image_width > 0.0 && el.image_height > 0.0 {
        (el.image_width, el.image_height)
    } else {
        (el.width, el.height)
    };
    let layout = layout_logo(
        natural_w,
        natural_h,
        el.logo_scale.unwrap_or(1.0),
        el.width,
        el.height,
        el.padding_ratio,
    );
    let (justify, align) = anchor_alignment(&el.padding);
    let (pad_x, pad_y) = anchor_padding(&el.padding, &layout);

    let fill = logo_fill(el)?;
    let logo_src = env
        .recolored_svg(src, fill.as_deref().unwrap_or("transparent"))
        .await;

    let mut outer = StyleMap::new()
        .with("width", "100%")
        .with("height", "100%")
        .with("display", "flex")
        .with("overflow", "hidden")
        .with("position", "relative")
        .with("justifyContent", justify)
        .with("alignItems", align)
        .with("padding", format!("{} {}", px(pad_y), px(pad_x)));
    if fill.is_none() && el.opacity() != 1.0 {
        outer.set("opacity", num(el.opacity()));
    }
    outer.set_opt("filter", drop_shadow(el, ctx)?);

    let logo_style = StyleMap::new()
        .with("width", px(layout.logo_width))
        .with("height", px(layout.logo_height))
        .with("flexShrink", "0")
        .with("display", "block");

    Ok(format!(
        r#"<div style="{}"><img id="logo-{}" src="{}" width="{}" height="{}" alt="logo" style="{}" /></div>"#,
        outer.to_css(),
        escape_attr(&el.id),
        escape_attr(&logo_src),
        num(layout.logo_width),
        num(layout.logo_height),
        logo_style.to_css()
    ))
}
