//! Geometry shared by the renderers: frames, margins, crops, rotations and
//! logo sizing.

use crate::model::{Element, ElementKind, Padding};
use crate::style::css::{px, StyleMap};

/// Axis-aligned rectangle in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// The frame an element is positioned against: the page for top-level
/// elements, the enclosing group otherwise.
pub type RootFrame = Rect;

/// Flow margins placing `rect` inside `root` when elements are stacked
/// instead of absolutely positioned.
///
/// `stroke` is the full outline width; half of it sits outside the element.
/// `consumed_height` is the height already taken by earlier stacked blocks.
pub fn margin_for_element(
    rect: &Rect,
    root: &RootFrame,
    stroke: f64,
    padding: &Padding,
    kind: ElementKind,
    consumed_height: f64,
) -> StyleMap {
    let mut styles = StyleMap::new();
    if kind.draws_own_outset() {
        styles
            .set("marginLeft", px(rect.x - root.x))
            .set("marginTop", px(rect.y - root.y - consumed_height));
        return styles;
    }

    let half_stroke = stroke / 2.0;
    let margin_left = rect.x - root.x - padding.horizontal - half_stroke;
    let margin_top = rect.y - root.y - padding.vertical - consumed_height - half_stroke;
    let margin_right = root.width - margin_left - rect.width;

    if (margin_left - margin_right).abs() <= 2.0 {
        styles
            .set("marginTop", px(margin_top))
            .set("marginLeft", "auto")
            .set("marginRight", "auto");
    } else if margin_left == 0.0 {
        styles.set("marginTop", px(margin_top));
    } else if margin_right == 0.0 {
        styles.set("marginLeft", "auto").set("marginTop", px(margin_top));
    } else {
        styles
            .set("marginLeft", px(margin_left))
            .set("marginTop", px(margin_top));
    }
    styles
}

/// Crop of an image element resolved against its root frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropWindow {
    /// Natural image size; falls back to a unit square when unknown, in which
    /// case `source` is expressed in fractions.
    pub natural: (f64, f64),
    /// Visible part of the crop, in natural image space.
    pub source: Rect,
    /// Visible part of the element after clamping to the root, relative to the
    /// element's own top-left corner.
    pub visible: Rect,
}

impl CropWindow {
    /// CSS box for an `<img>` inside a clip box sized to `visible`: width,
    /// height, left, top, all in percent of the clip box.
    pub fn image_percentages(&self) -> (f64, f64, f64, f64) {
        let (nw, nh) = self.natural;
        let sw = if self.source.width > 0.0 { self.source.width } else { nw };
        let sh = if self.source.height > 0.0 { self.source.height } else { nh };
        (
            nw / sw * 100.0,
            nh / sh * 100.0,
            -(self.source.x / sw) * 100.0,
            -(self.source.y / sh) * 100.0,
        )
    }

    /// True when the root clipped part of the element away.
    pub fn is_clamped(&self, element: &Element) -> bool {
        self.visible.x != 0.0
            || self.visible.y != 0.0
            || self.visible.width != element.width
            || self.visible.height != element.height
    }
}

/// Derive the crop window from four shapes: the natural image, the crop in
/// image space, the element on the canvas and the part of the element that
/// survives clamping to the root frame. Flips mirror the source window.
pub fn crop_window(element: &Element, root: &RootFrame) -> CropWindow {
    let natural_w = if element.image_width > 0.0 { element.image_width } else { 1.0 };
    let natural_h = if element.image_height > 0.0 { element.image_height } else { 1.0 };

    let cropped = Rect {
        x: element.crop_x * natural_w,
        y: element.crop_y * natural_h,
        width: element.crop_width.unwrap_or(1.0) * natural_w,
        height: element.crop_height.unwrap_or(1.0) * natural_h,
    };
    let on_canvas = Rect {
        x: element.x - root.x,
        y: element.y - root.y,
        width: element.width,
        height: element.height,
    };
    let mut visible = Rect {
        x: if on_canvas.x >= 0.0 { 0.0 } else { -on_canvas.x },
        y: if on_canvas.y >= 0.0 { 0.0 } else { -on_canvas.y },
        ..Rect::default()
    };
    visible.width = (root.width - visible.x - on_canvas.x).min(on_canvas.width - visible.x);
    visible.height = (root.height - visible.y - on_canvas.y).min(on_canvas.height - visible.y);
    // an unknown root size does not clamp
    if root.width <= 0.0 {
        visible.width = on_canvas.width - visible.x;
    }
    if root.height <= 0.0 {
        visible.height = on_canvas.height - visible.y;
    }
    visible.width = visible.width.max(0.0);
    visible.height = visible.height.max(0.0);

    let ratio = |part: f64, whole: f64| if whole != 0.0 { part / whole } else { 0.0 };
    let mut source = Rect {
        x: cropped.x + visible.x * ratio(cropped.width, on_canvas.width),
        y: cropped.y + visible.y * ratio(cropped.height, on_canvas.height),
        width: cropped.width * ratio(visible.width, on_canvas.width),
        height: cropped.height * ratio(visible.height, on_canvas.height),
    };
    if element.flip_vertical {
        source.y = natural_h - source.y - source.height;
    }
    if element.flip_horizontal {
        source.x = natural_w - source.x - source.width;
    }

    CropWindow {
        natural: (natural_w, natural_h),
        source,
        visible,
    }
}

/// Rotate a shadow offset by `-rotation` degrees so that a screen-aligned
/// CSS shadow follows the element's rotation.
pub fn rotate_offset(x: f64, y: f64, rotation: f64) -> (f64, f64) {
    if rotation == 0.0 {
        return (x, y);
    }
    let angle = (-rotation).to_radians();
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Angle of the segment `[x1, y1, x2, y2]` in degrees.
pub fn line_rotation(points: &[f64]) -> Option<f64> {
    match points {
        [x1, y1, x2, y2, ..] => Some((y2 - y1).atan2(x2 - x1).to_degrees()),
        _ => None,
    }
}

pub fn line_length(points: &[f64]) -> Option<f64> {
    match points {
        [x1, y1, x2, y2, ..] => Some((x2 - x1).hypot(y2 - y1)),
        _ => None,
    }
}

/// Logo and padded box sizes produced by [`layout_logo`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoLayout {
    pub logo_width: f64,
    pub logo_height: f64,
    pub container_width: f64,
    pub container_height: f64,
    /// Symmetric padding, `(container - logo) / 2` per axis.
    pub padding_x: f64,
    pub padding_y: f64,
}

impl LogoLayout {
    fn scaled(self, k: f64) -> Self {
        Self {
            logo_width: self.logo_width * k,
            logo_height: self.logo_height * k,
            container_width: self.container_width * k,
            container_height: self.container_height * k,
            padding_x: self.padding_x * k,
            padding_y: self.padding_y * k,
        }
    }

    fn fit_width(self, max: f64) -> Self {
        if max > 0.0 && self.container_width > max {
            self.scaled(max / self.container_width)
        } else {
            self
        }
    }

    fn fit_height(self, max: f64) -> Self {
        if max > 0.0 && self.container_height > max {
            self.scaled(max / self.container_height)
        } else {
            self
        }
    }
}

/// Size a logo and its padding inside a `max_w` x `max_h` container.
///
/// Square logos pad by half their width times `ratio`, wide logos by their
/// height and tall logos by their width. Oversized boxes shrink uniformly.
pub fn layout_logo(
    image_width: f64,
    image_height: f64,
    scale: f64,
    max_w: f64,
    max_h: f64,
    ratio: f64,
) -> LogoLayout {
    let w = image_width * scale;
    let h = image_height * scale;
    let padding = if w == h {
        w / 2.0 * ratio
    } else if w > h {
        h * ratio
    } else {
        w * ratio
    };
    let base = LogoLayout {
        logo_width: w,
        logo_height: h,
        container_width: w + 2.0 * padding,
        container_height: h + 2.0 * padding,
        padding_x: padding,
        padding_y: padding,
    };
    if w == h {
        base.fit_height(max_h)
    } else if w > h {
        base.fit_width(max_w).fit_height(max_h)
    } else {
        base.fit_height(max_h)
    }
}
