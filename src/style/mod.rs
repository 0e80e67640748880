//! Color, CSS, SVG and geometry helpers used by every renderer.

pub mod color;
pub mod css;
pub mod geometry;
pub mod svg;

pub use color::to_rgba;
pub use css::{cssify, kebab_case, StyleMap};
pub use geometry::{crop_window, layout_logo, line_rotation, margin_for_element, rotate_offset, Rect, RootFrame};
pub use svg::{recolor_svg, recolor_svg_markup, stretchy_svg};
