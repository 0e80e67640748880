//! Layout composer: resolves groups, renders every element concurrently and
//! wraps each fragment in a positioned container in paint order.

use std::cmp::Ordering;
use std::collections::HashMap;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use log::{debug, warn};

use crate::model::{Element, ElementKind};
use crate::rendering::{image, line, logo, shape, star, text, ElementContext, RenderEnv};
use crate::style::css::{escape_attr, num, px, StyleMap};
use crate::style::geometry::{line_rotation, margin_for_element, rotate_offset, Rect, RootFrame};
use crate::{LayoutMode, Result};

/// Emitted in place of elements that are unknown or failed to render.
pub const PLACEHOLDER: &str = "<div></div>";

/// An element with its resolved group members, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode<'a> {
    pub element: &'a Element,
    pub children: Vec<RenderNode<'a>>,
}

impl<'a> RenderNode<'a> {
    pub fn is_group(&self) -> bool {
        self.element.kind() == ElementKind::Group
    }

    /// The element's box, or for a group without a size of its own, the
    /// bounding box of its members.
    pub fn frame(&self) -> Rect {
        let el = self.element;
        if !self.is_group() || (el.width > 0.0 && el.height > 0.0) || self.children.is_empty() {
            return el.rect();
        }
        self.children
            .iter()
            .map(RenderNode::frame)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| el.rect())
    }
}

/// Stable sort by ascending `index`; equal indices keep input order.
pub fn sort_by_paint_order(nodes: &mut [RenderNode<'_>]) {
    nodes.sort_by(|a, b| {
        a.element
            .index
            .partial_cmp(&b.element.index)
            .unwrap_or(Ordering::Equal)
    });
}

/// Fold group members out of the flat element list into their groups.
///
/// Each `elementIds` entry is claimed by the first group listing it, so every
/// element is rendered exactly once. Members keep the `elementIds` order before
/// sorting; a group's inline `groupChildren` are resolved as their own list.
pub fn resolve_groups(elements: &[Element]) -> Vec<RenderNode<'_>> {
    let mut by_id: HashMap<&str, usize> = HashMap::new();
    for (i, el) in elements.iter().enumerate() {
        if !el.id.is_empty() {
            by_id.entry(el.id.as_str()).or_insert(i);
        }
    }

    // member index -> group index
    let mut owner: HashMap<usize, usize> = HashMap::new();
    for (g, group) in elements.iter().enumerate() {
        if group.kind() != ElementKind::Group {
            continue;
        }
        for id in &group.element_ids {
            let Some(&member) = by_id.get(id.as_str()) else {
                warn!("group {} references unknown element {}", group.id, id);
                continue;
            };
            // a group cannot contain itself or any group that contains it
            if is_ancestor(&owner, member, g) {
                continue;
            }
            owner.entry(member).or_insert(g);
        }
    }

    let mut visited = vec![false; elements.len()];
    let mut nodes: Vec<RenderNode<'_>> = (0..elements.len())
        .filter(|i| !owner.contains_key(i))
        .filter_map(|i| build_node(elements, i, &by_id, &owner, &mut visited))
        .collect();
    sort_by_paint_order(&mut nodes);
    nodes
}

/// True when `candidate` is `node` or one of its owning groups.
fn is_ancestor(owner: &HashMap<usize, usize>, candidate: usize, node: usize) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if n == candidate {
            return true;
        }
        current = owner.get(&n).copied();
    }
    false
}

fn build_node<'a>(
    elements: &'a [Element],
    i: usize,
    by_id: &HashMap<&str, usize>,
    owner: &HashMap<usize, usize>,
    visited: &mut [bool],
) -> Option<RenderNode<'a>> {
    if visited[i] {
        return None;
    }
    visited[i] = true;
    let element = &elements[i];
    let mut children = Vec::new();
    if element.kind() == ElementKind::Group {
        for id in &element.element_ids {
            let member = by_id.get(id.as_str()).copied();
            if let Some(member) = member.filter(|m| owner.get(m) == Some(&i)) {
                children.extend(build_node(elements, member, by_id, owner, visited));
            }
        }
        children.extend(resolve_groups(&element.group_children));
        sort_by_paint_order(&mut children);
    }
    Some(RenderNode { element, children })
}

/// CSS rotation and `transform-origin` for an element. Lines rotate by their
/// segment angle around the stroke center of the start point.
pub fn placement(el: &Element) -> (f64, String) {
    if el.kind() == ElementKind::Line {
        let rotation = line_rotation(&el.points).unwrap_or(el.rotation);
        return (rotation, line::line_origin(el));
    }
    (el.rotation, "top left".to_string())
}

/// Context handed to the element's renderer.
pub fn element_context(el: &Element, root: &RootFrame, rotation: f64) -> ElementContext {
    let shadow_offset = if el.shadow_enabled && rotation != 0.0 {
        rotate_offset(el.shadow_offset_x, el.shadow_offset_y, rotation)
    } else {
        (el.shadow_offset_x, el.shadow_offset_y)
    };
    ElementContext {
        root: *root,
        rotation,
        shadow_offset,
        stroke_outset: el.stroke_bg_width / 2.0,
    }
}

async fn render_element(el: &Element, ctx: &ElementContext, env: RenderEnv<'_>) -> Result<String> {
    match el.kind() {
        ElementKind::Text => text::render_text(el, ctx),
        ElementKind::Logo => logo::render_logo(el, ctx, env).await,
        ElementKind::Line => line::render_line(el, ctx),
        ElementKind::StarRating => star::render_star(el, ctx),
        ElementKind::Shape => shape::render_shape(el, ctx),
        ElementKind::Image => image::render_image(el, ctx, env).await,
        ElementKind::Group | ElementKind::Unknown => Ok(PLACEHOLDER.to_string()),
    }
}

fn hyperlinked(el: &Element, html: String) -> String {
    match el.hyperlink.as_deref().map(str::trim) {
        Some(href) if !href.is_empty() => {
            let style = StyleMap::new()
                .with("display", "block")
                .with("width", "100%")
                .with("height", "100%")
                .with("color", "inherit");
            format!(
                r#"<a target="_blank" href="{}" style="{}">{}</a>"#,
                escape_attr(href),
                style.to_css(),
                html
            )
        }
        _ => html,
    }
}

/// Inner HTML of a node's wrapper. Leaves are rendered against the page
/// frame; group members are positioned inside the group's frame.
fn render_content<'a>(node: &'a RenderNode<'a>, page: &'a RootFrame, env: RenderEnv<'a>) -> BoxFuture<'a, String> {
    async move {
        let el = node.element;
        let html = if node.is_group() {
            let frame = node.frame();
            let rendered = join_all(node.children.iter().map(|child| render_content(child, page, env))).await;
            node.children
                .iter()
                .zip(rendered)
                .map(|(child, html)| absolute_wrapper(child, &frame, html))
                .collect::<String>()
        } else {
            let (rotation, _) = placement(el);
            let ctx = element_context(el, page, rotation);
            debug!("rendering {} as {:?}", el.id, el.kind());
            match render_element(el, &ctx, env).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("element {} not rendered: {}", el.id, e);
                    PLACEHOLDER.to_string()
                }
            }
        };
        hyperlinked(el, html)
    }
    .boxed()
}

/// Size, paint order and rotation shared by both layout modes. The stroke
/// outset is left out for kinds that draw it themselves.
fn wrapper_box(node: &RenderNode<'_>) -> StyleMap {
    let el = node.element;
    let frame = node.frame();
    let outset = if el.kind().draws_own_outset() { 0.0 } else { el.stroke_bg_width };
    let (rotation, origin) = placement(el);
    StyleMap::new()
        .with("width", px(frame.width + 2.0 * el.padding.horizontal + outset))
        .with("height", px(frame.height + 2.0 * el.padding.vertical + outset))
        .with("zIndex", num(el.index))
        .with("rotate", format!("{}deg", num(rotation)))
        .with("transformOrigin", origin)
        .with("display", "flex")
        .with("boxSizing", "content-box")
}

fn absolute_wrapper(node: &RenderNode<'_>, origin: &Rect, html: String) -> String {
    let frame = node.frame();
    let mut styles = StyleMap::new()
        .with("position", "absolute")
        .with("left", px(frame.x - origin.x))
        .with("top", px(frame.y - origin.y));
    styles.merge(&wrapper_box(node));
    format!(r#"<div style="{}">{}</div>"#, styles.to_css(), html)
}

/// Flow wrappers for stacked mode. Each block's top margin is measured from
/// the bottom of the blocks before it.
fn stacked_wrappers(nodes: &[RenderNode<'_>], root: &RootFrame, rendered: Vec<String>) -> String {
    let mut consumed = 0.0;
    let mut out = String::new();
    for (node, html) in nodes.iter().zip(rendered) {
        let el = node.element;
        let frame = node.frame();
        let kind = el.kind();
        let margins = margin_for_element(&frame, root, el.stroke_bg_width, &el.padding, kind, consumed);
        let mut styles = StyleMap::new().with("position", "relative");
        styles.merge(&margins).merge(&wrapper_box(node));
        out.push_str(&format!(r#"<div style="{}">{}</div>"#, styles.to_css(), html));

        let (top_extent, outset) = if kind.draws_own_outset() {
            (0.0, 0.0)
        } else {
            (el.padding.vertical + el.stroke_bg_width / 2.0, el.stroke_bg_width)
        };
        let height = frame.height + 2.0 * el.padding.vertical + outset;
        consumed = frame.y - root.y - top_extent + height;
    }
    out
}

/// Render `elements` positioned against `root`, concatenated in paint order.
pub async fn compose_body(elements: &[Element], root: &RootFrame, env: RenderEnv<'_>) -> String {
    let nodes = resolve_groups(elements);
    debug!("composing {} top-level nodes from {} elements", nodes.len(), elements.len());
    let rendered = join_all(nodes.iter().map(|node| render_content(node, root, env))).await;
    match env.config.layout_mode {
        LayoutMode::Absolute => nodes
            .iter()
            .zip(rendered)
            .map(|(node, html)| absolute_wrapper(node, root, html))
            .collect(),
        LayoutMode::Stacked => stacked_wrappers(&nodes, root, rendered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryFetcher;
    use crate::RenderConfig;

    fn elements(json: serde_json::Value) -> Vec<Element> {
        serde_json::from_value(json).unwrap()
    }

    fn ids(nodes: &[RenderNode<'_>]) -> Vec<String> {
        nodes.iter().map(|n| n.element.id.clone()).collect()
    }

    #[test]
    fn paint_order_is_stable() {
        let els = elements(serde_json::json!([
            {"id": "A", "index": 2}, {"id": "B", "index": 1},
            {"id": "C", "index": 2}, {"id": "D", "index": 0}
        ]));
        assert_eq!(ids(&resolve_groups(&els)), ["D", "B", "A", "C"]);
    }

    #[test]
    fn group_members_are_nested_once() {
        let els = elements(serde_json::json!([
            {"id": "a", "type": "text", "index": 1},
            {"id": "g", "elementType": "group", "elementIds": ["b", "a"], "index": 0},
            {"id": "b", "type": "text", "index": 0},
            {"id": "h", "elementType": "group", "elementIds": ["a"], "index": 3},
            {"id": "c", "type": "text", "index": 2}
        ]));
        let nodes = resolve_groups(&els);
        assert_eq!(ids(&nodes), ["g", "c", "h"]);
        assert_eq!(ids(&nodes[0].children), ["b", "a"]);
        assert!(nodes[2].children.is_empty());
    }

    #[test]
    fn mutually_referencing_groups_do_not_loop() {
        let els = elements(serde_json::json!([
            {"id": "g1", "elementType": "group", "elementIds": ["g2"]},
            {"id": "g2", "elementType": "group", "elementIds": ["g1"]}
        ]));
        let nodes = resolve_groups(&els);
        assert_eq!(ids(&nodes), ["g1"]);
        assert_eq!(ids(&nodes[0].children), ["g2"]);
    }

    #[test]
    fn longer_group_cycles_keep_every_element() {
        let els = elements(serde_json::json!([
            {"id": "g1", "elementType": "group", "elementIds": ["g2", "leaf"], "index": 0},
            {"id": "g2", "elementType": "group", "elementIds": ["g3"], "index": 0},
            {"id": "g3", "elementType": "group", "elementIds": ["g1"], "index": 0},
            {"id": "leaf", "type": "text", "index": 1}
        ]));
        let nodes = resolve_groups(&els);
        assert_eq!(ids(&nodes), ["g1"]);
        assert_eq!(ids(&nodes[0].children), ["g2", "leaf"]);
        assert_eq!(ids(&nodes[0].children[0].children), ["g3"]);
        assert!(nodes[0].children[0].children[0].children.is_empty());
    }

    #[test]
    fn sizeless_group_takes_member_bounds() {
        let els = elements(serde_json::json!([
            {"id": "g", "elementType": "group", "elementIds": ["a", "b"]},
            {"id": "a", "type": "text", "x": 10, "y": 20, "width": 30, "height": 10},
            {"id": "b", "type": "text", "x": 50, "y": 5, "width": 10, "height": 10}
        ]));
        let nodes = resolve_groups(&els);
        assert_eq!(nodes[0].frame(), Rect::new(10.0, 5.0, 50.0, 25.0));
    }

    #[test]
    fn line_placement_pivots_on_stroke_center() {
        let el: Element = serde_json::from_value(serde_json::json!({
            "elementType": "line", "points": [0, 0, 0, 10], "strokeWidth": 6, "rotation": 15
        }))
        .unwrap();
        let (rotation, origin) = placement(&el);
        assert!((rotation - 90.0).abs() < 1e-9);
        assert_eq!(origin, "left 3px");
    }

    #[test]
    fn shadow_offset_follows_rotation() {
        let el: Element = serde_json::from_value(serde_json::json!({
            "shadowEnabled": true, "shadowOffsetX": 10, "shadowOffsetY": 0
        }))
        .unwrap();
        let ctx = element_context(&el, &RootFrame::default(), 90.0);
        assert!(ctx.shadow_offset.0.abs() < 1e-9);
        assert!((ctx.shadow_offset.1.abs() - 10.0).abs() < 1e-9);
        assert_eq!(element_context(&el, &RootFrame::default(), 0.0).shadow_offset, (10.0, 0.0));
    }

    #[tokio::test]
    async fn wrappers_are_positioned_and_unknowns_degrade() {
        let els = elements(serde_json::json!([
            {"id": "t", "type": "text", "text": "hi", "x": 10, "y": 20, "width": 100, "height": 30,
             "index": 1, "strokeBgWidth": 4, "padding": {"vertical": 2, "horizontal": 5}},
            {"id": "u", "elementType": "mystery", "index": 0},
            {"id": "l", "elementType": "line", "points": [1], "index": 2,
             "hyperlink": "https://example.com/?a=1&b=2"}
        ]));
        let cfg = RenderConfig::default();
        let fetcher = MemoryFetcher::new();
        let root = RootFrame::new(0.0, 0.0, 600.0, 400.0);
        let body = compose_body(&els, &root, RenderEnv::new(&cfg, &fetcher)).await;

        let first = body.find("z-index: 0").unwrap();
        let second = body.find("z-index: 1").unwrap();
        assert!(first < second);
        assert!(body.contains(
            "position: absolute; left: 10px; top: 20px; width: 114px; height: 38px; z-index: 1; rotate: 0deg; transform-origin: top left"
        ));
        assert!(body.contains(r#"href="https://example.com/?a=1&amp;b=2""#));
        assert_eq!(body.matches(PLACEHOLDER).count(), 2);
    }

    #[tokio::test]
    async fn group_members_are_offset_from_group() {
        let els = elements(serde_json::json!([
            {"id": "g", "elementType": "group", "elementIds": ["a"], "x": 100, "y": 50, "width": 200, "height": 100},
            {"id": "a", "type": "text", "text": "x", "x": 110, "y": 70, "width": 20, "height": 10}
        ]));
        let cfg = RenderConfig::default();
        let fetcher = MemoryFetcher::new();
        let root = RootFrame::new(0.0, 0.0, 600.0, 400.0);
        let body = compose_body(&els, &root, RenderEnv::new(&cfg, &fetcher)).await;
        assert!(body.starts_with(r#"<div style="position: absolute; left: 100px; top: 50px"#));
        assert!(body.contains("position: absolute; left: 10px; top: 20px; width: 20px"));
    }

    #[tokio::test]
    async fn stacked_mode_flows_with_margins() {
        let els = elements(serde_json::json!([
            {"id": "a", "type": "text", "text": "a", "x": 0, "y": 10, "width": 100, "height": 20, "index": 0},
            {"id": "b", "type": "text", "text": "b", "x": 50, "y": 40, "width": 100, "height": 20, "index": 1}
        ]));
        let cfg = RenderConfig {
            layout_mode: LayoutMode::Stacked,
            ..RenderConfig::default()
        };
        let fetcher = MemoryFetcher::new();
        let root = RootFrame::new(0.0, 0.0, 300.0, 400.0);
        let body = compose_body(&els, &root, RenderEnv::new(&cfg, &fetcher)).await;
        assert!(body.contains(r#"<div style="position: relative; margin-top: 10px; width: 100px"#));
        // the second block starts below the 30px already used by the first
        assert!(body.contains("position: relative; margin-left: 50px; margin-top: 10px; width: 100px"));
        assert!(!body.contains("position: absolute; left:"));
    }
}
