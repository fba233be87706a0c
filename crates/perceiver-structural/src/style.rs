//! Computed style and box layout for a [`DomArena`].
//!
//! Style resolution applies user-agent defaults, then `<style>` rules in source
//! order, then the inline `style` attribute (last write wins, no specificity).
//! Layout is intentionally simple: every displayed element without explicit
//! positioning takes its own row in a vertical flow, while `absolute` and
//! `fixed` boxes are placed from their `left/top/width/height` pixel values.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::selector::SelectorList;
use crate::dom::{DomArena, NodeId};

pub const FLOW_LEFT: f64 = 8.0;
pub const FLOW_TOP: f64 = 8.0;
pub const ROW_HEIGHT: f64 = 20.0;
pub const ROW_GAP: f64 = 4.0;
pub const ROW_WIDTH: f64 = 800.0;

const HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "template", "title", "meta", "link", "noscript", "base",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.has_area() && x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Static,
    Relative,
    Absolute,
    Fixed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    /// The element itself is `display:none`.
    pub display_none: bool,
    /// Neither the element nor any ancestor is `display:none`.
    pub displayed: bool,
    pub visibility: Visibility,
    pub opacity: f32,
    pub cursor: String,
    pub pointer_events: bool,
    pub position: Position,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub z_index: i32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display_none: false,
            displayed: true,
            visibility: Visibility::Visible,
            opacity: 1.0,
            cursor: "auto".to_string(),
            pointer_events: true,
            position: Position::Static,
            left: None,
            top: None,
            width: None,
            height: None,
            z_index: 0,
        }
    }
}

impl ComputedStyle {
    fn inherit(parent: &ComputedStyle) -> Self {
        Self {
            displayed: parent.displayed,
            visibility: parent.visibility,
            cursor: parent.cursor.clone(),
            pointer_events: parent.pointer_events,
            ..Self::default()
        }
    }

    fn apply(&mut self, property: &str, value: &str) {
        let lower = value.to_ascii_lowercase();
        match property {
            "display" => self.display_none = lower == "none",
            "visibility" => {
                self.visibility = match lower.as_str() {
                    "hidden" | "collapse" => Visibility::Hidden,
                    _ => Visibility::Visible,
                }
            }
            "opacity" => {
                if let Ok(opacity) = lower.parse::<f32>() {
                    self.opacity = opacity.clamp(0.0, 1.0);
                }
            }
            "cursor" => self.cursor = lower,
            "pointer-events" => self.pointer_events = lower != "none",
            "position" => {
                self.position = match lower.as_str() {
                    "relative" => Position::Relative,
                    "absolute" => Position::Absolute,
                    "fixed" => Position::Fixed,
                    _ => Position::Static,
                }
            }
            "left" => self.left = parse_px(&lower),
            "top" => self.top = parse_px(&lower),
            "width" => self.width = parse_px(&lower),
            "height" => self.height = parse_px(&lower),
            "z-index" => self.z_index = lower.parse().unwrap_or(0),
            _ => {}
        }
    }

    pub fn is_positioned_out_of_flow(&self) -> bool {
        matches!(self.position, Position::Absolute | Position::Fixed)
    }
}

fn parse_px(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|px| px.is_finite())
}

/// Split a declaration block into lowercase property names and raw values.
pub fn parse_declarations(block: &str) -> Vec<(String, String)> {
    block
        .split(';')
        .filter_map(|chunk| {
            let (property, value) = chunk.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some((property, value.to_string()))
            }
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct StyleRule {
    pub selector: SelectorList,
    pub declarations: Vec<(String, String)>,
}

/// Parse a stylesheet. At-rule blocks and rules with unsupported selectors are
/// skipped.
pub fn parse_stylesheet(source: &str) -> Vec<StyleRule> {
    let text = strip_comments(source);
    let mut rules = Vec::new();
    let mut rest = text.as_str();
    while let Some(open) = rest.find('{') {
        let prelude = rest[..open].trim();
        let Some(close) = matching_brace(rest, open) else {
            break;
        };
        let body = &rest[open + 1..close];
        rest = &rest[close + 1..];
        if prelude.starts_with('@') || prelude.is_empty() {
            continue;
        }
        match SelectorList::parse(prelude) {
            Ok(selector) => rules.push(StyleRule {
                selector,
                declarations: parse_declarations(body),
            }),
            Err(err) => debug!(selector = prelude, error = %err, "skipping stylesheet rule"),
        }
    }
    rules
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Clone, Debug)]
pub struct RenderBox {
    pub style: ComputedStyle,
    /// Document coordinates, or viewport coordinates for `position:fixed`.
    pub rect: Rect,
}

impl RenderBox {
    pub fn is_fixed(&self) -> bool {
        self.style.position == Position::Fixed
    }
}

/// Style and geometry for every element, computed once per document load.
#[derive(Clone, Debug, Default)]
pub struct RenderTree {
    boxes: Vec<Option<RenderBox>>,
    paint_order: Vec<NodeId>,
    document_height: f64,
}

impl RenderTree {
    pub fn compute(arena: &DomArena) -> Self {
        let stylesheet: String = arena
            .elements()
            .filter(|id| arena.tag(*id) == Some("style"))
            .map(|id| arena.text_content(id))
            .collect::<Vec<_>>()
            .join("\n");
        let rules = parse_stylesheet(&stylesheet);

        let mut boxes: Vec<Option<RenderBox>> = vec![None; arena.len()];
        let mut flow_y = FLOW_TOP;
        let mut document_height: f64 = 0.0;

        for id in arena.elements() {
            let Some(element) = arena.element(id) else {
                continue;
            };
            let inherited = arena
                .parent_element(id)
                .and_then(|parent| boxes[parent.0].as_ref())
                .map(|parent| ComputedStyle::inherit(&parent.style))
                .unwrap_or_default();
            let mut style = inherited;

            if HIDDEN_TAGS.contains(&element.tag.as_str())
                || element.has_attr("hidden")
                || (element.tag == "input" && element.input_type().as_deref() == Some("hidden"))
            {
                style.display_none = true;
            }
            if element.tag == "a" && element.has_attr("href") {
                style.cursor = "pointer".to_string();
            }
            for rule in rules.iter().filter(|rule| rule.selector.matches(arena, id)) {
                for (property, value) in &rule.declarations {
                    style.apply(property, value);
                }
            }
            if let Some(inline) = element.attr("style") {
                for (property, value) in parse_declarations(inline) {
                    style.apply(&property, &value);
                }
            }
            style.displayed = style.displayed && !style.display_none;

            let rect = if !style.displayed {
                Rect::default()
            } else if style.is_positioned_out_of_flow() {
                Rect::new(
                    style.left.unwrap_or(0.0),
                    style.top.unwrap_or(0.0),
                    style.width.unwrap_or(ROW_WIDTH),
                    style.height.unwrap_or(ROW_HEIGHT),
                )
            } else {
                let rect = Rect::new(
                    FLOW_LEFT,
                    flow_y,
                    style.width.unwrap_or(ROW_WIDTH),
                    style.height.unwrap_or(ROW_HEIGHT),
                );
                flow_y += rect.height.max(0.0) + ROW_GAP;
                rect
            };
            if style.displayed && style.position != Position::Fixed {
                document_height = document_height.max(rect.bottom());
            }
            boxes[id.0] = Some(RenderBox { style, rect });
        }

        let mut paint_order: Vec<NodeId> = arena
            .elements()
            .filter(|id| {
                boxes[id.0]
                    .as_ref()
                    .map(|render| render.style.displayed)
                    .unwrap_or(false)
            })
            .collect();
        paint_order.sort_by_key(|id| {
            let z = boxes[id.0]
                .as_ref()
                .map(|render| render.style.z_index)
                .unwrap_or(0);
            (z, id.0)
        });

        Self {
            boxes,
            paint_order,
            document_height: document_height + FLOW_TOP,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&RenderBox> {
        self.boxes.get(id.0).and_then(Option::as_ref)
    }

    pub fn style(&self, id: NodeId) -> Option<&ComputedStyle> {
        self.get(id).map(|render| &render.style)
    }

    pub fn document_height(&self) -> f64 {
        self.document_height
    }

    /// Rectangle relative to the viewport for the given scroll offsets.
    pub fn viewport_rect(&self, id: NodeId, scroll_x: f64, scroll_y: f64) -> Rect {
        match self.get(id) {
            Some(render) if render.is_fixed() => render.rect,
            Some(render) => render.rect.translated(-scroll_x, -scroll_y),
            None => Rect::default(),
        }
    }

    /// Topmost element that would receive a pointer event at viewport point
    /// `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64, scroll_x: f64, scroll_y: f64) -> Option<NodeId> {
        self.paint_order.iter().rev().copied().find(|id| {
            let Some(render) = self.get(*id) else {
                return false;
            };
            render.style.displayed
                && render.style.visibility == Visibility::Visible
                && render.style.pointer_events
                && self.viewport_rect(*id, scroll_x, scroll_y).contains(x, y)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(arena: &DomArena, id_attr: &str) -> NodeId {
        arena
            .elements()
            .find(|id| arena.element(*id).and_then(|el| el.id()) == Some(id_attr))
            .expect("element exists")
    }

    #[test]
    fn stylesheet_parsing_skips_comments_and_at_rules() {
        let rules = parse_stylesheet(
            "/* reset */ @media print { p { display: none } } .x { opacity: 0 !important; } a:hover { color: red }",
        );
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector.as_str(), ".x");
        assert_eq!(rules[0].declarations, vec![("opacity".to_string(), "0".to_string())]);
    }

    #[test]
    fn display_none_hides_subtree_and_visibility_inherits() {
        let arena = DomArena::parse(
            r#"<style>.gone { display: none }</style>
               <div class="gone"><span id="inner">x</span></div>
               <div style="visibility:hidden"><span id="ghost">y</span></div>"#,
        );
        let tree = RenderTree::compute(&arena);
        let inner = tree.style(find(&arena, "inner")).expect("style");
        assert!(!inner.displayed);
        let ghost = tree.style(find(&arena, "ghost")).expect("style");
        assert!(ghost.displayed);
        assert_eq!(ghost.visibility, Visibility::Hidden);
    }

    #[test]
    fn inline_style_overrides_stylesheet() {
        let arena = DomArena::parse(
            r#"<style>#b { cursor: default; width: 10px }</style><button id="b" style="cursor: pointer">B</button>"#,
        );
        let tree = RenderTree::compute(&arena);
        let button = tree.get(find(&arena, "b")).expect("box");
        assert_eq!(button.style.cursor, "pointer");
        assert_eq!(button.rect.width, 10.0);
    }

    #[test]
    fn flow_rows_stack_vertically() {
        let arena = DomArena::parse(r#"<body><p id="a">a</p><p id="b" style="height: 40px">b</p><p id="c">c</p></body>"#);
        let tree = RenderTree::compute(&arena);
        let a = tree.get(find(&arena, "a")).expect("a").rect;
        let b = tree.get(find(&arena, "b")).expect("b").rect;
        let c = tree.get(find(&arena, "c")).expect("c").rect;
        assert_eq!(b.y - a.y, ROW_HEIGHT + ROW_GAP);
        assert_eq!(c.y - b.y, 40.0 + ROW_GAP);
    }

    #[test]
    fn hit_test_prefers_higher_z_index() {
        let arena = DomArena::parse(
            r#"<body>
                <button id="under" style="position:absolute; left:0; top:0; width:100px; height:50px">under</button>
                <div id="over" style="position:fixed; left:0; top:0; width:200px; height:200px; z-index:10"></div>
            </body>"#,
        );
        let tree = RenderTree::compute(&arena);
        assert_eq!(tree.hit_test(10.0, 10.0, 0.0, 0.0), Some(find(&arena, "over")));
        // fixed boxes ignore scrolling, document boxes move with it
        assert_eq!(tree.hit_test(10.0, 10.0, 0.0, 400.0), Some(find(&arena, "over")));
        assert_eq!(tree.viewport_rect(find(&arena, "under"), 0.0, 400.0).y, -400.0);
    }

    #[test]
    fn pointer_events_none_is_transparent_to_hits() {
        let arena = DomArena::parse(
            r#"<body>
                <button id="target" style="position:absolute; left:0; top:0; width:100px; height:50px">go</button>
                <div style="position:absolute; left:0; top:0; width:100px; height:50px; z-index:5; pointer-events:none"></div>
            </body>"#,
        );
        let tree = RenderTree::compute(&arena);
        assert_eq!(tree.hit_test(50.0, 25.0, 0.0, 0.0), Some(find(&arena, "target")));
    }
}
