//! The acting context's live document.
//!
//! A [`LiveDocument`] couples the parsed node arena and its render tree with
//! the state that changes while a page is open: viewport scroll offsets, form
//! control values, focus, and the log of dispatched events. Every load bumps a
//! process-wide generation counter so stale node ids can be detected.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::selector::{SelectorError, SelectorList};
use crate::dom::{normalize_whitespace, DomArena, NodeId};
use crate::style::{Rect, RenderTree};

pub type SharedDocument = Arc<RwLock<LiveDocument>>;

pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 720.0;

static GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    GENERATION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Focus,
    Click,
    Input,
    Change,
    Scroll,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomEvent {
    pub node: Option<NodeId>,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

pub struct LiveDocument {
    url: String,
    generation: u64,
    arena: DomArena,
    render: RenderTree,
    viewport: Viewport,
    values: HashMap<NodeId, String>,
    checked: HashSet<NodeId>,
    focused: Option<NodeId>,
    events: Vec<DomEvent>,
}

impl LiveDocument {
    pub fn parse(url: impl Into<String>, html: &str) -> Self {
        let arena = DomArena::parse(html);
        let render = RenderTree::compute(&arena);
        let mut document = Self {
            url: url.into(),
            generation: next_generation(),
            arena,
            render,
            viewport: Viewport::default(),
            values: HashMap::new(),
            checked: HashSet::new(),
            focused: None,
            events: Vec::new(),
        };
        document.seed_form_state();
        document
    }

    pub fn blank() -> Self {
        Self::parse("about:blank", "<html><head></head><body></body></html>")
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }

    /// Replace the document in place, as a navigation would.
    pub fn load(&mut self, url: impl Into<String>, html: &str) {
        let viewport = Viewport {
            scroll_x: 0.0,
            scroll_y: 0.0,
            ..self.viewport
        };
        *self = Self::parse(url, html);
        self.viewport = viewport;
    }

    fn seed_form_state(&mut self) {
        let arena = &self.arena;
        for id in arena.elements() {
            let Some(element) = arena.element(id) else {
                continue;
            };
            match element.tag.as_str() {
                "input" => {
                    let ty = element.input_type().unwrap_or_default();
                    if matches!(ty.as_str(), "checkbox" | "radio") {
                        if element.has_attr("checked") {
                            self.checked.insert(id);
                        }
                    } else if let Some(value) = element.attr("value") {
                        self.values.insert(id, value.to_string());
                    }
                }
                "textarea" => {
                    self.values.insert(id, arena.text_content(id));
                }
                "select" => {
                    let options: Vec<NodeId> = arena
                        .descendant_elements(id)
                        .filter(|option| arena.tag(*option) == Some("option"))
                        .collect();
                    let selected = options
                        .iter()
                        .copied()
                        .find(|option| {
                            arena
                                .element(*option)
                                .map(|el| el.has_attr("selected"))
                                .unwrap_or(false)
                        })
                        .or_else(|| options.first().copied());
                    if let Some(option) = selected {
                        let value = self.option_value(option);
                        self.values.insert(id, value);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    pub fn render(&self) -> &RenderTree {
        &self.render
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    pub fn title(&self) -> String {
        self.arena
            .first_by_tag("title")
            .map(|id| normalize_whitespace(&self.arena.text_content(id)))
            .unwrap_or_default()
    }

    pub fn body(&self) -> NodeId {
        self.arena
            .first_by_tag("body")
            .unwrap_or_else(|| self.arena.root())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.arena.tag(id)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.arena.element(id).and_then(|element| element.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Whitespace-normalized text of the subtree.
    pub fn text(&self, id: NodeId) -> String {
        normalize_whitespace(&self.arena.text_content(id))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(list.select_first(&self.arena, self.arena.root()))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(list.select(&self.arena, self.arena.root()))
    }

    pub fn select_within(
        &self,
        scope: NodeId,
        selector: &SelectorList,
    ) -> Vec<NodeId> {
        selector.select(&self.arena, scope)
    }

    pub fn select_first_within(&self, scope: NodeId, selector: &SelectorList) -> Option<NodeId> {
        selector.select_first(&self.arena, scope)
    }

    pub fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
        selector.matches(&self.arena, id)
    }

    /// Current value of a form control (`None` for other elements).
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.values.get(&id).map(String::as_str)
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.checked.contains(&id)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    pub fn events_for(&self, id: NodeId) -> impl Iterator<Item = &DomEvent> {
        self.events.iter().filter(move |event| event.node == Some(id))
    }

    pub fn dispatch(&mut self, id: NodeId, kind: EventKind, data: Option<String>) {
        self.events.push(DomEvent {
            node: Some(id),
            kind,
            data,
        });
    }

    pub fn focus(&mut self, id: NodeId) {
        if self.focused != Some(id) {
            self.focused = Some(id);
            self.dispatch(id, EventKind::Focus, None);
        }
    }

    /// Assign a value without dispatching events.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.values.insert(id, value.into());
    }

    /// Append one character to the field value.
    pub fn insert_char(&mut self, id: NodeId, ch: char) {
        self.values.entry(id).or_default().push(ch);
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if checked {
            if self.input_type(id).as_deref() == Some("radio") {
                self.uncheck_radio_group(id);
            }
            self.checked.insert(id);
        } else {
            self.checked.remove(&id);
        }
    }

    fn input_type(&self, id: NodeId) -> Option<String> {
        self.arena.element(id).and_then(|element| element.input_type())
    }

    fn uncheck_radio_group(&mut self, id: NodeId) {
        let Some(name) = self.attr(id, "name").map(str::to_string) else {
            return;
        };
        let peers: Vec<NodeId> = self
            .checked
            .iter()
            .copied()
            .filter(|peer| {
                *peer != id
                    && self.input_type(*peer).as_deref() == Some("radio")
                    && self.attr(*peer, "name") == Some(name.as_str())
            })
            .collect();
        for peer in peers {
            self.checked.remove(&peer);
        }
    }

    fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text(option))
    }

    /// Options of a `<select>` as `(value, label)` pairs in document order.
    pub fn options(&self, select: NodeId) -> Vec<(String, String)> {
        self.arena
            .descendant_elements(select)
            .filter(|option| self.arena.tag(*option) == Some("option"))
            .map(|option| (self.option_value(option), self.text(option)))
            .collect()
    }

    /// Pick a `<select>` option by value, falling back to a case-insensitive
    /// label match. Returns the chosen value.
    pub fn select_option(&mut self, select: NodeId, wanted: &str) -> Option<String> {
        let options = self.options(select);
        let chosen = options
            .iter()
            .find(|(value, _)| value == wanted)
            .or_else(|| {
                options
                    .iter()
                    .find(|(_, label)| label.eq_ignore_ascii_case(wanted.trim()))
            })
            .map(|(value, _)| value.clone())?;
        self.values.insert(select, chosen.clone());
        Some(chosen)
    }

    /// Dispatch a click. Checkboxes toggle and radios select, each followed by a
    /// change event.
    pub fn click(&mut self, id: NodeId) {
        self.dispatch(id, EventKind::Click, None);
        match self.input_type(id).as_deref() {
            Some("checkbox") => {
                let next = !self.is_checked(id);
                self.set_checked(id, next);
                self.dispatch(id, EventKind::Change, Some(next.to_string()));
            }
            Some("radio") if !self.is_checked(id) => {
                self.set_checked(id, true);
                self.dispatch(id, EventKind::Change, Some("true".to_string()));
            }
            _ => {}
        }
    }

    pub fn max_scroll(&self) -> (f64, f64) {
        let height = (self.render.document_height() - self.viewport.height).max(0.0);
        let width = (crate::style::FLOW_LEFT * 2.0 + crate::style::ROW_WIDTH
            - self.viewport.width)
            .max(0.0);
        (width, height)
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) {
        let (max_x, max_y) = self.max_scroll();
        self.viewport.scroll_x = x.clamp(0.0, max_x);
        self.viewport.scroll_y = y.clamp(0.0, max_y);
        self.events.push(DomEvent {
            node: None,
            kind: EventKind::Scroll,
            data: Some(format!(
                "{},{}",
                self.viewport.scroll_x, self.viewport.scroll_y
            )),
        });
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        let Viewport {
            scroll_x, scroll_y, ..
        } = self.viewport;
        self.scroll_to(scroll_x + dx, scroll_y + dy);
    }

    /// Scroll so the element's centre lands in the middle of the viewport.
    /// The horizontal offset only changes when the element is cut off at the
    /// left or right edge.
    pub fn scroll_into_view(&mut self, id: NodeId) {
        let Some(render) = self.render.get(id) else {
            return;
        };
        if render.is_fixed() {
            return;
        }
        let (cx, cy) = render.rect.center();
        let left = render.rect.x - self.viewport.scroll_x;
        let right = render.rect.right() - self.viewport.scroll_x;
        let target_x = if left < 0.0 || right > self.viewport.width {
            cx - self.viewport.width / 2.0
        } else {
            self.viewport.scroll_x
        };
        let target_y = cy - self.viewport.height / 2.0;
        self.scroll_to(target_x, target_y);
    }

    /// Bounding box in viewport coordinates.
    pub fn viewport_rect(&self, id: NodeId) -> Rect {
        self.render
            .viewport_rect(id, self.viewport.scroll_x, self.viewport.scroll_y)
    }

    /// Topmost element at a viewport point. Points outside the viewport hit
    /// nothing.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<NodeId> {
        if x < 0.0 || y < 0.0 || x >= self.viewport.width || y >= self.viewport.height {
            return None;
        }
        self.render
            .hit_test(x, y, self.viewport.scroll_x, self.viewport.scroll_y)
    }

    /// Absolute XPath with a 1-based index among same-tag siblings at every
    /// step.
    pub fn xpath_of(&self, id: NodeId) -> Option<String> {
        self.arena.element(id)?;
        let mut steps = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(tag) = self.arena.tag(node) else {
                break;
            };
            let index = match self.arena.parent(node) {
                Some(parent) => {
                    self.arena
                        .element_children(parent)
                        .take_while(|sibling| *sibling != node)
                        .filter(|sibling| self.arena.tag(*sibling) == Some(tag))
                        .count()
                        + 1
                }
                None => 1,
            };
            steps.push(format!("{tag}[{index}]"));
            current = self.arena.parent_element(node);
        }
        steps.reverse();
        Some(format!("/{}", steps.join("/")))
    }

    /// Resolve an XPath produced by [`Self::xpath_of`].
    pub fn node_by_xpath(&self, xpath: &str) -> Option<NodeId> {
        let mut current = self.arena.root();
        for step in xpath.trim_start_matches('/').split('/') {
            let (tag, index) = match step.split_once('[') {
                Some((tag, rest)) => (tag, rest.trim_end_matches(']').parse::<usize>().ok()?),
                None => (step, 1),
            };
            current = self
                .arena
                .element_children(current)
                .filter(|child| self.arena.tag(*child) == Some(tag))
                .nth(index.checked_sub(1)?)?;
        }
        self.arena.element(current).map(|_| current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> LiveDocument {
        LiveDocument::parse("https://example.test/", html)
    }

    #[test]
    fn generations_increase_across_loads() {
        let mut document = doc("<p>one</p>");
        let first = document.generation();
        document.load("https://example.test/two", "<p>two</p>");
        assert!(document.generation() > first);
        assert_eq!(document.url(), "https://example.test/two");
    }

    #[test]
    fn form_state_is_seeded_from_markup() {
        let document = doc(
            r#"<input id="q" value="rust"><input id="c" type="checkbox" checked>
               <select id="s"><option value="a">A</option><option value="b" selected>B</option></select>
               <textarea id="t">notes</textarea>"#,
        );
        let q = document.query_selector("#q").unwrap().unwrap();
        let c = document.query_selector("#c").unwrap().unwrap();
        let s = document.query_selector("#s").unwrap().unwrap();
        let t = document.query_selector("#t").unwrap().unwrap();
        assert_eq!(document.value(q), Some("rust"));
        assert!(document.is_checked(c));
        assert_eq!(document.value(s), Some("b"));
        assert_eq!(document.value(t), Some("notes"));
    }

    #[test]
    fn click_toggles_checkbox_and_selects_radio() {
        let mut document = doc(
            r#"<input id="c" type="checkbox">
               <input id="r1" type="radio" name="g" checked><input id="r2" type="radio" name="g">"#,
        );
        let c = document.query_selector("#c").unwrap().unwrap();
        let r1 = document.query_selector("#r1").unwrap().unwrap();
        let r2 = document.query_selector("#r2").unwrap().unwrap();
        document.click(c);
        assert!(document.is_checked(c));
        document.click(r2);
        assert!(document.is_checked(r2));
        assert!(!document.is_checked(r1));
    }

    #[test]
    fn select_option_matches_value_then_label() {
        let mut document = doc(
            r#"<select id="s"><option value="us">United States</option><option value="de">Germany</option></select>"#,
        );
        let s = document.query_selector("#s").unwrap().unwrap();
        assert_eq!(document.select_option(s, "germany").as_deref(), Some("de"));
        assert_eq!(document.select_option(s, "us").as_deref(), Some("us"));
        assert_eq!(document.select_option(s, "france"), None);
        assert_eq!(document.value(s), Some("us"));
    }

    #[test]
    fn xpath_round_trips() {
        let document = doc("<body><div><p>a</p><p>b</p></div><div><p id='x'>c</p></div></body>");
        let x = document.query_selector("#x").unwrap().unwrap();
        let path = document.xpath_of(x).unwrap();
        assert_eq!(path, "/html[1]/body[1]/div[2]/p[1]");
        assert_eq!(document.node_by_xpath(&path), Some(x));
    }

    #[test]
    fn scroll_into_view_centres_element() {
        let mut html = String::from("<body>");
        for index in 0..100 {
            html.push_str(&format!("<p id='p{index}'>row {index}</p>"));
        }
        html.push_str("</body>");
        let mut document = doc(&html);
        let target = document.query_selector("#p80").unwrap().unwrap();
        assert!(document.viewport_rect(target).y > DEFAULT_VIEWPORT_HEIGHT);
        document.scroll_into_view(target);
        let rect = document.viewport_rect(target);
        assert!(rect.y >= 0.0 && rect.bottom() <= DEFAULT_VIEWPORT_HEIGHT);
        assert_eq!(document.hit_test(rect.center().0, rect.center().1), Some(target));
    }

    #[test]
    fn scroll_into_view_keeps_horizontal_offset_when_in_view() {
        let mut document = doc(
            r#"<body>
                <button id="near" style="position:absolute; left:0; top:0; width:60px; height:20px">near</button>
                <button id="far" style="position:absolute; left:500px; top:1000px; width:60px; height:20px">far</button>
            </body>"#,
        );
        document.set_viewport_size(400.0, 300.0);
        document.scroll_to(300.0, 0.0);
        assert_eq!(document.viewport().scroll_x, 300.0);

        let far = document.query_selector("#far").unwrap().unwrap();
        document.scroll_into_view(far);
        assert_eq!(document.viewport().scroll_x, 300.0);
        let rect = document.viewport_rect(far);
        assert!(rect.y >= 0.0 && rect.bottom() <= 300.0, "{rect:?}");

        let near = document.query_selector("#near").unwrap().unwrap();
        document.scroll_into_view(near);
        assert_eq!(document.viewport().scroll_x, 0.0);
        assert_eq!(document.viewport().scroll_y, 0.0);
    }
}
