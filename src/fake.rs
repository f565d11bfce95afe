//! In-memory page used by the component tests.
//!
//! Nodes live in an arena addressed by index. Timers run against a virtual
//! clock that only moves through [`FakePage::advance`], so every delay in the
//! components can be stepped through deterministically.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use crate::error::LandingError;
use crate::platform::{
    Dom, DomEvent, EventKind, Handler, IntersectionOptions, ListenerId, Media, MediaSnapshot,
    ObserverId, Rect, ScrollMetrics, Target, TimerHandle, Timers,
};

pub type NodeId = usize;

const ROOT: NodeId = 0;
const BODY: NodeId = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct FakeMedia {
    pub paused: bool,
    pub muted: bool,
    pub volume: f64,
    pub current_time: f64,
    pub duration: f64,
    pub play_error: Option<String>,
    pub metadata_loaded: bool,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            paused: true,
            muted: false,
            volume: 1.0,
            current_time: 0.0,
            duration: 120.0,
            play_error: None,
            metadata_loaded: false,
        }
    }
}

#[derive(Default)]
struct FakeNode {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    inner_html: String,
    text: String,
    styles: BTreeMap<String, String>,
    value: String,
    disabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    offset_top: f64,
    rect: Rect,
    scroll: ScrollMetrics,
    media: Option<FakeMedia>,
}

struct Listener {
    target: Target<NodeId>,
    kind: EventKind,
    handler: Rc<RefCell<Handler<NodeId>>>,
}

struct Observer {
    options: IntersectionOptions,
    on_visible: Rc<RefCell<Box<dyn FnMut(NodeId)>>>,
    watched: Vec<NodeId>,
}

enum TimerTask {
    Once(Box<dyn FnOnce()>),
    Repeat(Box<dyn FnMut()>),
}

struct PendingTimer {
    due: Duration,
    order: u64,
    period: Option<Duration>,
    task: TimerTask,
}

pub struct FakePage {
    nodes: RefCell<Vec<FakeNode>>,
    listeners: RefCell<BTreeMap<ListenerId, Listener>>,
    observers: RefCell<BTreeMap<ObserverId, Observer>>,
    timers: RefCell<BTreeMap<TimerHandle, PendingTimer>>,
    next_id: Cell<u32>,
    next_order: Cell<u64>,
    now: Cell<Duration>,
    running_timer: Cell<Option<TimerHandle>>,
    running_timer_cleared: Cell<bool>,
    scroll_y: Cell<f64>,
    focused: Cell<Option<NodeId>>,
    window_scrolls: RefCell<Vec<f64>>,
    element_scrolls: RefCell<Vec<(NodeId, f64)>>,
    scrolled_into_view: RefCell<Vec<NodeId>>,
}

impl FakePage {
    pub fn new() -> Rc<Self> {
        let page = Self {
            nodes: RefCell::new(Vec::new()),
            listeners: RefCell::new(BTreeMap::new()),
            observers: RefCell::new(BTreeMap::new()),
            timers: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            next_order: Cell::new(0),
            now: Cell::new(Duration::ZERO),
            running_timer: Cell::new(None),
            running_timer_cleared: Cell::new(false),
            scroll_y: Cell::new(0.0),
            focused: Cell::new(None),
            window_scrolls: RefCell::new(Vec::new()),
            element_scrolls: RefCell::new(Vec::new()),
            scrolled_into_view: RefCell::new(Vec::new()),
        };
        let root = page.alloc("html");
        let body = page.alloc("body");
        page.attach(root, body);
        Rc::new(page)
    }

    // ---- building ----

    pub fn body_id(&self) -> NodeId {
        BODY
    }

    /// Appends `<tag class="...">` to `parent`.
    pub fn element(&self, parent: NodeId, tag: &str, classes: &str) -> NodeId {
        let id = self.alloc(tag);
        self.nodes.borrow_mut()[id].classes =
            classes.split_whitespace().map(str::to_string).collect();
        self.attach(parent, id);
        id
    }

    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.nodes.borrow_mut()[node]
            .attributes
            .insert(name.to_string(), value.to_string());
        if name == "value" {
            self.nodes.borrow_mut()[node].value = value.to_string();
        }
    }

    pub fn set_offset_top(&self, node: NodeId, top: f64) {
        self.nodes.borrow_mut()[node].offset_top = top;
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.nodes.borrow_mut()[node].rect = rect;
    }

    pub fn set_scroll(&self, node: NodeId, metrics: ScrollMetrics) {
        self.nodes.borrow_mut()[node].scroll = metrics;
    }

    pub fn set_window_scroll_y(&self, y: f64) {
        self.scroll_y.set(y);
    }

    pub fn attach_media(&self, node: NodeId, media: FakeMedia) {
        self.nodes.borrow_mut()[node].media = Some(media);
    }

    pub fn update_media(&self, node: NodeId, update: impl FnOnce(&mut FakeMedia)) {
        if let Some(media) = self.nodes.borrow_mut()[node].media.as_mut() {
            update(media);
        }
    }

    // ---- inspection ----

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.nodes.borrow()[node].classes.clone()
    }

    pub fn class_present(&self, node: NodeId, class: &str) -> bool {
        self.nodes.borrow()[node].classes.iter().any(|c| c == class)
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.nodes.borrow()[node].tag.clone()
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node].attributes.get(name).cloned()
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        self.nodes.borrow()[node].inner_html.clone()
    }

    pub fn text(&self, node: NodeId) -> String {
        self.nodes.borrow()[node].text.clone()
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes.borrow()[node].styles.get(property).cloned()
    }

    pub fn current_value(&self, node: NodeId) -> String {
        self.nodes.borrow()[node].value.clone()
    }

    pub fn type_into(&self, node: NodeId, value: &str) {
        self.nodes.borrow_mut()[node].value = value.to_string();
    }

    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.nodes.borrow()[node].disabled
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node].children.clone()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = node;
        loop {
            if current == ROOT {
                return true;
            }
            match nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn media(&self, node: NodeId) -> FakeMedia {
        self.nodes.borrow()[node].media.clone().unwrap_or_default()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.get()
    }

    pub fn window_scrolls(&self) -> Vec<f64> {
        self.window_scrolls.borrow().clone()
    }

    pub fn element_scrolls(&self) -> Vec<(NodeId, f64)> {
        self.element_scrolls.borrow().clone()
    }

    pub fn scrolled_into_view(&self) -> Vec<NodeId> {
        self.scrolled_into_view.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    pub fn observer_options(&self) -> Vec<IntersectionOptions> {
        self.observers.borrow().values().map(|o| o.options).collect()
    }

    pub fn is_watched(&self, node: NodeId) -> bool {
        self.observers
            .borrow()
            .values()
            .any(|observer| observer.watched.contains(&node))
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    // ---- driving ----

    /// Dispatches an event at `target`. Clicks, submits, key presses and
    /// input events bubble through the ancestors, then the document and
    /// the window.
    pub fn dispatch(&self, target: Target<NodeId>, event: DomEvent<NodeId>) -> DomEvent<NodeId> {
        let bubbles = matches!(
            event.kind(),
            EventKind::Click | EventKind::Submit | EventKind::KeyDown | EventKind::Input
        );

        let mut path = vec![target.clone()];
        if bubbles {
            if let Target::Node(node) = target {
                let mut current = self.nodes.borrow()[node].parent;
                while let Some(parent) = current {
                    path.push(Target::Node(parent));
                    current = self.nodes.borrow()[parent].parent;
                }
                path.push(Target::Document);
                path.push(Target::Window);
            } else if target == Target::Document {
                path.push(Target::Window);
            }
        }

        for stop in path {
            self.fire(&stop, &event);
        }
        event
    }

    pub fn click(&self, node: NodeId) -> DomEvent<NodeId> {
        self.dispatch(
            Target::Node(node),
            DomEvent::new(EventKind::Click).with_target(node),
        )
    }

    pub fn click_at(&self, node: NodeId, client_x: f64) -> DomEvent<NodeId> {
        self.dispatch(
            Target::Node(node),
            DomEvent::new(EventKind::Click)
                .with_target(node)
                .with_client_x(client_x),
        )
    }

    pub fn press_key(&self, node: NodeId, key: &str) -> DomEvent<NodeId> {
        self.dispatch(
            Target::Node(node),
            DomEvent::new(EventKind::KeyDown)
                .with_target(node)
                .with_key(key),
        )
    }

    pub fn fire_on(&self, node: NodeId, kind: EventKind) -> DomEvent<NodeId> {
        self.dispatch(Target::Node(node), DomEvent::new(kind).with_target(node))
    }

    pub fn fire_window(&self, kind: EventKind) -> DomEvent<NodeId> {
        self.dispatch(Target::Window, DomEvent::new(kind))
    }

    /// Reports `node` as entering the viewport to every observer watching it.
    pub fn intersect(&self, node: NodeId) {
        let callbacks: Vec<(ObserverId, Rc<RefCell<Box<dyn FnMut(NodeId)>>>)> = self
            .observers
            .borrow()
            .iter()
            .filter(|(_, observer)| observer.watched.contains(&node))
            .map(|(id, observer)| (*id, Rc::clone(&observer.on_visible)))
            .collect();

        for (id, callback) in callbacks {
            let still_watching = self
                .observers
                .borrow()
                .get(&id)
                .is_some_and(|observer| observer.watched.contains(&node));
            if still_watching {
                (callback.borrow_mut())(node);
            }
        }
    }

    /// Moves the virtual clock forward, running every timer that falls due
    /// on the way in due order.
    pub fn advance(&self, by: Duration) {
        let until = self.now.get() + by;
        loop {
            let next = self
                .timers
                .borrow()
                .iter()
                .filter(|(_, timer)| timer.due <= until)
                .min_by_key(|(_, timer)| (timer.due, timer.order))
                .map(|(handle, _)| *handle);
            let Some(handle) = next else {
                break;
            };
            let Some(timer) = self.timers.borrow_mut().remove(&handle) else {
                break;
            };
            self.now.set(timer.due);

            match timer.task {
                TimerTask::Once(task) => task(),
                TimerTask::Repeat(mut task) => {
                    self.running_timer.set(Some(handle));
                    self.running_timer_cleared.set(false);
                    task();
                    self.running_timer.set(None);
                    if !self.running_timer_cleared.get() {
                        let period = timer.period.unwrap_or(Duration::from_millis(1));
                        let order = self.bump_order();
                        self.timers.borrow_mut().insert(
                            handle,
                            PendingTimer {
                                due: timer.due + period,
                                order,
                                period: timer.period,
                                task: TimerTask::Repeat(task),
                            },
                        );
                    }
                }
            }
        }
        self.now.set(until);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    // ---- internals ----

    fn alloc(&self, tag: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(FakeNode {
            tag: tag.to_ascii_lowercase(),
            ..FakeNode::default()
        });
        nodes.len() - 1
    }

    fn attach(&self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let mut nodes = self.nodes.borrow_mut();
        nodes[child].parent = Some(parent);
        nodes[parent].children.push(child);
    }

    fn detach(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node].parent.take() {
            nodes[parent].children.retain(|child| *child != node);
        }
    }

    fn next_handle(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn bump_order(&self) -> u64 {
        let order = self.next_order.get();
        self.next_order.set(order + 1);
        order
    }

    fn schedule(&self, delay: Duration, period: Option<Duration>, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle(self.next_handle());
        let order = self.bump_order();
        self.timers.borrow_mut().insert(
            handle,
            PendingTimer {
                due: self.now.get() + delay,
                order,
                period,
                task,
            },
        );
        handle
    }

    fn fire(&self, at: &Target<NodeId>, event: &DomEvent<NodeId>) {
        let handlers: Vec<(ListenerId, Rc<RefCell<Handler<NodeId>>>)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, listener)| &listener.target == at && listener.kind == event.kind())
            .map(|(id, listener)| (*id, Rc::clone(&listener.handler)))
            .collect();

        for (id, handler) in handlers {
            if self.listeners.borrow().contains_key(&id) {
                (handler.borrow_mut())(event);
            }
        }
    }

    fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = nodes[from].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(nodes[node].children.iter().rev().copied());
        }
        out
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .filter(|group| !group.is_empty())
            .any(|group| self.matches_chain(node, group))
    }

    fn matches_chain(&self, node: NodeId, group: &str) -> bool {
        let mut compounds: Vec<Compound> = group.split_whitespace().map(Compound::parse).collect();
        let Some(last) = compounds.pop() else {
            return false;
        };
        if !self.matches_compound(node, &last) {
            return false;
        }

        let mut ancestor = self.nodes.borrow()[node].parent;
        while let Some(required) = compounds.last() {
            let Some(candidate) = ancestor else {
                return false;
            };
            if self.matches_compound(candidate, required) {
                compounds.pop();
            }
            ancestor = self.nodes.borrow()[candidate].parent;
        }
        true
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let nodes = self.nodes.borrow();
        let element = &nodes[node];
        if let Some(tag) = &compound.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if element.attributes.get("id") != Some(id) {
                return false;
            }
        }
        if !compound
            .classes
            .iter()
            .all(|class| element.classes.contains(class))
        {
            return false;
        }
        compound.attributes.iter().all(|rule| {
            let value = element.attributes.get(&rule.name);
            match (&rule.test, value) {
                (_, None) => false,
                (AttrTest::Present, Some(_)) => true,
                (AttrTest::Equals(expected), Some(actual)) => actual == expected,
                (AttrTest::Prefix(prefix), Some(actual)) => actual.starts_with(prefix.as_str()),
            }
        })
    }
}

enum AttrTest {
    Present,
    Equals(String),
    Prefix(String),
}

struct AttrRule {
    name: String,
    test: AttrTest,
}

#[derive(Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttrRule>,
}

impl Compound {
    /// Understands `tag`, `.class`, `#id`, `[attr]`, `[attr="v"]` and
    /// `[attr^="v"]`, which is all the page uses.
    fn parse(raw: &str) -> Self {
        let mut compound = Self::default();
        let mut rest = raw;

        let tag_end = rest.find(['.', '#', '[']).unwrap_or(rest.len());
        if tag_end > 0 {
            compound.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            match marker {
                '[' => {
                    let close = rest.find(']').unwrap_or(rest.len());
                    compound.attributes.push(AttrRule::parse(&rest[1..close]));
                    rest = rest.get(close + 1..).unwrap_or("");
                }
                _ => {
                    let body = &rest[1..];
                    let end = body.find(['.', '#', '[']).unwrap_or(body.len());
                    let name = body[..end].to_string();
                    if marker == '.' {
                        compound.classes.push(name);
                    } else {
                        compound.id = Some(name);
                    }
                    rest = &body[end..];
                }
            }
        }
        compound
    }
}

impl AttrRule {
    fn parse(raw: &str) -> Self {
        let unquote = |value: &str| value.trim_matches(|c| c == '"' || c == '\'').to_string();
        if let Some((name, value)) = raw.split_once("^=") {
            return Self {
                name: name.to_string(),
                test: AttrTest::Prefix(unquote(value)),
            };
        }
        if let Some((name, value)) = raw.split_once('=') {
            return Self {
                name: name.to_string(),
                test: AttrTest::Equals(unquote(value)),
            };
        }
        Self {
            name: raw.to_string(),
            test: AttrTest::Present,
        }
    }
}

impl Dom for FakePage {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(BODY)
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.preorder(ROOT)
            .into_iter()
            .find(|node| self.matches(*node, selector))
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.preorder(ROOT)
            .into_iter()
            .filter(|node| self.matches(*node, selector))
            .collect()
    }

    fn query_within(&self, root: &NodeId, selector: &str) -> Option<NodeId> {
        self.preorder(*root)
            .into_iter()
            .find(|node| self.matches(*node, selector))
    }

    fn query_all_within(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        self.preorder(*root)
            .into_iter()
            .filter(|node| self.matches(*node, selector))
            .collect()
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let mut current = Some(*node);
        while let Some(candidate) = current {
            if self.matches(candidate, selector) {
                return Some(candidate);
            }
            current = self.nodes.borrow()[candidate].parent;
        }
        None
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let parent = nodes[*node].parent?;
        let siblings = &nodes[parent].children;
        let index = siblings.iter().position(|child| child == node)?;
        siblings.get(index + 1).copied()
    }

    fn create_element(&self, tag: &str) -> Result<NodeId, LandingError> {
        if tag.is_empty() {
            return Err(LandingError::CreateElement(tag.to_string()));
        }
        Ok(self.alloc(tag))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child);
    }

    fn remove(&self, node: &NodeId) {
        self.detach(*node);
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[*node].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.nodes.borrow_mut()[*node].classes.retain(|c| c != class);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.class_present(*node, class)
    }

    fn toggle_class(&self, node: &NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    fn set_class_name(&self, node: &NodeId, class_name: &str) {
        self.nodes.borrow_mut()[*node].classes =
            class_name.split_whitespace().map(str::to_string).collect();
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attr(*node, name)
    }

    fn has_attribute(&self, node: &NodeId, name: &str) -> bool {
        self.nodes.borrow()[*node].attributes.contains_key(name)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.set_attr(*node, name, value);
    }

    fn text_content(&self, node: &NodeId) -> String {
        let nodes = self.nodes.borrow();
        let element = &nodes[*node];
        if element.text.is_empty() {
            element.inner_html.clone()
        } else {
            element.text.clone()
        }
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[*node].inner_html = html.to_string();
        nodes[*node].text.clear();
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[*node].text = text.to_string();
        nodes[*node].inner_html.clear();
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        self.nodes.borrow_mut()[*node]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn value(&self, node: &NodeId) -> String {
        self.current_value(*node)
    }

    fn set_value(&self, node: &NodeId, value: &str) {
        self.type_into(*node, value);
    }

    fn set_disabled(&self, node: &NodeId, disabled: bool) {
        self.nodes.borrow_mut()[*node].disabled = disabled;
    }

    fn reset_form(&self, form: &NodeId) {
        for field in self.preorder(*form) {
            let mut nodes = self.nodes.borrow_mut();
            let element = &mut nodes[field];
            if matches!(element.tag.as_str(), "input" | "select" | "textarea") {
                element.value = element.attributes.get("value").cloned().unwrap_or_default();
            }
        }
    }

    fn focus(&self, node: &NodeId) {
        self.focused.set(Some(*node));
    }

    fn scroll_into_view(&self, node: &NodeId) {
        self.scrolled_into_view.borrow_mut().push(*node);
    }

    fn offset_top(&self, node: &NodeId) -> f64 {
        self.nodes.borrow()[*node].offset_top
    }

    fn bounding_rect(&self, node: &NodeId) -> Rect {
        self.nodes.borrow()[*node].rect
    }

    fn scroll_metrics(&self, node: &NodeId) -> ScrollMetrics {
        self.nodes.borrow()[*node].scroll
    }

    fn scroll_by(&self, node: &NodeId, dx: f64) {
        self.element_scrolls.borrow_mut().push((*node, dx));
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn scroll_to(&self, top: f64) {
        self.window_scrolls.borrow_mut().push(top);
    }

    fn listen(
        &self,
        target: Target<NodeId>,
        kind: EventKind,
        handler: Handler<NodeId>,
    ) -> ListenerId {
        let id = ListenerId(self.next_handle());
        self.listeners.borrow_mut().insert(
            id,
            Listener {
                target,
                kind,
                handler: Rc::new(RefCell::new(handler)),
            },
        );
        id
    }

    fn unlisten(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }

    fn observe_intersections(
        &self,
        options: IntersectionOptions,
        on_visible: Box<dyn FnMut(NodeId)>,
    ) -> ObserverId {
        let id = ObserverId(self.next_handle());
        self.observers.borrow_mut().insert(
            id,
            Observer {
                options,
                on_visible: Rc::new(RefCell::new(on_visible)),
                watched: Vec::new(),
            },
        );
        id
    }

    fn watch(&self, observer: ObserverId, node: &NodeId) {
        if let Some(observer) = self.observers.borrow_mut().get_mut(&observer) {
            if !observer.watched.contains(node) {
                observer.watched.push(*node);
            }
        }
    }

    fn unwatch(&self, observer: ObserverId, node: &NodeId) {
        if let Some(observer) = self.observers.borrow_mut().get_mut(&observer) {
            observer.watched.retain(|watched| watched != node);
        }
    }

    fn disconnect(&self, observer: ObserverId) {
        self.observers.borrow_mut().remove(&observer);
    }
}

impl Media for FakePage {
    fn media_state(&self, media: &NodeId) -> MediaSnapshot {
        let media = self.media(*media);
        MediaSnapshot {
            paused: media.paused,
            muted: media.muted,
            volume: media.volume,
            current_time: media.current_time,
            duration: media.duration,
        }
    }

    fn set_muted(&self, media: &NodeId, muted: bool) {
        self.update_media(*media, |state| state.muted = muted);
    }

    fn set_volume(&self, media: &NodeId, volume: f64) {
        self.update_media(*media, |state| state.volume = volume);
    }

    fn set_current_time(&self, media: &NodeId, seconds: f64) {
        self.update_media(*media, |state| state.current_time = seconds);
    }

    fn pause(&self, media: &NodeId) {
        self.update_media(*media, |state| state.paused = true);
    }

    fn has_metadata(&self, media: &NodeId) -> bool {
        self.media(*media).metadata_loaded
    }

    fn play(&self, media: &NodeId, on_rejected: Box<dyn FnOnce(String)>) {
        match self.media(*media).play_error {
            Some(reason) => on_rejected(reason),
            None => self.update_media(*media, |state| state.paused = false),
        }
    }
}

impl Timers for FakePage {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
        self.schedule(delay, None, TimerTask::Once(task))
    }

    fn set_interval(&self, period: Duration, task: Box<dyn FnMut()>) -> TimerHandle {
        let period = period.max(Duration::from_millis(1));
        self.schedule(period, Some(period), TimerTask::Repeat(task))
    }

    fn clear(&self, handle: TimerHandle) {
        self.timers.borrow_mut().remove(&handle);
        if self.running_timer.get() == Some(handle) {
            self.running_timer_cleared.set(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_cover_descendant_and_attribute_forms() {
        let page = FakePage::new();
        let nav = page.element(page.body_id(), "nav", "navbar");
        let menu = page.element(nav, "ul", "nav-menu");
        let link = page.element(menu, "a", "");
        page.set_attr(link, "href", "#programs");
        let other = page.element(page.body_id(), "a", "");
        page.set_attr(other, "href", "https://example.com");

        assert_eq!(page.query_all(".nav-menu a"), vec![link]);
        assert_eq!(page.query_all("a[href^=\"#\"]"), vec![link]);
        assert_eq!(page.query("a[href=\"https://example.com\"]"), Some(other));
        assert_eq!(page.closest(&link, ".navbar"), Some(nav));
        assert_eq!(page.closest(&other, ".navbar"), None);
        assert_eq!(page.query_all("ul, nav").len(), 2);
    }

    #[test]
    fn intervals_stop_when_cleared_from_their_own_tick() {
        let page = FakePage::new();
        let ticks = Rc::new(Cell::new(0));
        let handle = Rc::new(Cell::new(None));
        let id = {
            let page_ref = Rc::clone(&page);
            let ticks = Rc::clone(&ticks);
            let handle = Rc::clone(&handle);
            page.set_interval(
                Duration::from_millis(10),
                Box::new(move || {
                    ticks.set(ticks.get() + 1);
                    if ticks.get() == 3 {
                        if let Some(handle) = handle.get() {
                            page_ref.clear(handle);
                        }
                    }
                }),
            )
        };
        handle.set(Some(id));

        page.advance_ms(100);

        assert_eq!(ticks.get(), 3);
        assert_eq!(page.pending_timers(), 0);
    }

    #[test]
    fn clicks_bubble_to_document_listeners() {
        let page = FakePage::new();
        let button = page.element(page.body_id(), "button", "");
        let seen = Rc::new(Cell::new(None));
        {
            let seen = Rc::clone(&seen);
            page.listen(
                Target::Document,
                EventKind::Click,
                Box::new(move |event| seen.set(event.target().copied())),
            );
        }

        page.click(button);

        assert_eq!(seen.get(), Some(button));
    }
}
