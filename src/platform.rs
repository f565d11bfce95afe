//! Capabilities the page components are written against.
//!
//! The browser build implements these with `web-sys` (see `frontend`), the
//! tests with an in-memory page driven by a virtual clock. Components only
//! ever see element handles handed to them, never global lookups.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::LandingError;

pub type Handler<N> = Box<dyn FnMut(&DomEvent<N>)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Submit,
    KeyDown,
    MouseEnter,
    MouseLeave,
    Scroll,
    Resize,
    Input,
    TimeUpdate,
    Ended,
    LoadedMetadata,
    Load,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Submit => "submit",
            Self::KeyDown => "keydown",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::Scroll => "scroll",
            Self::Resize => "resize",
            Self::Input => "input",
            Self::TimeUpdate => "timeupdate",
            Self::Ended => "ended",
            Self::LoadedMetadata => "loadedmetadata",
            Self::Load => "load",
        }
    }
}

/// Where a listener is attached.
#[derive(Clone, Debug, PartialEq)]
pub enum Target<N> {
    Window,
    Document,
    Node(N),
}

/// The parts of a browser event the components read.
///
/// `prevent_default` only records the request; the browser implementation
/// forwards it to the real event once the handler returns.
#[derive(Debug)]
pub struct DomEvent<N> {
    kind: EventKind,
    target: Option<N>,
    key: Option<String>,
    client_x: f64,
    default_prevented: Cell<bool>,
}

impl<N> DomEvent<N> {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            key: None,
            client_x: 0.0,
            default_prevented: Cell::new(false),
        }
    }

    pub fn with_target(mut self, target: N) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_client_x(mut self, client_x: f64) -> Self {
        self.client_x = client_x;
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn target(&self) -> Option<&N> {
        self.target.as_ref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn client_x(&self) -> f64 {
        self.client_x
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u32);

/// Horizontal extent of an element's border box, in viewport pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub width: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_left: f64,
    pub scroll_width: f64,
    pub client_width: f64,
}

impl ScrollMetrics {
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_width - self.client_width).max(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionOptions {
    pub threshold: f64,
    pub root_margin: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaSnapshot {
    pub paused: bool,
    pub muted: bool,
    pub volume: f64,
    pub current_time: f64,
    pub duration: f64,
}

pub trait Dom {
    type Node: Clone + PartialEq + 'static;

    fn body(&self) -> Option<Self::Node>;
    fn query(&self, selector: &str) -> Option<Self::Node>;
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;
    fn query_within(&self, root: &Self::Node, selector: &str) -> Option<Self::Node>;
    fn query_all_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    fn create_element(&self, tag: &str) -> Result<Self::Node, LandingError>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    fn remove(&self, node: &Self::Node);

    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    /// Flips `class` and reports whether it is now present.
    fn toggle_class(&self, node: &Self::Node, class: &str) -> bool;
    fn set_class_name(&self, node: &Self::Node, class_name: &str);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn text_content(&self, node: &Self::Node) -> String;
    fn set_inner_html(&self, node: &Self::Node, html: &str);
    fn set_text(&self, node: &Self::Node, text: &str);
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    /// Current value of an input, select or textarea; empty otherwise.
    fn value(&self, node: &Self::Node) -> String;
    fn set_value(&self, node: &Self::Node, value: &str);
    fn set_disabled(&self, node: &Self::Node, disabled: bool);
    fn reset_form(&self, form: &Self::Node);
    fn focus(&self, node: &Self::Node);
    fn scroll_into_view(&self, node: &Self::Node);

    fn offset_top(&self, node: &Self::Node) -> f64;
    fn bounding_rect(&self, node: &Self::Node) -> Rect;
    fn scroll_metrics(&self, node: &Self::Node) -> ScrollMetrics;
    /// Smoothly scrolls an element horizontally by `dx` pixels.
    fn scroll_by(&self, node: &Self::Node, dx: f64);

    fn scroll_y(&self) -> f64;
    /// Smoothly scrolls the window to an absolute vertical offset.
    fn scroll_to(&self, top: f64);

    fn listen(
        &self,
        target: Target<Self::Node>,
        kind: EventKind,
        handler: Handler<Self::Node>,
    ) -> ListenerId;
    fn unlisten(&self, id: ListenerId);

    /// Creates an observer whose callback runs for each watched node that
    /// starts intersecting the viewport.
    fn observe_intersections(
        &self,
        options: IntersectionOptions,
        on_visible: Box<dyn FnMut(Self::Node)>,
    ) -> ObserverId;
    fn watch(&self, observer: ObserverId, node: &Self::Node);
    fn unwatch(&self, observer: ObserverId, node: &Self::Node);
    fn disconnect(&self, observer: ObserverId);
}

pub trait Media: Dom {
    fn media_state(&self, media: &Self::Node) -> MediaSnapshot;
    fn set_muted(&self, media: &Self::Node, muted: bool);
    fn set_volume(&self, media: &Self::Node, volume: f64);
    fn set_current_time(&self, media: &Self::Node, seconds: f64);
    fn pause(&self, media: &Self::Node);
    /// Whether duration and dimensions are already known, i.e. whether
    /// `loadedmetadata` has fired.
    fn has_metadata(&self, media: &Self::Node) -> bool;
    /// Requests playback. A refused request (autoplay policy, missing
    /// source) is reported through `on_rejected`, possibly asynchronously.
    fn play(&self, media: &Self::Node, on_rejected: Box<dyn FnOnce(String)>);
}

pub trait Timers {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle;
    fn set_interval(&self, period: Duration, task: Box<dyn FnMut()>) -> TimerHandle;
    /// Cancels a pending timer. Unknown or already-fired handles are ignored.
    fn clear(&self, handle: TimerHandle);
}

pub trait Platform: Dom + Media + Timers {}

impl<T: Dom + Media + Timers> Platform for T {}

/// Teardown for whatever a component registered. Nothing happens on drop;
/// the page keeps its disposers alive for its whole lifetime.
#[derive(Default)]
pub struct Disposer {
    teardown: Vec<Box<dyn FnOnce()>>,
}

impl Disposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, teardown: impl FnOnce() + 'static) {
        self.teardown.push(Box::new(teardown));
    }

    pub fn listen<D: Dom + 'static>(
        &mut self,
        dom: &Rc<D>,
        target: Target<D::Node>,
        kind: EventKind,
        handler: impl FnMut(&DomEvent<D::Node>) + 'static,
    ) {
        let id = dom.listen(target, kind, Box::new(handler));
        let dom = Rc::clone(dom);
        self.defer(move || dom.unlisten(id));
    }

    pub fn observer<D: Dom + 'static>(&mut self, dom: &Rc<D>, observer: ObserverId) {
        let dom = Rc::clone(dom);
        self.defer(move || dom.disconnect(observer));
    }

    pub fn absorb(&mut self, other: Disposer) {
        self.teardown.extend(other.teardown);
    }

    pub fn len(&self) -> usize {
        self.teardown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teardown.is_empty()
    }

    pub fn dispose(self) {
        for teardown in self.teardown.into_iter().rev() {
            teardown();
        }
    }
}
