use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::{Interval, Timeout};
use js_sys::{Array, Reflect};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    window, Document, Element, Event, EventTarget, HtmlButtonElement, HtmlElement,
    HtmlFormElement, HtmlInputElement, HtmlMediaElement, HtmlSelectElement,
    HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent, MouseEvent, ScrollBehavior, ScrollIntoViewOptions,
    ScrollToOptions, Window,
};

use crate::error::LandingError;
use crate::lead_form::{self, SimulatedLeadSink, FORM_SELECTOR};
use crate::page::{init_page, read_options};
use crate::platform::{
    Dom, DomEvent, EventKind, Handler, IntersectionOptions, ListenerId, Media, MediaSnapshot,
    ObserverId, Rect, ScrollMetrics, Target, TimerHandle, Timers,
};

const SCHEDULE_CALL_GLOBAL: &str = "scheduleCall";

struct Listener {
    target: EventTarget,
    kind: EventKind,
    callback: Closure<dyn FnMut(Event)>,
}

struct Observer {
    observer: IntersectionObserver,
    callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

enum Timer {
    Once(Timeout),
    Repeat(Interval),
}

impl Timer {
    // Callbacks may clear their own timer, so the closure is handed to the
    // JS garbage collector instead of being dropped mid-call.
    fn cancel(self) {
        let _ = match self {
            Self::Once(timeout) => timeout.cancel().into_js_value(),
            Self::Repeat(interval) => interval.cancel().into_js_value(),
        };
    }
}

/// `Dom`, `Media` and `Timers` backed by the real document.
pub struct BrowserPlatform {
    window: Window,
    document: Document,
    listeners: RefCell<HashMap<ListenerId, Listener>>,
    observers: RefCell<HashMap<ObserverId, Observer>>,
    timers: Rc<RefCell<HashMap<TimerHandle, Timer>>>,
    next_id: Cell<u32>,
}

impl BrowserPlatform {
    pub fn new() -> Option<Self> {
        let window = window()?;
        let document = window.document()?;
        Some(Self {
            window,
            document,
            listeners: RefCell::new(HashMap::new()),
            observers: RefCell::new(HashMap::new()),
            timers: Rc::new(RefCell::new(HashMap::new())),
            next_id: Cell::new(1),
        })
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        id
    }

    fn event_target(&self, target: &Target<Element>) -> EventTarget {
        match target {
            Target::Window => self.window.clone().into(),
            Target::Document => self.document.clone().into(),
            Target::Node(element) => element.clone().into(),
        }
    }
}

fn millis(duration: Duration) -> u32 {
    duration.as_millis().min(u128::from(u32::MAX)) as u32
}

fn describe(error: &JsValue) -> String {
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    error.as_string().unwrap_or_else(|| format!("{error:?}"))
}

fn collect_elements(list: web_sys::NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|index| list.get(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn to_dom_event(kind: EventKind, event: &Event) -> DomEvent<Element> {
    let mut dom_event = DomEvent::new(kind);
    if let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) {
        dom_event = dom_event.with_target(target);
    }
    if let Some(keyboard) = event.dyn_ref::<KeyboardEvent>() {
        dom_event = dom_event.with_key(keyboard.key());
    }
    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        dom_event = dom_event.with_client_x(f64::from(mouse.client_x()));
    }
    dom_event
}

fn smooth_scroll_options() -> ScrollToOptions {
    let options = ScrollToOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options
}

impl Dom for BrowserPlatform {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        self.document
            .query_selector_all(selector)
            .map(collect_elements)
            .unwrap_or_default()
    }

    fn query_within(&self, root: &Element, selector: &str) -> Option<Element> {
        root.query_selector(selector).ok().flatten()
    }

    fn query_all_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        root.query_selector_all(selector)
            .map(collect_elements)
            .unwrap_or_default()
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn next_sibling(&self, node: &Element) -> Option<Element> {
        node.next_element_sibling()
    }

    fn create_element(&self, tag: &str) -> Result<Element, LandingError> {
        self.document
            .create_element(tag)
            .map_err(|_| LandingError::CreateElement(tag.to_string()))
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        let _ = parent.append_child(child);
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn toggle_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().toggle(class).unwrap_or(false)
    }

    fn set_class_name(&self, node: &Element, class_name: &str) {
        node.set_class_name(class_name);
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn has_attribute(&self, node: &Element, name: &str) -> bool {
        node.has_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            let _ = element.style().set_property(property, value);
        }
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn set_value(&self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn set_disabled(&self, node: &Element, disabled: bool) {
        if let Some(button) = node.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_disabled(disabled);
        } else if disabled {
            let _ = node.set_attribute("disabled", "");
        } else {
            let _ = node.remove_attribute("disabled");
        }
    }

    fn reset_form(&self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn focus(&self, node: &Element) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            let _ = element.focus();
        }
    }

    fn scroll_into_view(&self, node: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn offset_top(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map(|element| f64::from(element.offset_top()))
            .unwrap_or(0.0)
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect {
            left: rect.left(),
            width: rect.width(),
        }
    }

    fn scroll_metrics(&self, node: &Element) -> ScrollMetrics {
        ScrollMetrics {
            scroll_left: f64::from(node.scroll_left()),
            scroll_width: f64::from(node.scroll_width()),
            client_width: f64::from(node.client_width()),
        }
    }

    fn scroll_by(&self, node: &Element, dx: f64) {
        let options = smooth_scroll_options();
        options.set_left(dx);
        node.scroll_by_with_scroll_to_options(&options);
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to(&self, top: f64) {
        let options = smooth_scroll_options();
        options.set_top(top);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn listen(
        &self,
        target: Target<Element>,
        kind: EventKind,
        mut handler: Handler<Element>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id());
        let target = self.event_target(&target);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let dom_event = to_dom_event(kind, &event);
            handler(&dom_event);
            if dom_event.default_prevented() {
                event.prevent_default();
            }
        });
        let _ = target
            .add_event_listener_with_callback(kind.as_str(), callback.as_ref().unchecked_ref());
        self.listeners.borrow_mut().insert(
            id,
            Listener {
                target,
                kind,
                callback,
            },
        );
        id
    }

    fn unlisten(&self, id: ListenerId) {
        let Some(listener) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        let _ = listener.target.remove_event_listener_with_callback(
            listener.kind.as_str(),
            listener.callback.as_ref().unchecked_ref(),
        );
        // Handlers may detach themselves while running.
        let _ = listener.callback.into_js_value();
    }

    fn observe_intersections(
        &self,
        options: IntersectionOptions,
        mut on_visible: Box<dyn FnMut(Element)>,
    ) -> ObserverId {
        let id = ObserverId(self.next_id());
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    if entry.is_intersecting() {
                        on_visible(entry.target());
                    }
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(options.root_margin);
        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                self.observers
                    .borrow_mut()
                    .insert(id, Observer { observer, callback });
            }
            Err(err) => log::warn!("intersection observer unavailable: {}", describe(&err)),
        }
        id
    }

    fn watch(&self, observer: ObserverId, node: &Element) {
        if let Some(entry) = self.observers.borrow().get(&observer) {
            entry.observer.observe(node);
        }
    }

    fn unwatch(&self, observer: ObserverId, node: &Element) {
        if let Some(entry) = self.observers.borrow().get(&observer) {
            entry.observer.unobserve(node);
        }
    }

    fn disconnect(&self, observer: ObserverId) {
        let Some(entry) = self.observers.borrow_mut().remove(&observer) else {
            return;
        };
        entry.observer.disconnect();
        let _ = entry.callback.into_js_value();
    }
}

impl Media for BrowserPlatform {
    fn media_state(&self, media: &Element) -> MediaSnapshot {
        match media.dyn_ref::<HtmlMediaElement>() {
            Some(media) => MediaSnapshot {
                paused: media.paused(),
                muted: media.muted(),
                volume: media.volume(),
                current_time: media.current_time(),
                duration: media.duration(),
            },
            None => MediaSnapshot {
                paused: true,
                muted: false,
                volume: 1.0,
                current_time: 0.0,
                duration: f64::NAN,
            },
        }
    }

    fn set_muted(&self, media: &Element, muted: bool) {
        if let Some(media) = media.dyn_ref::<HtmlMediaElement>() {
            media.set_muted(muted);
        }
    }

    fn set_volume(&self, media: &Element, volume: f64) {
        if let Some(media) = media.dyn_ref::<HtmlMediaElement>() {
            media.set_volume(volume);
        }
    }

    fn set_current_time(&self, media: &Element, seconds: f64) {
        if let Some(media) = media.dyn_ref::<HtmlMediaElement>() {
            media.set_current_time(seconds);
        }
    }

    fn pause(&self, media: &Element) {
        if let Some(media) = media.dyn_ref::<HtmlMediaElement>() {
            let _ = media.pause();
        }
    }

    fn has_metadata(&self, media: &Element) -> bool {
        media
            .dyn_ref::<HtmlMediaElement>()
            .is_some_and(|media| media.ready_state() >= HtmlMediaElement::HAVE_METADATA)
    }

    fn play(&self, media: &Element, on_rejected: Box<dyn FnOnce(String)>) {
        let Some(media) = media.dyn_ref::<HtmlMediaElement>() else {
            on_rejected("element is not playable".to_string());
            return;
        };
        match media.play() {
            Ok(promise) => spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    on_rejected(describe(&err));
                }
            }),
            Err(err) => on_rejected(describe(&err)),
        }
    }
}

impl Timers for BrowserPlatform {
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
        let handle = TimerHandle(self.next_id());
        let timers = Rc::clone(&self.timers);
        let timeout = Timeout::new(millis(delay), move || {
            let fired = timers.borrow_mut().remove(&handle);
            if let Some(Timer::Once(timeout)) = fired {
                let _ = timeout.forget();
            }
            task();
        });
        self.timers.borrow_mut().insert(handle, Timer::Once(timeout));
        handle
    }

    fn set_interval(&self, period: Duration, task: Box<dyn FnMut()>) -> TimerHandle {
        let handle = TimerHandle(self.next_id());
        let interval = Interval::new(millis(period), task);
        self.timers
            .borrow_mut()
            .insert(handle, Timer::Repeat(interval));
        handle
    }

    fn clear(&self, handle: TimerHandle) {
        let timer = self.timers.borrow_mut().remove(&handle);
        if let Some(timer) = timer {
            timer.cancel();
        }
    }
}

fn start(platform: &Rc<BrowserPlatform>) {
    let options = read_options(platform.as_ref());
    // The page lives as long as the document; its teardown never runs.
    let _page = init_page(platform, &options, Rc::new(SimulatedLeadSink));

    if platform.document.ready_state() == "complete" {
        if let Some(body) = platform.body() {
            platform.add_class(&body, "loaded");
        }
    }
}

/// Scrolls to the lead form and focuses its first field. Called from the
/// page's "Book a call" buttons.
#[wasm_bindgen(js_name = scheduleCall)]
pub fn schedule_call() {
    let Some(platform) = BrowserPlatform::new() else {
        return;
    };
    match platform.query(FORM_SELECTOR) {
        Some(form) => lead_form::schedule_call(&platform, &form),
        None => log::warn!("scheduleCall: lead form not found"),
    }
}

// Inline `onclick="scheduleCall()"` handlers look the function up on `window`.
fn expose_schedule_call(window: &Window) {
    let callback = Closure::<dyn Fn()>::new(schedule_call);
    let _ = Reflect::set(
        window,
        &JsValue::from_str(SCHEDULE_CALL_GLOBAL),
        callback.as_ref().unchecked_ref(),
    );
    callback.forget();
}

pub fn run() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let Some(platform) = BrowserPlatform::new() else {
        log::error!("no window or document available");
        return;
    };
    let platform = Rc::new(platform);
    expose_schedule_call(&platform.window);

    if platform.document.ready_state() != "loading" {
        start(&platform);
        return;
    }

    let document = platform.document.clone();
    let on_ready = Closure::once(move || start(&platform));
    let _ = document
        .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref());
    on_ready.forget();
}
