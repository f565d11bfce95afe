use std::rc::Rc;

use crate::options::PageOptions;
use crate::platform::{Disposer, Dom, EventKind, ScrollMetrics, Target};

pub const SECTION_SELECTOR: &str = ".scroll-section";
const CONTAINER_SELECTORS: [&str; 2] = [".scroll-container", ".programs-scroll-container"];
const LEFT_SELECTOR: &str = ".scroll-left";
const RIGHT_SELECTOR: &str = ".scroll-right";
const DISABLED_CLASS: &str = "disabled";

/// Which arrows are unavailable at a given scroll position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrowState {
    pub left_disabled: bool,
    pub right_disabled: bool,
}

impl ArrowState {
    pub fn at(metrics: ScrollMetrics, edge: f64) -> Self {
        Self {
            left_disabled: metrics.scroll_left <= edge,
            right_disabled: metrics.scroll_left >= metrics.max_scroll() - edge,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CarouselElements<N> {
    pub container: N,
    pub left: N,
    pub right: N,
}

impl<N: Clone + PartialEq + 'static> CarouselElements<N> {
    /// Finds the track and arrows inside a `.scroll-section`; sections
    /// missing any of them are not carousels.
    pub fn locate<D: Dom<Node = N>>(dom: &D, section: &N) -> Option<Self> {
        let container = CONTAINER_SELECTORS
            .iter()
            .find_map(|selector| dom.query_within(section, selector))?;
        Some(Self {
            container,
            left: dom.query_within(section, LEFT_SELECTOR)?,
            right: dom.query_within(section, RIGHT_SELECTOR)?,
        })
    }
}

struct Carousel<D: Dom> {
    dom: Rc<D>,
    elements: CarouselElements<D::Node>,
    step: f64,
    edge: f64,
}

impl<D: Dom> Carousel<D> {
    fn update_buttons(&self) {
        let dom = &self.dom;
        let state = ArrowState::at(dom.scroll_metrics(&self.elements.container), self.edge);
        set_flag(dom.as_ref(), &self.elements.left, state.left_disabled);
        set_flag(dom.as_ref(), &self.elements.right, state.right_disabled);
    }

    fn scroll(&self, direction: Direction) {
        let (button, dx) = match direction {
            Direction::Left => (&self.elements.left, -self.step),
            Direction::Right => (&self.elements.right, self.step),
        };
        if self.dom.has_class(button, DISABLED_CLASS) {
            return;
        }
        self.dom.scroll_by(&self.elements.container, dx);
    }
}

fn set_flag<D: Dom>(dom: &D, node: &D::Node, on: bool) {
    if on {
        dom.add_class(node, DISABLED_CLASS);
    } else {
        dom.remove_class(node, DISABLED_CLASS);
    }
}

pub fn init_horizontal_scroll<D: Dom + 'static>(
    dom: &Rc<D>,
    elements: CarouselElements<D::Node>,
    options: &PageOptions,
) -> Disposer {
    let carousel = Rc::new(Carousel {
        dom: Rc::clone(dom),
        elements,
        step: options.carousel_step_px,
        edge: options.carousel_edge_px,
    });
    let container = carousel.elements.container.clone();
    let mut disposer = Disposer::new();

    for (button, direction) in [
        (carousel.elements.left.clone(), Direction::Left),
        (carousel.elements.right.clone(), Direction::Right),
    ] {
        let carousel = Rc::clone(&carousel);
        disposer.listen(dom, Target::Node(button), EventKind::Click, move |_| {
            carousel.scroll(direction)
        });
    }

    for target in [Target::Node(container.clone()), Target::Window] {
        let kind = match target {
            Target::Window => EventKind::Resize,
            _ => EventKind::Scroll,
        };
        let carousel = Rc::clone(&carousel);
        disposer.listen(dom, target, kind, move |_| carousel.update_buttons());
    }

    dom.set_attribute(&container, "tabindex", "0");
    {
        let carousel = Rc::clone(&carousel);
        disposer.listen(dom, Target::Node(container), EventKind::KeyDown, move |event| {
            let direction = match event.key() {
                Some("ArrowLeft") => Direction::Left,
                Some("ArrowRight") => Direction::Right,
                _ => return,
            };
            event.prevent_default();
            carousel.scroll(direction);
        });
    }

    carousel.update_buttons();
    disposer
}
