use std::cell::Cell;
use std::rc::Rc;

use crate::platform::{Disposer, Dom, IntersectionOptions};

pub const REVEAL_SELECTOR: &str = ".program-card, .step, .price-card";
const REVEALED_CLASS: &str = "fade-in";

const REVEAL_OBSERVER: IntersectionOptions = IntersectionOptions {
    threshold: 0.1,
    root_margin: "0px 0px -50px 0px",
};

/// Fades cards in the first time they scroll into view.
pub fn init_scroll_animations<D: Dom + 'static>(dom: &Rc<D>, targets: Vec<D::Node>) -> Disposer {
    let mut disposer = Disposer::new();
    if targets.is_empty() {
        return disposer;
    }

    let observer = {
        let dom_ref = Rc::clone(dom);
        let observer_id = Rc::new(Cell::new(None));
        let id_slot = Rc::clone(&observer_id);
        let id = dom.observe_intersections(
            REVEAL_OBSERVER,
            Box::new(move |node| {
                dom_ref.add_class(&node, REVEALED_CLASS);
                if let Some(id) = id_slot.get() {
                    dom_ref.unwatch(id, &node);
                }
            }),
        );
        observer_id.set(Some(id));
        id
    };

    for target in &targets {
        dom.watch(observer, target);
    }
    disposer.observer(dom, observer);
    disposer
}
