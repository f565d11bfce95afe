use std::rc::Rc;

use crate::platform::{Disposer, Dom, EventKind, Target};

pub const CARD_SELECTOR: &str = ".program-card";

const LIFTED: &str = "translateY(-10px)";
const RESTING: &str = "translateY(0)";

pub fn init_card_hover_effects<D: Dom + 'static>(dom: &Rc<D>, cards: Vec<D::Node>) -> Disposer {
    let mut disposer = Disposer::new();
    for card in cards {
        for (kind, transform) in [
            (EventKind::MouseEnter, LIFTED),
            (EventKind::MouseLeave, RESTING),
        ] {
            let dom_ref = Rc::clone(dom);
            let node = card.clone();
            disposer.listen(dom, Target::Node(card.clone()), kind, move |_| {
                dom_ref.set_style(&node, "transform", transform)
            });
        }
    }
    disposer
}
