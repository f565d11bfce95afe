use std::rc::Rc;

use crate::options::PageOptions;
use crate::platform::{Disposer, Dom, EventKind, Target};

pub const ANCHOR_SELECTOR: &str = "a[href^=\"#\"]";

/// In-page anchors glide to their section, leaving room for the fixed
/// header. Bare `#` links and links to missing sections keep the browser's
/// default behaviour.
pub fn init_smooth_scrolling<D: Dom + 'static>(
    dom: &Rc<D>,
    anchors: Vec<D::Node>,
    options: &PageOptions,
) -> Disposer {
    let offset = options.anchor_offset_px;
    let mut disposer = Disposer::new();

    for anchor in anchors {
        let dom_ref = Rc::clone(dom);
        let link = anchor.clone();
        disposer.listen(dom, Target::Node(anchor), EventKind::Click, move |event| {
            let Some(href) = dom_ref.attribute(&link, "href") else {
                return;
            };
            if href == "#" {
                return;
            }
            let Some(section) = dom_ref.query(&href) else {
                return;
            };
            event.prevent_default();
            dom_ref.scroll_to(dom_ref.offset_top(&section) - offset);
        });
    }

    disposer
}
