use std::rc::Rc;

use crate::options::PageOptions;
use crate::platform::{Disposer, Dom, EventKind, Target};

pub const SECTION_SELECTOR: &str = "section[id]";
pub const NAV_ANCHOR_SELECTOR: &str = ".nav-menu a[href^=\"#\"]";
const ACTIVE_CLASS: &str = "active";

/// The last section (in document order) whose top, less `offset`, has been
/// scrolled past.
pub fn current_section<'a, I>(scroll_y: f64, sections: I, offset: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    sections
        .into_iter()
        .filter(|(_, top)| scroll_y >= top - offset)
        .last()
        .map(|(id, _)| id)
}

struct Highlighter<D: Dom> {
    dom: Rc<D>,
    sections: Vec<D::Node>,
    links: Vec<D::Node>,
    offset: f64,
}

impl<D: Dom> Highlighter<D> {
    fn update(&self) {
        let dom = &self.dom;
        let sections: Vec<(String, f64)> = self
            .sections
            .iter()
            .filter_map(|section| Some((dom.attribute(section, "id")?, dom.offset_top(section))))
            .collect();
        let current = current_section(
            dom.scroll_y(),
            sections.iter().map(|(id, top)| (id.as_str(), *top)),
            self.offset,
        )
        .map(|id| format!("#{id}"));

        for link in &self.links {
            dom.remove_class(link, ACTIVE_CLASS);
            if current.is_some() && dom.attribute(link, "href") == current {
                dom.add_class(link, ACTIVE_CLASS);
            }
        }
    }
}

pub fn init_active_nav_highlight<D: Dom + 'static>(
    dom: &Rc<D>,
    sections: Vec<D::Node>,
    links: Vec<D::Node>,
    options: &PageOptions,
) -> Disposer {
    let highlighter = Rc::new(Highlighter {
        dom: Rc::clone(dom),
        sections,
        links,
        offset: options.section_offset_px,
    });

    let mut disposer = Disposer::new();
    {
        let highlighter = Rc::clone(&highlighter);
        disposer.listen(dom, Target::Window, EventKind::Scroll, move |_| highlighter.update());
    }
    highlighter.update();
    disposer
}
