use std::rc::Rc;

use crate::platform::{Disposer, Dom, EventKind, Target};

pub const HAMBURGER_SELECTOR: &str = "#hamburger";
pub const MENU_SELECTOR: &str = ".nav-menu";
pub const MENU_LINKS_SELECTOR: &str = ".nav-menu a";
const NAVBAR_SELECTOR: &str = ".navbar";

const OPEN_CLASS: &str = "active";
const BARS_ICON: &str = "<i class=\"fas fa-bars\"></i>";
const CLOSE_ICON: &str = "<i class=\"fas fa-times\"></i>";

#[derive(Clone, Debug, PartialEq)]
pub struct NavElements<N> {
    pub hamburger: N,
    pub menu: N,
    pub links: Vec<N>,
}

impl<N: Clone + PartialEq + 'static> NavElements<N> {
    pub fn locate<D: Dom<Node = N>>(dom: &D) -> Option<Self> {
        Some(Self {
            hamburger: dom.query(HAMBURGER_SELECTOR)?,
            menu: dom.query(MENU_SELECTOR)?,
            links: dom.query_all(MENU_LINKS_SELECTOR),
        })
    }
}

struct MobileNav<D: Dom> {
    dom: Rc<D>,
    elements: NavElements<D::Node>,
}

impl<D: Dom> MobileNav<D> {
    fn is_open(&self) -> bool {
        self.dom.has_class(&self.elements.menu, OPEN_CLASS)
    }

    fn render(&self, open: bool) {
        let dom = &self.dom;
        dom.set_inner_html(
            &self.elements.hamburger,
            if open { CLOSE_ICON } else { BARS_ICON },
        );
        if let Some(body) = dom.body() {
            dom.set_style(&body, "overflow", if open { "hidden" } else { "auto" });
        }
    }

    fn toggle(&self) {
        let open = self.dom.toggle_class(&self.elements.menu, OPEN_CLASS);
        self.render(open);
    }

    fn close(&self) {
        self.dom.remove_class(&self.elements.menu, OPEN_CLASS);
        self.render(false);
    }
}

/// Hamburger menu for narrow viewports. An open menu closes on a link
/// click, a click outside the navbar, or Escape.
pub fn init_mobile_navigation<D: Dom + 'static>(
    dom: &Rc<D>,
    elements: NavElements<D::Node>,
) -> Disposer {
    let nav = Rc::new(MobileNav {
        dom: Rc::clone(dom),
        elements,
    });
    let mut disposer = Disposer::new();

    {
        let nav_ref = Rc::clone(&nav);
        disposer.listen(
            dom,
            Target::Node(nav.elements.hamburger.clone()),
            EventKind::Click,
            move |_| nav_ref.toggle(),
        );
    }

    for link in &nav.elements.links {
        let nav_ref = Rc::clone(&nav);
        disposer.listen(dom, Target::Node(link.clone()), EventKind::Click, move |_| {
            nav_ref.close()
        });
    }

    {
        let nav_ref = Rc::clone(&nav);
        disposer.listen(dom, Target::Document, EventKind::Click, move |event| {
            let inside_navbar = event
                .target()
                .and_then(|target| nav_ref.dom.closest(target, NAVBAR_SELECTOR))
                .is_some();
            if !inside_navbar && nav_ref.is_open() {
                nav_ref.close();
            }
        });
    }

    {
        let nav_ref = Rc::clone(&nav);
        disposer.listen(dom, Target::Document, EventKind::KeyDown, move |event| {
            if event.key() == Some("Escape") && nav_ref.is_open() {
                nav_ref.close();
            }
        });
    }

    disposer
}
