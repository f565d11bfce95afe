//! Page bootstrap: finds each component's elements and wires it up.
//!
//! Components are independent. One whose markup is missing is skipped, and
//! one that fails to build is logged and skipped; neither stops the rest of
//! the page from initializing.

use std::rc::Rc;

use crate::card_hover::{init_card_hover_effects, CARD_SELECTOR};
use crate::carousel::{self, init_horizontal_scroll, CarouselElements};
use crate::lead_form::{init_lead_form, LeadFormElements, LeadSink, FORM_SELECTOR};
use crate::metrics::{init_metrics_counter, METRIC_SELECTOR};
use crate::nav_highlight::{self, init_active_nav_highlight, NAV_ANCHOR_SELECTOR};
use crate::navigation::{init_mobile_navigation, NavElements};
use crate::notification::Notifier;
use crate::options::{PageOptions, OPTIONS_ELEMENT_SELECTOR};
use crate::platform::{Disposer, Dom, EventKind, Platform, Target};
use crate::reveal::{init_scroll_animations, REVEAL_SELECTOR};
use crate::smooth_scroll::{init_smooth_scrolling, ANCHOR_SELECTOR};
use crate::video::{init_video_player, VideoElements};

const LOADED_CLASS: &str = "loaded";

/// Options embedded in the page, or the defaults when there are none.
pub fn read_options<D: Dom>(dom: &D) -> PageOptions {
    let raw = dom
        .query(OPTIONS_ELEMENT_SELECTOR)
        .map(|node| dom.text_content(&node));
    PageOptions::from_json_or_default(raw.as_deref())
}

pub fn init_page<P: Platform + 'static>(
    platform: &Rc<P>,
    options: &PageOptions,
    sink: Rc<dyn LeadSink>,
) -> Disposer {
    let mut page = Disposer::new();

    match NavElements::locate(platform.as_ref()) {
        Some(elements) => page.absorb(init_mobile_navigation(platform, elements)),
        None => log::debug!("mobile navigation not present"),
    }

    if let Some(form) = platform.query(FORM_SELECTOR) {
        match LeadFormElements::locate(platform.as_ref(), form) {
            Ok(elements) => {
                let notifier = Notifier::new(Rc::clone(platform), options);
                page.absorb(init_lead_form(platform, elements, notifier, sink, options));
            }
            Err(err) => log::warn!("lead form skipped: {err}"),
        }
    }

    page.absorb(init_smooth_scrolling(
        platform,
        platform.query_all(ANCHOR_SELECTOR),
        options,
    ));
    page.absorb(init_scroll_animations(
        platform,
        platform.query_all(REVEAL_SELECTOR),
    ));
    page.absorb(init_card_hover_effects(
        platform,
        platform.query_all(CARD_SELECTOR),
    ));
    page.absorb(init_active_nav_highlight(
        platform,
        platform.query_all(nav_highlight::SECTION_SELECTOR),
        platform.query_all(NAV_ANCHOR_SELECTOR),
        options,
    ));
    page.absorb(init_metrics_counter(
        platform,
        platform.query_all(METRIC_SELECTOR),
        options,
    ));

    for section in platform.query_all(carousel::SECTION_SELECTOR) {
        if let Some(elements) = CarouselElements::locate(platform.as_ref(), &section) {
            page.absorb(init_horizontal_scroll(platform, elements, options));
        }
    }

    if let Some(elements) = VideoElements::locate(platform.as_ref()) {
        match init_video_player(platform, elements) {
            Ok(player) => page.absorb(player.into_disposer()),
            Err(err) => log::warn!("video player skipped: {err}"),
        }
    }

    {
        let dom = Rc::clone(platform);
        page.listen(platform, Target::Window, EventKind::Load, move |_| {
            if let Some(body) = dom.body() {
                dom.add_class(&body, LOADED_CLASS);
            }
        });
    }

    log::debug!("page wired with {} teardown steps", page.len());
    page
}
