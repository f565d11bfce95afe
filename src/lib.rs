pub mod card_hover;
pub mod carousel;
pub mod error;
pub mod lead_form;
pub mod metrics;
pub mod nav_highlight;
pub mod navigation;
pub mod notification;
pub mod options;
pub mod page;
pub mod platform;
pub mod reveal;
pub mod smooth_scroll;
pub mod video;

#[cfg(test)]
mod fake;

#[cfg(target_arch = "wasm32")]
pub mod frontend;

#[cfg(not(target_arch = "wasm32"))]
pub mod backend;
