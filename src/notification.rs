use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::LandingError;
use crate::options::PageOptions;
use crate::platform::{EventKind, ListenerId, Platform, Target, TimerHandle};

const HIDDEN_CLASS: &str = "notification-hidden";
const CLOSE_GLYPH: &str = "\u{d7}";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Presents transient banners appended to `<body>`.
pub struct Notifier<P: Platform> {
    platform: Rc<P>,
    lifetime: Duration,
    fade: Duration,
}

impl<P: Platform> Clone for Notifier<P> {
    fn clone(&self) -> Self {
        Self {
            platform: Rc::clone(&self.platform),
            lifetime: self.lifetime,
            fade: self.fade,
        }
    }
}

impl<P: Platform + 'static> Notifier<P> {
    pub fn new(platform: Rc<P>, options: &PageOptions) -> Self {
        Self {
            platform,
            lifetime: options.notification_lifetime(),
            fade: options.notification_fade(),
        }
    }

    pub fn show(&self, message: &str, severity: Severity) -> Result<Notification<P>, LandingError> {
        let platform = &self.platform;
        let body = platform
            .body()
            .ok_or(LandingError::MissingElement("body"))?;

        let element = platform.create_element("div")?;
        platform.set_class_name(
            &element,
            &format!("notification notification-{}", severity.as_str()),
        );
        let content = platform.create_element("div")?;
        platform.set_class_name(&content, "notification-content");
        let text = platform.create_element("span")?;
        platform.set_text(&text, message);
        let close = platform.create_element("button")?;
        platform.set_class_name(&close, "notification-close");
        platform.set_text(&close, CLOSE_GLYPH);

        platform.append_child(&content, &text);
        platform.append_child(&content, &close);
        platform.append_child(&element, &content);
        platform.append_child(&body, &element);

        let inner = Rc::new(NotificationInner {
            platform: Rc::clone(platform),
            element,
            fade: self.fade,
            auto_dismiss: Cell::new(None),
            close_listener: Cell::new(None),
            dismissed: Cell::new(false),
        });

        let auto_dismiss = {
            let inner = Rc::clone(&inner);
            platform.set_timeout(self.lifetime, Box::new(move || inner.dismiss()))
        };
        inner.auto_dismiss.set(Some(auto_dismiss));

        let close_listener = {
            let inner = Rc::clone(&inner);
            platform.listen(
                Target::Node(close),
                EventKind::Click,
                Box::new(move |_| inner.dismiss()),
            )
        };
        inner.close_listener.set(Some(close_listener));

        Ok(Notification { inner })
    }

    /// Shows a banner, logging instead of failing when the page cannot
    /// host one.
    pub fn announce(&self, message: &str, severity: Severity) {
        if let Err(error) = self.show(message, severity) {
            log::error!("notification not shown ({}): {error}", severity.as_str());
        }
    }
}

pub struct Notification<P: Platform> {
    inner: Rc<NotificationInner<P>>,
}

impl<P: Platform + 'static> Notification<P> {
    pub fn element(&self) -> &P::Node {
        &self.inner.element
    }

    pub fn dismiss(&self) {
        self.inner.dismiss();
    }
}

struct NotificationInner<P: Platform> {
    platform: Rc<P>,
    element: P::Node,
    fade: Duration,
    auto_dismiss: Cell<Option<TimerHandle>>,
    close_listener: Cell<Option<ListenerId>>,
    dismissed: Cell<bool>,
}

impl<P: Platform + 'static> NotificationInner<P> {
    fn dismiss(&self) {
        if self.dismissed.replace(true) {
            return;
        }
        if let Some(timer) = self.auto_dismiss.take() {
            self.platform.clear(timer);
        }
        if let Some(listener) = self.close_listener.take() {
            self.platform.unlisten(listener);
        }

        self.platform.add_class(&self.element, HIDDEN_CLASS);
        let platform = Rc::clone(&self.platform);
        let element = self.element.clone();
        self.platform
            .set_timeout(self.fade, Box::new(move || platform.remove(&element)));
    }
}
