use std::cell::Cell;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Field, LandingError, LeadError, SubmitError};
use crate::notification::{Notifier, Severity};
use crate::options::PageOptions;
use crate::platform::{Disposer, Dom, EventKind, Platform, Target, TimerHandle};

pub const FORM_SELECTOR: &str = "#leadForm";
const NAME_SELECTOR: &str = "input[type=\"text\"]";
const EMAIL_SELECTOR: &str = "input[type=\"email\"]";
const PROGRAM_SELECTOR: &str = "select";
const SUBMIT_SELECTOR: &str = "button[type=\"submit\"]";

const SUBMIT_LABEL: &str = "Book Free Call <i class=\"fas fa-calendar-check\"></i>";
const SUBMITTING_LABEL: &str = "<i class=\"fas fa-spinner fa-spin\"></i> Submitting...";
const SUBMIT_FAILED_MESSAGE: &str = "An error occurred. Please try again.";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub program: String,
}

impl Lead {
    fn thank_you(&self) -> String {
        format!(
            "Thank you, {}! We'll contact you at {} soon.",
            self.name, self.email
        )
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Trims the free-text fields and checks a lead is complete.
pub fn validate_lead(name: &str, email: &str, program: &str) -> Result<Lead, LeadError> {
    let name = name.trim();
    let email = email.trim();

    let missing = [
        (Field::Name, name),
        (Field::Email, email),
        (Field::Program, program),
    ]
    .into_iter()
    .find(|(_, value)| value.is_empty());
    if let Some((field, _)) = missing {
        return Err(LeadError::MissingField(field));
    }

    if !is_valid_email(email) {
        return Err(LeadError::InvalidEmail);
    }

    Ok(Lead {
        name: name.to_string(),
        email: email.to_string(),
        program: program.to_string(),
    })
}

/// Receives leads once the simulated network delay has elapsed.
pub trait LeadSink {
    fn submit(&self, lead: &Lead) -> Result<(), SubmitError>;
}

/// Accepts every lead and only records it in the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimulatedLeadSink;

impl LeadSink for SimulatedLeadSink {
    fn submit(&self, lead: &Lead) -> Result<(), SubmitError> {
        log::info!(
            "lead captured: name={} email={} program={}",
            lead.name,
            lead.email,
            lead.program
        );
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeadFormElements<N> {
    pub form: N,
    pub name: N,
    pub email: N,
    pub program: N,
    pub submit: N,
}

impl<N: Clone + PartialEq + 'static> LeadFormElements<N> {
    pub fn locate<D: Dom<Node = N>>(dom: &D, form: N) -> Result<Self, LandingError> {
        let find = |selector: &'static str| {
            dom.query_within(&form, selector)
                .ok_or(LandingError::MissingElement(selector))
        };
        Ok(Self {
            name: find(NAME_SELECTOR)?,
            email: find(EMAIL_SELECTOR)?,
            program: find(PROGRAM_SELECTOR)?,
            submit: find(SUBMIT_SELECTOR)?,
            form,
        })
    }
}

struct LeadForm<P: Platform> {
    platform: Rc<P>,
    elements: LeadFormElements<P::Node>,
    notifier: Notifier<P>,
    sink: Rc<dyn LeadSink>,
    delay: std::time::Duration,
    pending: Cell<Option<TimerHandle>>,
}

impl<P: Platform + 'static> LeadForm<P> {
    fn on_submit(self: &Rc<Self>) {
        if self.pending.get().is_some() {
            log::debug!("lead form submit ignored while a submission is pending");
            return;
        }

        let platform = &self.platform;
        let elements = &self.elements;
        let lead = match validate_lead(
            &platform.value(&elements.name),
            &platform.value(&elements.email),
            &platform.value(&elements.program),
        ) {
            Ok(lead) => lead,
            Err(error) => {
                log::debug!("lead rejected: {error:?}");
                self.notifier.announce(&error.to_string(), Severity::Error);
                return;
            }
        };

        platform.set_disabled(&elements.submit, true);
        platform.set_inner_html(&elements.submit, SUBMITTING_LABEL);

        let form = Rc::clone(self);
        let timer = platform.set_timeout(self.delay, Box::new(move || form.complete(lead)));
        self.pending.set(Some(timer));
    }

    fn complete(&self, lead: Lead) {
        self.pending.set(None);

        match self.sink.submit(&lead) {
            Ok(()) => {
                self.notifier.announce(&lead.thank_you(), Severity::Success);
                self.platform.reset_form(&self.elements.form);
            }
            Err(error) => {
                log::error!("lead form submission error: {error}");
                self.notifier.announce(SUBMIT_FAILED_MESSAGE, Severity::Error);
            }
        }

        self.platform.set_disabled(&self.elements.submit, false);
        self.platform
            .set_inner_html(&self.elements.submit, SUBMIT_LABEL);
    }
}

pub fn init_lead_form<P: Platform + 'static>(
    platform: &Rc<P>,
    elements: LeadFormElements<P::Node>,
    notifier: Notifier<P>,
    sink: Rc<dyn LeadSink>,
    options: &PageOptions,
) -> Disposer {
    let form_node = elements.form.clone();
    let form = Rc::new(LeadForm {
        platform: Rc::clone(platform),
        elements,
        notifier,
        sink,
        delay: options.submit_delay(),
        pending: Cell::new(None),
    });

    let mut disposer = Disposer::new();
    {
        let form = Rc::clone(&form);
        disposer.listen(platform, Target::Node(form_node), EventKind::Submit, move |event| {
            event.prevent_default();
            form.on_submit();
        });
    }
    {
        let platform = Rc::clone(platform);
        disposer.defer(move || {
            if let Some(timer) = form.pending.take() {
                platform.clear(timer);
            }
        });
    }
    disposer
}

/// Brings the lead form into view and puts the caret in its name field.
pub fn schedule_call<D: Dom>(dom: &D, form: &D::Node) {
    dom.scroll_into_view(form);
    if let Some(name) = dom.query_within(form, NAME_SELECTOR) {
        dom.focus(&name);
    }
}
