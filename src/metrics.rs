use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::options::PageOptions;
use crate::platform::{Disposer, Dom, IntersectionOptions, Platform, TimerHandle};

pub const METRIC_SELECTOR: &str = ".metric-number";
const SUFFIX_CLASS: &str = "metric-suffix";

const METRIC_OBSERVER: IntersectionOptions = IntersectionOptions {
    threshold: 0.5,
    root_margin: "0px",
};

/// Counts from zero to a target in equal steps, landing exactly on it.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricRamp {
    target: f64,
    step: f64,
    current: f64,
    done: bool,
}

impl MetricRamp {
    pub fn new(target: f64, duration: Duration, tick: Duration) -> Self {
        let ticks = (duration.as_millis() as f64 / tick.as_millis().max(1) as f64).max(1.0);
        Self {
            target,
            step: target / ticks,
            current: 0.0,
            done: false,
        }
    }

    pub fn tick(&mut self) -> f64 {
        if self.done {
            return self.current;
        }
        self.current += self.step;
        let reached = if self.step >= 0.0 {
            self.current >= self.target
        } else {
            self.current <= self.target
        };
        if reached {
            self.current = self.target;
            self.done = true;
        }
        self.current
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whole numbers when a suffix element follows the counter, tenths
    /// otherwise. Intermediate values round down so the display never
    /// overshoots the target.
    pub fn display(&self, whole: bool) -> String {
        if whole {
            return format!("{}", self.current.floor() as i64);
        }
        if self.done {
            return format!("{:.1}", self.current);
        }
        format!("{:.1}", (self.current * 10.0).floor() / 10.0)
    }
}

struct Metric<N> {
    node: N,
    target: f64,
    whole: bool,
    started: Cell<bool>,
}

fn parse_target(raw: Option<String>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn start_counter<P: Platform + 'static>(
    platform: &Rc<P>,
    metric: &Metric<P::Node>,
    options: &PageOptions,
    running: &Rc<RefCell<Vec<TimerHandle>>>,
) {
    let mut ramp = MetricRamp::new(
        metric.target,
        Duration::from_millis(options.metrics_duration_ms),
        options.metrics_tick(),
    );
    let handle: Rc<Cell<Option<TimerHandle>>> = Rc::new(Cell::new(None));

    let id = {
        let platform_ref = Rc::clone(platform);
        let node = metric.node.clone();
        let whole = metric.whole;
        let handle = Rc::clone(&handle);
        let running = Rc::clone(running);
        platform.set_interval(
            options.metrics_tick(),
            Box::new(move || {
                ramp.tick();
                platform_ref.set_text(&node, &ramp.display(whole));
                if ramp.is_done() {
                    if let Some(id) = handle.take() {
                        platform_ref.clear(id);
                        running.borrow_mut().retain(|timer| *timer != id);
                    }
                }
            }),
        )
    };
    handle.set(Some(id));
    running.borrow_mut().push(id);
}

/// Animates every `.metric-number` the first time half of it is visible.
pub fn init_metrics_counter<P: Platform + 'static>(
    platform: &Rc<P>,
    nodes: Vec<P::Node>,
    options: &PageOptions,
) -> Disposer {
    let mut disposer = Disposer::new();

    let metrics: Vec<Metric<P::Node>> = nodes
        .into_iter()
        .filter_map(|node| {
            let Some(target) = parse_target(platform.attribute(&node, "data-target")) else {
                log::warn!("metric counter skipped: missing or non-numeric data-target");
                return None;
            };
            let whole = platform
                .next_sibling(&node)
                .is_some_and(|sibling| platform.has_class(&sibling, SUFFIX_CLASS));
            Some(Metric {
                node,
                target,
                whole,
                started: Cell::new(false),
            })
        })
        .collect();
    if metrics.is_empty() {
        return disposer;
    }

    let metrics = Rc::new(metrics);
    let running: Rc<RefCell<Vec<TimerHandle>>> = Rc::new(RefCell::new(Vec::new()));
    let observer_slot = Rc::new(Cell::new(None));

    let observer = {
        let platform_ref = Rc::clone(platform);
        let metrics = Rc::clone(&metrics);
        let running = Rc::clone(&running);
        let observer_slot = Rc::clone(&observer_slot);
        let options = options.clone();
        platform.observe_intersections(
            METRIC_OBSERVER,
            Box::new(move |node| {
                if let Some(observer) = observer_slot.get() {
                    platform_ref.unwatch(observer, &node);
                }
                let Some(metric) = metrics.iter().find(|metric| metric.node == node) else {
                    return;
                };
                if metric.started.replace(true) {
                    return;
                }
                start_counter(&platform_ref, metric, &options, &running);
            }),
        )
    };
    observer_slot.set(Some(observer));

    for metric in metrics.iter() {
        platform.watch(observer, &metric.node);
    }

    disposer.observer(platform, observer);
    {
        let platform = Rc::clone(platform);
        disposer.defer(move || {
            for timer in running.borrow_mut().drain(..) {
                platform.clear(timer);
            }
        });
    }
    disposer
}
