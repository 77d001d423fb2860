//! Event bus for the pub-sub contract between table controllers

use crate::state::events::{TableEvent, TableEventKind};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// Maximum event history size
const MAX_HISTORY: usize = 100;

/// Trait for components that react to table events
pub trait TableEventSubscriber {
    /// Handle an event published on the table
    fn on_table_event(&mut self, event: &TableEvent);

    /// Get subscriber name for debugging
    fn name(&self) -> &str;
}

/// Adapter turning a closure into a subscriber
pub struct FnSubscriber<F>
where
    F: FnMut(&TableEvent),
{
    name: String,
    handler: F,
}

impl<F> FnSubscriber<F>
where
    F: FnMut(&TableEvent),
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> TableEventSubscriber for FnSubscriber<F>
where
    F: FnMut(&TableEvent),
{
    fn on_table_event(&mut self, event: &TableEvent) {
        (self.handler)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct Subscription {
    kind: TableEventKind,
    subscriber: Weak<RefCell<dyn TableEventSubscriber>>,
}

/// Per-table event bus.
///
/// Subscribers are held weakly; the owner of a controller keeps it alive and
/// dropping it ends the subscription.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RefCell<Vec<Subscription>>,
    history: RefCell<VecDeque<TableEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` for events of `kind`
    pub fn subscribe(&self, kind: TableEventKind, subscriber: &Rc<RefCell<dyn TableEventSubscriber>>) {
        let name = subscriber
            .try_borrow()
            .map(|s| s.name().to_string())
            .unwrap_or_else(|_| "<busy>".to_string());
        info!(target: "events", "EventBus: Adding subscriber {} for '{}'", name, kind.name());
        self.subscriptions.borrow_mut().push(Subscription {
            kind,
            subscriber: Rc::downgrade(subscriber),
        });
    }

    /// Publish an event to every live subscriber of its kind
    pub fn publish(&self, event: TableEvent) {
        debug!(target: "events", "EventBus: Publishing {:?}", event);

        {
            let mut history = self.history.borrow_mut();
            history.push_back(event.clone());
            if history.len() > MAX_HISTORY {
                history.pop_front();
            }
        }

        // Snapshot first so handlers may subscribe or publish themselves
        let targets: Vec<Rc<RefCell<dyn TableEventSubscriber>>> = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            subscriptions.retain(|s| s.subscriber.strong_count() > 0);
            subscriptions
                .iter()
                .filter(|s| s.kind == event.kind())
                .filter_map(|s| s.subscriber.upgrade())
                .collect()
        };

        for target in targets {
            match target.try_borrow_mut() {
                Ok(mut subscriber) => {
                    debug!(target: "events", "EventBus: Notifying {}", subscriber.name());
                    subscriber.on_table_event(&event);
                }
                Err(_) => {
                    warn!(target: "events", "EventBus: Subscriber busy, skipping re-entrant {:?}", event);
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|s| s.subscriber.strong_count() > 0)
            .count()
    }

    /// Most recent events, oldest first
    pub fn history(&self) -> Vec<TableEvent> {
        self.history.borrow().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::events::SortDirection;

    fn recorder() -> (Rc<RefCell<Vec<TableEvent>>>, Rc<RefCell<dyn TableEventSubscriber>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let subscriber: Rc<RefCell<dyn TableEventSubscriber>> = Rc::new(RefCell::new(
            FnSubscriber::new("recorder", move |event: &TableEvent| {
                sink.borrow_mut().push(event.clone())
            }),
        ));
        (seen, subscriber)
    }

    #[test]
    fn test_publish_reaches_matching_subscribers_only() {
        let bus = EventBus::new();
        let (sorts, sort_sub) = recorder();
        let (filters, filter_sub) = recorder();
        bus.subscribe(TableEventKind::Sort, &sort_sub);
        bus.subscribe(TableEventKind::Filter, &filter_sub);

        bus.publish(TableEvent::Sort {
            index: 1,
            direction: SortDirection::Desc,
        });
        bus.publish(TableEvent::filter_cleared());

        assert_eq!(sorts.borrow().len(), 1);
        assert_eq!(filters.borrow().as_slice(), &[TableEvent::filter_cleared()]);
        assert_eq!(bus.history().len(), 2);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let (_seen, subscriber) = recorder();
        bus.subscribe(TableEventKind::Sort, &subscriber);
        assert_eq!(bus.subscriber_count(), 1);

        drop(subscriber);
        bus.publish(TableEvent::Sort {
            index: 0,
            direction: SortDirection::Asc,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let bus = EventBus::new();
        for _ in 0..(MAX_HISTORY + 20) {
            bus.publish(TableEvent::filter_cleared());
        }
        assert_eq!(bus.history().len(), MAX_HISTORY);
    }
}
