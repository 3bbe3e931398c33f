//! Start-up wiring for event subscribers.
//!
//! Integrations register named callbacks on [`EventHooks`]. [`EventHandlers`] turns each callback into its own channel
//! and handler task, and hands out the matching [`EventProducers`] to the settlement API. Every subscriber gets its
//! own copy of each event, so a slow WhatsApp delivery never holds up any other subscriber.
use std::sync::Arc;

use futures_util::future::BoxFuture;
use log::*;
use tokio::task::JoinSet;

use crate::events::{EventHandler, EventProducer, Handler, OrderSettledEvent};

struct Subscriber<E> {
    name: String,
    handler: Handler<E>,
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), handler: Arc::clone(&self.handler) }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    order_settled: Vec<Subscriber<OrderSettledEvent>>,
}

impl EventHooks {
    /// Registers `f` to be called once for every order that is settled. `name` identifies the subscriber in the logs.
    pub fn on_order_settled<S, F>(&mut self, name: S, f: F) -> &mut Self
    where
        S: Into<String>,
        F: (Fn(OrderSettledEvent) -> BoxFuture<'static, ()>) + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("📬️ {name} subscribed to settled orders");
        self.order_settled.push(Subscriber { name, handler: Arc::new(f) });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_settled.is_empty()
    }
}

pub struct EventHandlers {
    order_settled: Vec<(String, EventHandler<OrderSettledEvent>)>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let order_settled = hooks
            .order_settled
            .into_iter()
            .map(|s| (s.name, EventHandler::new(buffer_size, s.handler)))
            .collect();
        Self { order_settled }
    }

    /// The names of the order settled subscribers, in registration order.
    pub fn order_settled_subscribers(&self) -> Vec<&str> {
        self.order_settled.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn producers(&self) -> EventProducers {
        let order_settled = self.order_settled.iter().map(|(_, handler)| handler.subscribe()).collect();
        EventProducers { order_settled }
    }

    /// Spawns one task per subscriber. Each task runs until every producer handed out by [`Self::producers`] has
    /// been dropped. Dropping the returned set aborts the handlers, so keep it for as long as events can be published.
    pub fn start_handlers(self) -> JoinSet<()> {
        let mut tasks = JoinSet::new();
        for (name, handler) in self.order_settled {
            info!("📬️ Starting the order settled handler for {name}");
            tasks.spawn(async move {
                handler.start_handler().await;
                debug!("📬️ The order settled handler for {name} has stopped");
            });
        }
        tasks
    }
}

/// The publishing side of the hooks, held by the settlement API.
#[derive(Default, Clone)]
pub struct EventProducers {
    order_settled: Vec<EventProducer<OrderSettledEvent>>,
}

impl EventProducers {
    /// Hands the event to every order settled subscriber.
    pub async fn publish_order_settled(&self, event: OrderSettledEvent) {
        let order_id = &event.settled.order.order_id;
        trace!("📬️ Publishing settlement of {order_id} to {} subscribers", self.order_settled.len());
        for producer in &self.order_settled {
            producer.publish_event(event.clone()).await;
        }
    }

    pub fn order_settled_subscriber_count(&self) -> usize {
        self.order_settled.len()
    }
}
