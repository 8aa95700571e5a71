use std::{future::Future, pin::Pin, sync::Arc};

use tokio::task::JoinHandle;

use crate::events::{CartUpdatedEvent, EventHandler, EventProducer, Handler, LowStockEvent, OrderUpdatedEvent};

/// The publishing side of the hooks, cloned into every API that emits events. An empty list means nobody listens.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub cart_updated_producer: Vec<EventProducer<CartUpdatedEvent>>,
    pub low_stock_producer: Vec<EventProducer<LowStockEvent>>,
    pub order_updated_producer: Vec<EventProducer<OrderUpdatedEvent>>,
}

impl EventProducers {
    pub async fn publish_cart_updated(&self, event: CartUpdatedEvent) {
        for producer in &self.cart_updated_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_low_stock(&self, event: LowStockEvent) {
        for producer in &self.low_stock_producer {
            producer.publish_event(event).await;
        }
    }

    pub async fn publish_order_updated(&self, event: OrderUpdatedEvent) {
        for producer in &self.order_updated_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_cart_updated: Option<EventHandler<CartUpdatedEvent>>,
    pub on_low_stock: Option<EventHandler<LowStockEvent>>,
    pub on_order_updated: Option<EventHandler<OrderUpdatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_cart_updated = hooks.on_cart_updated.map(|f| EventHandler::new(buffer_size, f));
        let on_low_stock = hooks.on_low_stock.map(|f| EventHandler::new(buffer_size, f));
        let on_order_updated = hooks.on_order_updated.map(|f| EventHandler::new(buffer_size, f));
        Self { on_cart_updated, on_low_stock, on_order_updated }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_cart_updated {
            result.cart_updated_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_low_stock {
            result.low_stock_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_updated {
            result.order_updated_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns one worker per registered hook. Each worker stops once all of its producers are dropped.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut workers = Vec::new();
        if let Some(handler) = self.on_cart_updated {
            workers.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_low_stock {
            workers.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_updated {
            workers.push(tokio::spawn(handler.start_handler()));
        }
        workers
    }
}

type HookResult = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_cart_updated: Option<Handler<CartUpdatedEvent>>,
    pub on_low_stock: Option<Handler<LowStockEvent>>,
    pub on_order_updated: Option<Handler<OrderUpdatedEvent>>,
}

impl EventHooks {
    pub fn on_cart_updated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(CartUpdatedEvent) -> HookResult) + Send + Sync + 'static {
        self.on_cart_updated = Some(Arc::new(f));
        self
    }

    pub fn on_low_stock<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(LowStockEvent) -> HookResult) + Send + Sync + 'static {
        self.on_low_stock = Some(Arc::new(f));
        self
    }

    pub fn on_order_updated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderUpdatedEvent) -> HookResult) + Send + Sync + 'static {
        self.on_order_updated = Some(Arc::new(f));
        self
    }
}
