//! A small stateless pub-sub channel.
//!
//! Each [`EventHandler`] owns one async hook and an mpsc queue. Any number of [`EventProducer`]s can push events into
//! the queue. The handler runs every event through the hook on its own task, so a slow hook never holds up the queue.
//! Hooks only see the event itself, never the engine's state.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.sender.clone() }
    }

    /// Runs until every producer has been dropped, then waits for in-flight hooks to finish.
    pub async fn start_handler(self) {
        let Self { mut receiver, sender, handler } = self;
        // Only the producers may keep the queue open
        drop(sender);
        debug!("📬️ Event handler started");
        let mut jobs = JoinSet::new();
        while let Some(event) = receiver.recv().await {
            trace!("📬️ Dispatching event");
            let handler = Arc::clone(&handler);
            jobs.spawn(async move { (handler)(event).await });
            // Reap finished jobs so the set does not grow without bound
            while let Some(done) = jobs.try_join_next() {
                if let Err(e) = done {
                    warn!("📬️ An event hook panicked or was aborted: {e}");
                }
            }
        }
        debug!("📬️ All producers are gone. Waiting for {} hooks to finish", jobs.len());
        while let Some(done) = jobs.join_next().await {
            if let Err(e) = done {
                warn!("📬️ An event hook panicked or was aborted: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues the event. A closed channel is logged and otherwise ignored.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
