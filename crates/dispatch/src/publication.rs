//! Asynchronous delivery of raised events to their handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use tokio::sync::Notify;

use crate::event::RaisedEvent;
use crate::handler::ErasedEventHandler;

/// An event paired with the handlers it must reach.
pub(crate) type Delivery = (RaisedEvent, Vec<Arc<dyn ErasedEventHandler>>);

/// Counts publications that are still being delivered.
#[derive(Default)]
pub(crate) struct PublicationTracker {
    in_flight: AtomicUsize,
    idle: Notify,
}

impl PublicationTracker {
    pub(crate) fn begin(self: &Arc<Self>) -> PublicationGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        PublicationGuard(Arc::clone(self))
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_idle(&self) {
        loop {
            // Registered before the check so a wake-up in between is not lost
            let notified = self.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks one publication as finished when dropped, even if delivery panicked.
pub(crate) struct PublicationGuard(Arc<PublicationTracker>);

impl Drop for PublicationGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Delivers a batch of events in order.
///
/// Handlers of one event run concurrently, each in its own task, so a
/// failing or panicking handler cannot affect its siblings. The next event
/// starts once every handler of the previous one has finished.
pub(crate) async fn deliver(batch: Vec<Delivery>) {
    for (event, handlers) in batch {
        let names: Vec<&'static str> = handlers.iter().map(|handler| handler.name()).collect();

        let tasks = handlers.into_iter().map(|handler| {
            let event = event.clone();
            tokio::spawn(async move { handler.handle_raised(&event).await })
        });

        let results = join_all(tasks).await;
        metrics::counter!("dispatch_events_published_total").increment(1);

        for (handler, result) in names.into_iter().zip(results) {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    metrics::counter!("dispatch_event_handler_failures_total").increment(1);
                    tracing::error!(
                        event_type = event.event_type(),
                        event_id = %event.event_id(),
                        handler,
                        %error,
                        "event handler failed"
                    );
                }
                Err(join_error) => {
                    metrics::counter!("dispatch_event_handler_failures_total").increment(1);
                    tracing::error!(
                        event_type = event.event_type(),
                        event_id = %event.event_id(),
                        handler,
                        error = %join_error,
                        "event handler panicked"
                    );
                }
            }
        }
    }
}
