//! Change notifications for hosts that mirror the layer stack.
//!
//! `emit` calls every subscriber synchronously and also queues the event so a
//! UI loop can drain it later with `poll`.

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use crate::grid::Rgb;

/// Queue length at which the oldest half is dropped.
const MAX_QUEUE_SIZE: usize = 1000;

/// Which frames a change touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameScope {
    Frame(usize),
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    PixelChanged {
        frame_index: usize,
        x: usize,
        y: usize,
        colour: Rgb,
    },
    FramePixelsChanged(FrameScope),
    LayersChanged(FrameScope),
    TrackAdded {
        index: usize,
        id: Uuid,
    },
    TrackRemoved {
        index: usize,
        id: Uuid,
    },
    TrackMoved {
        from: usize,
        to: usize,
    },
    GroupChanged(FrameScope),
}

type Callback = Arc<dyn Fn(&LayerEvent) + Send + Sync>;

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Callback>>>,
    queue: Arc<Mutex<Vec<LayerEvent>>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("queued", &self.queue_len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every emitted event, in subscription order.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&LayerEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(callback));
    }

    pub fn emit(&self, event: LayerEvent) {
        // Clone the list so callbacks may subscribe without deadlocking.
        let subscribers: Vec<Callback> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for cb in &subscribers {
            cb(&event);
        }

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict = queue.len() / 2;
            tracing::warn!(queued = queue.len(), evict, "layer event queue full, dropping oldest");
            queue.drain(0..evict);
        }
        queue.push(event);
    }

    /// Drain every event queued since the last poll.
    pub fn poll(&self) -> Vec<LayerEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn clear(&self) {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
