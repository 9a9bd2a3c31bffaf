//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into
//! the device. Each subscriber is driven by a dedicated worker loop fed by a
//! bounded queue owned by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, uploads); they do **not** block the
//!   foreground loop nor other subscribers.
//! - Each subscriber declares its queue capacity via
//!   [`Subscribe::queue_capacity`]. On overflow, events for that subscriber
//!   are **dropped** and a `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use switchcore::{Event, EventKind, Subscribe};
//!
//! struct FaultCounter;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FaultCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::FaultRaised {
//!             // bump a metric...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "fault-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        256
    }
}
