//! Notifications module
//!
//! Real-time spot and occupancy events for websocket clients
//! (`/ws/spaces`).
//!
//! ```ignore
//! let event_bus = create_event_bus();
//! event_bus.publish(Event::SpotRemoved(SpotRemovedEvent {
//!     spot_id: 3,
//!     timestamp: Utc::now(),
//! }));
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
