//! Delivery of qualifying ticket transitions to an external webhook.
//!
//! The update path enqueues a `NotificationEvent` and moves on; a worker
//! drains the queue off the request path and POSTs each event with bounded
//! retries. Delivery is at-least-once: a retry racing an unacknowledged
//! success may duplicate an event, and consumers must tolerate that.

pub mod error;
pub mod queue;
pub mod worker;
