//! Batching queue that flushes on a size threshold or a time interval.
//!
//! Producers [`push`](Batcher::push) items one at a time; a consumer callback
//! receives them as a `Vec` whenever the queue is flushed:
//!
//! - **Size**: the queue reaches [`Options::max`] items after a push
//! - **Time**: [`Options::interval`] elapses since the previous flush
//! - **Manual**: [`Batcher::flush`] or [`Batcher::end(true)`](Batcher::end)
//!
//! Every flush takes at most `max` items from the front of the queue, so
//! batches are delivered in push order and no item is delivered twice.
//!
//! # Example
//!
//! ```
//! use saturated::{Batcher, Options};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> saturated::Result<()> {
//! let batcher = Batcher::new(
//!     |batch: Vec<String>| println!("writing {} lines", batch.len()),
//!     Options::new()
//!         .with_interval(Duration::from_secs(1))
//!         .with_max(100),
//! )?;
//!
//! batcher.push("hello".to_string());
//! batcher.push("world".to_string());
//! assert_eq!(batcher.size(), 2);
//!
//! // Deliver what is left and stop the timer.
//! batcher.end(true);
//! assert_eq!(batcher.size(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! # Lifecycle
//!
//! A batcher is running from creation until [`Batcher::end`]. Once ended, no
//! timer or size-triggered flush happens again; pushes still queue items and
//! manual flushes still deliver them. Dropping the last handle behaves like
//! `end(false)`.
//!
//! # Runtime
//!
//! The interval timer is a tokio task, so a batcher needs a runtime with the
//! time driver enabled. Queue operations are synchronous and never await.

mod batcher;
mod config;
mod error;
mod timer;

pub use batcher::{Batcher, WeakBatcher};
pub use config::{DEFAULT_INTERVAL, Options};
pub use error::{Error, Result};
