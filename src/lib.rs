//! Tag-based, level-partitioned, non-buffered broadcast rendezvous.
//!
//! A fixed-size namespace of *instances*, each partitioned into a fixed
//! number of independent *levels*. A sender publishes one message on one
//! level; every receiver registered on that level at that moment consumes
//! it; a receiver that arrives late gets nothing, and an unread message is
//! never buffered. `control(AWAKE_ALL)` cancels every receiver currently
//! parked on an instance, across all its levels, in one shot;
//! `control(REMOVE)` tears the instance down once no receiver is inside the
//! rendezvous.
//!
//!
//! ```
//! use std::sync::atomic::AtomicBool;
//! use tag_engine::{Credentials, OpenCommand, Permission, TagConfig, TagEngine};
//!
//! let engine = TagEngine::new(TagConfig::default());
//! let cancel = AtomicBool::new(false);
//! let creds = Credentials::root();
//!
//! let slot = engine
//!     .open(42, OpenCommand::Create, Permission::All, creds, &cancel)
//!     .unwrap();
//!
//! // A send with nobody registered on the level is simply discarded.
//! engine.send(slot, 0, b"hi", creds, &cancel).unwrap();
//! assert_eq!(engine.discarded_sends(), 1);
//! ```

mod bitmask;
mod cancel;
mod config;
mod engine;
mod epoch;
mod keymap;
mod snapshot;
mod table;
mod types;

pub mod error;

pub use config::{TagConfig, PRIVATE_KEY};
pub use engine::TagEngine;
pub use error::TagError;
pub use snapshot::{format_snapshot, snapshot, SnapshotLine};
pub use table::Instance;
pub use types::{ControlCommand, Credentials, OpenCommand, Permission};
