//! # netcoll Testkit
//!
//! Test utilities for netcoll.
//!
//! This crate provides:
//! - Fixtures: `tracing` setup, bindings wired to a [`TickScheduler`](netcoll_core::TickScheduler),
//!   event recorders and a loopback [`replicate`] helper
//! - Property-based generators for mutation scripts using proptest
//! - Wire-format test vectors
//!
//! ## Usage
//!
//! ```
//! use netcoll_core::ReplicatedList;
//! use netcoll_testkit::prelude::*;
//!
//! let (binding, _scheduler) = server_binding(1);
//! let mut source: ReplicatedList<i32> = ReplicatedList::new(binding.clone(), Default::default());
//! let mut replica: ReplicatedList<i32> = ReplicatedList::new(binding, Default::default());
//!
//! source.add(3).unwrap();
//! replicate(&mut source, &mut replica).unwrap();
//! assert_eq!(replica.as_slice(), &[3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
