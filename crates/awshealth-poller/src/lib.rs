//! awshealth-poller: drives the fetch → snapshot → reconcile cycle.
//!
//! # State Machine
//!
//! ```text
//! Idle → Fetching ─ok──→ Applying ───┐
//!          │                         ├→ Sleeping → Idle → ...
//!          └─error─→ Recovering ─────┘
//! ```
//!
//! One cycle at a time: a slow fetch delays the next cycle rather than
//! overlapping it. A failed fetch leaves the published series untouched
//! and is retried at the next scheduled cycle, never within the same one.

pub mod poller;

pub use poller::{CycleOutcome, PollPhase, Poller};
