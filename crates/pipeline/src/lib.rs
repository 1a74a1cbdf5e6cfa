//! The Postgen processing loop.
//!
//! Fetch pending topics, generate a post for each one and commit it back,
//! then wait and start over. A failing topic never stops the batch and a
//! failing cycle never stops the loop.

pub mod processor;
pub mod sleeper;

#[cfg(test)]
mod tests;

pub use processor::{CycleOutcome, CycleReport, Processor, TopicOutcome};
pub use sleeper::{Sleeper, TokioSleeper};
