//! Processing loop scenarios driven by in-memory fakes.

mod scenario;
mod support;
