//! Step Handlers
//!
//! One module per step in the vocabulary. Handlers mutate the shared state
//! (result slots only), call external capabilities exclusively through the
//! adapter set, and report failures as data in a [`crate::step::StepReport`].
//! No error ever crosses a step boundary uncaught, so the scheduler can
//! always make forward progress.

pub mod classify;
pub mod extract;
pub mod index;
pub mod parse;
pub mod query;
pub mod remind;
pub mod retrieve;
pub mod scan;
pub mod terminal;
pub mod web;
