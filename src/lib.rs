//! Capacity-limited group polls.
//!
//! Users vote on options that each admit a fixed number of votes. The
//! [`engine`] guarantees that no option ever exceeds its quota and that every
//! user holds at most one vote per poll, even when many votes race.

pub mod banner;
pub mod commands;
pub mod config;
pub mod consts;
pub mod display;
pub mod engine;
pub mod error;
pub mod events;
pub mod intake;
pub mod lifecycle;
pub mod poll;
pub mod service;
pub mod store;

pub use error::{PollError, StoreError};
pub use service::PollService;
