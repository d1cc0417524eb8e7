//! # Control Actors
//!
//! The three actors of the lighting control engine:
//!
//! - [`DispatchActor`] owns the fixture registry and runs every panel
//!   command through one validate, connect, encode, transmit pipeline
//! - [`LinkActor`] owns the broker session and its connection state machine
//! - [`DimmerActor`] drives the brightness sweep clock
//!
//! Actors communicate only through the channels wired up by
//! `panel_runtime::ChannelManager`. None of them share state.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod constants;
pub mod dimmer_actor;
pub mod dispatch_actor;
pub mod link_actor;

pub use dimmer_actor::DimmerActor;
pub use dispatch_actor::{DispatchActor, SaveMode};
pub use link_actor::LinkActor;
