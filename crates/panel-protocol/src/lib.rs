//! # Panel Protocol
//!
//! Type-safe data and message definitions for the fixture control engine.
//!
//! This crate holds the color model, the fixture registry, presets, the
//! link state machine and the command/event enums exchanged between the
//! front-end and the engine. It has zero dependencies on UI frameworks or
//! network APIs, making it fully testable in plain native Rust.
//!
//! ## Architecture
//!
//! - **PanelCommand**: Messages from front-end / animator → engine
//! - **PanelEvent**: Messages from engine → front-end
//! - **LinkState**: connection FSM (pure logic, no side effects)
//! - **Color / WireColor**: working vs wire-ready color values
//! - **FixtureBank**: the fixture collection, snapshot semantics
//!
//! ## Message Flow
//!
//! ```text
//! front-end → PanelCommand → DispatchActor → link / dimmer messages
//!                  ↓
//!             PanelEvent → front-end
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod color;
pub mod dim;
pub mod errors;
pub mod fixture;
pub mod messages;
pub mod preset;
pub mod state;

pub use color::{Channel, ChannelId, Color, WireColor, CHANNEL_MAX};
pub use dim::{DimCycle, DimDirection, BRIGHTNESS_MAX, BRIGHTNESS_MIN};
pub use errors::ControlError;
pub use fixture::{Fixture, FixtureBank, DEFAULT_FIXTURE_COUNT};
pub use messages::{NoticeLevel, PanelCommand, PanelEvent};
pub use preset::{DimPreset, PresetTable, SolidPreset};
pub use state::LinkState;
