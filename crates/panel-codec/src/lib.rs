//! # Panel Codec
//!
//! Pure mapping from fixture state to the two wire forms fixtures accept:
//! the JSON batch array and the compact positional string. Nothing here
//! performs I/O; the dispatcher feeds validated state in and passes the
//! returned payload to the link for transmission.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod batch;
pub mod positional;

pub use batch::encode_batch;
pub use positional::{encode_positional, power_off_command, power_on_command};
