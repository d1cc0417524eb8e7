//! # Panel Runtime
//!
//! Provides the runtime infrastructure for the lighting panel's actor engine.
//!
//! This crate defines:
//! - **Actor trait**: Base trait for all actors with lifecycle methods
//! - **Channel management**: Type-safe message routing between actors
//! - **Spawn utilities**: Helper functions for launching actors
//!
//! ## Architecture
//!
//! The actor runtime follows these principles:
//! - **Zero shared state**: Each actor owns its data
//! - **Message passing**: Actors communicate via typed messages
//! - **Sequential processing**: Messages are handled one at a time
//! - **Failure isolation**: Actor errors don't crash the engine
//!
//! ## Example
//!
//! ```ignore
//! use panel_runtime::{spawn_actor, ChannelManager};
//!
//! // Create channel infrastructure
//! let (manager, handles) = ChannelManager::new();
//!
//! // Create and spawn actors
//! let link_actor = LinkActor::new(/* ... */);
//! spawn_actor(link_actor, handles.link_rx, handles.event_tx.clone());
//!
//! // Send commands from the panel surface
//! manager.send_command(PanelCommand::SaveAll);
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod actor;
pub mod channels;
pub mod logging;

pub use actor::{spawn_actor, Actor};
pub use channels::{ChannelManager, DimmerMessage, EngineHandles, LinkMessage};
