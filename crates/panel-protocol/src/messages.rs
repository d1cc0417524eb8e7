use crate::color::{ChannelId, Color};
use crate::fixture::Fixture;
use crate::state::LinkState;
use serde::{Deserialize, Serialize};

/// Severity of a user-facing notice. The display layer decides how each
/// level is rendered; the engine only picks the level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Commands from the front-end (or the animator) to the control engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PanelCommand {
    /// Edit one channel of a fixture's working color from a raw text field
    SetChannel {
        id: u16,
        channel: ChannelId,
        raw: String,
    },

    /// Replace a fixture's working color wholesale
    SetColor { id: u16, color: Color },

    /// Include or exclude a fixture from batch saves
    ToggleEnabled { id: u16 },

    /// Flip logical power and transmit the matching on/off command
    TogglePowered { id: u16 },

    /// Address a fixture id, provisioning it with defaults when unknown
    SelectFixture { id: u16 },

    /// Apply a named solid preset to a fixture and transmit it
    ApplyPreset { id: u16, name: String },

    /// Send every enabled fixture's color to the fixtures
    SaveAll,

    /// Start the brightness sweep for a fixture against a dim preset
    StartDim { id: u16, name: String },

    /// Stop the brightness sweep
    StopDim,

    /// Wake-up from the animator: a fresh brightness is waiting in the
    /// sweep's level cell. Rides the same channel as user commands so all
    /// producers serialize through one dispatcher; carrying no value of its
    /// own, a backlog of pulses collapses into one send of the latest level.
    DimPulse,

    /// Tear the engine down and release the transport session
    Shutdown,
}

/// Events from the control engine to the front-end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PanelEvent {
    /// Link state has changed
    StateChanged { state: LinkState },

    /// User-facing notice for the toast surface
    Notice {
        level: NoticeLevel,
        message: String,
    },

    /// Registry snapshot after a mutation
    FixturesChanged { fixtures: Vec<Fixture> },

    /// Current animator brightness, for display
    DimLevel { brightness: u8 },
}

impl PanelEvent {
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        PanelEvent::Notice {
            level,
            message: message.into(),
        }
    }
}
