//! RGBW color values and the normalization rules applied to panel input.
//!
//! Channel levels arrive from text fields and remote intents as arbitrary
//! strings or integers. Everything funnels through here: parseable input is
//! clamped into the 0-255 channel range, unparseable input becomes the
//! explicit [`Channel::Unset`] sentinel. Only a fully specified color can
//! cross into wire encoding, which [`Color::complete`] enforces by producing
//! a [`WireColor`].

use serde::{Deserialize, Serialize};

/// Highest level a channel can carry.
pub const CHANNEL_MAX: u8 = 255;

/// One color channel: a settled level, or not yet specified.
///
/// Serializes untagged, so a set channel is a bare number and an unset one
/// is `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Channel {
    Level(u8),
    Unset,
}

impl Channel {
    /// Parse a raw text field into a channel value.
    ///
    /// Unparseable text (including empty) is `Unset`; numeric input is
    /// clamped into `0..=255`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(value) => Self::clamped(value),
            Err(_) => Channel::Unset,
        }
    }

    /// Clamp any integer into the channel range.
    pub fn clamped(value: i64) -> Self {
        Channel::Level(value.clamp(0, i64::from(CHANNEL_MAX)) as u8)
    }

    pub fn is_set(self) -> bool {
        matches!(self, Channel::Level(_))
    }

    /// The settled level, if there is one.
    pub fn level(self) -> Option<u8> {
        match self {
            Channel::Level(value) => Some(value),
            Channel::Unset => None,
        }
    }
}

impl From<u8> for Channel {
    fn from(value: u8) -> Self {
        Channel::Level(value)
    }
}

/// Names one of the four channels, for single-channel edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelId {
    Red,
    Green,
    Blue,
    White,
}

impl ChannelId {
    pub fn name(self) -> &'static str {
        match self {
            ChannelId::Red => "red",
            ChannelId::Green => "green",
            ChannelId::Blue => "blue",
            ChannelId::White => "white",
        }
    }
}

impl std::str::FromStr for ChannelId {
    type Err = crate::errors::ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(ChannelId::Red),
            "green" | "g" => Ok(ChannelId::Green),
            "blue" | "b" => Ok(ChannelId::Blue),
            "white" | "w" => Ok(ChannelId::White),
            other => Err(crate::errors::ControlError::Validation(format!(
                "Unknown channel '{other}'. Expected red, green, blue or white"
            ))),
        }
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A working RGBW color. May be partially specified while being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
    pub white: Channel,
}

impl Color {
    /// All channels at zero. The provisioning default.
    pub const OFF: Color = Color {
        red: Channel::Level(0),
        green: Channel::Level(0),
        blue: Channel::Level(0),
        white: Channel::Level(0),
    };

    pub fn new(red: u8, green: u8, blue: u8, white: u8) -> Self {
        Color {
            red: Channel::Level(red),
            green: Channel::Level(green),
            blue: Channel::Level(blue),
            white: Channel::Level(white),
        }
    }

    /// True when no channel is unset.
    pub fn is_complete(&self) -> bool {
        self.red.is_set() && self.green.is_set() && self.blue.is_set() && self.white.is_set()
    }

    /// The transmission gate: a wire-ready color, or `None` while any
    /// channel is still unset.
    pub fn complete(&self) -> Option<WireColor> {
        Some(WireColor {
            red: self.red.level()?,
            green: self.green.level()?,
            blue: self.blue.level()?,
            white: self.white.level()?,
        })
    }

    /// Copy of this color with one channel replaced.
    pub fn with_channel(&self, id: ChannelId, value: Channel) -> Color {
        let mut next = *self;
        match id {
            ChannelId::Red => next.red = value,
            ChannelId::Green => next.green = value,
            ChannelId::Blue => next.blue = value,
            ChannelId::White => next.white = value,
        }
        next
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::OFF
    }
}

impl From<WireColor> for Color {
    fn from(wire: WireColor) -> Self {
        Color::new(wire.red, wire.green, wire.blue, wire.white)
    }
}

/// A fully specified color as transmitted to fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
}

impl WireColor {
    /// Every channel dark. The power-off form.
    pub const OFF: WireColor = WireColor {
        red: 0,
        green: 0,
        blue: 0,
        white: 0,
    };

    /// White channel only, at full level. The power-on form and the
    /// canonical rendering of saturated RGB.
    pub const WHITE: WireColor = WireColor {
        red: 0,
        green: 0,
        blue: 0,
        white: CHANNEL_MAX,
    };

    pub const fn new(red: u8, green: u8, blue: u8, white: u8) -> Self {
        WireColor {
            red,
            green,
            blue,
            white,
        }
    }

    /// True when red, green and blue are all fully saturated.
    pub fn all_max_rgb(&self) -> bool {
        self.red == CHANNEL_MAX && self.green == CHANNEL_MAX && self.blue == CHANNEL_MAX
    }

    /// Outgoing commands render saturated RGB as white-channel-only.
    pub fn canonical(self) -> WireColor {
        if self.all_max_rgb() {
            WireColor::WHITE
        } else {
            self
        }
    }

    /// Scale every channel by a percentage brightness in `0..=100`.
    pub fn scaled(self, brightness: u8) -> WireColor {
        let factor = u16::from(brightness.min(100));
        let scale = |level: u8| (u16::from(level) * factor / 100) as u8;
        WireColor {
            red: scale(self.red),
            green: scale(self.green),
            blue: scale(self.blue),
            white: scale(self.white),
        }
    }
}
