//! Brightness sweep state for the dimming animator.
//!
//! The cycle is a triangular wave over `0..=100`. Each tick advances the
//! brightness by the configured step in the current direction. A bound value
//! is emitted like any other; the direction flip happens on the tick after
//! the bound was reached, so 0 and 100 each appear exactly once per period.

use serde::{Deserialize, Serialize};

/// Lowest brightness the sweep reaches.
pub const BRIGHTNESS_MIN: u8 = 0;

/// Highest brightness the sweep reaches.
pub const BRIGHTNESS_MAX: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimDirection {
    Rising,
    Falling,
}

/// One point of the sweep: the current brightness and where it is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimCycle {
    pub brightness: u8,
    pub direction: DimDirection,
}

impl DimCycle {
    /// A sweep about to fall from full brightness.
    pub fn new() -> Self {
        DimCycle {
            brightness: BRIGHTNESS_MAX,
            direction: DimDirection::Falling,
        }
    }

    /// The next point of the wave.
    ///
    /// If the previous point sat on a bound, the direction flips and the
    /// first step of the new direction is taken in the same tick.
    pub fn advance(self, step: u8) -> DimCycle {
        match self.direction {
            DimDirection::Falling => {
                if self.brightness == BRIGHTNESS_MIN {
                    DimCycle {
                        brightness: BRIGHTNESS_MIN.saturating_add(step).min(BRIGHTNESS_MAX),
                        direction: DimDirection::Rising,
                    }
                } else {
                    DimCycle {
                        brightness: self.brightness.saturating_sub(step),
                        direction: DimDirection::Falling,
                    }
                }
            }
            DimDirection::Rising => {
                if self.brightness == BRIGHTNESS_MAX {
                    DimCycle {
                        brightness: BRIGHTNESS_MAX.saturating_sub(step),
                        direction: DimDirection::Falling,
                    }
                } else {
                    DimCycle {
                        brightness: self.brightness.saturating_add(step).min(BRIGHTNESS_MAX),
                        direction: DimDirection::Rising,
                    }
                }
            }
        }
    }
}

impl Default for DimCycle {
    fn default() -> Self {
        DimCycle::new()
    }
}
