//! Centralized configuration constants for the control actors
//!
//! All timing and threshold values are defined here with rationale based on
//! observed fixture behavior and broker limits.
//!
//! **Before changing any constant:**
//! 1. Read its full documentation comment
//! 2. Understand the hardware/broker basis for the value
//! 3. Test against real fixtures (RGBW controllers vary)
//! 4. Update documentation with your findings

/// Brightness sweep timing
pub mod dim {
    /// Interval between brightness pulses (milliseconds)
    ///
    /// **Value**: 200ms (5 pulses per second)
    ///
    /// **Rationale**: RGBW controllers interpolate between received levels,
    /// so 5 Hz reads as a continuous fade to the eye. Faster pulsing floods
    /// a QoS-0 topic with frames the fixtures would coalesce anyway; slower
    /// pulsing makes the staircase visible on strips without interpolation.
    ///
    /// **Used in**: dimmer_actor.rs sweep loop
    pub const TICK_MS: u64 = 200;

    /// Brightness change per pulse (percentage points)
    ///
    /// **Value**: 5
    ///
    /// **Rationale**: Divides the 0-100 range evenly, so every sweep lands
    /// exactly on both bounds. One direction takes 20 pulses (4 seconds)
    /// and a full wave takes 40 pulses (8 seconds), which matches the
    /// pacing of the slowest supported fixtures.
    ///
    /// **Used in**: dimmer_actor.rs sweep loop
    pub const STEP: u8 = 5;
}
