use panel_protocol::WireColor;

/// Encode the compact single-fixture form: `"<id>,<r>,<g>,<b>,<w>"`.
/// Saturated RGB is canonicalized to the white-only rendering first.
pub fn encode_positional(id: u16, color: WireColor) -> String {
    let c = color.canonical();
    format!("{},{},{},{},{}", id, c.red, c.green, c.blue, c.white)
}

/// The switch-on command: white channel at full level.
pub fn power_on_command(id: u16) -> String {
    encode_positional(id, WireColor::WHITE)
}

/// The switch-off command: every channel dark.
pub fn power_off_command(id: u16) -> String {
    encode_positional(id, WireColor::OFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_layout() {
        assert_eq!(
            encode_positional(7, WireColor::new(10, 20, 30, 0)),
            "7,10,20,30,0"
        );
    }

    #[test]
    fn test_positional_canonicalizes_saturated_rgb() {
        assert_eq!(
            encode_positional(7, WireColor::new(255, 255, 255, 0)),
            "7,0,0,0,255"
        );
        // White level is irrelevant once RGB saturates.
        assert_eq!(
            encode_positional(7, WireColor::new(255, 255, 255, 42)),
            "7,0,0,0,255"
        );
    }

    #[test]
    fn test_power_forms() {
        assert_eq!(power_on_command(3), "3,0,0,0,255");
        assert_eq!(power_off_command(3), "3,0,0,0,0");
    }
}
