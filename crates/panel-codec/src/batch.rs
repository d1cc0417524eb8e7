use panel_protocol::{ControlError, Fixture, WireColor};
use serde::{Deserialize, Serialize};

/// One element of the batch payload.
/// Deserialize is only exercised by tests but keeps the wire shape honest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BatchEntry {
    id: u16,
    color: WireColor,
}

/// Encode every enabled fixture into the JSON batch form:
/// `[{"id":1,"color":{"red":..,"green":..,"blue":..,"white":..}}, ...]`.
///
/// Disabled fixtures are skipped entirely. An enabled fixture with an unset
/// channel fails the whole batch; completeness is supposed to be checked
/// before encoding, so hitting that error here means a dispatch bug, not a
/// user mistake. Saturated RGB is canonicalized to the white-only form.
pub fn encode_batch<'a>(
    fixtures: impl IntoIterator<Item = &'a Fixture>,
) -> Result<String, ControlError> {
    let mut entries = Vec::new();
    for fixture in fixtures {
        if !fixture.enabled {
            continue;
        }
        let color = fixture.color.complete().ok_or_else(|| {
            ControlError::Validation(format!(
                "Batch not encoded: fixture {} has unset channels. Fill in all fields and retry.",
                fixture.id
            ))
        })?;
        entries.push(BatchEntry {
            id: fixture.id,
            color: color.canonical(),
        });
    }
    serde_json::to_string(&entries)
        .map_err(|e| ControlError::Other(format!("Batch encoding failed: {e}")))
}
