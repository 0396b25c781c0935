//! JSON-lines reader for recorded key events.
//!
//! Each non-empty line holds one [`KeyEvent`]. Events are returned in file
//! order; the engine tolerates out-of-order timestamps.

use crate::collector::types::KeyEvent;
use crate::error::EngineError;
use std::io::BufRead;

/// Read every key event from a JSON-lines source.
pub fn read_key_events<R: BufRead>(reader: R) -> Result<Vec<KeyEvent>, EngineError> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: KeyEvent =
            serde_json::from_str(trimmed).map_err(|e| EngineError::InvalidEvent {
                line: index + 1,
                message: e.to_string(),
            })?;
        events.push(event);
    }

    Ok(events)
}
