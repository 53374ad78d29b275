use std::path::Path;

use skirmish_game::InputFrame;

use crate::PeerError;

/// Recorded input replayed one frame per tick, looping at the end.
#[derive(Debug, Clone, Default)]
pub struct Script {
    frames: Vec<InputFrame>,
    cursor: usize,
    idle: InputFrame,
}

impl Script {
    /// A script that never presses anything.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn new(frames: Vec<InputFrame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// Parse a JSON array of input frames. Omitted fields default to
    /// released buttons and zero look delta.
    pub fn from_json(text: &str) -> Result<Self, PeerError> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PeerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PeerError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Input for the next tick.
    pub fn next_frame(&mut self) -> &InputFrame {
        if self.frames.is_empty() {
            return &self.idle;
        }
        let index = self.cursor % self.frames.len();
        self.cursor = self.cursor.wrapping_add(1);
        &self.frames[index]
    }
}
