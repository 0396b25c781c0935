//! Key event input for the signal engine.
//!
//! The engine does not hook the keyboard itself; hosts forward key presses
//! as [`KeyEvent`]s, read them from a recording, or generate them.

pub mod reader;
pub mod synthetic;
pub mod types;

// Re-export commonly used types
pub use reader::read_key_events;
pub use synthetic::{generate, TypingProfile};
pub use types::{KeyEvent, KeyKind, BACKSPACE};
