//! Keyboard and mouse input mapped to viewer actions.
//!
//! # Invariants
//! - No global state: window callbacks write into an [`InputState`] owned by
//!   the application, and the render loop consumes one [`FrameInput`] per frame.
//! - Mouse motion is accumulated between frames and consumed exactly once.

pub mod action;
pub mod state;

pub use action::{Action, Key, MoveDirection};
pub use state::{FrameInput, InputState, KeyState, MoveFlags};
