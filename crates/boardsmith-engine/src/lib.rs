//! # Boardsmith Engine
//!
//! The editing session behind the board canvas. [`Engine`] owns the element
//! registry and turns pointer input into hover, selection, drag and routing
//! changes, re-routing attached traces whenever a pad or hole moves.

pub mod engine;
pub mod interaction;

pub use engine::{Engine, EngineError, SelectionListener};
pub use interaction::{Action, Anchor, Hit, Interaction, PointerEvent, PointerState, RoutingState};
