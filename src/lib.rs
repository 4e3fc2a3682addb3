//! Pokedex and battle-mode TUI client.
//!
//! The binary owns the terminal runtime; this library exposes the modules
//! for testing.

pub mod action;
pub mod api;
pub mod effect;
pub mod reducer;
pub mod results;
pub mod state;
pub mod ui;
