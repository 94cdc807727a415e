//! Falling-block puzzle simulation with an optional power-up layer.
//!
//! The library holds the whole game core. Drawing and input live in the
//! terminal host (`src/main.rs`), which only talks to [`game::Game`].

pub mod board;
pub mod catalog;
pub mod config;
pub mod error;
pub mod game;
pub mod piece;
pub mod powerup;
pub mod progression;
