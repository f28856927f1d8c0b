//! Terminal UI: rendering, keyboard input, and shared styles.

pub mod input;
pub mod render;
pub mod styles;
pub mod views;
