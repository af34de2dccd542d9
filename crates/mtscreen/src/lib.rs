#![warn(clippy::pedantic)]

//! Screen model for a BBS-era terminal emulator.
//!
//! The model is a grid of [`Cell`]s held in an append-only scrollback
//! ring; the visible window is the tail of the ring. All glyph writes
//! funnel through [`Screen::print_glyph`] so the animation refresh hook
//! can observe color changes.

pub mod cell;
pub mod driver;
pub mod line;
pub mod ring;
pub mod screen;

pub use cell::{Cell, CellAttributes, CellColor, Pen};
pub use driver::ScreenDriver;
pub use line::Line;
pub use ring::ScrollbackRing;
pub use screen::Screen;
