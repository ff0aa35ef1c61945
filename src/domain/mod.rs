pub mod catalog;
pub mod grid;
pub mod level;
pub mod tween;
