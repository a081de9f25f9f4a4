//! Crossover detection between a line and its trigger line.

pub mod crossover;

pub use crossover::{detect_crossover, Crossover};
