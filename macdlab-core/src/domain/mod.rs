//! Domain types for MACDLab

pub mod bar;

pub use bar::{Bar, BarSeries};
