//! Domain types for TrendScan

pub mod bar;
pub mod group;
pub mod series;

pub use bar::Bar;
pub use group::Group;
pub use series::{Series, SeriesError};
