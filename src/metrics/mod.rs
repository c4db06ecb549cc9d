pub mod summary;
pub mod timeseries;

pub use summary::{round_trips, AnalyzerResult, Trade};
pub use timeseries::{calculate_equity_curve, EquityPoint, Snapshot};
