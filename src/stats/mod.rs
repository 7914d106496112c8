//! Stats module - summaries behind the charts

mod calculator;

pub use calculator::{BoxSummary, CrossTab, StatsCalculator, WHISKER_IQR};
