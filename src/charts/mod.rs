//! Charts module - chart selection, data extraction and PNG rendering

mod dashboard;
mod plotter;
#[cfg(feature = "plot")]
mod renderer;

pub use dashboard::{
    dashboard_chart, grouped_counts, DashboardRequest, DEFAULT_GROUP_BY, MISSING_LABEL,
};
pub use plotter::{
    is_numeric, ChartData, ChartError, ChartKind, ChartPlotter, ChartRequest, PreparedChart,
    MAX_CATEGORIES,
};
#[cfg(feature = "plot")]
pub use renderer::ChartRenderer;

/// Hand a rendered chart to the system viewer.
#[cfg(feature = "plot")]
pub fn open_chart(path: &std::path::Path) -> Result<(), ChartError> {
    open::that(path)?;
    Ok(())
}
