pub mod console;

use crate::analyzer::AnalysisReport;
use crate::model::PresentError;

pub use console::{ConsolePresenter, render_report};

/// Consumer of analysis results (dashboard, console, ...).
pub trait Presenter {
    fn present(&mut self, entity_id: &str, report: &AnalysisReport) -> Result<(), PresentError>;
}
