//! Tools available to the task handlers

mod calculator;
mod doc_search;

pub use calculator::CalculatorTool;
pub use doc_search::DocSearchTool;
