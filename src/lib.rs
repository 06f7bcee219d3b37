//! Fee, profit and lot valuation engine for resellers of secondhand video games.

pub mod app;
pub mod domain;
pub mod infra;
pub mod util;

pub use app::{LotWorkflow, WorkflowError};
