//! View-level services: derived state, form controllers, and mutation flows.

pub mod dividends;
pub mod flash;
pub mod forms;
pub mod growth;
pub mod market;
pub mod portfolio;
pub mod scanner;
pub mod watchlists;
