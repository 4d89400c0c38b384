pub mod api;
pub mod driver;
pub mod error;
pub mod pages;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod utils;

pub use error::E2eError;
pub use runner::run_scenarios;
pub use utils::config::Config;
