pub mod config;
pub mod data;
pub mod report;

pub use config::Config;
pub use data::load_prices;
pub use report::{print_summary, signal_label, write_reports};
