//! Rolling-window technical indicators.
//!
//! Every function returns a vector aligned with its input. Positions whose
//! window is incomplete, or whose window contains a NaN, are NaN.

pub mod window;
pub mod trend;
pub mod oscillator;
pub mod volatility;

pub use oscillator::rsi::rsi_sma;
pub use trend::ma::moving_average;
pub use volatility::rolling_std::rolling_std;
pub use window::rolling;
