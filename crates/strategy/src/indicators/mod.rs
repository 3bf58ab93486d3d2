pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use macd::MacdIndicator;
pub use moving_average::{ema, sma};
pub use rsi::RsiIndicator;
