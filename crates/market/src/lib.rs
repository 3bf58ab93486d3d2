pub mod binance;
pub mod simulator;
pub mod source;
pub mod window;

pub use binance::BinanceKlines;
pub use simulator::MarketSimulator;
pub use source::{MarketFeed, MarketSource, Tick};
pub use window::CandleWindow;
