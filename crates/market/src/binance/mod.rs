pub mod rest;

pub use rest::BinanceKlines;
