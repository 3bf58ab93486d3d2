pub mod blocks;
pub mod config;
pub mod engine;
pub mod indicators;
pub mod rules;

pub use blocks::{Block, BlockCategory, BlockConfig, BlockKind};
pub use config::{StrategyConfig, StrategyFileConfig};
pub use engine::{Action, Decision, Position, StrategyEngine};
pub use rules::ExitReason;
