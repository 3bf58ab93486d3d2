pub mod analysts;
pub mod panel;
pub mod provider;

pub use analysts::{Analyst, AnalystProfile};
pub use panel::{AnalystComment, AnalystPanel, PerformanceContext};
pub use provider::{AnthropicProvider, TextProvider};
