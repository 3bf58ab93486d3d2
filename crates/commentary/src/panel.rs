use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use strategy::Decision;

use crate::analysts::{Analyst, GENERIC_LINE};
use crate::provider::TextProvider;

/// Session figures the analysts react to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceContext {
    pub pnl: f64,
    pub trade_count: u32,
    pub balance: f64,
}

/// One analyst reaction, streamed to the client as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystComment {
    pub analyst: Analyst,
    pub text: String,
    /// Unix time in seconds.
    pub timestamp: f64,
}

/// Picks analysts and produces their comments, generated when a provider is
/// configured and scripted otherwise.
#[derive(Clone, Default)]
pub struct AnalystPanel {
    provider: Option<Arc<dyn TextProvider>>,
}

impl AnalystPanel {
    /// Scripted lines only.
    pub fn scripted() -> Self {
        Self { provider: None }
    }

    pub fn with_provider(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    pub fn is_generative(&self) -> bool {
        self.provider.is_some()
    }

    /// One or two distinct, randomly chosen analysts to react to a trade.
    pub fn pick<R: Rng>(rng: &mut R) -> Vec<Analyst> {
        let count = rng.gen_range(1..=2);
        Analyst::ALL.choose_multiple(rng, count).copied().collect()
    }

    /// A single analyst's comment, stamped when it is produced. Provider
    /// failures fall back to a scripted line.
    pub async fn comment<R: Rng + Send>(
        &self,
        analyst: Analyst,
        decision: &Decision,
        context: &PerformanceContext,
        rng: &mut R,
    ) -> AnalystComment {
        let text = match &self.provider {
            Some(provider) => match provider.comment(analyst, decision, context).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(analyst = %analyst, error = %e, "Generated comment failed, using script");
                    scripted_comment(analyst, decision, rng)
                }
            },
            None => scripted_comment(analyst, decision, rng),
        };
        AnalystComment {
            analyst,
            text,
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }

    /// Reactions from one or two distinct, randomly chosen analysts.
    pub async fn reactions<R: Rng + Send>(
        &self,
        decision: &Decision,
        context: &PerformanceContext,
        rng: &mut R,
    ) -> Vec<AnalystComment> {
        let mut comments = Vec::new();
        for analyst in Self::pick(rng) {
            comments.push(self.comment(analyst, decision, context, rng).await);
        }
        comments
    }
}

/// Random scripted line for `analyst`, or the generic line when none is
/// scripted for this decision.
pub fn scripted_comment<R: Rng + ?Sized>(analyst: Analyst, decision: &Decision, rng: &mut R) -> String {
    analyst
        .scripted_lines(decision)
        .and_then(|lines| lines.choose(rng))
        .copied()
        .unwrap_or(GENERIC_LINE)
        .to_string()
}
