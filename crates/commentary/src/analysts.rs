use serde::{Deserialize, Serialize};

use strategy::{Action, Decision, ExitReason};

/// Line used when nothing is scripted for an analyst and event.
pub const GENERIC_LINE: &str = "Monitoring market conditions...";

/// The judges reacting to trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analyst {
    Rita,
    Yang,
    Sharpe,
}

/// Persona handed to the generative provider.
#[derive(Debug, Clone, Copy)]
pub struct AnalystProfile {
    pub name: &'static str,
    pub style: &'static str,
    pub loves: &'static [&'static str],
    pub hates: &'static [&'static str],
}

impl Analyst {
    pub const ALL: [Analyst; 3] = [Analyst::Rita, Analyst::Yang, Analyst::Sharpe];

    pub fn id(&self) -> &'static str {
        match self {
            Analyst::Rita => "rita",
            Analyst::Yang => "yang",
            Analyst::Sharpe => "sharpe",
        }
    }

    pub fn profile(&self) -> AnalystProfile {
        match self {
            Analyst::Rita => AnalystProfile {
                name: "Judge Rita",
                style: "supportive, encouraging, focused on safety and style",
                loves: &["safe routines", "steady progress", "good discipline"],
                hates: &["risky moves", "big stumbles", "over-exposure"],
            },
            Analyst::Yang => AnalystProfile {
                name: "Judge Yang",
                style: "high-energy, bold, aggressive momentum seeker",
                loves: &["big performances", "flawless execution", "pure energy"],
                hates: &["playing it too safe", "boring routines", "missed opportunities"],
            },
            Analyst::Sharpe => AnalystProfile {
                name: "Judge Sharpe",
                style: "precise, mathematical, focused on technical merit",
                loves: &["consistency", "high technical scores", "perfect balance"],
                hates: &["sloppy acts", "unnecessary risks", "deviating from the script"],
            },
        }
    }

    /// Scripted lines for a decision.
    ///
    /// Exits look up `(EXIT, reason)` first, then fall back to the bare
    /// action. Returns `None` when neither is scripted.
    pub fn scripted_lines(&self, decision: &Decision) -> Option<&'static [&'static str]> {
        let action = decision.action();
        decision
            .reason()
            .and_then(|reason| scripted(*self, action, Some(reason)))
            .or_else(|| scripted(*self, action, None))
    }
}

impl std::fmt::Display for Analyst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

fn scripted(
    analyst: Analyst,
    action: Action,
    reason: Option<ExitReason>,
) -> Option<&'static [&'static str]> {
    use Analyst::*;
    use ExitReason::*;

    let lines: &'static [&'static str] = match (analyst, action, reason) {
        (Rita, Action::Enter, None) => &[
            "Ooh, bold entrance! I love the energy!",
            "A classic move. Let's see if you can nail the landing!",
            "Taking the stage with confidence. Show us what you've got!",
        ],
        (Rita, Action::Exit, Some(StopLoss)) => &[
            "A bit of a stumble, but you kept your cool! Safety first!",
            "Ouch! But hey, every star has a bad night. Reset and come back!",
            "The spotlight was a bit bright there. Good job protecting your routine.",
        ],
        (Rita, Action::Exit, Some(TakeProfit)) => &[
            "Bravo! That was a spectacular finish!",
            "Pure talent! You absolutely owned that performance.",
            "Encore! Encore! A perfectly timed exit.",
        ],
        (Yang, Action::Enter, None) => &[
            "MOMENTUM! POWER! GO GO GO!",
            "THAT'S WHAT I CALL A SHOW-STOPPER!",
            "HERE WE GO! MAXIMUM VIBES INITIATED!",
        ],
        (Yang, Action::Exit, Some(StopLoss)) => &[
            "TOUGH BREAK! BUT THE CROWD STILL LOVES YOU!",
            "TECHNICAL GLITCH! WE'LL FIX IT IN POST!",
            "HEART OF A CHAMPION! YOU'LL CRUSH IT NEXT TIME!",
        ],
        (Yang, Action::Exit, Some(TakeProfit)) => &[
            "YES! THAT'S A GOLD MEDAL PERFORMANCE!",
            "YOU'RE A NATURAL! PURE ALPHA ENERGY!",
            "FLAWLESS! THE JUDGES ARE GIVING YOU A 10!",
        ],
        (Sharpe, Action::Enter, None) => &[
            "Calculated confidence. A very professional start.",
            "Statistically, that was a brilliant opening. Carry on.",
            "I see the vision. The technical merit is high here.",
        ],
        (Sharpe, Action::Exit, Some(StopLoss)) => &[
            "A minor setback in the data. Your risk management is commendable.",
            "Safety protocol engaged. You showed great discipline there.",
            "Protecting the routine is part of the talent. Wise choice.",
        ],
        (Sharpe, Action::Exit, Some(TakeProfit)) => &[
            "Masterful execution. Your Sharpe ratio is singing!",
            "High technical scores all around. Very well done.",
            "Consistency is your greatest talent. Beautifully handled.",
        ],
        _ => return None,
    };
    Some(lines)
}
