//! Advisory token accounting. Nothing here gates a request.

use std::fmt;

use agent_provider::TokenCounts;

pub const DEFAULT_MAX_CONTEXT_TOKENS: u64 = 200_000;
/// Price per million input tokens.
pub const INPUT_COST_PER_MILLION: f64 = 3.00;
/// Price per million output tokens.
pub const OUTPUT_COST_PER_MILLION: f64 = 15.00;

/// Running input/output counters for the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn record(&mut self, counts: TokenCounts) {
        self.input = self.input.saturating_add(counts.input_tokens);
        self.output = self.output.saturating_add(counts.output_tokens);
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.input.saturating_add(self.output)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn report(&self, max_context_tokens: u64) -> UsageReport {
        let input_cost = cost(self.input, INPUT_COST_PER_MILLION);
        let output_cost = cost(self.output, OUTPUT_COST_PER_MILLION);
        let row = |label, tokens, cost| UsageRow {
            label,
            tokens,
            context_percent: percent(tokens, max_context_tokens),
            cost,
        };

        UsageReport {
            max_context_tokens,
            input: row("Input", self.input, input_cost),
            output: row("Output", self.output, output_cost),
            total: row("Total", self.total(), input_cost + output_cost),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageRow {
    pub label: &'static str,
    pub tokens: u64,
    pub context_percent: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageReport {
    pub max_context_tokens: u64,
    pub input: UsageRow,
    pub output: UsageRow,
    pub total: UsageRow,
}

impl UsageReport {
    #[must_use]
    pub fn rows(&self) -> [UsageRow; 3] {
        [self.input, self.output, self.total]
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<8} {:>12} {:>14} {:>10}",
            "Type",
            "Tokens",
            format!("% of {}", self.max_context_tokens),
            "Cost ($)"
        )?;
        for row in self.rows() {
            writeln!(
                f,
                "{:<8} {:>12} {:>13.2}% {:>10.4}",
                row.label, row.tokens, row.context_percent, row.cost
            )?;
        }
        Ok(())
    }
}

fn cost(tokens: u64, per_million: f64) -> f64 {
    tokens as f64 / 1_000_000.0 * per_million
}

fn percent(tokens: u64, max_context_tokens: u64) -> f64 {
    if max_context_tokens == 0 {
        return 0.0;
    }
    tokens as f64 / max_context_tokens as f64 * 100.0
}
