//! Per-chunk character budget derived from a model's context window.
//!
//! The budget is a heuristic: no tokenizer is consulted. Characters per token
//! is kept low so the estimate stays under the model's real capacity.

use crate::ai::model_config::get_model_registry;
use crate::context::ContextError;

/// Fraction of the context window handed to the diff payload. The rest is
/// left for instructions and the model's answer.
pub const DEFAULT_INPUT_SHARE: f64 = 0.5;

/// Conservative characters-per-token estimate.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 3;

/// Budget computed for one model, for display and logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budget {
    /// Context window of the model in tokens.
    pub model_token_limit: usize,
    /// Share of the window reserved for input.
    pub input_share: f64,
    /// Characters assumed per token.
    pub chars_per_token: usize,
    /// Resulting maximum characters per chunk.
    pub max_chars_per_chunk: usize,
}

/// Computes how many characters of diff a single request may carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetCalculator {
    input_share: f64,
    chars_per_token: usize,
    override_chars: Option<usize>,
}

impl Default for BudgetCalculator {
    fn default() -> Self {
        Self {
            input_share: DEFAULT_INPUT_SHARE,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            override_chars: None,
        }
    }
}

impl BudgetCalculator {
    /// Creates a calculator with explicit tuning values.
    ///
    /// `input_share` must lie in `(0, 1]` and `chars_per_token` must be
    /// positive.
    pub fn new(input_share: f64, chars_per_token: usize) -> Result<Self, ContextError> {
        if !(input_share > 0.0 && input_share <= 1.0) {
            return Err(ContextError::invalid(format!(
                "input share must be in (0, 1], got {input_share}"
            )));
        }
        if chars_per_token == 0 {
            return Err(ContextError::invalid(
                "characters per token must be greater than zero",
            ));
        }

        Ok(Self {
            input_share,
            chars_per_token,
            override_chars: None,
        })
    }

    /// Uses a fixed chunk size instead of the computed one. Zero is ignored.
    #[must_use]
    pub fn with_override(mut self, max_chars: Option<usize>) -> Self {
        self.override_chars = max_chars.filter(|&n| n > 0);
        self
    }

    /// Maximum characters per chunk for `model`.
    ///
    /// Unknown models use their provider's default window, or
    /// [`DEFAULT_INPUT_CONTEXT`](crate::ai::model_config::DEFAULT_INPUT_CONTEXT)
    /// when no provider can be inferred. The result is always at least 1.
    pub fn compute_max_chunk_chars(&self, model: &str) -> usize {
        self.budget_for(model).max_chars_per_chunk
    }

    /// Full budget breakdown for `model`.
    pub fn budget_for(&self, model: &str) -> Budget {
        let model_token_limit = get_model_registry().get_input_context(model);
        Budget {
            model_token_limit,
            input_share: self.input_share,
            chars_per_token: self.chars_per_token,
            max_chars_per_chunk: self.chars_for_limit(model_token_limit),
        }
    }

    /// Maximum characters per chunk for a context window of `token_limit`.
    pub fn chars_for_limit(&self, token_limit: usize) -> usize {
        if let Some(chars) = self.override_chars {
            return chars;
        }

        let input_tokens = (token_limit as f64 * self.input_share).floor() as usize;
        input_tokens.saturating_mul(self.chars_per_token).max(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ai::model_config::DEFAULT_INPUT_CONTEXT;
    use proptest::prelude::*;

    #[test]
    fn known_model_uses_registry_window() {
        // gpt-4o-mini: 128000 tokens * 0.5 * 3
        let calc = BudgetCalculator::default();
        assert_eq!(calc.compute_max_chunk_chars("gpt-4o-mini"), 192_000);
    }

    #[test]
    fn unknown_model_uses_default_window() {
        let calc = BudgetCalculator::default();
        let budget = calc.budget_for("totally-unknown-model");
        assert_eq!(budget.model_token_limit, DEFAULT_INPUT_CONTEXT);
        assert_eq!(budget.max_chars_per_chunk, 12_288);
    }

    #[test]
    fn empty_model_identifier_still_positive() {
        assert!(BudgetCalculator::default().compute_max_chunk_chars("") > 0);
    }

    #[test]
    fn override_wins_when_positive() {
        let calc = BudgetCalculator::default().with_override(Some(1_000));
        assert_eq!(calc.compute_max_chunk_chars("gpt-4o"), 1_000);

        let ignored = BudgetCalculator::default().with_override(Some(0));
        assert_eq!(ignored.compute_max_chunk_chars("gpt-4"), 12_288);
    }

    #[test]
    fn tiny_window_clamps_to_one() {
        let calc = BudgetCalculator::new(0.1, 1).unwrap();
        assert_eq!(calc.chars_for_limit(1), 1);
        assert_eq!(calc.chars_for_limit(0), 1);
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        assert!(BudgetCalculator::new(0.0, 3).is_err());
        assert!(BudgetCalculator::new(1.5, 3).is_err());
        assert!(BudgetCalculator::new(f64::NAN, 3).is_err());
        assert!(matches!(
            BudgetCalculator::new(0.5, 0),
            Err(ContextError::InvalidArgument(_))
        ));
        assert!(BudgetCalculator::new(1.0, 4).is_ok());
    }

    proptest! {
        #[test]
        fn larger_share_never_shrinks_budget(
            limit in 0usize..2_000_000,
            a in 0.01f64..=1.0,
            b in 0.01f64..=1.0,
        ) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let small = BudgetCalculator::new(low, 3).unwrap().chars_for_limit(limit);
            let large = BudgetCalculator::new(high, 3).unwrap().chars_for_limit(limit);
            prop_assert!(small <= large);
            prop_assert!(small >= 1);
        }
    }
}
