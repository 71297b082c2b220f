//! Token-budgeted assembly of retrieved hits and recent interactions into a
//! single prompt-ready string.

use crate::constants::defaults;
use crate::types::{Interaction, RetrievalHit};

/// Estimated tokens per character for the default tokenizer (4 chars ≈ 1 token).
const CHARS_PER_TOKEN: usize = 4;

/// A pluggable token estimator. The default implementation approximates 4
/// characters per token; callers with a real tokenizer can supply their own.
pub trait Tokenizer {
    /// Estimate the number of tokens `text` would occupy.
    fn estimate(&self, text: &str) -> usize;
}

/// Default tokenizer: `chars / 4`, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokenizer;

impl Tokenizer for ApproxTokenizer {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(CHARS_PER_TOKEN)
    }
}

/// Inputs to [`ContextWindow::build`].
#[derive(Debug, Clone)]
pub struct ContextInputs<'a> {
    /// System preamble, always included.
    pub system_preamble: &'a str,
    /// The current user prompt, always included.
    pub prompt: &'a str,
    /// Retrieved hits, already sorted by descending adjusted similarity.
    pub retrieved: &'a [RetrievalHit],
    /// Recent interactions, most-recent first.
    pub recent: &'a [Interaction],
}

/// Result of [`ContextWindow::build`].
#[derive(Debug, Clone)]
pub struct BuiltContext {
    /// The assembled context string with stable section markers.
    pub text: String,
    /// Number of candidate blocks dropped for lack of budget.
    pub elided_blocks: usize,
}

/// Assembles context strings within a token budget.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    max_tokens: usize,
    reserved_tokens: usize,
    overlap_ratio: f32,
}

impl ContextWindow {
    /// Construct a window with the given token budget and a floor reserved
    /// for the system preamble and current prompt.
    #[must_use]
    pub fn new(max_tokens: usize, reserved_tokens: usize) -> Self {
        Self {
            max_tokens,
            reserved_tokens,
            overlap_ratio: defaults::CONTEXT_OVERLAP_RATIO,
        }
    }

    /// Override the sliding-window overlap ratio (default `0.1`).
    #[must_use]
    pub fn with_overlap_ratio(mut self, ratio: f32) -> Self {
        self.overlap_ratio = ratio;
        self
    }

    /// Assemble `inputs` into a single string, filling the budget with
    /// retrieved hits (descending similarity) interleaved with recent
    /// interactions, using a default [`ApproxTokenizer`].
    #[must_use]
    pub fn build(&self, inputs: &ContextInputs<'_>) -> BuiltContext {
        self.build_with_tokenizer(inputs, &ApproxTokenizer)
    }

    /// Like [`Self::build`] but with a caller-supplied [`Tokenizer`].
    #[must_use]
    pub fn build_with_tokenizer(&self, inputs: &ContextInputs<'_>, tokenizer: &dyn Tokenizer) -> BuiltContext {
        let mut sections = Vec::new();
        sections.push(format!("# SYSTEM\n{}", inputs.system_preamble));

        let mut budget = self
            .max_tokens
            .saturating_sub(self.reserved_tokens.min(self.max_tokens));
        let mut elided_blocks = 0usize;

        let mut retrieved_section = String::from("# RETRIEVED\n");
        let mut recent_section = String::from("# RECENT\n");

        let mut recent_iter = inputs.recent.iter();
        for hit in inputs.retrieved {
            let block = self.chunk_block(&hit.interaction.response, &mut budget, tokenizer);
            match block {
                Some(text) => retrieved_section.push_str(&format!(
                    "- [score={}; id={}] {text}\n",
                    hit.adjusted_similarity, hit.interaction.id
                )),
                None => elided_blocks += 1,
            }

            // Interleave one recent interaction per retrieved hit as long as
            // it fits; this keeps recency visible without starving retrieval.
            if let Some(recent) = recent_iter.next() {
                let tokens = tokenizer.estimate(&recent.response);
                if tokens <= budget {
                    budget -= tokens;
                    recent_section.push_str(&format!("- {}\n", recent.response));
                } else {
                    elided_blocks += 1;
                }
            }
        }

        for recent in recent_iter {
            let tokens = tokenizer.estimate(&recent.response);
            if tokens <= budget {
                budget -= tokens;
                recent_section.push_str(&format!("- {}\n", recent.response));
            } else {
                elided_blocks += 1;
            }
        }

        sections.push(recent_section);
        sections.push(retrieved_section);
        sections.push(format!("# PROMPT\n{}", inputs.prompt));

        BuiltContext {
            text: sections.join("\n"),
            elided_blocks,
        }
    }

    /// Fit `text` into the remaining `budget`, applying sliding-window
    /// chunking with `overlap_ratio` if it doesn't fit whole. Returns `None`
    /// (and leaves `budget` untouched) if even a single window cannot fit.
    fn chunk_block(&self, text: &str, budget: &mut usize, tokenizer: &dyn Tokenizer) -> Option<String> {
        let tokens = tokenizer.estimate(text);
        if tokens <= *budget {
            *budget -= tokens;
            return Some(text.to_string());
        }
        if *budget == 0 {
            return None;
        }

        let window_chars = (*budget) * CHARS_PER_TOKEN;
        let step_chars = ((window_chars as f32) * (1.0 - self.overlap_ratio)).max(1.0) as usize;
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return None;
        }

        let mut windows = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + window_chars).min(chars.len());
            windows.push(chars[start..end].iter().collect::<String>());
            if end == chars.len() {
                break;
            }
            start += step_chars;
        }

        let merged = merge_overlapping_windows(&windows, self.overlap_ratio);
        let used = tokenizer.estimate(&merged).min(*budget);
        *budget -= used;
        Some(merged)
    }
}

/// Merge adjacent sliding windows by removing the longest overlapping
/// suffix/prefix pair between consecutive windows.
fn merge_overlapping_windows(windows: &[String], overlap_ratio: f32) -> String {
    if windows.is_empty() {
        return String::new();
    }
    let mut merged = windows[0].clone();
    for window in &windows[1..] {
        let max_overlap = ((window.len() as f32) * overlap_ratio).ceil() as usize;
        let overlap = (1..=max_overlap.min(merged.len()).min(window.len()))
            .rev()
            .find(|&len| merged.ends_with(&window[..len]))
            .unwrap_or(0);
        merged.push_str(&window[overlap..]);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Interaction, Tier};

    fn hit(response: &str) -> RetrievalHit {
        RetrievalHit {
            adjusted_similarity: 90.0,
            interaction: Interaction::new("id", "p", response, vec![0.0]),
            concept_overlap: Vec::new(),
        }
    }

    #[test]
    fn approx_tokenizer_rounds_up() {
        let t = ApproxTokenizer;
        assert_eq!(t.estimate("abcd"), 1);
        assert_eq!(t.estimate("abcde"), 2);
    }

    #[test]
    fn build_includes_preamble_and_prompt_sections() {
        let window = ContextWindow::new(1000, 10);
        let inputs = ContextInputs {
            system_preamble: "be helpful",
            prompt: "what is rust?",
            retrieved: &[],
            recent: &[],
        };
        let built = window.build(&inputs);
        assert!(built.text.contains("# SYSTEM\nbe helpful"));
        assert!(built.text.contains("# PROMPT\nwhat is rust?"));
        assert_eq!(built.elided_blocks, 0);
    }

    #[test]
    fn build_elides_blocks_when_budget_exhausted() {
        let window = ContextWindow::new(20, 10);
        let hits = vec![hit(&"x".repeat(200)), hit("short")];
        let inputs = ContextInputs {
            system_preamble: "s",
            prompt: "p",
            retrieved: &hits,
            recent: &[],
        };
        let built = window.build(&inputs);
        assert!(built.elided_blocks > 0);
    }

    #[test]
    fn chunk_block_splits_oversized_text_with_overlap() {
        let window = ContextWindow::new(1000, 0);
        let mut budget = 5; // 20 chars
        let text = "a".repeat(100);
        let chunked = window.chunk_block(&text, &mut budget, &ApproxTokenizer);
        assert!(chunked.is_some());
    }

    #[test]
    fn merge_overlapping_windows_dedupes_shared_suffix() {
        let windows = vec!["hello wor".to_string(), "world".to_string()];
        let merged = merge_overlapping_windows(&windows, 0.5);
        assert_eq!(merged, "hello world");
    }

    #[test]
    fn build_orders_sections_and_formats_retrieved_items() {
        let window = ContextWindow::new(1000, 10);
        let hits = vec![RetrievalHit {
            adjusted_similarity: 87.5,
            interaction: Interaction::new("id-1", "p", "retrieved text", vec![0.0]),
            concept_overlap: Vec::new(),
        }];
        let inputs = ContextInputs {
            system_preamble: "s",
            prompt: "what is rust?",
            retrieved: &hits,
            recent: &[],
        };
        let built = window.build(&inputs);

        let system_pos = built.text.find("# SYSTEM").unwrap();
        let recent_pos = built.text.find("# RECENT").unwrap();
        let retrieved_pos = built.text.find("# RETRIEVED").unwrap();
        let prompt_pos = built.text.find("# PROMPT").unwrap();
        assert!(system_pos < recent_pos);
        assert!(recent_pos < retrieved_pos);
        assert!(retrieved_pos < prompt_pos);

        assert!(built.text.contains("- [score=87.5; id=id-1] retrieved text"));
    }

    #[test]
    fn build_interleaves_recent_with_retrieved() {
        let window = ContextWindow::new(1000, 10);
        let hits = vec![hit("retrieved one")];
        let recent = vec![Interaction {
            tier: Tier::Short,
            ..Interaction::new("r1", "p", "recent one", vec![0.0])
        }];
        let inputs = ContextInputs {
            system_preamble: "s",
            prompt: "p",
            retrieved: &hits,
            recent: &recent,
        };
        let built = window.build(&inputs);
        assert!(built.text.contains("retrieved one"));
        assert!(built.text.contains("recent one"));
    }
}
