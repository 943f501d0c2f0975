//! Summary generation with retries and a deterministic fallback.
//!
//! The summarizer never fails: after exhausting its attempts it answers
//! with a fallback derived from the document title, flagged so the
//! orchestrator records it as a placeholder outcome.

use std::time::Duration;

use super::backend::GenerationBackend;
use crate::models::enums::Language;

/// Retry and acceptance knobs. Tests shrink the delay.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Output below this length is judged useless and retried.
    pub min_summary_chars: usize,
    /// Excerpts below this length are not worth sending to a backend.
    pub min_excerpt_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            min_summary_chars: 30,
            min_excerpt_chars: 50,
        }
    }
}

/// Result of a summarization run. `used_fallback` marks placeholder
/// text; a valid recorded outcome, but one the orchestrator must not
/// spend explanation generation on.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub text: String,
    pub used_fallback: bool,
}

impl SummaryOutcome {
    /// Deterministic fallback derived from the document title.
    pub fn fallback_for(title: &str) -> Self {
        Self {
            text: format!("This document contains budget information for {title}."),
            used_fallback: true,
        }
    }

    fn placeholder(text: &str) -> Self {
        Self {
            text: text.to_string(),
            used_fallback: true,
        }
    }
}

pub struct Summarizer {
    backend: Box<dyn GenerationBackend>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(backend: Box<dyn GenerationBackend>) -> Self {
        Self::with_config(backend, SummarizerConfig::default())
    }

    pub fn with_config(backend: Box<dyn GenerationBackend>, config: SummarizerConfig) -> Self {
        Self { backend, config }
    }

    /// Reduce an excerpt to a short summary in the given language.
    /// Always returns non-empty text.
    pub fn summarize(&self, title: &str, excerpt: &str, language: Language) -> SummaryOutcome {
        let excerpt = excerpt.trim();
        if excerpt.len() < self.config.min_excerpt_chars {
            tracing::warn!(title, "Not enough relevant text to summarize");
            return SummaryOutcome::placeholder(
                "Not enough relevant text found in document to generate a summary.",
            );
        }

        let prompt = build_prompt(excerpt, language);

        for attempt in 1..=self.config.max_attempts {
            match self.backend.generate(&prompt) {
                Ok(text) => {
                    let text = text.trim();
                    if text.len() >= self.config.min_summary_chars {
                        tracing::info!(
                            title,
                            language = language.as_str(),
                            chars = text.len(),
                            backend = self.backend.name(),
                            "Generated summary"
                        );
                        return SummaryOutcome {
                            text: text.to_string(),
                            used_fallback: false,
                        };
                    }
                    tracing::warn!(
                        title,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        chars = text.len(),
                        "Summary too short, retrying"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        title,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "Summarization backend failed"
                    );
                }
            }
            if attempt < self.config.max_attempts {
                std::thread::sleep(self.config.retry_delay);
            }
        }

        tracing::error!(title, "All summarization attempts failed, using fallback");
        SummaryOutcome::fallback_for(title)
    }
}

fn build_prompt(excerpt: &str, language: Language) -> String {
    format!(
        "The following is an excerpt from a government budget document:\n\n\
         {excerpt}\n\n\
         Provide a concise summary of this excerpt, focusing on key points related to \
         gender equality, social inclusion, and sustainable development. Focus on \
         policies, impacts, and recommendations if present. Write the summary in {}.",
        language.display_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::backend::MockBackend;

    const EXCERPT: &str = "The budget increases funding for gender equality programs, \
                           maternal health services, and support for marginalized \
                           communities across all districts.";

    fn quick_config() -> SummarizerConfig {
        SummarizerConfig {
            retry_delay: Duration::ZERO,
            ..SummarizerConfig::default()
        }
    }

    #[test]
    fn successful_generation_is_not_a_fallback() {
        let summarizer = Summarizer::with_config(
            Box::new(MockBackend::new(
                "The budget expands maternal health funding and inclusion programs.",
            )),
            quick_config(),
        );
        let outcome = summarizer.summarize("Uganda Budget 2025", EXCERPT, Language::En);
        assert!(!outcome.used_fallback);
        assert!(outcome.text.contains("maternal health"));
    }

    #[test]
    fn backend_failure_exhausts_retries_then_falls_back() {
        let backend = std::sync::Arc::new(MockBackend::failing());
        let summarizer =
            Summarizer::with_config(Box::new(std::sync::Arc::clone(&backend)), quick_config());

        let outcome = summarizer.summarize("Uganda Budget 2025", EXCERPT, Language::En);
        assert!(outcome.used_fallback);
        assert_eq!(
            outcome.text,
            "This document contains budget information for Uganda Budget 2025."
        );
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn short_output_retried_then_accepted() {
        let backend = MockBackend::sequence(vec![
            Some("too short".into()),
            Some("A proper summary of gender equality allocations in the budget.".into()),
        ]);
        let summarizer = Summarizer::with_config(Box::new(backend), quick_config());
        let outcome = summarizer.summarize("Budget", EXCERPT, Language::En);
        assert!(!outcome.used_fallback);
        assert!(outcome.text.starts_with("A proper summary"));
    }

    #[test]
    fn too_short_excerpt_yields_placeholder_without_backend_call() {
        let summarizer = Summarizer::with_config(
            Box::new(MockBackend::new("should never be used")),
            quick_config(),
        );
        let outcome = summarizer.summarize("Budget", "tiny", Language::En);
        assert!(outcome.used_fallback);
        assert!(outcome.text.contains("Not enough relevant text"));
    }

    #[test]
    fn summary_text_is_never_empty() {
        for excerpt in ["", "tiny", EXCERPT] {
            let summarizer = Summarizer::with_config(
                Box::new(MockBackend::failing()),
                quick_config(),
            );
            let outcome = summarizer.summarize("Budget", excerpt, Language::Sw);
            assert!(!outcome.text.is_empty());
        }
    }

    #[test]
    fn prompt_names_the_target_language() {
        assert!(build_prompt(EXCERPT, Language::Sw).contains("Swahili"));
        assert!(build_prompt(EXCERPT, Language::En).contains("English"));
    }
}
