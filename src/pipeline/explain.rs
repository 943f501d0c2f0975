//! Plain-language impact explanation generation.
//!
//! Turns a summary into a narrative an audience with limited literacy
//! can follow, focused on gender equality and reduced inequalities.
//! Infallible by contract: malformed input, backend failures, and
//! degenerate output all resolve to a deterministic region-templated
//! fallback.

use std::time::Duration;

use super::backend::GenerationBackend;
use super::truncate_chars;

/// Validation and retry knobs. Tests shrink the delay.
#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Input shorter than this cannot be explained meaningfully.
    pub min_input_chars: usize,
    /// Input longer than this is anomalous; likely not a summary at all.
    pub max_input_chars: usize,
    /// Input is truncated to this length before prompting.
    pub prompt_input_cap: usize,
    /// Output below this length is rejected as degenerate.
    pub min_output_chars: usize,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            min_input_chars: 10,
            max_input_chars: 20_000,
            prompt_input_cap: 4_000,
            min_output_chars: 50,
        }
    }
}

pub struct ExplanationGenerator {
    backend: Box<dyn GenerationBackend>,
    config: ExplainerConfig,
}

impl ExplanationGenerator {
    pub fn new(backend: Box<dyn GenerationBackend>) -> Self {
        Self::with_config(backend, ExplainerConfig::default())
    }

    pub fn with_config(backend: Box<dyn GenerationBackend>, config: ExplainerConfig) -> Self {
        Self { backend, config }
    }

    /// Generate an explanation of the summary's impact. Always returns
    /// non-empty text; never an error.
    pub fn explain(&self, summary_text: &str, region_name: Option<&str>) -> String {
        let input = summary_text.trim();
        if input.len() < self.config.min_input_chars {
            tracing::warn!("Summary text too short for explanation generation");
            return fallback_explanation(region_name);
        }
        if input.chars().count() > self.config.max_input_chars {
            tracing::warn!(
                chars = input.chars().count(),
                "Summary text anomalously long, skipping explanation generation"
            );
            return fallback_explanation(region_name);
        }

        let input = truncate_chars(input, self.config.prompt_input_cap);
        let prompt = build_prompt(input, region_name);

        for attempt in 1..=self.config.max_attempts {
            match self.backend.generate(&prompt) {
                Ok(text) => {
                    let text = text.trim();
                    if text.chars().count() < self.config.min_output_chars {
                        tracing::warn!(
                            attempt,
                            chars = text.chars().count(),
                            "Generated explanation too short, retrying"
                        );
                    } else if echoes_prompt(text) {
                        tracing::warn!(attempt, "Backend echoed the prompt, retrying");
                    } else {
                        tracing::info!(
                            chars = text.len(),
                            backend = self.backend.name(),
                            "Generated explanation"
                        );
                        return text.to_string();
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "Explanation backend failed"
                    );
                }
            }
            if attempt < self.config.max_attempts {
                std::thread::sleep(self.config.retry_delay);
            }
        }

        tracing::error!("All explanation attempts failed, using fallback");
        fallback_explanation(region_name)
    }
}

fn build_prompt(summary_text: &str, region_name: Option<&str>) -> String {
    let region_context = region_context(region_name);
    format!(
        "The following is a budget excerpt{region_context}: \"{summary_text}\"\n\n\
         Explain in simple, accessible language how this budget affects:\n\
         1. Gender equality (women, girls, and gender minorities)\n\
         2. Reduction of inequalities (marginalized and vulnerable populations)\n\
         Be specific about both positive and negative impacts. Explain as if speaking to \
         someone with limited literacy or technical knowledge."
    )
}

/// The backend sometimes answers with its own instructions instead of
/// an explanation.
fn echoes_prompt(output: &str) -> bool {
    output.contains("Explain in simple, accessible language")
        || output.starts_with("The following is a budget excerpt")
}

/// Deterministic explanation used whenever generation is unavailable or
/// produces nothing usable.
pub fn fallback_explanation(region_name: Option<&str>) -> String {
    let region_context = region_context(region_name);
    format!(
        "This budget{region_context} contains provisions that may impact gender equality \
         and reduce inequalities. For women and girls, it could affect access to \
         education, healthcare, and economic opportunities. For marginalized communities, \
         it might influence social services, infrastructure development, and protection \
         programs. The specific impacts depend on funding allocations and implementation."
    )
}

fn region_context(region_name: Option<&str>) -> String {
    match region_name {
        Some(name) if !name.trim().is_empty() => format!(" in {name}"),
        _ => String::new(),
    }
}
