//! Document processing orchestrator.
//!
//! Drives extraction → relevance filtering → summarization →
//! explanation for one document and persists the results. Stage-local
//! failures (download, parsing, generation) are absorbed into fallback
//! content; the pipeline always records an outcome. Only a missing
//! document, an unusable source, or a database failure abort the
//! attempt, and of those only the latter two are worth retrying.

use rusqlite::Connection;
use uuid::Uuid;

use super::explain::ExplanationGenerator;
use super::extraction::{self, ContentSource, ExtractionError, SourceError};
use super::extraction::fetch::{fetch_remote, FetchConfig};
use super::extraction::pdf::{extract_text, ExtractConfig};
use super::relevance;
use super::summarize::{Summarizer, SummaryOutcome};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::{Language, ProcessingStatus};
use crate::models::Summary;

/// Errors that abort a processing attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// The document does not exist; terminal, not worth retrying.
    #[error("document {0} not found")]
    NotFound(Uuid),

    /// No usable content source; retried by the job queue.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Persistence failure; retried by the job queue.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ProcessingError {
    /// Whether the job queue should retry after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}

/// Outcome counters for one processing run, for logging.
#[derive(Debug, Default)]
pub struct ProcessingReport {
    pub summaries_created: u32,
    pub fallbacks_recorded: u32,
    pub skipped: bool,
}

pub struct DocumentPipeline {
    fetch_config: FetchConfig,
    extract_config: ExtractConfig,
    summarizer: Summarizer,
    explainer: ExplanationGenerator,
}

impl DocumentPipeline {
    pub fn new(summarizer: Summarizer, explainer: ExplanationGenerator) -> Self {
        Self {
            fetch_config: FetchConfig::default(),
            extract_config: ExtractConfig::default(),
            summarizer,
            explainer,
        }
    }

    #[cfg(test)]
    pub fn with_fetch_config(mut self, fetch_config: FetchConfig) -> Self {
        self.fetch_config = fetch_config;
        self
    }

    /// Process one document: create the missing per-language summaries
    /// and mark the document's terminal state.
    ///
    /// Idempotent; a completed document is skipped outright, and the
    /// UNIQUE(document_id, language) constraint prevents duplicates
    /// even when two runs race.
    pub fn process(
        &self,
        conn: &Connection,
        document_id: Uuid,
    ) -> Result<ProcessingReport, ProcessingError> {
        let document = repository::get_document(conn, &document_id)?
            .ok_or(ProcessingError::NotFound(document_id))?;

        if document.processing_status != ProcessingStatus::Unprocessed {
            tracing::info!(
                document_id = %document_id,
                status = document.processing_status.as_str(),
                "Document already processed, skipping"
            );
            return Ok(ProcessingReport {
                skipped: true,
                ..ProcessingReport::default()
            });
        }

        tracing::info!(document_id = %document_id, title = %document.title, "Processing document");

        let source = extraction::resolve_source(&document)?;

        // Extraction and filtering are language-independent; run them
        // once and share the excerpt across languages. A failure here
        // is recorded per language as fallback content, never raised.
        let excerpt = match self.extract_content(&source) {
            Ok(text) => Some(relevance::filter_relevant(&text)),
            Err(e) => {
                tracing::error!(
                    document_id = %document_id,
                    error = %e,
                    "Extraction failed, recording fallback summaries"
                );
                None
            }
        };

        let region_name = repository::get_region(conn, &document.region_id)?.map(|r| r.name);

        let mut report = ProcessingReport::default();
        for language in Language::ALL {
            if repository::summary_exists(conn, &document.id, language)? {
                tracing::info!(
                    document_id = %document_id,
                    language = language.as_str(),
                    "Summary already exists, skipping language"
                );
                continue;
            }

            let outcome = match &excerpt {
                Some(text) => self.summarizer.summarize(&document.title, text, language),
                None => SummaryOutcome::fallback_for(&document.title),
            };
            if outcome.used_fallback {
                report.fallbacks_recorded += 1;
            }

            // Fallback text is a valid recorded outcome; persisted
            // exactly like a generated summary.
            let summary = Summary::new(document.id, language, outcome.text.clone(), excerpt.clone());
            let created = repository::insert_summary(conn, &summary)?;
            if !created {
                tracing::info!(
                    document_id = %document_id,
                    language = language.as_str(),
                    "Concurrent run created this summary first"
                );
                continue;
            }
            report.summaries_created += 1;

            // Placeholder summaries carry no real content to explain.
            if !outcome.used_fallback {
                let explanation = self.explainer.explain(&outcome.text, region_name.as_deref());
                if let Err(e) =
                    repository::update_summary_explanation(conn, &summary.id, &explanation)
                {
                    tracing::error!(
                        summary_id = %summary.id,
                        error = %e,
                        "Failed to persist explanation; summary remains without one"
                    );
                }
            }

            tracing::info!(
                document_id = %document_id,
                language = language.as_str(),
                fallback = outcome.used_fallback,
                "Created summary"
            );
        }

        let status = if report.fallbacks_recorded == 0 {
            ProcessingStatus::Processed
        } else {
            ProcessingStatus::ProcessedWithError
        };
        // Targeted status update; does not pass through the write path
        // that enqueues processing, so completion cannot re-trigger.
        repository::update_processing_status(conn, &document.id, status)?;

        tracing::info!(
            document_id = %document_id,
            status = status.as_str(),
            summaries = report.summaries_created,
            fallbacks = report.fallbacks_recorded,
            "Document processing complete"
        );
        Ok(report)
    }

    fn extract_content(&self, source: &ContentSource) -> Result<String, ExtractionError> {
        match source {
            ContentSource::Local(path) => extract_text(path, &self.extract_config),
            ContentSource::Remote(url) => {
                let temp = fetch_remote(url, &self.fetch_config)?;
                // `temp` drops at the end of this scope, deleting the
                // downloaded file on success and failure alike.
                extract_text(temp.path(), &self.extract_config)
            }
        }
    }
}
