//! Orchestrator
//!
//! Pure coordination over the query cache and the external clients; owns no
//! persistent state of its own. The single-request path resolves one
//! bilingual answer through the cache; the batch path fans revision
//! questions out under a fixed concurrency cap and reassembles results in
//! input order.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::cache::{fingerprint, CachedValue, QueryCache, QueryMode};
use crate::clients::{
    AnswerGenerator, ChapterScope, PassageFilter, PassageRetriever, RetrievedPassage,
};
use crate::error::{Result, TutorError};
use crate::models::{BilingualAnswer, RevisionItem};
use crate::prompt::{self, SWAHILI_FALLBACK};
use crate::text;

// == Budgets ==
/// Passages fetched for a whole-chapter summary
const SUMMARY_DOC_BUDGET: usize = 200;
/// Candidate passages fetched when locating revision questions
const REVISION_DOC_BUDGET: usize = 300;
/// Passages fetched for one focused question
const QUESTION_DOC_BUDGET: usize = 4;
/// Token ceiling for the summary context block
const SUMMARY_TOKEN_BUDGET: usize = 10_000;
/// Passages shorter than this carry no usable summary content
const MIN_SUMMARY_PASSAGE_LEN: usize = 50;

/// Answer text for a batch item whose generation failed.
pub const ANSWER_UNAVAILABLE: &str =
    "Sorry, this answer could not be generated. Please try again.";

// == Coalescing ==
/// How long a coalescing waiter polls for another worker's result before
/// computing it itself.
const COALESCE_WAIT: Duration = Duration::from_secs(30);
const COALESCE_POLL: Duration = Duration::from_millis(500);

// == Orchestrator ==
/// Coordinates cache, retrieval, and generation for all three request modes.
pub struct Orchestrator {
    cache: Arc<RwLock<QueryCache>>,
    retriever: Arc<dyn PassageRetriever>,
    generator: Arc<dyn AnswerGenerator>,
    max_concurrent: usize,
}

impl Orchestrator {
    /// Creates an orchestrator over an injected cache and client pair.
    ///
    /// `max_concurrent` caps simultaneous in-flight generations during batch
    /// fan-out, independent of batch length.
    pub fn new(
        cache: Arc<RwLock<QueryCache>>,
        retriever: Arc<dyn PassageRetriever>,
        generator: Arc<dyn AnswerGenerator>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            cache,
            retriever,
            generator,
            max_concurrent: max_concurrent.max(1),
        }
    }

    // == Single-Request Path: Summarize ==
    /// Produces a bilingual summary of a chapter, cached by chapter id.
    pub async fn summarize_chapter(&self, chapter: &str) -> Result<BilingualAnswer> {
        let chapter = chapter.trim().to_string();
        let key = fingerprint(QueryMode::Summarize, &chapter);
        self.resolve_answer(&key, || self.compute_summary(&chapter))
            .await
    }

    // == Single-Request Path: Ask ==
    /// Answers a free-form question, cached by normalized question text.
    pub async fn answer_question(&self, question: &str) -> Result<BilingualAnswer> {
        let canonical = text::normalize_question(question);
        if canonical.is_empty() {
            return Err(TutorError::Validation(
                "Question contained no usable text".to_string(),
            ));
        }
        let key = fingerprint(QueryMode::Ask, &canonical);
        self.resolve_answer(&key, || self.compute_ask(&canonical))
            .await
    }

    // == Batch Path: Revision ==
    /// Answers every official revision question for a chapter.
    ///
    /// Results are ordered by original question position regardless of
    /// completion order. One failed sub-request degrades that item only;
    /// the batch is cached only when every item succeeded.
    pub async fn answer_revision_questions(&self, chapter: &str) -> Result<Vec<RevisionItem>> {
        let chapter = chapter.trim().to_string();
        let key = fingerprint(QueryMode::Revision, &chapter);

        if let Some(CachedValue::Revision(items)) = self.lookup(&key).await {
            return Ok(items);
        }
        if !self.begin_inflight(&key).await {
            if let Some(CachedValue::Revision(items)) = self.await_inflight(&key).await {
                return Ok(items);
            }
            debug!("coalesce wait for '{}' lapsed, computing locally", key);
            self.begin_inflight(&key).await;
        }

        match self.compute_revision_batch(&chapter).await {
            Ok((items, all_succeeded)) => {
                if all_succeeded {
                    self.store(&key, CachedValue::Revision(items.clone())).await;
                } else {
                    // Failed items must stay regenerable
                    self.end_inflight(&key).await;
                }
                Ok(items)
            }
            Err(err) => {
                self.end_inflight(&key).await;
                Err(err)
            }
        }
    }

    // == Shared Resolution ==
    /// Cache-through resolution for a single bilingual answer: hit returns
    /// immediately, concurrent identical misses coalesce, and only a
    /// successful computation is stored.
    async fn resolve_answer<F, Fut>(&self, key: &str, compute: F) -> Result<BilingualAnswer>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BilingualAnswer>>,
    {
        if let Some(CachedValue::Answer(answer)) = self.lookup(key).await {
            return Ok(answer);
        }
        if !self.begin_inflight(key).await {
            if let Some(CachedValue::Answer(answer)) = self.await_inflight(key).await {
                return Ok(answer);
            }
            debug!("coalesce wait for '{}' lapsed, computing locally", key);
            self.begin_inflight(key).await;
        }

        match compute().await {
            Ok(answer) => {
                // set() also releases the in-flight marker
                self.store(key, CachedValue::Answer(answer.clone())).await;
                Ok(answer)
            }
            Err(err) => {
                self.end_inflight(key).await;
                Err(err)
            }
        }
    }

    /// Polls for a result another worker is computing. Returns `None` once
    /// the marker lapses or the deadline passes; the caller then computes.
    async fn await_inflight(&self, key: &str) -> Option<CachedValue> {
        let deadline = tokio::time::Instant::now() + COALESCE_WAIT;
        loop {
            tokio::time::sleep(COALESCE_POLL).await;
            {
                let mut cache = self.cache.write().await;
                if let Some(value) = cache.get(key) {
                    return Some(value);
                }
                if !cache.is_inflight(key) {
                    return None;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
        }
    }

    // == Computation: Summary ==
    async fn compute_summary(&self, chapter: &str) -> Result<BilingualAnswer> {
        let filter = PassageFilter::content(ChapterScope::Variants(chapter.to_string()));
        let query = format!("content chapter {chapter}");
        let passages = self
            .retriever
            .search(&query, &filter, SUMMARY_DOC_BUDGET)
            .await?;

        let selected = select_summary_passages(passages);
        if selected.is_empty() {
            info!("no usable content for chapter {}, generating anyway", chapter);
        }

        let prompt_text = prompt::build_summary_prompt(chapter, &selected);
        let output = self.generator.generate(&prompt_text).await?;
        Ok(prompt::parse_bilingual(&output))
    }

    // == Computation: Ask ==
    async fn compute_ask(&self, question: &str) -> Result<BilingualAnswer> {
        let filter = PassageFilter::content(ChapterScope::Any);
        let passages = self
            .retriever
            .search(question, &filter, QUESTION_DOC_BUDGET)
            .await?;

        let prompt_text = prompt::build_answer_prompt("unknown", &passages, question);
        let output = self.generator.generate(&prompt_text).await?;
        Ok(prompt::parse_bilingual(&output))
    }

    // == Computation: Revision Batch ==
    /// Fetches the chapter's revision questions and answers them under the
    /// concurrency cap. Returns the ordered items plus whether every item
    /// succeeded.
    async fn compute_revision_batch(
        &self,
        chapter: &str,
    ) -> Result<(Vec<RevisionItem>, bool)> {
        let major = chapter.split('.').next().unwrap_or(chapter).to_string();

        // Revision questions conventionally live at chapter <major>.5;
        // fall back to prefix-filtering all revision passages.
        let exact = PassageFilter::revision(ChapterScope::Exact(format!("{major}.5")));
        let mut revision_docs = self
            .retriever
            .search("revision questions", &exact, REVISION_DOC_BUDGET)
            .await?;
        if revision_docs.is_empty() {
            let any = PassageFilter::revision(ChapterScope::Any);
            let all = self
                .retriever
                .search(&format!("chapter {major} questions"), &any, REVISION_DOC_BUDGET)
                .await?;
            let prefix = format!("{major}.");
            revision_docs = all
                .into_iter()
                .filter(|p| p.chapter_tag.starts_with(&prefix))
                .collect();
        }

        // Shared chapter content, used when per-question retrieval finds nothing
        let root = PassageFilter::content(ChapterScope::Root(major.clone()));
        let mut content_docs = self
            .retriever
            .search(&format!("content chapter_root {major}"), &root, REVISION_DOC_BUDGET)
            .await?;
        if content_docs.is_empty() {
            let variants = PassageFilter::content(ChapterScope::Variants(chapter.to_string()));
            content_docs = self
                .retriever
                .search(&format!("content chapter {chapter}"), &variants, SUMMARY_DOC_BUDGET)
                .await?;
        }

        let questions = prepare_questions(&revision_docs);
        info!(
            "chapter {}: {} revision questions after filtering",
            chapter,
            questions.len()
        );
        if questions.is_empty() {
            // A chapter without extractable questions is a valid, cacheable result
            return Ok((Vec::new(), true));
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let shared_docs = Arc::new(content_docs);
        let mut handles = Vec::with_capacity(questions.len());

        for (index, question) in questions.iter().enumerate() {
            let semaphore = semaphore.clone();
            let retriever = self.retriever.clone();
            let generator = self.generator.clone();
            let cache = self.cache.clone();
            let question = question.clone();
            let chapter = chapter.to_string();
            let shared_docs = shared_docs.clone();

            handles.push((
                index,
                tokio::spawn(async move {
                    // Hold one permit for the whole sub-request; excess
                    // questions wait for a slot rather than being rejected
                    let _permit = semaphore.acquire_owned().await.ok();
                    answer_single_question(
                        retriever,
                        generator,
                        cache,
                        question,
                        chapter,
                        shared_docs,
                    )
                    .await
                }),
            ));
        }

        // Reassemble by positional slot so input order survives any
        // completion order
        let mut slots: Vec<Option<(RevisionItem, bool)>> = Vec::with_capacity(questions.len());
        slots.resize_with(questions.len(), || None);
        for (index, handle) in handles {
            match handle.await {
                Ok(outcome) => slots[index] = Some(outcome),
                Err(err) => warn!("revision sub-task {} failed to join: {}", index, err),
            }
        }

        let mut all_succeeded = true;
        let items = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Some((item, succeeded)) => {
                    all_succeeded &= succeeded;
                    item
                }
                None => {
                    all_succeeded = false;
                    failed_item(&questions[index])
                }
            })
            .collect();

        Ok((items, all_succeeded))
    }

    // == Cache Helpers ==
    async fn lookup(&self, key: &str) -> Option<CachedValue> {
        self.cache.write().await.get(key)
    }

    async fn store(&self, key: &str, value: CachedValue) {
        self.cache.write().await.set(key, value);
    }

    async fn begin_inflight(&self, key: &str) -> bool {
        self.cache.write().await.begin_inflight(key)
    }

    async fn end_inflight(&self, key: &str) {
        self.cache.write().await.end_inflight(key);
    }
}

// == Sub-Request ==
/// Resolves one revision question: per-question cache check, focused
/// retrieval with shared-docs fallback, one bilingual generation, and the
/// Swahili question rendering. Never propagates an error; a failed
/// generation yields the fallback item so siblings are unaffected.
async fn answer_single_question(
    retriever: Arc<dyn PassageRetriever>,
    generator: Arc<dyn AnswerGenerator>,
    cache: Arc<RwLock<QueryCache>>,
    question: String,
    chapter: String,
    fallback_docs: Arc<Vec<RetrievedPassage>>,
) -> (RevisionItem, bool) {
    // Sub-answers share the ask| namespace, so a revision question already
    // answered via /ask hits the same entry
    let key = fingerprint(QueryMode::Ask, &question);
    let cached = { cache.write().await.get(&key) };

    let (answer, succeeded) = match cached {
        Some(CachedValue::Answer(answer)) => (answer, true),
        _ => {
            let filter = PassageFilter::content(ChapterScope::Any);
            let passages = match retriever
                .search(&question, &filter, QUESTION_DOC_BUDGET)
                .await
            {
                Ok(passages) if !passages.is_empty() => passages,
                _ => fallback_docs
                    .iter()
                    .take(QUESTION_DOC_BUDGET)
                    .cloned()
                    .collect(),
            };

            let prompt_text = prompt::build_answer_prompt(&chapter, &passages, &question);
            match generator.generate(&prompt_text).await {
                Ok(output) => {
                    let answer = prompt::parse_bilingual(&output);
                    cache
                        .write()
                        .await
                        .set(key, CachedValue::Answer(answer.clone()));
                    (answer, true)
                }
                Err(err) => {
                    warn!("generation failed for question '{}': {}", question, err);
                    (
                        BilingualAnswer::new(ANSWER_UNAVAILABLE, SWAHILI_FALLBACK),
                        false,
                    )
                }
            }
        }
    };

    // The question itself is also rendered in Swahili; the English text
    // stands in when translation fails
    let translation_prompt = prompt::build_translation_prompt(&question);
    let swahili_question = match generator.generate(&translation_prompt).await {
        Ok(translation) if !translation.trim().is_empty() => translation.trim().to_string(),
        _ => question.clone(),
    };

    (
        RevisionItem {
            question_text: question,
            swahili_question,
            answer,
        },
        succeeded,
    )
}

/// Builds the fallback item for a sub-task that could not be joined.
fn failed_item(question: &str) -> RevisionItem {
    RevisionItem {
        question_text: question.to_string(),
        swahili_question: question.to_string(),
        answer: BilingualAnswer::new(ANSWER_UNAVAILABLE, SWAHILI_FALLBACK),
    }
}

/// Normalizes extracted questions, drops residual noise, and deduplicates
/// while preserving order.
fn prepare_questions(revision_docs: &[RetrievedPassage]) -> Vec<String> {
    let raw = text::extract_revision_questions(revision_docs);
    let mut seen = HashSet::new();
    let mut questions = Vec::new();

    for question in raw {
        let question = text::normalize_question(&question);
        if question.len() < 6 {
            continue;
        }
        let lower = question.to_lowercase();
        if lower.starts_with("index") || lower.starts_with("chapter") || lower.starts_with("--- page")
        {
            continue;
        }
        if seen.insert(question.clone()) {
            questions.push(question);
        }
    }

    questions
}

/// Keeps the longest substantive passages that fit the summary token budget.
fn select_summary_passages(passages: Vec<RetrievedPassage>) -> Vec<RetrievedPassage> {
    let mut cleaned: Vec<RetrievedPassage> = passages
        .into_iter()
        .filter(|p| p.text.trim().len() > MIN_SUMMARY_PASSAGE_LEN)
        .collect();
    cleaned.sort_by(|a, b| b.text.len().cmp(&a.text.len()));

    let mut selected = Vec::new();
    let mut token_total = 0;
    for passage in cleaned {
        let tokens = text::estimate_tokens(&passage.text);
        if token_total + tokens > SUMMARY_TOKEN_BUDGET {
            break;
        }
        token_total += tokens;
        selected.push(passage);
    }
    selected
}
