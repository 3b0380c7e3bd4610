//! Prompt Templates and Bilingual Parsing
//!
//! Assembles generation prompts from retrieved passages and parses the
//! model's ENGLISH:/SWAHILI: output into the fixed bilingual shape. Loosely
//! typed generation output is coerced here, at the boundary, and never flows
//! deeper into the orchestrator.

use serde_json::Value;

use crate::clients::RetrievedPassage;
use crate::models::BilingualAnswer;

// == Public Constants ==
/// Substituted whenever a Swahili variant cannot be produced.
pub const SWAHILI_FALLBACK: &str = "(Swahili version not available)";

/// Context line used when retrieval found nothing; generation still runs and
/// the English answer communicates the lack of findable content.
const NO_CONTEXT_SIGNAL: &str =
    "No matching textbook content was found for this request. Say so, and answer only from general curriculum knowledge if you safely can.";

// == Prompt Builders ==
/// Joins passage texts into the prompt context block, or the explicit
/// no-context signal when retrieval came back empty.
fn context_block(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return NO_CONTEXT_SIGNAL.to_string();
    }
    passages
        .iter()
        .map(|p| p.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Bilingual question-answering prompt over retrieved textbook excerpts.
pub fn build_answer_prompt(
    chapter: &str,
    passages: &[RetrievedPassage],
    question: &str,
) -> String {
    format!(
        "You are a helpful, curriculum-aligned Biology tutor for Form 1 students in Kenya.\n\
         \n\
         Using the following textbook excerpts, answer the question clearly and completely in BOTH English AND Swahili.\n\
         \n\
         Chapter: {chapter}\n\
         Textbook Content:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         ---\n\
         \n\
         IMPORTANT: You MUST provide your answer in BOTH languages:\n\
         \n\
         1. First, write a clear, complete answer in English.\n\
         2. Then, write the SAME answer in Swahili (a direct translation or explanation in Swahili).\n\
         \n\
         Format your response EXACTLY as follows:\n\
         \n\
         ENGLISH:\n\
         [your complete English answer here]\n\
         \n\
         SWAHILI:\n\
         [your complete Swahili answer here]",
        chapter = chapter,
        context = context_block(passages),
        question = question,
    )
}

/// Bilingual chapter-summary prompt.
pub fn build_summary_prompt(chapter: &str, passages: &[RetrievedPassage]) -> String {
    format!(
        "You are a helpful, curriculum-aligned Biology tutor for Form 1 students in Kenya.\n\
         \n\
         Your task is to write a complete and helpful revision summary of the chapter below.\n\
         \n\
         You MUST provide the summary in BOTH English AND Swahili.\n\
         \n\
         The summary should include:\n\
         - Clear definitions of important terms (e.g. osmosis, digestion, vitamins)\n\
         - Descriptions of processes, procedures, or stages (e.g. how digestion works)\n\
         - Examples of items, functions, or outcomes\n\
         - Lists of key components (e.g. nutrients, vitamins, organs)\n\
         - Mentions of diagrams, apparatus, or activities\n\
         - Functions or roles of major parts or systems\n\
         \n\
         Be as detailed and helpful as possible.\n\
         \n\
         Chapter: {chapter}\n\
         Textbook Content:\n\
         {context}\n\
         \n\
         ---\n\
         \n\
         IMPORTANT: You MUST provide the summary in BOTH languages:\n\
         \n\
         1. First, write a detailed, comprehensive summary in English.\n\
         2. Then, write the SAME summary in Swahili (a complete translation/explanation in Swahili).\n\
         \n\
         Format your response EXACTLY as follows:\n\
         \n\
         ENGLISH:\n\
         [your detailed English summary here - multiple paragraphs if needed]\n\
         \n\
         SWAHILI:\n\
         [your detailed Swahili summary here - multiple paragraphs if needed]",
        chapter = chapter,
        context = context_block(passages),
    )
}

/// Question-translation prompt; the reply must be the bare Swahili text.
pub fn build_translation_prompt(question: &str) -> String {
    format!(
        "You are a translator. Translate the following English question to Swahili. \
         Return ONLY the Swahili translation, nothing else.\n\
         \n\
         {question}"
    )
}

// == Bilingual Parsing ==
/// Coerces raw generation output into the bilingual answer shape.
///
/// Tries the explicit ENGLISH:/SWAHILI: label format first, then a JSON
/// object with `english`/`swahili` fields. Anything else is treated as an
/// English-only answer with [`SWAHILI_FALLBACK`] substituted, so the caller
/// always gets both fields.
pub fn parse_bilingual(output: &str) -> BilingualAnswer {
    let text = output.trim();

    if text.contains("ENGLISH:") && text.contains("SWAHILI:") {
        if let Some((head, tail)) = text.split_once("SWAHILI:") {
            let english = head.replace("ENGLISH:", "").trim().to_string();
            let swahili = tail.trim().to_string();
            return BilingualAnswer {
                english,
                swahili: non_empty_or_fallback(swahili),
            };
        }
    }

    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(text) {
        if let (Some(english), Some(swahili)) = (
            obj.get("english").and_then(Value::as_str),
            obj.get("swahili").and_then(Value::as_str),
        ) {
            return BilingualAnswer {
                english: english.trim().to_string(),
                swahili: non_empty_or_fallback(swahili.trim().to_string()),
            };
        }
    }

    BilingualAnswer {
        english: text.to_string(),
        swahili: SWAHILI_FALLBACK.to_string(),
    }
}

fn non_empty_or_fallback(swahili: String) -> String {
    if swahili.is_empty() {
        SWAHILI_FALLBACK.to_string()
    } else {
        swahili
    }
}
