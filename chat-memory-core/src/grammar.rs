//! Prompt templates and word-level comparison between a text and its
//! corrected version

use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;

/// Instruction handed to a model to obtain the corrected text
pub const CORRECTION_PROMPT: &str = "Give the user text: {user_input}\n\n\
Find any grammatical error and return the corrected version. \
Do not change the overall intent of the user's query, just correct any grammatical mistakes. \
If the user query does not have any grammatical error just return the text as it is.";

/// Fill the correction prompt with the user's text
pub fn correction_prompt(text: &str) -> String {
    CORRECTION_PROMPT.replace("{user_input}", text)
}

/// Instruction handed to a model to translate text
pub const TRANSLATION_PROMPT: &str = "Please translate the given text into {language} language\n\n\
{text}\n\n\
Please return only the translated language";

/// Fill the translation prompt with the text and the target language
pub fn translation_prompt(text: &str, language: &str) -> String {
    TRANSLATION_PROMPT
        .replace("{language}", language.trim())
        .replace("{text}", text)
}

/// Words of `original` that were removed or replaced in `corrected`, in order.
///
/// Uses a minimal word edit (Myers). When a correction reorders blocks of
/// words, the shorter run is the one reported as changed, even if a
/// longest-common-block diff would keep it and flag the longer run instead.
pub fn incorrect_words(original: &str, corrected: &str) -> Vec<String> {
    let old: Vec<&str> = original.split_whitespace().collect();
    let new: Vec<&str> = corrected.split_whitespace().collect();

    TextDiff::from_slices(&old, &new)
        .iter_all_changes()
        .filter(|change| change.tag() == ChangeTag::Delete)
        .map(|change| change.value().to_string())
        .collect()
}

/// Rejoin the words of `text` with single spaces, passing every word listed
/// in `words` through `mark`
pub fn highlight_words<F>(text: &str, words: &[String], mark: F) -> String
where
    F: Fn(&str) -> String,
{
    let flagged: HashSet<&str> = words.iter().map(String::as_str).collect();

    text.split_whitespace()
        .map(|word| {
            if flagged.contains(word) {
                mark(word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML marker underlining a word with a wavy red line
pub fn html_wavy_underline(word: &str) -> String {
    format!("<span style='text-decoration: underline wavy red;'>{}</span>", word)
}
