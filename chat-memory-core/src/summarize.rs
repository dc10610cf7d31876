//! Chunked map-reduce summarization of long documents
//!
//! Lengths are measured in whitespace-delimited words, which stand in for
//! model tokens closely enough to size prompts.

use crate::config::SummarizerConfig;
use crate::conversation::ChatModel;
use crate::session::{ChatMessage, Role};
use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

const MAP_PROMPT: &str = "The following is a set of documents:\n{docs}\n\
Based on this list of docs, please summarize the document\nHelpful Answer:";

const REDUCE_PROMPT: &str = "The following is a set of documents:\n{docs}\n\
Based on this list of docs, please summarize the document\nHelpful Answer:";

/// Length of `text` in words
pub fn word_len(text: &str) -> usize {
    text.split_whitespace().count()
}

fn total_len(texts: &[String]) -> usize {
    texts.iter().map(|t| word_len(t)).sum()
}

/// Splits text on a separator and merges the pieces into bounded chunks
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separator: String,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> crate::Result<Self> {
        if chunk_size == 0 {
            return Err(crate::Error::Validation(
                "chunk_size must be > 0".to_string(),
            ));
        }
        if chunk_overlap > chunk_size {
            return Err(crate::Error::Validation(format!(
                "chunk_overlap ({}) must not exceed chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separator: "\n\n".to_string(),
        })
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = text
            .split(self.separator.as_str())
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .collect();
        self.merge(&pieces)
    }

    /// Greedily pack pieces into chunks, carrying up to `chunk_overlap`
    /// words of trailing pieces into the next chunk
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<(&str, usize)> = Vec::new();
        let mut total = 0;

        for &piece in pieces {
            let len = word_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if total > self.chunk_size {
                    warn!(
                        chunk_len = total,
                        chunk_size = self.chunk_size,
                        "Created a chunk longer than the configured size"
                    );
                }
                chunks.push(self.join(&current));

                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    let (_, dropped) = current.remove(0);
                    total -= dropped;
                }
            }

            current.push((piece, len));
            total += len;
        }

        if !current.is_empty() {
            if total > self.chunk_size {
                warn!(
                    chunk_len = total,
                    chunk_size = self.chunk_size,
                    "Created a chunk longer than the configured size"
                );
            }
            chunks.push(self.join(&current));
        }

        chunks
    }

    fn join(&self, pieces: &[(&str, usize)]) -> String {
        pieces
            .iter()
            .map(|(piece, _)| *piece)
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

/// Summarizes long text by summarizing chunks, then combining the summaries
pub struct Summarizer<M: ChatModel> {
    model: M,
    splitter: TextSplitter,
    token_max: usize,
}

impl<M: ChatModel> Summarizer<M> {
    pub fn new(model: M, config: &SummarizerConfig) -> crate::Result<Self> {
        if config.token_max == 0 {
            return Err(crate::Error::Validation(
                "token_max must be > 0".to_string(),
            ));
        }
        Ok(Self {
            model,
            splitter: TextSplitter::new(config.chunk_size, config.chunk_overlap)?,
            token_max: config.token_max,
        })
    }

    async fn ask(&self, template: &str, docs: &str) -> crate::Result<String> {
        let prompt = template.replace("{docs}", docs);
        self.model
            .complete(vec![ChatMessage::new(Role::User, prompt, Utc::now())])
            .await
    }

    async fn reduce(&self, summaries: &[String]) -> crate::Result<String> {
        self.ask(REDUCE_PROMPT, &summaries.join("\n\n")).await
    }

    /// Group summaries into batches whose combined length stays within `token_max`
    fn batches<'a>(&self, summaries: &'a [String]) -> Vec<&'a [String]> {
        let mut batches = Vec::new();
        let mut start = 0;
        let mut total = 0;

        for (i, summary) in summaries.iter().enumerate() {
            let len = word_len(summary);
            if i > start && total + len > self.token_max {
                batches.push(&summaries[start..i]);
                start = i;
                total = 0;
            }
            total += len;
        }
        if start < summaries.len() {
            batches.push(&summaries[start..]);
        }

        batches
    }

    pub async fn summarize(&self, text: &str) -> crate::Result<String> {
        let chunks = self.splitter.split(text);
        if chunks.is_empty() {
            return Err(crate::Error::Validation(
                "nothing to summarize".to_string(),
            ));
        }
        info!(chunks = chunks.len(), "Summarizing document");

        let mut summaries =
            try_join_all(chunks.iter().map(|chunk| self.ask(MAP_PROMPT, chunk))).await?;

        while summaries.len() > 1 && total_len(&summaries) > self.token_max {
            let batches = self.batches(&summaries);
            if batches.len() == summaries.len() {
                // Every summary alone exceeds the budget; collapsing cannot shrink further
                warn!(token_max = self.token_max, "Partial summaries exceed token_max");
                break;
            }
            debug!(batches = batches.len(), "Collapsing partial summaries");
            summaries = try_join_all(batches.into_iter().map(|batch| self.reduce(batch))).await?;
        }

        self.reduce(&summaries).await
    }
}
