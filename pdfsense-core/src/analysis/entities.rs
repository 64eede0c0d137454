use std::sync::Arc;

use tracing::*;

use crate::{capability::EntityTagger, error::PdfsenseError, model::EntityMap};

/// Groups tagger output by label.
///
/// Only the first `char_limit` characters are tagged. Labels keep the order in
/// which they were first seen, entity texts keep discovery order and
/// duplicates. Nothing is filtered.
#[derive(Clone)]
pub struct EntityExtractor {
    tagger: Arc<dyn EntityTagger>,
    char_limit: usize,
}

impl EntityExtractor {
    pub fn new(tagger: Arc<dyn EntityTagger>, char_limit: usize) -> Self {
        Self { tagger, char_limit }
    }

    pub fn extract(&self, text: &str) -> Result<EntityMap, PdfsenseError> {
        let head = truncate_chars(text, self.char_limit);
        debug!(
            "Tagging {} of {} characters",
            head.chars().count(),
            text.chars().count()
        );

        let spans = self.tagger.tag(head)?;

        let mut entities = EntityMap::new();
        for span in spans {
            entities
                .entry_or_insert_with(&span.label, Vec::new)
                .push(span.text);
        }

        Ok(entities)
    }
}

/// Longest prefix of `text` holding at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
