use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use snafu::ResultExt;
use tracing::*;

use crate::{
    capability::EntityTagger,
    error::{PatternSnafu, PdfsenseError},
    model::TaggedSpan,
    nlp::labels::EntityLabel,
};

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec";

const UNITS: &str = "mm|cm|km|m|kg|mg|g|kV|mV|V|mA|A|kW|MW|W|kHz|MHz|GHz|Hz|Ω|ohms?|°C|°F|meters?|metres?|volts?|amps?|watts?|feet|ft|inches|lbs?|tons?";

const ORG_SUFFIXES: &str = "Inc|Ltd|LLC|Corp|Corporation|Company|Co|GmbH|AG|PLC|Group|Limited";

static SHARED: OnceCell<Arc<RuleTagger>> = OnceCell::new();

fn pattern(label: EntityLabel) -> String {
    match label {
        EntityLabel::Money => r"[$€£]\s?\d+(?:,\d{3})*(?:\.\d+)?(?:\s?(?:million|billion|thousand))?|\b\d+(?:,\d{3})*(?:\.\d+)?\s?(?:USD|EUR|GBP|dollars|euros|pounds)\b".to_string(),
        EntityLabel::Percent => r"\b\d+(?:\.\d+)?\s?(?:%|percent\b)".to_string(),
        EntityLabel::Date => format!(
            r"\b(?:\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}[/.]\d{{1,2}}[/.]\d{{2,4}}|(?:{MONTHS})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}|\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{MONTHS})\s+\d{{4}})\b"
        ),
        EntityLabel::Quantity => format!(r"\b\d+(?:\.\d+)?\s?(?:{UNITS})(?:\b|$)"),
        EntityLabel::Org => format!(r"\b(?:[A-Z][\w&]*\s+){{1,4}}(?:{ORG_SUFFIXES})\b\.?"),
        EntityLabel::Cardinal => r"\b\d+(?:,\d{3})*(?:\.\d+)?\b".to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    label: EntityLabel,
}

/// Pattern-based entity tagger.
///
/// Every label's pattern runs over the whole text; overlapping candidates are
/// resolved leftmost-longest, ties going to the label with the higher
/// priority. Spans come back in text order.
#[derive(Debug)]
pub struct RuleTagger {
    patterns: Vec<(EntityLabel, Regex)>,
}

impl RuleTagger {
    pub fn new() -> Result<Self, PdfsenseError> {
        let patterns = EntityLabel::ALL
            .iter()
            .map(|label| {
                Regex::new(&pattern(*label))
                    .context(PatternSnafu { stage: label.name() })
                    .map(|regex| (*label, regex))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Process-wide tagger, compiled on first use.
    pub fn shared() -> Result<Arc<Self>, PdfsenseError> {
        SHARED
            .get_or_try_init(|| {
                info!("Compiling entity patterns");
                Self::new().map(Arc::new)
            })
            .cloned()
    }

    fn candidates(&self, text: &str) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .patterns
            .iter()
            .flat_map(|(label, regex)| {
                regex.find_iter(text).map(|m| Candidate {
                    start: m.start(),
                    end: m.end(),
                    label: *label,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.label.priority().cmp(&b.label.priority()))
        });
        candidates
    }
}

impl EntityTagger for RuleTagger {
    fn tag(&self, text: &str) -> Result<Vec<TaggedSpan>, PdfsenseError> {
        let mut spans = Vec::new();
        let mut cursor = 0;

        for candidate in self.candidates(text) {
            if candidate.start < cursor {
                continue;
            }
            let span = text[candidate.start..candidate.end].trim_end();
            if span.is_empty() {
                continue;
            }
            spans.push(TaggedSpan::new(span, candidate.label.name()));
            cursor = candidate.end;
        }

        debug!("Tagged {} spans", spans.len());
        Ok(spans)
    }
}
