use serde::Serialize;

use crate::model::{EntityMap, KeywordSet, SectionMap, TableGrid};

/// Raw text of a document and the path that produced it.
///
/// `used_ocr` is only ever set when native extraction produced no
/// non-whitespace text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub raw_text: String,
    pub used_ocr: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
}

/// The terminal artifact of a successful analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub status: ReportStatus,
    pub filename: String,
    #[serde(rename = "usedOCR")]
    pub used_ocr: bool,
    pub language: String,
    pub keywords: KeywordSet,
    pub entities: EntityMap,
    pub sections: SectionMap,
    pub tables: Vec<TableGrid>,
    pub text: String,
}
