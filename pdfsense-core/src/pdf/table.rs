//! Stream-mode table detection: tables are found from the alignment of
//! positioned text alone, without ruling lines.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    ops::Range,
};

use tracing::*;

use crate::{error::PdfsenseError, model::TableGrid};

/// A run of text with its position on the page, in PDF points.
///
/// `y` grows upwards, as in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridDetectorConfig {
    pub min_rows: usize,
    pub min_columns: usize,
    /// More columns than this is word-level splitting, not a table
    pub max_columns: usize,
    /// Spans whose baselines differ by less than `height * factor` share a row
    pub row_tolerance_factor: f32,
    /// Share of a row's spans that must start on a column edge
    pub min_alignment_ratio: f32,
    /// Column edges closer than this are merged
    pub min_column_gap: f32,
    /// Left edges are bucketed at this granularity
    pub edge_bucket: f32,
}

impl Default for GridDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            row_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            edge_bucket: 5.0,
        }
    }
}

impl GridDetectorConfig {
    pub fn validate(&self) -> Result<(), PdfsenseError> {
        let message = if self.min_rows == 0 || self.min_columns == 0 {
            "grid needs at least one row and one column"
        } else if self.max_columns < self.min_columns {
            "max columns is below min columns"
        } else if self.edge_bucket <= 0.0 || self.row_tolerance_factor < 0.0 {
            "edge bucket must be positive"
        } else {
            return Ok(());
        };

        Err(PdfsenseError::InvalidConfig {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
struct Row {
    spans: Vec<TextSpan>,
}

impl Row {
    fn leftmost(&self) -> Option<&TextSpan> {
        self.spans.first()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GridDetector {
    config: GridDetectorConfig,
}

impl GridDetector {
    pub fn new(config: GridDetectorConfig) -> Result<Self, PdfsenseError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Tables on one page, top to bottom.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<TableGrid> {
        let rows = self.group_rows(spans);
        if rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let edges = self.column_edges(&rows);
        if edges.len() < self.config.min_columns {
            return Vec::new();
        }

        let mut tables = Vec::new();
        for run in self.aligned_runs(&rows, &edges) {
            let rows = &rows[run];
            // edges of the whole page may be polluted by body text
            let edges = self.column_edges(rows);

            if edges.is_empty() || edges.len() < self.config.min_columns {
                continue;
            }
            if edges.len() > self.config.max_columns {
                debug!("Skip region with {} columns", edges.len());
                continue;
            }
            if self.is_list(rows, &edges) {
                debug!("Skip region that reads as a list");
                continue;
            }

            tables.push(self.to_grid(rows, &edges));
        }

        tables
    }

    fn group_rows(&self, spans: &[TextSpan]) -> Vec<Row> {
        let mut sorted: Vec<&TextSpan> = spans
            .iter()
            .filter(|span| !span.text.trim().is_empty())
            .collect();
        sorted.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        });

        let mut rows: Vec<Row> = Vec::new();
        let mut baseline: Option<f32> = None;
        for span in sorted {
            let tolerance = span.height.max(1.0) * self.config.row_tolerance_factor;
            match (baseline, rows.last_mut()) {
                (Some(y), Some(row)) if (span.y - y).abs() <= tolerance => {
                    row.spans.push(span.clone());
                }
                _ => {
                    baseline = Some(span.y);
                    rows.push(Row {
                        spans: vec![span.clone()],
                    });
                }
            }
        }

        for row in rows.iter_mut() {
            row.spans
                .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        }
        rows
    }

    /// Left edges shared by enough rows, merged when closer than the column gap.
    fn column_edges(&self, rows: &[Row]) -> Vec<f32> {
        let multi: Vec<&Row> = rows.iter().filter(|row| row.spans.len() >= 2).collect();
        let candidates: Vec<&Row> = if multi.len() >= self.config.min_rows {
            multi
        } else {
            rows.iter().collect()
        };

        let mut counts: HashMap<i32, usize> = HashMap::new();
        for row in &candidates {
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|span| (span.x / self.config.edge_bucket).round() as i32)
                .collect();
            for bucket in buckets {
                *counts.entry(bucket).or_default() += 1;
            }
        }

        let min_hits =
            ((candidates.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);
        let mut edges: Vec<f32> = counts
            .into_iter()
            .filter(|(_, hits)| *hits >= min_hits)
            .map(|(bucket, _)| bucket as f32 * self.config.edge_bucket)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    fn alignment(&self, row: &Row, edges: &[f32]) -> f32 {
        if row.spans.is_empty() {
            return 0.0;
        }
        let aligned = row
            .spans
            .iter()
            .filter(|span| {
                edges
                    .iter()
                    .any(|edge| (span.x - edge).abs() <= self.config.edge_bucket)
            })
            .count();
        aligned as f32 / row.spans.len() as f32
    }

    /// Maximal runs of consecutive well-aligned rows that are long enough.
    fn aligned_runs(&self, rows: &[Row], edges: &[f32]) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start = None;

        for (idx, row) in rows.iter().enumerate() {
            let aligned = row.spans.len() >= 2
                && self.alignment(row, edges) >= self.config.min_alignment_ratio;
            match (aligned, start) {
                (true, None) => start = Some(idx),
                (false, Some(begin)) => {
                    if idx - begin >= self.config.min_rows {
                        runs.push(begin..idx);
                    }
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(begin) = start {
            if rows.len() - begin >= self.config.min_rows {
                runs.push(begin..rows.len());
            }
        }

        runs
    }

    fn is_list(&self, rows: &[Row], edges: &[f32]) -> bool {
        let (bullets, numbers) = rows
            .iter()
            .filter_map(Row::leftmost)
            .fold((0usize, 0usize), |(bullets, numbers), span| {
                let text = span.text.trim();
                if is_bullet(text) {
                    (bullets + 1, numbers)
                } else if is_enumerator(text) {
                    (bullets, numbers + 1)
                } else {
                    (bullets, numbers)
                }
            });

        let total = rows.len() as f32;
        bullets as f32 / total >= 0.5
            || (edges.len() == 2 && (bullets + numbers) as f32 / total >= 0.5)
    }

    fn column_of(&self, x: f32, edges: &[f32]) -> usize {
        edges
            .iter()
            .rposition(|edge| x >= edge - self.config.edge_bucket * 2.0)
            .unwrap_or(0)
    }

    fn to_grid(&self, rows: &[Row], edges: &[f32]) -> TableGrid {
        let rows = rows
            .iter()
            .map(|row| {
                let mut cells = vec![String::new(); edges.len()];
                for span in &row.spans {
                    let cell = &mut cells[self.column_of(span.x, edges)];
                    if !cell.is_empty() {
                        cell.push(' ');
                    }
                    cell.push_str(span.text.trim());
                }
                cells
            })
            .collect();

        TableGrid::new(rows)
    }
}

fn is_bullet(text: &str) -> bool {
    matches!(
        text,
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// `1.`, `12)`, `7`, `a.` and the like.
fn is_enumerator(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return false;
    }

    let digits = compact.chars().take_while(char::is_ascii_digit).count();
    let rest = &compact[digits..];
    if digits > 0 && matches!(rest, "" | "." | ")") {
        return true;
    }

    let mut chars = compact.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text, x, y, text.len() as f32 * 6.0, 12.0)
    }

    fn price_list() -> Vec<TextSpan> {
        vec![
            span("Item", 50.0, 700.0),
            span("Qty", 200.0, 700.0),
            span("Price", 300.0, 700.0),
            span("Cable", 50.0, 685.0),
            span("10", 200.0, 685.0),
            span("$20", 300.0, 685.0),
            span("Switch", 50.0, 670.0),
            span("2", 200.0, 670.0),
            span("$5", 300.0, 670.0),
        ]
    }

    #[test]
    fn test_detect_simple_grid() {
        let tables = GridDetector::default().detect(&price_list());

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(0, 0), Some("Item"));
        assert_eq!(table.cell(1, 2), Some("$20"));
        assert_eq!(table.cell(2, 0), Some("Switch"));
    }

    #[test]
    fn test_rows_tolerate_baseline_jitter() {
        let mut spans = price_list();
        spans[1].y += 2.0;
        spans[5].y -= 1.5;

        let tables = GridDetector::default().detect(&spans);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].row_count(), 3);
    }

    #[test]
    fn test_prose_has_no_tables() {
        let spans = vec![
            span("The cable shall be rated for outdoor use.", 50.0, 700.0),
            span("Voltage drop must stay below three percent.", 50.0, 685.0),
            span("Installers must be certified.", 50.0, 670.0),
        ];
        assert!(GridDetector::default().detect(&spans).is_empty());
        assert!(GridDetector::default().detect(&[]).is_empty());
    }

    #[test]
    fn test_numbered_list_is_not_a_table() {
        let spans = vec![
            span("1.", 50.0, 700.0),
            span("Scope of supply", 80.0, 700.0),
            span("2.", 50.0, 685.0),
            span("Delivery terms", 80.0, 685.0),
            span("3.", 50.0, 670.0),
            span("Warranty", 80.0, 670.0),
        ];
        assert!(GridDetector::default().detect(&spans).is_empty());
    }

    #[test]
    fn test_too_many_columns_rejected() {
        let spans: Vec<TextSpan> = (0..2)
            .flat_map(|row| {
                (0..8).map(move |col| span("w", 50.0 + col as f32 * 40.0, 700.0 - row as f32 * 15.0))
            })
            .collect();
        assert!(GridDetector::default().detect(&spans).is_empty());
    }

    #[test]
    fn test_degenerate_config_rejected() {
        let config = GridDetectorConfig {
            min_columns: 0,
            min_alignment_ratio: 0.0,
            ..GridDetectorConfig::default()
        };
        assert!(matches!(
            GridDetector::new(config),
            Err(PdfsenseError::InvalidConfig { .. })
        ));

        let config = GridDetectorConfig {
            max_columns: 1,
            ..GridDetectorConfig::default()
        };
        assert!(GridDetector::new(config).is_err());
        assert!(GridDetector::new(GridDetectorConfig::default()).is_ok());
    }

    #[test]
    fn test_rows_without_shared_edges_yield_no_grid() {
        // every span starts at its own x, so no edge gathers two hits
        let detector = GridDetector {
            config: GridDetectorConfig {
                min_columns: 0,
                min_alignment_ratio: 0.0,
                ..GridDetectorConfig::default()
            },
        };
        let spans = vec![
            span("Cable", 50.0, 700.0),
            span("rated", 130.0, 700.0),
            span("Wire", 210.0, 685.0),
            span("gauge", 290.0, 685.0),
        ];

        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_enumerator_markers() {
        assert!(is_enumerator("1."));
        assert!(is_enumerator("12)"));
        assert!(is_enumerator("7"));
        assert!(is_enumerator("a."));
        assert!(!is_enumerator("Cable"));
        assert!(!is_enumerator("1.5m"));
        assert!(is_bullet("•"));
        assert!(!is_bullet("Qty"));
    }
}
