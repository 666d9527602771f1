//! Tabular evidence ingest.
//!
//! Evidence files carry one observed 0–4 score per row. Only column presence
//! and numeric parsing are validated here; ranges are checked on the emitted
//! snapshots instead.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    #[error("failed to open evidence file '{source_name}': {source}")]
    Io {
        source_name: String,
        source: std::io::Error,
    },
    #[error("invalid CSV data in '{source_name}': {source}")]
    Csv {
        source_name: String,
        source: csv::Error,
    },
    #[error("evidence file '{source_name}' is missing columns: {}", missing.join(", "))]
    Schema {
        source_name: String,
        missing: Vec<String>,
    },
    #[error("evidence file '{source_name}' line {line}: column '{column}' value '{value}' is not a number")]
    Data {
        source_name: String,
        line: u64,
        column: String,
        value: String,
    },
}

/// Column layout expected from an evidence file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceSchema {
    pub key_column: &'static str,
    pub group_column: Option<&'static str>,
    pub score_column: &'static str,
}

impl EvidenceSchema {
    /// Module evidence: one row per component observation.
    pub const COMPONENTS: Self = Self {
        key_column: "component_code",
        group_column: None,
        score_column: "score_0_4",
    };

    /// Index evidence: indicator observations tagged with their pillar.
    pub const INDICATORS: Self = Self {
        key_column: "indicator_id",
        group_column: Some("pillar"),
        score_column: "score_0_4",
    };

    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![self.key_column];
        columns.extend(self.group_column);
        columns.push(self.score_column);
        columns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRow {
    pub key: String,
    pub group: Option<String>,
    pub value: f64,
}

pub fn load_path<P: AsRef<Path>>(
    path: P,
    schema: EvidenceSchema,
) -> Result<Vec<EvidenceRow>, EvidenceError> {
    let path = path.as_ref();
    let source_name = path.display().to_string();
    let file = File::open(path).map_err(|source| EvidenceError::Io {
        source_name: source_name.clone(),
        source,
    })?;
    load_reader(file, &source_name, schema)
}

pub fn load_reader<R: Read>(
    reader: R,
    source_name: &str,
    schema: EvidenceSchema,
) -> Result<Vec<EvidenceRow>, EvidenceError> {
    let csv_error = |source| EvidenceError::Csv {
        source_name: source_name.to_string(),
        source,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers().map_err(csv_error)?.clone();
    let position = |column: &str| headers.iter().position(|header| header == column);

    let missing: Vec<String> = schema
        .required_columns()
        .into_iter()
        .filter(|column| position(column).is_none())
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(EvidenceError::Schema {
            source_name: source_name.to_string(),
            missing,
        });
    }

    // Presence was checked above.
    let key_idx = position(schema.key_column).unwrap_or_default();
    let score_idx = position(schema.score_column).unwrap_or_default();
    let group_idx = schema.group_column.and_then(position);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(index as u64 + 2);

        let key = record.get(key_idx).unwrap_or_default();
        if key.is_empty() {
            debug!(source = source_name, line, "skipping evidence row without identifier");
            continue;
        }

        let raw_score = record.get(score_idx).unwrap_or_default();
        let value = parse_score(raw_score).ok_or_else(|| EvidenceError::Data {
            source_name: source_name.to_string(),
            line,
            column: schema.score_column.to_string(),
            value: raw_score.to_string(),
        })?;

        let group = group_idx
            .and_then(|idx| record.get(idx))
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        rows.push(EvidenceRow {
            key: key.to_string(),
            group,
            value,
        });
    }

    Ok(rows)
}

fn parse_score(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_rows_and_ignores_extra_columns() {
        let csv = "id,component_code,score_0_4,note\n1,A,2,first\n2,A,4,second\n3,B,1.5,\n";
        let rows = load_reader(csv.as_bytes(), "inline", EvidenceSchema::COMPONENTS)
            .expect("evidence loads");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].key, "A");
        assert_eq!(rows[2].value, 1.5);
        assert!(rows.iter().all(|row| row.group.is_none()));
    }

    #[test]
    fn schema_error_names_every_missing_column() {
        let csv = "indicator_id,value\nI1,2\n";
        let err = load_reader(csv.as_bytes(), "inline", EvidenceSchema::INDICATORS)
            .expect_err("columns missing");

        match err {
            EvidenceError::Schema { missing, .. } => {
                assert_eq!(missing, vec!["pillar".to_string(), "score_0_4".to_string()]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_score_is_a_data_error() {
        let csv = "component_code,score_0_4\nA,2\nB,high\n";
        let err = load_reader(csv.as_bytes(), "inline", EvidenceSchema::COMPONENTS)
            .expect_err("bad number");

        match err {
            EvidenceError::Data {
                line,
                column,
                value,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, "score_0_4");
                assert_eq!(value, "high");
            }
            other => panic!("expected data error, got {other:?}"),
        }
    }

    #[test]
    fn empty_and_non_finite_scores_are_rejected() {
        for csv in [
            "component_code,score_0_4\nA,\n",
            "component_code,score_0_4\nA,NaN\n",
            "component_code,score_0_4\nA,inf\n",
        ] {
            let err = load_reader(csv.as_bytes(), "inline", EvidenceSchema::COMPONENTS)
                .expect_err("not a usable score");
            assert!(matches!(err, EvidenceError::Data { .. }), "{csv}");
        }
    }

    #[test]
    fn captures_pillar_tag_for_indicators() {
        let csv = "indicator_id,pillar,score_0_4\nI1, S ,3\nI2,,1\n";
        let rows = load_reader(csv.as_bytes(), "inline", EvidenceSchema::INDICATORS)
            .expect("evidence loads");

        assert_eq!(rows[0].group.as_deref(), Some("S"));
        assert_eq!(rows[1].group, None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_path("./does-not-exist.csv", EvidenceSchema::COMPONENTS)
            .expect_err("file missing");
        assert!(matches!(err, EvidenceError::Io { .. }));
    }
}
