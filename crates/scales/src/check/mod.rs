//! Sanity checks for emitted snapshots.
//!
//! Snapshots are read as loose JSON rather than typed views so that a file
//! with a wrong field type is reported instead of rejected wholesale.
//! Problems that make a snapshot unpublishable are errors; gaps that only
//! leave it incomplete are warnings.

use crate::config::{PathsConfig, ScalesConfig};
use crate::engine::BandTable;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: CheckReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Ledger entries inspected before the rest of a large file is skipped.
const LEDGER_CHECK_LIMIT: usize = 100;

const LEDGER_FIELDS: [&str; 7] = [
    "id",
    "date",
    "pillar",
    "indicator_id",
    "score_0_4",
    "short_reason",
    "source_type",
];

/// Check the index snapshot, the public ledger and every configured module
/// snapshot.
pub fn check_all(config: &ScalesConfig, paths: &PathsConfig) -> CheckReport {
    let mut report = check_index_state(config, &paths.index_state());
    report.merge(check_ledger(config, &paths.ledger()));
    for key in config.modules.keys() {
        report.merge(check_module_state(config, key, &paths.module_state(key)));
    }
    report
}

pub fn check_index_state(config: &ScalesConfig, path: &Path) -> CheckReport {
    let mut report = CheckReport::default();
    let Some(state) = read_state(path, &mut report, Severity::Error) else {
        return report;
    };
    let bands = &config.bands;

    match state.get("global") {
        None => report.warn("index state has no 'global' section"),
        Some(global) => match score_of(global, "score") {
            Score::Absent => report.warn("global section missing 'score'"),
            Score::Invalid(raw) => report.error(format!("global score is not numeric: {raw}")),
            Score::Number(score) => {
                check_range(&mut report, "global score", score, 100.0);
                check_band(&mut report, "global", global, Some(score), &bands.constitutional);
            }
        },
    }

    match state.get("indices").and_then(Value::as_object) {
        None => report.warn("no 'indices' section found in index state"),
        Some(indices) => {
            for key in config.indices.keys() {
                let Some(entry) = indices.get(key) else {
                    report.warn(format!("expected index '{key}' is missing from indices"));
                    continue;
                };
                let subject = format!("index '{key}'");
                match score_of(entry, "score") {
                    Score::Absent => report.warn(format!("{subject} missing score")),
                    Score::Invalid(raw) => {
                        report.error(format!("{subject} score is not numeric: {raw}"))
                    }
                    Score::Number(score) => {
                        check_range(&mut report, &subject, score, 100.0);
                        check_band(
                            &mut report,
                            &subject,
                            entry,
                            Some(score),
                            &bands.constitutional,
                        );
                    }
                }
            }
        }
    }

    match state.get("pillars").and_then(Value::as_array) {
        None => report.warn("no 'pillars' section found in index state"),
        Some(pillars) => {
            for (code, _) in config.declared_pillars() {
                let Some(entry) = pillars
                    .iter()
                    .find(|pillar| pillar.get("code").and_then(Value::as_str) == Some(code))
                else {
                    report.warn(format!("expected pillar '{code}' not found in pillars"));
                    continue;
                };
                let subject = format!("pillar '{code}'");
                match score_of(entry, "score") {
                    Score::Absent => report.warn(format!("{subject} missing score")),
                    Score::Invalid(raw) => {
                        report.error(format!("{subject} score is not numeric: {raw}"))
                    }
                    Score::Number(score) => {
                        check_range(&mut report, &subject, score, 4.0);
                        check_band(&mut report, &subject, entry, Some(score), bands.pillar());
                    }
                }
            }
        }
    }

    report
}

pub fn check_module_state(config: &ScalesConfig, key: &str, path: &Path) -> CheckReport {
    let mut report = CheckReport::default();
    let Some(state) = read_state(path, &mut report, Severity::Warning) else {
        return report;
    };
    let bands = &config.bands;
    let module = format!("module {key}");

    if state.get("key").and_then(Value::as_str) != Some(key) {
        report.warn(format!("{module} top-level 'key' is missing or does not match"));
    }
    if state
        .get("name")
        .and_then(Value::as_str)
        .map_or(true, str::is_empty)
    {
        report.warn(format!("{module} 'name' is missing or empty"));
    }
    let score = match score_of(&state, "score") {
        Score::Absent => {
            report.warn(format!("{module} missing 'score'"));
            None
        }
        Score::Invalid(raw) => {
            report.error(format!("{module} score is not numeric: {raw}"));
            None
        }
        Score::Number(score) => {
            check_range(&mut report, &module, score, 100.0);
            Some(score)
        }
    };
    check_band(&mut report, &module, &state, score, &bands.module);

    let Some(components) = state.get("components").and_then(Value::as_array) else {
        report.warn(format!("{module} has no 'components' array"));
        return report;
    };

    let expected: Vec<&str> = config
        .module(key)
        .map(|def| def.scored_components().map(|(code, _, _)| code).collect())
        .unwrap_or_default();

    for code in &expected {
        let Some(entry) = components
            .iter()
            .find(|component| component.get("code").and_then(Value::as_str) == Some(*code))
        else {
            report.warn(format!("{module} missing expected component '{code}'"));
            continue;
        };
        let subject = format!("{module} component '{code}'");
        match score_of(entry, "score_0_4") {
            Score::Absent => report.warn(format!("{subject} missing 'score_0_4'")),
            Score::Invalid(raw) => {
                report.error(format!("{subject} score_0_4 is not numeric: {raw}"))
            }
            Score::Number(score) => {
                check_range(&mut report, &subject, score, 4.0);
                check_band(&mut report, &subject, entry, Some(score), &bands.component);
            }
        }
    }

    let declared: HashSet<&str> = expected.iter().copied().collect();
    for code in components
        .iter()
        .filter_map(|component| component.get("code").and_then(Value::as_str))
        .filter(|code| !declared.contains(code))
    {
        report.warn(format!("{module} has unexpected component '{code}' not in config"));
    }

    report
}

/// Validate the hand-curated public evidence ledger: a JSON array of entries
/// that each cite one indicator observation.
pub fn check_ledger(config: &ScalesConfig, path: &Path) -> CheckReport {
    let mut report = CheckReport::default();
    let Some(ledger) = read_document(path, &mut report, Severity::Warning) else {
        return report;
    };
    let Some(entries) = ledger.as_array() else {
        report.error(format!("{} did not decode to an array", path.display()));
        return report;
    };

    if entries.len() > LEDGER_CHECK_LIMIT {
        report.warn(format!(
            "more than {LEDGER_CHECK_LIMIT} ledger entries; only the first {LEDGER_CHECK_LIMIT} checked"
        ));
    }

    let pillars: Vec<&str> = config.declared_pillars().map(|(code, _)| code).collect();
    for entry in entries.iter().take(LEDGER_CHECK_LIMIT) {
        let id = entry
            .get("id")
            .filter(|id| !id.is_null())
            .map(plain_text)
            .unwrap_or_else(|| "UNKNOWN".to_string());

        for field in LEDGER_FIELDS {
            if is_blank(entry.get(field)) {
                report.error(format!("ledger entry missing required field '{field}' (id={id})"));
            }
        }

        if let Some(pillar) = entry.get("pillar").and_then(Value::as_str) {
            if !pillars.is_empty() && !pillars.contains(&pillar) {
                report.warn(format!(
                    "ledger entry has pillar '{pillar}' outside the configured set ({}) (id={id})",
                    pillars.join(", ")
                ));
            }
        }

        match score_of(entry, "score_0_4") {
            Score::Absent => {}
            Score::Invalid(raw) => {
                report.error(format!("ledger entry {id} score_0_4 is not numeric: {raw}"))
            }
            Score::Number(score) => {
                check_range(&mut report, &format!("ledger entry {id}"), score, 4.0)
            }
        }
    }

    report
}

#[derive(Debug, Clone, Copy)]
enum Severity {
    Error,
    Warning,
}

fn read_state(path: &Path, report: &mut CheckReport, missing: Severity) -> Option<Value> {
    let value = read_document(path, report, missing)?;
    if value.is_object() {
        Some(value)
    } else {
        report.error(format!("{} did not decode to an object", path.display()));
        None
    }
}

fn read_document(path: &Path, report: &mut CheckReport, missing: Severity) -> Option<Value> {
    let display = path.display();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            let message = format!("cannot read {display}: {err}");
            match missing {
                Severity::Error => report.error(message),
                Severity::Warning => report.warn(message),
            }
            return None;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            report.error(format!("{display} is not valid JSON: {err}"));
            None
        }
    }
}

enum Score {
    Absent,
    Number(f64),
    Invalid(String),
}

/// Numbers and numeric strings count as scores.
fn score_of(entry: &Value, field: &str) -> Score {
    match entry.get(field) {
        None | Some(Value::Null) => Score::Absent,
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|score| score.is_finite())
            .map(Score::Number)
            .unwrap_or_else(|| Score::Invalid(raw.clone())),
        Some(value) => value
            .as_f64()
            .map(Score::Number)
            .unwrap_or_else(|| Score::Invalid(value.to_string())),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn check_range(report: &mut CheckReport, subject: &str, score: f64, max: f64) {
    if !(0.0..=max).contains(&score) {
        report.error(format!("{subject} score out of range (0–{max}): {score}"));
    }
}

/// A missing band is a warning whether or not the score is usable; a band
/// that disagrees with a numeric score is an error.
fn check_band(
    report: &mut CheckReport,
    subject: &str,
    entry: &Value,
    score: Option<f64>,
    table: &BandTable,
) {
    let Some(band) = entry.get("band").and_then(Value::as_str) else {
        report.warn(format!("{subject} missing 'band'"));
        return;
    };
    let Some(score) = score else {
        return;
    };
    let expected = table.band(Some(score));
    if Some(band) != expected {
        report.error(format!(
            "{subject} band '{band}' does not match score {score} (expected '{}')",
            expected.unwrap_or("none")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn config() -> ScalesConfig {
        ScalesConfig::from_yaml_str(
            "pillars:\n  - {code: P1, name: One}\nindices:\n  IDX: {name: Index, pillar_weights: {P1: 1}}\nmodules:\n  M:\n    components:\n      - {code: A}\n      - {code: B}\n",
            "inline",
        )
        .expect("config parses")
    }

    fn write(dir: &Path, name: &str, value: &Value) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value).expect("json")).expect("write");
        path
    }

    #[test]
    fn clean_index_state_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "scales_state.json",
            &json!({
                "global": {"score": 50.0, "band": "Amber", "summary": ""},
                "indices": {"IDX": {"name": "Index", "score": 50.0, "band": "Amber", "summary": ""}},
                "pillars": [{"code": "P1", "name": "One", "score": 2.0, "band": "High"}]
            }),
        );

        let report = check_index_state(&config(), &path);

        assert!(report.is_ok(), "{report:?}");
        assert!(report.warnings.is_empty(), "{report:?}");
    }

    #[test]
    fn out_of_range_and_mislabelled_scores_are_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "scales_state.json",
            &json!({
                "global": {"score": 120.0, "band": "Black"},
                "indices": {"IDX": {"score": 10.0, "band": "Red"}},
                "pillars": [{"code": "P1", "score": "high"}]
            }),
        );

        let report = check_index_state(&config(), &path);

        assert_eq!(report.errors.len(), 3, "{report:?}");
        assert!(report.errors.iter().any(|e| e.contains("global score out of range")));
        assert!(report.errors.iter().any(|e| e.contains("band 'Red'")));
        assert!(report.errors.iter().any(|e| e.contains("not numeric")));
    }

    #[test]
    fn missing_index_state_is_an_error_but_missing_module_is_a_warning() {
        let dir = tempfile::tempdir().expect("tempdir");

        let index = check_index_state(&config(), &dir.path().join("scales_state.json"));
        assert_eq!(index.errors.len(), 1);

        let module = check_module_state(&config(), "M", &dir.path().join("M_state.json"));
        assert!(module.is_ok());
        assert_eq!(module.warnings.len(), 1);
    }

    #[test]
    fn module_state_reports_gaps_and_strays() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "M_state.json",
            &json!({
                "key": "M",
                "name": "Module",
                "score": 37.5,
                "band": "Moderate",
                "components": [
                    {"code": "A", "score_0_4": 3.0, "band": "Extreme"},
                    {"code": "B", "score_0_4": null, "band": null},
                    {"code": "Z", "score_0_4": 5.0}
                ]
            }),
        );

        let report = check_module_state(&config(), "M", &path);

        assert!(report.is_ok(), "{report:?}");
        assert_eq!(report.warnings.len(), 2, "{report:?}");
        assert!(report.warnings.iter().any(|w| w.contains("'B' missing 'score_0_4'")));
        assert!(report.warnings.iter().any(|w| w.contains("unexpected component 'Z'")));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("M_state.json");
        fs::write(&path, "{ not json").expect("write");

        let report = check_module_state(&config(), "M", &path);

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("not valid JSON"));
    }

    #[test]
    fn module_without_score_still_needs_a_band() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "M_state.json",
            &json!({
                "key": "M",
                "name": "Module",
                "score": null,
                "components": [
                    {"code": "A", "score_0_4": 1.0, "band": "Moderate"},
                    {"code": "B", "score_0_4": 0.5, "band": "Low"}
                ]
            }),
        );

        let report = check_module_state(&config(), "M", &path);

        assert!(report.is_ok(), "{report:?}");
        assert_eq!(report.warnings.len(), 2, "{report:?}");
        assert!(report.warnings.iter().any(|w| w.contains("missing 'score'")));
        assert!(report.warnings.iter().any(|w| w.contains("module M missing 'band'")));
    }

    #[test]
    fn clean_ledger_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "scales_ledger_public.json",
            &json!([{
                "id": "L-001",
                "date": "2025-11-01",
                "pillar": "P1",
                "indicator_id": "I1",
                "score_0_4": 2,
                "short_reason": "Certification delayed",
                "source_type": "court"
            }]),
        );

        let report = check_ledger(&config(), &path);

        assert!(report.is_ok(), "{report:?}");
        assert!(report.warnings.is_empty(), "{report:?}");
    }

    #[test]
    fn ledger_entries_need_fields_range_and_known_pillar() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "scales_ledger_public.json",
            &json!([
                {
                    "id": "L-002",
                    "date": "2025-11-02",
                    "pillar": "ZZ",
                    "indicator_id": "I9",
                    "score_0_4": 7,
                    "short_reason": "",
                    "source_type": "news"
                },
                {"date": "2025-11-03", "pillar": "P1", "indicator_id": "I1",
                 "score_0_4": "3", "short_reason": "ok", "source_type": "law"}
            ]),
        );

        let report = check_ledger(&config(), &path);

        assert_eq!(report.errors.len(), 3, "{report:?}");
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("'short_reason' (id=L-002)")));
        assert!(report.errors.iter().any(|e| e.contains("L-002 score out of range")));
        assert!(report.errors.iter().any(|e| e.contains("'id' (id=UNKNOWN)")));
        assert_eq!(report.warnings.len(), 1, "{report:?}");
        assert!(report.warnings[0].contains("pillar 'ZZ'"));
    }

    #[test]
    fn large_ledger_is_capped_with_a_warning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entries: Vec<Value> = (0..LEDGER_CHECK_LIMIT + 5)
            .map(|n| json!({"id": n, "score_0_4": 9}))
            .collect();
        let path = write(dir.path(), "scales_ledger_public.json", &Value::Array(entries));

        let report = check_ledger(&config(), &path);

        let out_of_range = report
            .errors
            .iter()
            .filter(|e| e.contains("out of range"))
            .count();
        assert_eq!(out_of_range, LEDGER_CHECK_LIMIT);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("only the first 100 checked")));
    }

    #[test]
    fn missing_ledger_warns_and_non_array_ledger_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scales_ledger_public.json");

        let missing = check_ledger(&config(), &path);
        assert!(missing.is_ok());
        assert_eq!(missing.warnings.len(), 1);

        fs::write(&path, r#"{"entries": []}"#).expect("write");
        let not_array = check_ledger(&config(), &path);
        assert_eq!(not_array.errors.len(), 1);
        assert!(not_array.errors[0].contains("did not decode to an array"));
    }
}
