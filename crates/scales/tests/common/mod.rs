#![allow(dead_code)]

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 6).expect("valid run date")
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory");
    }
    fs::write(&path, contents).expect("file written");
    path
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(path).expect("state readable");
    serde_json::from_str(&raw).expect("state is valid JSON")
}
