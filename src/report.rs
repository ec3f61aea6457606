// src/report.rs

use crate::error::{Error, Result};
use crate::model::Report;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const REPORT_FILE: &str = "regressions.json";

/// Writes the report to `html_dir/regressions.json` and returns its path.
pub fn save(html_dir: &Path, report: &Report) -> Result<PathBuf> {
    let path = html_dir.join(REPORT_FILE);
    let io_err = |source| Error::Io {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(html_dir).map_err(io_err)?;
    let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
    serde_json::to_writer(&mut writer, report).map_err(|source| Error::Json {
        path: path.clone(),
        source,
    })?;
    writer.flush().map_err(io_err)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphParams, Jump, JumpResult, RegressionRecord};

    #[test]
    fn saves_report_under_html_dir() {
        let dir = tempfile::tempdir().unwrap();
        let html_dir = dir.path().join("html");
        let report = Report {
            regressions: vec![RegressionRecord {
                entry_name: "time_foo".to_string(),
                graph_path: "graphs/time_foo.json".to_string(),
                graph_params: GraphParams::new(),
                param_index: None,
                result: JumpResult {
                    jumps: vec![Jump { before: Some(3), after: 4 }],
                    current_value: 20.0,
                    best_value: 10.0,
                },
            }],
        };

        let path = save(&html_dir, &report).unwrap();
        assert_eq!(path, html_dir.join(REPORT_FILE));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            r#"{"regressions":[["time_foo","graphs/time_foo.json",{},null,[[[3,4]],20.0,10.0]]]}"#
        );
    }

    #[test]
    fn empty_report_has_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(dir.path(), &Report::default()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), r#"{"regressions":[]}"#);
    }
}
