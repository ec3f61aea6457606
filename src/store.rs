// src/store.rs

use crate::error::{Error, Result};
use crate::model::{Benchmark, GraphParams, Sample};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of one graph: its parameters, path and raw series
pub trait GraphProvider {
    /// Path relative to the html directory, without the `.json` suffix
    fn path(&self) -> &str;

    fn params(&self) -> &GraphParams;

    /// Raw `(time, value)` samples in time order
    fn series(&self) -> Result<Vec<Sample>>;

    /// Benchmark name, i.e. the last path component
    fn benchmark_name(&self) -> &str {
        let path = self.path();
        path.rsplit('/').next().unwrap_or(path)
    }
}

/// Graph stored as a JSON file of `[time, value]` pairs
#[derive(Debug, Clone)]
pub struct GraphFile {
    path: String,
    params: GraphParams,
    file: PathBuf,
}

impl GraphProvider for GraphFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn params(&self) -> &GraphParams {
        &self.params
    }

    fn series(&self) -> Result<Vec<Sample>> {
        read_json(&self.file)
    }
}

/// Graph held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    pub path: String,
    pub params: GraphParams,
    pub samples: Vec<Sample>,
}

impl GraphProvider for MemoryGraph {
    fn path(&self) -> &str {
        &self.path
    }

    fn params(&self) -> &GraphParams {
        &self.params
    }

    fn series(&self) -> Result<Vec<Sample>> {
        Ok(self.samples.clone())
    }
}

/// Loads the benchmark registry, skipping non-benchmark entries such as `version`.
pub fn load_benchmarks(path: &Path) -> Result<BTreeMap<String, Benchmark>> {
    let raw: BTreeMap<String, serde_json::Value> = read_json(path)?;
    let mut benchmarks = BTreeMap::new();
    for (name, value) in raw {
        if !value.is_object() {
            continue;
        }
        let benchmark: Benchmark = serde_json::from_value(value).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        benchmarks.insert(name, benchmark);
    }
    Ok(benchmarks)
}

/// Finds every graph file below `html_dir/graphs`, sorted by path.
pub fn discover_graphs(html_dir: &Path) -> Result<Vec<GraphFile>> {
    let mut graphs = Vec::new();
    let root = html_dir.join("graphs");
    if root.is_dir() {
        walk_graphs(html_dir, &root, &mut graphs)?;
    }
    graphs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(graphs)
}

fn walk_graphs(html_dir: &Path, dir: &Path, graphs: &mut Vec<GraphFile>) -> Result<()> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let file = entry.map_err(io_err)?.path();
        if file.is_dir() {
            walk_graphs(html_dir, &file, graphs)?;
            continue;
        }
        if file.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Ok(relative) = file.with_extension("").strip_prefix(html_dir).map(Path::to_path_buf) else {
            continue;
        };
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| c.as_os_str().to_str().map(String::from))
            .collect();
        graphs.push(GraphFile {
            path: segments.join("/"),
            params: params_from_segments(&segments),
            file,
        });
    }
    Ok(())
}

/// Decodes `key-value` directory segments between `graphs/` and the file name.
fn params_from_segments(segments: &[String]) -> GraphParams {
    let dirs = match segments.len() {
        0..=2 => &[][..],
        n => &segments[1..n - 1],
    };
    dirs.iter()
        .map(|segment| match segment.split_once('-') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (segment.clone(), String::new()),
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}
