//! JSON-backed experience buffer
//!
//! The file is a single JSON array of strings. It is read once when a run
//! starts and rewritten in full (pretty-printed) when the run ends.

use crate::core::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered collection of trajectory records, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceBuffer {
    path: PathBuf,
    records: Vec<String>,
}

impl ExperienceBuffer {
    /// An empty buffer that will be written to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    /// Read an existing buffer file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let records: Vec<String> = serde_json::from_str(&contents)?;
        tracing::info!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Read the buffer file, or start empty if it does not exist yet
    pub fn load_or_empty(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("No buffer at {}, starting empty", path.display());
            Ok(Self::empty(path))
        }
    }

    /// Concatenate several buffer files, in order
    pub fn load_many<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<String>> {
        let mut all = Vec::new();
        for path in paths {
            all.extend(Self::load(path)?.records);
        }
        Ok(all)
    }

    /// Write every record back to the buffer file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json)?;
        tracing::info!("Saved {} records to {}", self.records.len(), self.path.display());
        Ok(())
    }

    pub fn push(&mut self, record: impl Into<String>) {
        self.records.push(record.into());
    }

    /// Drop every stored record (the file is untouched until `save`)
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[String] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("replay_lab_store_{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip.json");
        let mut buffer = ExperienceBuffer::empty(&path);
        buffer.push("first run");
        buffer.push("second run\nwith two lines");
        buffer.save().unwrap();

        let loaded = ExperienceBuffer::load(&path).unwrap();
        assert_eq!(loaded.records(), buffer.records());
        assert_eq!(loaded.len(), 2);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n  \"first run\""));
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let path = temp_path("missing.json");
        let buffer = ExperienceBuffer::load_or_empty(&path).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.path(), path.as_path());
    }

    #[test]
    fn test_load_rejects_non_string_array() {
        let path = temp_path("bad.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(ExperienceBuffer::load(&path).is_err());
    }

    #[test]
    fn test_load_many_preserves_order() {
        let a = temp_path("many_a.json");
        let b = temp_path("many_b.json");
        let mut first = ExperienceBuffer::empty(&a);
        first.push("a1");
        first.save().unwrap();
        let mut second = ExperienceBuffer::empty(&b);
        second.push("b1");
        second.push("b2");
        second.save().unwrap();

        let all = ExperienceBuffer::load_many(&[a, b]).unwrap();
        assert_eq!(all, vec!["a1", "b1", "b2"]);
    }
}
