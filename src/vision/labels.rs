// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class-index to class-name table for detection models

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;

/// Ordered class names; the position of a name is its class index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load labels from a text file, one class name per line
    ///
    /// Blank lines are skipped, surrounding whitespace is trimmed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;

        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            anyhow::bail!("Labels file {} contains no class names", path.display());
        }

        Ok(Self { names })
    }

    /// Parse the `names` entry that YOLOv8 exporters embed in ONNX metadata
    ///
    /// The value is a Python dict literal such as `{0: 'person', 1: 'bicycle'}`.
    /// Indices must be contiguous from zero and names must be non-empty.
    pub fn from_metadata(raw: &str) -> Result<Self> {
        let pattern = Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#)
            .context("Failed to compile labels pattern")?;

        let mut entries: Vec<(usize, String)> = Vec::new();
        for caps in pattern.captures_iter(raw) {
            let index: usize = caps[1]
                .parse()
                .with_context(|| format!("Invalid class index '{}'", &caps[1]))?;
            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            if name.trim().is_empty() {
                anyhow::bail!("Class {} has an empty name in model metadata", index);
            }
            entries.push((index, name));
        }

        if entries.is_empty() {
            anyhow::bail!("No class names found in model metadata: {}", raw);
        }

        entries.sort_by_key(|(index, _)| *index);
        for (expected, (index, _)) in entries.iter().enumerate() {
            if *index != expected {
                anyhow::bail!(
                    "Class indices in model metadata are not contiguous: expected {}, found {}",
                    expected,
                    index
                );
            }
        }

        Ok(Self {
            names: entries.into_iter().map(|(_, name)| name).collect(),
        })
    }

    /// Look up the name for a class index
    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl From<Vec<&str>> for ClassLabels {
    fn from(names: Vec<&str>) -> Self {
        Self::new(names.into_iter().map(str::to_string).collect())
    }
}
