//! Rendering and writing generated bundles.
//!
//! One bundle is written as a single JSON document. Several bundles go to a JSON array when
//! the destination ends in `.json`, otherwise the destination is treated as a directory that
//! receives `bundle_0000.json`, `bundle_0001.json`, ...

use anyhow::Context;
use fhir::Bundle;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Serialise bundles and down-convert them for R4 receivers.
pub fn render(bundles: &[Bundle]) -> anyhow::Result<Vec<Value>> {
    bundles
        .iter()
        .map(|bundle| {
            let value = serde_json::to_value(bundle).context("serialising bundle")?;
            Ok(fhir::r4::adapt_bundle(value))
        })
        .collect()
}

/// A lone bundle as an object, several as an array.
pub fn to_pretty_json(rendered: &[Value]) -> anyhow::Result<String> {
    let text = match rendered {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    Ok(text)
}

/// Write to `destination` and return the path actually written (a file or a directory).
pub fn write(rendered: &[Value], destination: &Path) -> anyhow::Result<PathBuf> {
    let is_json_file = destination
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if rendered.len() == 1 || is_json_file {
        create_parent(destination)?;
        fs::write(destination, to_pretty_json(rendered)?)
            .with_context(|| format!("writing {}", destination.display()))?;
        return Ok(destination.to_path_buf());
    }

    fs::create_dir_all(destination)
        .with_context(|| format!("creating directory {}", destination.display()))?;
    for (index, bundle) in rendered.iter().enumerate() {
        let path = destination.join(format!("bundle_{index:04}.json"));
        fs::write(&path, serde_json::to_string_pretty(bundle)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(destination.to_path_buf())
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}
