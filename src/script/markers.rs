use regex::Regex;
use std::sync::OnceLock;

use super::Manifest;
use crate::error::Result;

fn structure_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^-- Table structure for table `((?:[^`]|``)+)`\s*$")
            .expect("structure marker regex is valid")
    })
}

/// Tables a script recreates, in order of first appearance.
///
/// Uses the header manifest when present. Scripts without one fall back to
/// scanning the `-- Table structure for table` comments.
pub fn discover_tables(script: &str) -> Result<Vec<String>> {
    if let Some(manifest) = Manifest::find(script)? {
        return Ok(manifest.tables);
    }

    let mut tables: Vec<String> = Vec::new();
    for cap in structure_marker().captures_iter(script) {
        let name = cap[1].replace("``", "`");
        if !tables.contains(&name) {
            tables.push(name);
        }
    }
    Ok(tables)
}
