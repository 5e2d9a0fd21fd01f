//! Fixture file loading.

use crate::{ScenarioFixture, SpecError, SpecResult};
use std::fs;
use std::path::Path;

/// Load a single scenario file.
pub fn load_fixture(path: &Path) -> SpecResult<ScenarioFixture> {
    let content = fs::read_to_string(path).map_err(|e| SpecError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    ScenarioFixture::from_toml(&content, &path.display().to_string())
}

/// Load every scenario under `dir` (glob: **/*.toml), named by their path
/// relative to `dir` and sorted by name.
pub fn load_all_fixtures(dir: &Path) -> SpecResult<Vec<(String, ScenarioFixture)>> {
    let mut fixtures = Vec::new();
    load_fixtures_recursive(dir, dir, &mut fixtures)?;
    fixtures.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(fixtures)
}

fn load_fixtures_recursive(
    base: &Path,
    dir: &Path,
    fixtures: &mut Vec<(String, ScenarioFixture)>,
) -> SpecResult<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(dir).map_err(|e| SpecError::Load {
        path: dir.display().to_string(),
        message: e.to_string(),
    })? {
        let entry = entry.map_err(|e| SpecError::Load {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        let path = entry.path();

        if path.is_dir() {
            load_fixtures_recursive(base, &path, fixtures)?;
        } else if path.extension().map_or(false, |e| e == "toml") {
            let relative = path.strip_prefix(base).unwrap_or(&path);
            let fixture = load_fixture(&path)?;
            // Forward slashes so names match expected-failures.toml everywhere.
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            fixtures.push((name, fixture));
        }
    }

    Ok(())
}
