use std::path::Path;

use eyre::{Result, eyre};

use super::Project;

pub(super) const CONFIG_FILES: [&str; 2] = ["hardhat.config.js", "hardhat.config.ts"];

pub(super) fn has_config(path: &Path) -> bool {
    CONFIG_FILES.iter().any(|file| path.join(file).exists())
}

/// Load a Hardhat project from the given path
pub fn load_project(path: &Path) -> Result<Project> {
    if !has_config(path) {
        return Err(eyre!(
            "hardhat.config.js or hardhat.config.ts not found at {:?}",
            path
        ));
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(Project {
        root: path.to_path_buf(),
        name,
        artifacts_dir: path.join("artifacts"),
        deployments_dir: path.join("deployments"),
    })
}
