use std::path::Path;

use eyre::{Result, eyre};

use super::{Project, hardhat};

/// Find the Hardhat project containing `path`, walking up parent directories
pub fn detect(path: &Path) -> Result<Project> {
    for dir in path.ancestors() {
        if hardhat::has_config(dir) {
            let project = hardhat::load_project(dir)?;
            tracing::info!("Detected Hardhat project {} at {:?}", project.name, project.root);
            return Ok(project);
        }
    }

    Err(eyre!(
        "No Hardhat project detected at {:?}\n\
         Expected: {}",
        path,
        hardhat::CONFIG_FILES.join(" or ")
    ))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_detect_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hardhat.config.js"), "module.exports = {}").unwrap();
        let nested = dir.path().join("deploy");
        fs::create_dir(&nested).unwrap();

        let project = detect(&nested).unwrap();
        assert_eq!(project.root, dir.path());
    }
}
