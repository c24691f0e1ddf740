//! Grouping of input files by base name.
//!
//! The operator delivers several files per subscriber, e.g.
//! `79161234567.loc`, `79161234567.bil` and `79161234567.inf`. Only the
//! extensions listed in [`DiscoveryConfig::extensions`] are considered;
//! everything else under the root is ignored.

use std::collections::BTreeMap;
use std::path::Path;

use loc_analyze_location_models::FileGroup;
use loc_analyze_location_models::config::DiscoveryConfig;
use walkdir::WalkDir;

use crate::IngestError;

/// Walks `root` recursively and groups recognized files by base name,
/// ordered by base name.
///
/// Extensions are compared case-insensitively and stored as spelled in
/// the configuration. When the same base name and extension occur in more
/// than one directory the first path in walk order wins. Unreadable
/// entries and file names that are not valid UTF-8 are logged and skipped.
///
/// # Errors
///
/// Returns [`IngestError::FileSystem`] if `root` does not exist or cannot
/// be read, and [`IngestError::NotADirectory`] if it is a file.
pub fn classify(root: &Path, config: &DiscoveryConfig) -> Result<Vec<FileGroup>, IngestError> {
    let metadata = std::fs::metadata(root).map_err(|source| IngestError::FileSystem {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(IngestError::NotADirectory(root.to_path_buf()));
    }

    let mut groups: BTreeMap<String, FileGroup> = BTreeMap::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let (Some(stem), Some(extension)) = (path.file_stem(), path.extension()) else {
            continue;
        };
        let (Some(stem), Some(extension)) = (stem.to_str(), extension.to_str()) else {
            log::warn!("Skipping {}: file name is not valid UTF-8", path.display());
            continue;
        };

        let Some(known) = config
            .extensions
            .iter()
            .find(|known| known.eq_ignore_ascii_case(extension))
        else {
            continue;
        };

        groups
            .entry(stem.to_string())
            .or_insert_with(|| FileGroup::new(stem))
            .insert(known.clone(), path.to_path_buf());
    }

    log::debug!(
        "Found {} file groups under {}",
        groups.len(),
        root.display()
    );

    Ok(groups.into_values().collect())
}

/// Whether `group` has a location log and can be analyzed.
#[must_use]
pub fn is_eligible(group: &FileGroup, config: &DiscoveryConfig) -> bool {
    group.has_extension(&config.log_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        if let Some(parent) = Path::new(name).parent() {
            std::fs::create_dir_all(dir.join(parent)).unwrap();
        }
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn groups_by_base_name_across_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "100.loc");
        touch(dir.path(), "100.inf");
        touch(dir.path(), "nested/100.bil");
        touch(dir.path(), "200.inf");

        let groups = classify(dir.path(), &DiscoveryConfig::default()).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].base_name, "100");
        assert_eq!(
            groups[0].extensions().into_iter().collect::<Vec<_>>(),
            ["bil", "inf", "loc"]
        );
        assert_eq!(
            groups[0].path_for("bil"),
            Some(dir.path().join("nested/100.bil").as_path())
        );
        assert_eq!(groups[1].base_name, "200");
    }

    #[test]
    fn ignores_unrecognized_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "100.txt");
        touch(dir.path(), "notes");
        touch(dir.path(), "100.LOC");

        let groups = classify(dir.path(), &DiscoveryConfig::default()).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].extensions().into_iter().collect::<Vec<_>>(),
            ["loc"]
        );
    }

    #[test]
    fn groups_without_log_are_not_eligible() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "100.loc");
        touch(dir.path(), "200.inf");
        touch(dir.path(), "200.bil");
        let config = DiscoveryConfig::default();

        let groups = classify(dir.path(), &config).unwrap();
        let eligible: Vec<&str> = groups
            .iter()
            .filter(|g| is_eligible(g, &config))
            .map(|g| g.base_name.as_str())
            .collect();

        assert_eq!(eligible, ["100"]);
    }

    #[cfg(unix)]
    #[test]
    fn skips_non_utf8_file_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "100.loc");
        let name = OsStr::from_bytes(b"\xff\xfe.loc");
        if std::fs::write(dir.path().join(name), b"").is_err() {
            // Some file systems refuse such names outright.
            return;
        }

        let groups = classify(dir.path(), &DiscoveryConfig::default()).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].base_name, "100");
    }

    #[test]
    fn missing_root_is_file_system_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = classify(&dir.path().join("absent"), &DiscoveryConfig::default());

        assert!(matches!(result, Err(IngestError::FileSystem { .. })));
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "100.loc");

        let result = classify(&dir.path().join("100.loc"), &DiscoveryConfig::default());

        assert!(matches!(result, Err(IngestError::NotADirectory(_))));
    }

    #[test]
    fn empty_root_has_no_groups() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            classify(dir.path(), &DiscoveryConfig::default())
                .unwrap()
                .is_empty()
        );
    }
}
