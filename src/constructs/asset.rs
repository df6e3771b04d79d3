//! # File Assets
//!
//! Content fingerprints for locally built artifacts. The fingerprint decides
//! the object key the artifact is uploaded under, so it must change whenever
//! the sources or the build options change and stay put otherwise.

use crate::error::{Result, StackError};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directories never part of a source fingerprint
const IGNORED_DIRS: &[&str] = &["target", ".git", "node_modules", "cdk.out"];

/// SHA-256 over the source tree at `project_dir/entry` and `options`
///
/// Files are visited in name order and hashed together with their path
/// relative to the entry, so renames change the fingerprint. A missing entry
/// is fingerprinted by its path alone.
pub fn fingerprint(project_dir: &Path, entry: &str, options: &impl Serialize) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(entry.as_bytes());
    hasher.update([0]);
    hasher.update(serde_json::to_vec(options)?);

    let root = project_dir.join(entry);
    if root.exists() {
        let mut files = 0_usize;
        for item in WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.file_type().is_dir()
                        && e.file_name()
                            .to_str()
                            .is_some_and(|name| IGNORED_DIRS.contains(&name)))
            })
        {
            let item = item.map_err(|e| StackError::Io {
                path: root.display().to_string(),
                source: e.into(),
            })?;
            if !item.file_type().is_file() {
                continue;
            }
            let relative = item.path().strip_prefix(&root).unwrap_or(item.path());
            hasher.update([0]);
            hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
            hasher.update([0]);
            hash_file(&mut hasher, item.path())?;
            files += 1;
        }
        debug!(entry, files, "Fingerprinted asset sources");
    } else {
        warn!(
            entry,
            path = %root.display(),
            "Asset source not found; fingerprint covers the path and build options only"
        );
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let io_error = |source: std::io::Error| StackError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(io_error)?;
    let mut buffer = vec![0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(io_error)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lambda/src")).unwrap();
        fs::write(dir.path().join("lambda/Cargo.toml"), "[package]\nname = \"handler\"\n").unwrap();
        fs::write(dir.path().join("lambda/src/main.rs"), "fn main() {}\n").unwrap();
        dir
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let dir = project();
        let a = fingerprint(dir.path(), "lambda", &json!({})).unwrap();
        let b = fingerprint(dir.path(), "lambda", &json!({})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_sources() {
        let dir = project();
        let before = fingerprint(dir.path(), "lambda", &json!({})).unwrap();
        fs::write(dir.path().join("lambda/src/main.rs"), "fn main() { println!(); }\n").unwrap();
        let after = fingerprint(dir.path(), "lambda", &json!({})).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_fingerprint_ignores_build_output() {
        let dir = project();
        let before = fingerprint(dir.path(), "lambda", &json!({})).unwrap();
        fs::create_dir_all(dir.path().join("lambda/target/release")).unwrap();
        fs::write(dir.path().join("lambda/target/release/bootstrap"), "binary").unwrap();
        let after = fingerprint(dir.path(), "lambda", &json!({})).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_fingerprint_tracks_options() {
        let dir = project();
        let docker =
            fingerprint(dir.path(), "lambda", &json!({"forceDockerBundling": true})).unwrap();
        let local =
            fingerprint(dir.path(), "lambda", &json!({"forceDockerBundling": false})).unwrap();
        assert_ne!(docker, local);
    }

    #[test]
    fn test_missing_entry_still_fingerprints() {
        let dir = TempDir::new().unwrap();
        let hash = fingerprint(dir.path(), "missing", &json!({})).unwrap();
        assert_eq!(hash.len(), 64);
    }
}
