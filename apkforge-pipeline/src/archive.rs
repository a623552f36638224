//! Template materialization
//!
//! Zip extraction and packing plus plain directory copies. These are
//! blocking operations; callers run them on the blocking thread pool.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{BuildError, Result};

fn extraction(reason: impl std::fmt::Display) -> BuildError {
    BuildError::Extraction(reason.to_string())
}

/// Extracts every entry of a zip archive below `dest`
///
/// Entries are processed in archive order. Each file is fully written and
/// synced before the next entry is read. Returns the number of files
/// written.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize> {
    info!(
        "Extracting archive {} into {}",
        archive.display(),
        dest.display()
    );

    let file = File::open(archive)
        .map_err(|e| extraction(format!("cannot open {}: {}", archive.display(), e)))?;
    let mut zip = ZipArchive::new(BufReader::new(file))
        .map_err(|e| extraction(format!("malformed archive {}: {}", archive.display(), e)))?;

    fs::create_dir_all(dest)
        .map_err(|e| extraction(format!("cannot create {}: {}", dest.display(), e)))?;

    let mut files = 0;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| extraction(format!("unreadable entry #{}: {}", index, e)))?;

        let relative = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| extraction(format!("entry '{}' escapes the destination", entry.name())))?;
        let target = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| extraction(format!("cannot create {}: {}", target.display(), e)))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| extraction(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let mut out = File::create(&target)
            .map_err(|e| extraction(format!("cannot create {}: {}", target.display(), e)))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| extraction(format!("cannot write {}: {}", target.display(), e)))?;
        out.sync_all()
            .map_err(|e| extraction(format!("cannot flush {}: {}", target.display(), e)))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode().filter(|m| m & 0o777 != 0) {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| extraction(format!("cannot chmod {}: {}", target.display(), e)))?;
        }

        debug!("Extracted {}", relative.display());
        files += 1;
    }

    info!("Extracted {} file(s)", files);
    Ok(files)
}

/// Packs the tree below `src` into a zip archive at `archive`
///
/// Entries are written in file-name order with `/` separators, directories
/// included, so that extraction reproduces the same tree.
pub fn pack_directory(src: &Path, archive: &Path) -> io::Result<usize> {
    let file = File::create(archive)?;
    let mut zip = ZipWriter::new(file);
    let base = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut files = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        #[cfg(unix)]
        let options = {
            use std::os::unix::fs::PermissionsExt;
            let mode = entry.metadata().map_err(io::Error::other)?.permissions().mode();
            base.unix_permissions(mode & 0o7777)
        };
        #[cfg(not(unix))]
        let options = base;

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input = File::open(entry.path())?;
            io::copy(&mut input, &mut zip)?;
            files += 1;
        }
    }

    let mut file = zip.finish()?;
    file.flush()?;
    Ok(files)
}

/// Copies the tree below `src` into `dest`, keeping file permissions
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    info!("Copying template {} into {}", src.display(), dest.display());

    if !src.is_dir() {
        return Err(extraction(format!(
            "template directory {} does not exist",
            src.display()
        )));
    }

    let mut files = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| extraction(format!("cannot walk template: {}", e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| extraction(e))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| extraction(format!("cannot create {}: {}", target.display(), e)))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    extraction(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| extraction(format!("cannot copy {}: {}", target.display(), e)))?;
            files += 1;
        }
    }

    info!("Copied {} file(s)", files);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    /// Relative path -> contents (None for directories)
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap())
            .map(|e| {
                let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
                let contents = if e.file_type().is_dir() {
                    None
                } else {
                    Some(fs::read(e.path()).unwrap())
                };
                (relative, contents)
            })
            .collect()
    }

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("project/android/app")).unwrap();
        fs::create_dir_all(root.join("project/empty")).unwrap();
        fs::write(root.join("project/.env"), "APP_URL=APP_URL_PLACEHOLDER\n").unwrap();
        fs::write(root.join("project/pubspec.yaml"), "name: webview\n").unwrap();
        fs::write(root.join("project/android/app/binary.bin"), [0u8, 159, 146, 150, 255]).unwrap();
    }

    #[test]
    fn test_pack_extract_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let original = tmp.path().join("original");
        sample_tree(&original);

        let first_zip = tmp.path().join("first.zip");
        pack_directory(&original, &first_zip).unwrap();

        let extracted = tmp.path().join("extracted");
        let files = extract_archive(&first_zip, &extracted).unwrap();
        assert_eq!(files, 3);
        assert_eq!(snapshot(&original), snapshot(&extracted));

        // Re-package the extracted tree and extract again
        let second_zip = tmp.path().join("second.zip");
        pack_directory(&extracted, &second_zip).unwrap();
        let again = tmp.path().join("again");
        extract_archive(&second_zip, &again).unwrap();
        assert_eq!(snapshot(&extracted), snapshot(&again));
        assert!(again.join("project/empty").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_restores_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let original = tmp.path().join("original");
        fs::create_dir_all(&original).unwrap();
        let script = original.join("gradlew");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let archive = tmp.path().join("t.zip");
        pack_directory(&original, &archive).unwrap();
        let out = tmp.path().join("out");
        extract_archive(&archive, &out).unwrap();

        let mode = fs::metadata(out.join("gradlew")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_extract_rejects_malformed_archive() {
        let tmp = tempfile::TempDir::new().unwrap();
        let archive = tmp.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip archive").unwrap();

        let err = extract_archive(&archive, &tmp.path().join("out")).unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
    }

    #[test]
    fn test_extract_rejects_truncated_archive() {
        let tmp = tempfile::TempDir::new().unwrap();
        let original = tmp.path().join("original");
        sample_tree(&original);
        let archive = tmp.path().join("full.zip");
        pack_directory(&original, &archive).unwrap();

        let bytes = fs::read(&archive).unwrap();
        let truncated = tmp.path().join("truncated.zip");
        fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();

        assert!(extract_archive(&truncated, &tmp.path().join("out")).is_err());
    }

    #[test]
    fn test_extract_rejects_path_traversal() {
        let tmp = tempfile::TempDir::new().unwrap();
        let archive = tmp.path().join("evil.zip");
        {
            let mut zip = ZipWriter::new(File::create(&archive).unwrap());
            zip.start_file("../escaped.txt", FileOptions::default())
                .unwrap();
            zip.write_all(b"nope").unwrap();
            zip.finish().unwrap();
        }

        let dest = tmp.path().join("dest");
        let err = extract_archive(&archive, &dest).unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
        assert!(!tmp.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_extract_missing_archive() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = extract_archive(&tmp.path().join("absent.zip"), tmp.path()).unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }

    #[test]
    fn test_copy_tree() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        sample_tree(&src);

        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        let files = copy_tree(&src, &dest).unwrap();

        assert_eq!(files, 3);
        assert_eq!(snapshot(&src), snapshot(&dest));
    }

    #[test]
    fn test_copy_tree_missing_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = copy_tree(&tmp.path().join("absent"), tmp.path()).unwrap_err();
        assert_eq!(err.kind(), "ExtractionError");
    }
}
