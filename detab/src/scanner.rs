use ignore::WalkBuilder;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::errors::{DetabError, DetabResult};

/// Walks `root` depth first and calls `emit` for every regular file whose name
/// matches `filter`.
///
/// Entries are visited in file-name order within each directory and every
/// subdirectory is descended before its later siblings. The first listing error
/// aborts the walk; paths emitted before it are unaffected. A symlink is emitted
/// when it resolves to a regular file, so the rewrite lands on its target;
/// links to directories are never descended and dangling links are skipped, as
/// are other special entries. Hidden files and ignore files get no special
/// treatment.
pub fn scan_dir<F>(root: &Path, filter: &Regex, mut emit: F) -> DetabResult<()>
where
    F: FnMut(PathBuf) -> DetabResult<()>,
{
    let metadata = fs::metadata(root).map_err(|e| DetabError::scan(root, e))?;
    if !metadata.is_dir() {
        return Err(DetabError::scan(
            root,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    debug!("Scanning {} for files matching /{}/", root.display(), filter);

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut emitted = 0usize;
    for entry in walker {
        let entry = entry.map_err(|err| walk_error(root, err))?;

        let is_file = match entry.file_type() {
            Some(ft) if ft.is_file() => true,
            Some(ft) if ft.is_symlink() => links_to_file(entry.path()),
            _ => false,
        };
        if !is_file {
            continue;
        }

        if filter.is_match(&entry.file_name().to_string_lossy()) {
            trace!("Matched {}", entry.path().display());
            emit(entry.into_path())?;
            emitted += 1;
        }
    }

    debug!("Scan of {} emitted {} files", root.display(), emitted);
    Ok(())
}

/// Collects every file [`scan_dir`] would emit, in visiting order
pub fn collect_files(root: &Path, filter: &Regex) -> DetabResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    scan_dir(root, filter, |path| {
        files.push(path);
        Ok(())
    })?;
    Ok(files)
}

fn links_to_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file(),
        Err(err) => {
            debug!("Skipping unresolvable link {}: {}", path.display(), err);
            false
        }
    }
}

fn walk_error(root: &Path, err: ignore::Error) -> DetabError {
    let path = error_path(&err).unwrap_or(root).to_path_buf();
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message));
    DetabError::scan(path, source)
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        _ => None,
    }
}
