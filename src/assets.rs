//! Static asset copier.
//!
//! Copies the active template's `static/` tree, then the user's configured
//! static files, into the output directory. Relative paths are preserved
//! and existing files are overwritten, so a re-run yields the same tree.

use crate::config::StaticFiles;
use crate::error::{PublishError, Result};
use include_dir::{Dir, DirEntry};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Depth scanned under a template's `static/` directory.
const TEMPLATE_SCAN_DEPTH: usize = 3;

/// Where the template's own assets come from.
#[derive(Debug, Clone, Copy)]
pub enum TemplateStatic<'a> {
    Bundled(&'a Dir<'a>),
    Dir(&'a Path),
}

fn write_file(to: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| PublishError::io(parent, e))?;
    }
    fs::write(to, contents).map_err(|e| PublishError::io(to, e))
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| PublishError::io(parent, e))?;
    }
    fs::copy(from, to).map_err(|e| PublishError::io(from, e))?;
    Ok(())
}

/// Copy the template's `static/` directory. Returns the number of files.
pub fn copy_template_static(source: TemplateStatic<'_>, outdir: &Path) -> Result<usize> {
    let count = match source {
        TemplateStatic::Bundled(root) => match root.get_dir("static") {
            Some(dir) => copy_embedded(dir, Path::new("static"), outdir)?,
            None => 0,
        },
        TemplateStatic::Dir(template) => {
            let dir = template.join("static");
            if dir.is_dir() {
                copy_tree(&dir, outdir, TEMPLATE_SCAN_DEPTH, |_| true)?
            } else {
                0
            }
        }
    };
    tracing::debug!("copied {} template assets", count);
    Ok(count)
}

fn copy_embedded(dir: &Dir<'_>, base: &Path, outdir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(sub) => count += copy_embedded(sub, base, outdir)?,
            DirEntry::File(file) => {
                let relative = file.path().strip_prefix(base).unwrap_or(file.path());
                write_file(&outdir.join(relative), file.contents())?;
                count += 1;
            }
        }
    }
    Ok(count)
}

/// Copy every accepted file under `from` to the same relative path under
/// `outdir`, descending at most `depth` levels.
fn copy_tree<F>(from: &Path, outdir: &Path, depth: usize, accept: F) -> Result<usize>
where
    F: Fn(&Path) -> bool,
{
    let mut count = 0;
    for entry in WalkDir::new(from).max_depth(depth).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| from.to_path_buf());
            PublishError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() || !accept(entry.path()) {
            continue;
        }
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        copy_file(entry.path(), &outdir.join(relative))?;
        count += 1;
    }
    Ok(count)
}

/// Copy the user's `staticFiles`. Missing include paths are skipped with a
/// warning.
pub fn copy_user_static(statics: &StaticFiles, outdir: &Path) -> Result<usize> {
    let filter = statics.filter()?;
    let mut count = 0;
    for include in statics.include_paths() {
        let include: PathBuf = include.clone();
        if include.is_file() {
            if filter.accepts(&include) {
                if let Some(name) = include.file_name() {
                    copy_file(&include, &outdir.join(name))?;
                    count += 1;
                }
            }
            continue;
        }
        if !include.is_dir() {
            tracing::warn!("static path {} does not exist", include.display());
            continue;
        }
        count += copy_tree(&include, outdir, statics.depth, |p| filter.accepts(p))?;
    }
    tracing::debug!("copied {} user static files", count);
    Ok(count)
}
