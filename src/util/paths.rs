use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, VaultError};

pub fn is_safe_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Positive decimal directory names in canonical form only; "7" counts, "007" and "+7" do not.
pub fn parse_numeric_name(name: &str) -> Option<u64> {
    if name.is_empty() || name.starts_with('0') || !name.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    name.parse::<u64>().ok().filter(|n| *n > 0)
}

pub fn exists_as_dir(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_dir()
}

pub fn exists_as_file(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_file()
}

pub fn ensure_directory(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    if path.is_dir() {
        return true;
    }
    match fs::create_dir_all(path) {
        Ok(()) => path.is_dir(),
        Err(err) => {
            tracing::debug!("create {}: {}", path.display(), err);
            false
        }
    }
}

/// `None` when the path is empty or not a readable directory.
pub fn highest_numeric_subdirectory(path: &Path) -> Option<u64> {
    if !exists_as_dir(path) {
        return None;
    }
    let entries = fs::read_dir(path).ok()?;
    let mut highest = 0;
    for entry in entries.flatten() {
        if !entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }
        if let Some(n) = parse_numeric_name(&entry.file_name().to_string_lossy()) {
            highest = highest.max(n);
        }
    }
    Some(highest)
}

pub fn next_directory_number_and_create(root: &Path) -> Result<u64> {
    if !ensure_directory(root) {
        return Err(VaultError::message(format!(
            "backup root {} is not usable",
            root.display()
        )));
    }
    let highest = highest_numeric_subdirectory(root)
        .ok_or_else(|| VaultError::message(format!("read {}: not a directory", root.display())))?;
    let exhausted =
        || VaultError::message(format!("no free backup number under {}", root.display()));
    let mut candidate = highest.checked_add(1).ok_or_else(exhausted)?;
    // create_dir fails on an existing entry, so a racing creator pushes us to the next number
    for _ in 0..16 {
        let target = root.join(candidate.to_string());
        match fs::create_dir(&target) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                candidate = candidate.checked_add(1).ok_or_else(exhausted)?;
            }
            Err(err) => {
                return Err(VaultError::message(format!(
                    "create {}: {}",
                    target.display(),
                    err
                )))
            }
        }
    }
    Err(exhausted())
}

/// Sorted names of the immediate subdirectories; empty when `path` is not a directory.
pub fn subdirectory_names(path: &Path) -> Vec<String> {
    if !exists_as_dir(path) {
        return Vec::new();
    }
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    let mut out: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    out.sort();
    out
}

/// Regular files below `path`, as sorted paths relative to it.
pub fn list_directory_as_report(path: &Path) -> Vec<String> {
    if !exists_as_dir(path) {
        return Vec::new();
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(path).follow_links(false).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(path).unwrap_or(entry.path());
        out.push(rel.to_string_lossy().to_string());
    }
    out.sort();
    out
}

pub fn delete_recursively(path: &Path) -> io::Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Copy a directory tree, skipping symlinks. Returns the number of files copied.
pub fn copy_tree(source: &Path, dest: &Path) -> io::Result<usize> {
    let mut copied = 0;
    fs::create_dir_all(dest)?;
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let src_path = entry.path();
        let rel = src_path.strip_prefix(source).unwrap_or(src_path);
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(rel);
        let ft = entry.file_type();
        if ft.is_symlink() {
            continue;
        }
        if ft.is_dir() {
            fs::create_dir_all(&target)?;
        } else if ft.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(src_path, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Remove everything inside `path`, keeping the directory itself.
pub fn clear_directory(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return fs::create_dir_all(path);
    }
    for entry in fs::read_dir(path)? {
        delete_recursively(&entry?.path())?;
    }
    Ok(())
}

pub fn backup_root_fallback() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("backups")
}
