use std::fs;
use std::io;
use std::path::Path;

use csn_setup_core::{FileEntry, OverwritePolicy};
use semver::Version;

use crate::checksum::sha256_file_hex;
use crate::errors::{classify_create_error, classify_replace_error, io_context, InstallError};
use crate::layout::InstallLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub dest: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Copied { files: Vec<StagedFile> },
    SkippedCurrent,
}

/// Copies one manifest entry from the payload into the install root.
///
/// `Always` entries replace the destination unconditionally; the main
/// executable uses this so the binary on disk is always the one just
/// shipped. `IfNewerVersion` entries are skipped when a previous receipt
/// records a version at least as new as the manifest's.
///
/// Recursive entries mirror the whole source subtree, creating
/// intermediate directories. The mirror is additive: destination files
/// with no source counterpart are left in place, never deleted.
pub fn stage_entry(
    layout: &InstallLayout,
    payload_root: &Path,
    entry: &FileEntry,
    version: &Version,
    previous_version: Option<&Version>,
) -> Result<StageOutcome, InstallError> {
    if entry.overwrite == OverwritePolicy::IfNewerVersion {
        if let Some(previous) = previous_version {
            if previous >= version {
                return Ok(StageOutcome::SkippedCurrent);
            }
        }
    }

    let source = payload_root.join(&entry.source);
    if !source.exists() {
        return Err(InstallError::SourceMissing { path: source });
    }

    let dest = layout.resolve(&entry.dest)?;
    let mut files = Vec::new();
    if entry.recursive {
        if !source.is_dir() {
            return Err(InstallError::SourceMissing { path: source });
        }
        mirror_tree(&source, &dest, &entry.dest, &mut files)?;
    } else {
        copy_file_replacing(&source, &dest)?;
        files.push(StagedFile {
            dest: entry.dest.clone(),
            sha256: sha256_file_hex(&dest)?,
        });
    }

    Ok(StageOutcome::Copied { files })
}

fn mirror_tree(
    src: &Path,
    dst: &Path,
    dest_rel: &str,
    files: &mut Vec<StagedFile>,
) -> Result<(), InstallError> {
    fs::create_dir_all(dst).map_err(|err| classify_create_error(dst, err))?;
    for entry in
        fs::read_dir(src).map_err(|err| io_context(err, format!("failed to read {}", src.display())))?
    {
        let entry =
            entry.map_err(|err| io_context(err, format!("failed to read {}", src.display())))?;
        let src_path = entry.path();
        let name = entry.file_name();
        let dst_path = dst.join(&name);
        let child_rel = format!("{}/{}", dest_rel, name.to_string_lossy());

        let metadata = fs::symlink_metadata(&src_path)
            .map_err(|err| io_context(err, format!("failed to stat {}", src_path.display())))?;
        if metadata.is_dir() {
            mirror_tree(&src_path, &dst_path, &child_rel, files)?;
            continue;
        }

        copy_file_replacing(&src_path, &dst_path)?;
        files.push(StagedFile {
            dest: child_rel,
            sha256: sha256_file_hex(&dst_path)?,
        });
    }
    Ok(())
}

fn copy_file_replacing(src: &Path, dst: &Path) -> Result<(), InstallError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|err| classify_create_error(parent, err))?;
    }

    if let Err(err) = fs::copy(src, dst) {
        if err.kind() == io::ErrorKind::NotFound && !src.exists() {
            return Err(InstallError::SourceMissing {
                path: src.to_path_buf(),
            });
        }
        return Err(classify_replace_error(dst, err));
    }
    Ok(())
}
