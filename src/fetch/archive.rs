//! Archive extraction and layout normalization.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

/// Extract every entry of the zip file at `archive` into `dest`.
///
/// Entries overlay existing content; files not in the archive are left alone.
pub fn extract(archive: &Path, dest: &Path) -> Result<(), ZipError> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    zip.extract(dest)
}

/// Move `src` to `dst`, merging directories and replacing files.
fn move_entry(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() && dst.is_dir() {
        let children: Vec<_> = fs::read_dir(src)?.collect::<Result<_, _>>()?;
        for child in children {
            move_entry(&child.path(), &dst.join(child.file_name()))?;
        }
        return fs::remove_dir(src);
    }

    match fs::symlink_metadata(dst) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(dst)?,
        Ok(_) => fs::remove_file(dst)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    fs::rename(src, dst)
}

/// Hoist everything under `dest/<folder>` into `dest` and remove the folder.
///
/// Returns `false` without touching anything when the folder is absent.
pub fn flatten(dest: &Path, folder: &str) -> io::Result<bool> {
    let nested = dest.join(folder);
    if !nested.is_dir() {
        log::info!("No {} folder in the archive, keeping its layout.", folder);
        return Ok(false);
    }

    log::info!("Moving files out of {} folder...", folder);
    let entries: Vec<_> = fs::read_dir(&nested)?.collect::<Result<_, _>>()?;
    for entry in entries {
        let target = dest.join(entry.file_name());
        if target == nested {
            // A child sharing the folder's name would land on its parent.
            log::warn!(
                "Leaving {} in place: it has the same name as its parent folder",
                entry.path().display()
            );
            continue;
        }
        move_entry(&entry.path(), &target)?;
    }

    if let Err(e) = fs::remove_dir(&nested) {
        log::warn!("Could not remove {}: {}", nested.display(), e);
    }
    Ok(true)
}
