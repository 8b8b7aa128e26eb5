//! Process-wide font registration.
//!
//! Text layout in every document uses the faces registered here. The
//! database is copy-on-write: each layout takes an `Arc` snapshot, and a
//! registration made afterwards only affects later layouts.

use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use usvg::fontdb;

use crate::error::{NovaError, NovaResult};

fn registry() -> &'static RwLock<Arc<fontdb::Database>> {
    static REGISTRY: OnceLock<RwLock<Arc<fontdb::Database>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Arc::new(fontdb::Database::new())))
}

/// Snapshot of the registered fonts, shared with usvg options.
pub(crate) fn database() -> Arc<fontdb::Database> {
    let guard = registry().read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&guard)
}

fn with_database_mut<R>(f: impl FnOnce(&mut fontdb::Database) -> R) -> R {
    let mut guard = registry().write().unwrap_or_else(PoisonError::into_inner);
    f(Arc::make_mut(&mut guard))
}

/// Register every face in a font file under `family`.
///
/// Returns the number of faces registered.
///
/// # Errors
///
/// Returns [`NovaError::FileRead`] if the file cannot be read and
/// [`NovaError::FontLoad`] if it contains no usable face.
pub fn add_font_face_from_file(
    family: &str,
    bold: bool,
    italic: bool,
    path: impl AsRef<Path>,
) -> NovaResult<usize> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| NovaError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    add_font_face_from_data(family, bold, italic, data)
}

/// Register every face in in-memory font data under `family`.
///
/// The faces are renamed to `family` and given a bold/normal weight and an
/// italic/normal style, so SVG text can select them by that family name.
///
/// # Errors
///
/// Returns [`NovaError::FontLoad`] if the data contains no usable face.
pub fn add_font_face_from_data(
    family: &str,
    bold: bool,
    italic: bool,
    data: Vec<u8>,
) -> NovaResult<usize> {
    if family.trim().is_empty() {
        return Err(NovaError::FontLoad("font family name is empty".to_string()));
    }

    let registered = with_database_mut(|db| {
        let ids = db.load_font_source(fontdb::Source::Binary(Arc::new(data)));
        let mut registered = 0;
        for id in ids {
            let Some(mut info) = db.face(id).cloned() else {
                continue;
            };
            db.remove_face(id);
            info.families = vec![(family.to_string(), fontdb::Language::English_UnitedStates)];
            info.weight = if bold {
                fontdb::Weight::BOLD
            } else {
                fontdb::Weight::NORMAL
            };
            info.style = if italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            };
            db.push_face_info(info);
            registered += 1;
        }
        registered
    });

    if registered == 0 {
        return Err(NovaError::FontLoad(format!(
            "no usable font face for family {family:?}"
        )));
    }

    tracing::debug!(family, bold, italic, faces = registered, "registered font faces");
    Ok(registered)
}

/// Register every face in a font file under the family names it declares.
///
/// Returns the number of faces registered.
///
/// # Errors
///
/// Returns [`NovaError::FileRead`] if the file cannot be read and
/// [`NovaError::FontLoad`] if it contains no usable face.
pub fn load_font_file(path: impl AsRef<Path>) -> NovaResult<usize> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| NovaError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let added = with_database_mut(|db| {
        db.load_font_source(fontdb::Source::Binary(Arc::new(data)))
            .len()
    });
    if added == 0 {
        return Err(NovaError::FontLoad(format!(
            "no usable font face in {}",
            path.display()
        )));
    }

    tracing::debug!(path = %path.display(), faces = added, "loaded font file");
    Ok(added)
}

/// Register every font found in a directory (recursively), keeping their own family names.
///
/// Returns the number of faces added.
pub fn load_fonts_dir(dir: impl AsRef<Path>) -> usize {
    let dir = dir.as_ref();
    let added = with_database_mut(|db| {
        let before = db.len();
        db.load_fonts_dir(dir);
        db.len().saturating_sub(before)
    });
    tracing::debug!(dir = %dir.display(), faces = added, "loaded font directory");
    added
}

/// Register the fonts installed on the system.
///
/// Returns the number of faces added.
pub fn load_system_fonts() -> usize {
    let added = with_database_mut(|db| {
        let before = db.len();
        db.load_system_fonts();
        db.len().saturating_sub(before)
    });
    tracing::debug!(faces = added, "loaded system fonts");
    added
}

/// Number of registered faces.
#[must_use]
pub fn font_face_count() -> usize {
    database().len()
}

/// Sorted, de-duplicated family names of all registered faces.
#[must_use]
pub fn font_families() -> Vec<String> {
    let db = database();
    let mut families: Vec<String> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .collect();
    families.sort();
    families.dedup();
    families
}

/// Drop every registered face.
pub fn clear_font_faces() {
    with_database_mut(|db| *db = fontdb::Database::new());
    tracing::debug!("cleared font registry");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_data_is_rejected() {
        let result = add_font_face_from_data("Broken", false, false, b"not a font".to_vec());
        assert!(matches!(result, Err(NovaError::FontLoad(_))));
    }

    #[test]
    fn test_empty_family_is_rejected() {
        let result = add_font_face_from_data("  ", true, false, Vec::new());
        assert!(matches!(result, Err(NovaError::FontLoad(_))));
    }

    #[test]
    fn test_missing_font_file() {
        let result = add_font_face_from_file("Arial", false, false, "/nonexistent/font.ttf");
        assert!(matches!(result, Err(NovaError::FileRead { .. })));
    }

    #[test]
    fn test_font_file_without_faces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bogus.ttf");
        std::fs::write(&path, b"definitely not a font").expect("write");
        assert!(matches!(load_font_file(&path), Err(NovaError::FontLoad(_))));
    }

    #[test]
    fn test_empty_directory_adds_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(load_fonts_dir(dir.path()), 0);
    }

    #[test]
    fn test_families_are_sorted_and_unique() {
        let families = font_families();
        let mut sorted = families.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(families, sorted);
    }
}
