use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{AssemblyError, AssemblyResult};

/// Confines client-supplied file references to the trusted audio and asset directories.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    audio_dir: PathBuf,
    assets_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(audio_dir: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            assets_dir: assets_dir.into(),
        }
    }

    pub async fn resolve_audio(&self, reference: &str) -> AssemblyResult<PathBuf> {
        resolve_in(reference, &self.audio_dir, "audio file").await
    }

    pub async fn resolve_asset(&self, reference: &str, what: &'static str) -> AssemblyResult<PathBuf> {
        resolve_in(reference, &self.assets_dir, what).await
    }
}

/// Last path component of a reference, treating both `/` and `\` as separators so a
/// Windows-style reference cannot smuggle a directory through on unix.
pub fn file_name_component(reference: &str) -> Option<&str> {
    let name = reference
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    match name {
        "" | "." | ".." => None,
        name if name.contains('\0') => None,
        name => Some(name),
    }
}

/// Resolves only the file name of `reference` against `trusted_dir`. The result is
/// canonical and must still live under the canonical trusted directory, which also
/// rules out symlinks pointing elsewhere.
pub async fn resolve_in(
    reference: &str,
    trusted_dir: &Path,
    what: &'static str,
) -> AssemblyResult<PathBuf> {
    let Some(name) = file_name_component(reference) else {
        return Err(AssemblyError::missing(what, trusted_dir.join(reference.trim())));
    };
    let candidate = trusted_dir.join(name);

    let root = fs::canonicalize(trusted_dir)
        .await
        .map_err(|_| AssemblyError::missing(what, &candidate))?;
    let resolved = fs::canonicalize(&candidate)
        .await
        .map_err(|_| AssemblyError::missing(what, &candidate))?;

    if !resolved.starts_with(&root) {
        return Err(AssemblyError::missing(what, &candidate));
    }

    let is_file = fs::metadata(&resolved)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(AssemblyError::missing(what, &candidate));
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_components_are_discarded() {
        assert_eq!(file_name_component("../../etc/passwd"), Some("passwd"));
        assert_eq!(file_name_component("/audio/abc.mp3"), Some("abc.mp3"));
        assert_eq!(file_name_component("..\\..\\boot.ini"), Some("boot.ini"));
        assert_eq!(file_name_component("clip.mp4"), Some("clip.mp4"));
        assert_eq!(file_name_component(".."), None);
        assert_eq!(file_name_component("assets/"), None);
        assert_eq!(file_name_component("   "), None);
    }

    #[tokio::test]
    async fn traversal_resolves_inside_trusted_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("passwd"), b"not really").await.unwrap();

        let resolved = resolve_in("../../etc/passwd", dir.path(), "asset")
            .await
            .unwrap();
        let root = fs::canonicalize(dir.path()).await.unwrap();
        assert_eq!(resolved, root.join("passwd"));
    }

    #[tokio::test]
    async fn traversal_to_absent_file_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_in("../../etc/passwd", dir.path(), "asset")
            .await
            .unwrap_err();
        match err {
            AssemblyError::MissingInput { path, .. } => {
                assert_eq!(path, dir.path().join("passwd"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn directories_are_not_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).await.unwrap();
        let err = resolve_in("nested", dir.path(), "asset").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_escaping_trusted_dir_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        let trusted = tempfile::tempdir().unwrap();
        let target = outside.path().join("secret.mp3");
        fs::write(&target, b"x").await.unwrap();
        std::os::unix::fs::symlink(&target, trusted.path().join("link.mp3")).unwrap();

        let err = resolve_in("link.mp3", trusted.path(), "audio file")
            .await
            .unwrap_err();
        assert!(matches!(err, AssemblyError::MissingInput { .. }));
    }
}
