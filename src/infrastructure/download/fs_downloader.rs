//! Save clips into a local directory

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::application::ports::{ClipDownloader, ClipSource, RoomError};

/// Downloader writing into a fixed directory
pub struct FsDownloader {
    dir: PathBuf,
}

impl FsDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's download directory, or the working directory
    pub fn default_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// `name`, then `-1`, `-2`, ... appended to its stem
    fn candidates<'a>(dir: &'a Path, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (name, None),
        };
        std::iter::once(dir.join(name)).chain((1u32..).map(move |n| match ext {
            Some(ext) => dir.join(format!("{stem}-{n}.{ext}")),
            None => dir.join(format!("{stem}-{n}")),
        }))
    }

    /// Claim the first free candidate. Creation is atomic, so two saves
    /// racing for one name end up in different files.
    async fn create_unique(dir: &Path, name: &str) -> std::io::Result<(PathBuf, File)> {
        for path in Self::candidates(dir, name) {
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(ErrorKind::AlreadyExists.into())
    }
}

impl Default for FsDownloader {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

#[async_trait]
impl ClipDownloader for FsDownloader {
    async fn save(&self, source: &ClipSource, suggested_name: &str) -> Result<PathBuf, RoomError> {
        let data = match source {
            ClipSource::File(path) => fs::read(path)
                .await
                .map_err(|e| RoomError::Download(format!("{}: {}", path.display(), e)))?,
            ClipSource::Inline { data, .. } => data.as_ref().clone(),
        };

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RoomError::Download(e.to_string()))?;

        let (path, mut file) = Self::create_unique(&self.dir, suggested_name)
            .await
            .map_err(|e| RoomError::Download(e.to_string()))?;
        let written = async {
            file.write_all(&data).await?;
            file.flush().await
        };
        written
            .await
            .map_err(|e| RoomError::Download(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), bytes = data.len(), "clip saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn saves_inline_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = FsDownloader::new(dir.path().join("downloads"));
        let source = ClipSource::Inline {
            mime: "audio/wav".into(),
            data: Arc::new(vec![1, 2, 3]),
        };

        let path = downloader.save(&source, "voice-message-1.wav").await.unwrap();
        assert_eq!(path, dir.path().join("downloads/voice-message-1.wav"));
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = FsDownloader::new(dir.path());
        let source = ClipSource::Inline {
            mime: "audio/wav".into(),
            data: Arc::new(vec![9]),
        };

        let first = downloader.save(&source, "clip.wav").await.unwrap();
        let second = downloader.save(&source, "clip.wav").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "clip-1.wav");
    }

    #[tokio::test]
    async fn existing_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.wav"), b"old").unwrap();
        let downloader = FsDownloader::new(dir.path());
        let source = ClipSource::Inline {
            mime: "audio/wav".into(),
            data: Arc::new(vec![7]),
        };

        let path = downloader.save(&source, "clip.wav").await.unwrap();
        assert_eq!(path.file_name().unwrap(), "clip-1.wav");
        assert_eq!(std::fs::read(dir.path().join("clip.wav")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn concurrent_saves_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = FsDownloader::new(dir.path());
        let source = ClipSource::Inline {
            mime: "audio/wav".into(),
            data: Arc::new(vec![1, 2]),
        };

        let (a, b, c, d) = tokio::join!(
            downloader.save(&source, "clip.wav"),
            downloader.save(&source, "clip.wav"),
            downloader.save(&source, "clip.wav"),
            downloader.save(&source, "clip.wav"),
        );
        let mut paths = vec![a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()];
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 4);
        for path in paths {
            assert_eq!(std::fs::read(path).unwrap(), vec![1, 2]);
        }
    }

    #[test]
    fn candidates_without_extension() {
        let dir = Path::new("/d");
        let names: Vec<_> = FsDownloader::candidates(dir, "clip").take(3).collect();
        assert_eq!(
            names,
            vec![dir.join("clip"), dir.join("clip-1"), dir.join("clip-2")]
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = FsDownloader::new(dir.path());
        let source = ClipSource::File(dir.path().join("gone.flac"));
        assert!(matches!(
            downloader.save(&source, "x.flac").await,
            Err(RoomError::Download(_))
        ));
    }
}
