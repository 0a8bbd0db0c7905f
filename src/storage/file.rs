use super::StoragePort;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One JSON file per key under a directory, optionally gzip-compressed
#[derive(Clone, Debug)]
pub struct FileStore {
    directory: PathBuf,
    compress: bool,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>, compress: bool) -> Self {
        Self {
            directory: directory.into(),
            compress,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn plain_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }

    fn gzip_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json.gz", key))
    }

    fn read_file(path: &Path, compressed: bool) -> Result<Option<String>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", path.display()))
            }
        };

        let mut contents = String::new();
        if compressed {
            GzDecoder::new(file)
                .read_to_string(&mut contents)
                .with_context(|| format!("Failed to decompress {}", path.display()))?;
        } else {
            let mut file = file;
            file.read_to_string(&mut contents)
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }
        Ok(Some(contents))
    }
}

impl StoragePort for FileStore {
    /// Reads the gzip file if present, otherwise the plain one
    fn read(&self, key: &str) -> Result<Option<String>> {
        if let Some(contents) = Self::read_file(&self.gzip_path(key), true)? {
            return Ok(Some(contents));
        }
        Self::read_file(&self.plain_path(key), false)
    }

    /// Writes to a temporary file, fsyncs, then renames over the target
    fn write(&self, key: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.directory).with_context(|| {
            format!("Failed to create storage directory {}", self.directory.display())
        })?;

        let (path, stale) = if self.compress {
            (self.gzip_path(key), self.plain_path(key))
        } else {
            (self.plain_path(key), self.gzip_path(key))
        };
        let tmp_path = self.directory.join(format!("{}.tmp", key));

        {
            let tmp_file = File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;

            let file = if self.compress {
                let mut encoder = GzEncoder::new(tmp_file, Compression::default());
                encoder
                    .write_all(contents.as_bytes())
                    .context("Failed to write compressed collection")?;
                encoder.finish().context("Failed to finish compression")?
            } else {
                let mut file = tmp_file;
                file.write_all(contents.as_bytes())
                    .context("Failed to write collection")?;
                file
            };

            file.sync_all().context("Failed to sync collection file to disk")?;
        }

        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to rename {} to {}", tmp_path.display(), path.display()))?;

        // A leftover file in the other format would shadow or outlive this one
        if stale.exists() {
            fs::remove_file(&stale)
                .with_context(|| format!("Failed to remove stale {}", stale.display()))?;
        }

        debug!(key, path = %path.display(), bytes = contents.len(), "Collection written");
        Ok(())
    }
}
