//! Resource blob store
//!
//! A trace references auxiliary data (vertex data, textures, shader sources)
//! out of a single binary file shipped next to the generated replay
//! executable. The file is read fully into memory once, before the frame
//! loop starts, and served thereafter as read-only byte ranges. The engine
//! imposes no structure on the bytes; interpretation belongs to the recorded
//! operations.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Error loading the resource blob.
///
/// Both variants are fatal: without the blob, recorded operations that
/// reference it cannot be replayed faithfully.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The resource file could not be located, opened, or read.
    #[error("resource file unavailable: {path}: {source}")]
    Unavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The blob allocation failed.
    #[error("cannot allocate {len} bytes for resource blob")]
    OutOfMemory { len: u64 },
}

/// The trace's binary resource file, loaded once and immutable for the run.
#[derive(Debug)]
pub struct ResourceBlob {
    data: Vec<u8>,
}

impl ResourceBlob {
    /// Load the resource file with the given name from the directory of the
    /// running executable.
    ///
    /// Fails with [`BlobError::Unavailable`] if the file cannot be opened or
    /// read and [`BlobError::OutOfMemory`] if the allocation fails. No
    /// partial state is retained on failure.
    pub fn load(file_name: &str) -> Result<Self, BlobError> {
        let path = Self::resource_path(file_name)?;
        Self::load_from(&path)
    }

    /// Load a resource blob from an explicit path.
    ///
    /// `load` resolves the conventional executable-adjacent location and
    /// delegates here; tools and tests may point at any file directly.
    pub fn load_from(path: &Path) -> Result<Self, BlobError> {
        let unavailable = |source| BlobError::Unavailable {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(unavailable)?;
        let len = file.metadata().map_err(unavailable)?.len();

        let mut data = Vec::new();
        data.try_reserve_exact(len as usize)
            .map_err(|_| BlobError::OutOfMemory { len })?;
        file.read_to_end(&mut data).map_err(unavailable)?;

        tracing::info!("loaded resource blob {} ({} bytes)", path.display(), data.len());
        Ok(Self { data })
    }

    /// Resolve the conventional location of a resource file: the same
    /// directory as the running executable.
    pub fn resource_path(file_name: &str) -> Result<PathBuf, BlobError> {
        let exe = std::env::current_exe().map_err(|source| BlobError::Unavailable {
            path: PathBuf::from(file_name),
            source,
        })?;
        // current_exe always has a parent directory on the platforms the
        // engine runs on; fall back to the bare file name if it somehow
        // does not.
        Ok(match exe.parent() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        })
    }

    /// Read `length` bytes starting at `offset`.
    ///
    /// Returns `Some` iff the full range lies within the blob; never returns
    /// partial data.
    pub fn read(&self, offset: usize, length: usize) -> Option<&[u8]> {
        self.data.get(offset..offset.checked_add(length)?)
    }

    /// Total blob length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
