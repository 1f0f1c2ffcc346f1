use crate::error::{FileRole, LoadError};
use std::future::Future;
use std::path::Path;

/// Reads one whole file for a load operation.
///
/// Implementations make a single attempt per call and report failures as
/// [`LoadError::FileRead`] carrying the role and path they were given.
pub trait Fetch: Send + Sync {
    fn fetch(
        &self,
        role: FileRole,
        path: &Path,
    ) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send;
}

/// Reads files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetcher;

impl Fetch for FsFetcher {
    async fn fetch(&self, role: FileRole, path: &Path) -> Result<Vec<u8>, LoadError> {
        tokio::fs::read(path)
            .await
            .map_err(|source| LoadError::FileRead {
                role,
                path: path.to_path_buf(),
                source,
            })
    }
}
