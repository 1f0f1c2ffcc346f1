use super::fetch::Fetch;
use crate::error::{FileRole, LoadError};
use futures_util::future::try_join_all;
use std::path::PathBuf;

/// Fetches every CA file concurrently.
///
/// The returned buffers follow `paths` order whatever order the reads finish
/// in. The first failing read becomes the result; reads still pending at that
/// point are dropped and their outcome is never observed.
pub async fn assemble_chain<F: Fetch>(
    fetcher: &F,
    paths: &[PathBuf],
) -> Result<Vec<Vec<u8>>, LoadError> {
    try_join_all(paths.iter().map(|path| fetcher.fetch(FileRole::Ca, path))).await
}
