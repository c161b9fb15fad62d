//! Artifact persistence seam
//!
//! The exporter only needs three operations against its destination:
//! prepare the target, write bytes, and report the written size. Keeping
//! the seam this narrow lets local filesystem and object storage back the
//! same orchestration.

use async_trait::async_trait;
use std::path::Path;

/// Persists exported artifacts and reports their size
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Ensure the output target exists, creating it if absent
    async fn prepare_target(&self, target: &Path) -> std::io::Result<()>;

    /// Persist `bytes` at `location`
    async fn write(&self, location: &Path, bytes: &[u8]) -> std::io::Result<()>;

    /// Size in bytes of a previously written artifact
    async fn size(&self, location: &Path) -> std::io::Result<u64>;
}

/// Local filesystem sink
#[derive(Debug, Default)]
pub struct FilesystemSink;

#[async_trait]
impl ArtifactSink for FilesystemSink {
    async fn prepare_target(&self, target: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(target).await
    }

    async fn write(&self, location: &Path, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(location, bytes).await
    }

    async fn size(&self, location: &Path) -> std::io::Result<u64> {
        let metadata = tokio::fs::metadata(location).await?;
        Ok(metadata.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_filesystem_sink_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("stems");
        let sink = FilesystemSink;

        sink.prepare_target(&target).await.unwrap();
        let location = target.join("violin.wav");
        sink.write(&location, b"payload").await.unwrap();
        assert_eq!(sink.size(&location).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_prepare_target_fails_over_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let clash = temp_dir.path().join("not_a_dir");
        tokio::fs::write(&clash, b"file").await.unwrap();

        let sink = FilesystemSink;
        assert!(sink.prepare_target(&clash).await.is_err());
    }
}
