//! Conversion execution: scoped output artifacts, bounded concurrency and a
//! time limit around every converter call.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::config::{ConversionConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::domain::artifact::ScopedArtifact;
use crate::domain::foundation::OutputName;
use crate::ports::{ArtifactFactory, ConversionInput, Converter, ConverterError};

/// Caps how many conversions run at once and how long each may take.
#[derive(Debug, Clone)]
pub struct ConversionLimiter {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    acquire_timeout: Duration,
    run_timeout: Duration,
}

impl ConversionLimiter {
    pub fn new(max_concurrent: usize, acquire_timeout: Duration, run_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            acquire_timeout,
            run_timeout,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(
            config.max_concurrent,
            config.acquire_timeout(),
            config.timeout(),
        )
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, ConverterError> {
        match tokio::time::timeout(self.acquire_timeout, self.permits.clone().acquire_owned()).await
        {
            Ok(Ok(permit)) => Ok(permit),
            // The semaphore is never closed; treat it like a full pool.
            Ok(Err(_)) | Err(_) => {
                warn!(
                    max_concurrent = self.max_concurrent,
                    waited_ms = self.acquire_timeout.as_millis() as u64,
                    "No conversion slot available"
                );
                Err(ConverterError::Busy {
                    waited: self.acquire_timeout,
                })
            }
        }
    }

    /// Runs `converter` once a slot is free, failing if it exceeds the time
    /// limit. A timed-out tool process is killed when its future is dropped.
    pub async fn run(
        &self,
        converter: &dyn Converter,
        input: &ConversionInput,
        output: &std::path::Path,
    ) -> Result<(), ConverterError> {
        let _permit = self.acquire().await?;
        match tokio::time::timeout(self.run_timeout, converter.convert(input, output)).await {
            Ok(result) => result,
            Err(_) => Err(ConverterError::TimedOut {
                after: self.run_timeout,
            }),
        }
    }
}

/// Runs one conversion into a freshly created scoped artifact.
#[derive(Clone)]
pub struct ConversionService {
    artifacts: Arc<dyn ArtifactFactory>,
    limiter: ConversionLimiter,
    max_upload_bytes: u64,
}

impl ConversionService {
    pub fn new(artifacts: Arc<dyn ArtifactFactory>, limiter: ConversionLimiter) -> Self {
        Self {
            artifacts,
            limiter,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Caps the size of documents accepted as conversion input.
    pub fn with_upload_limit(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn artifacts(&self) -> &Arc<dyn ArtifactFactory> {
        &self.artifacts
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Converts `input` into `name.extension`.
    ///
    /// The returned artifact is owned by the caller and deleted when dropped.
    /// On failure the partially written output is deleted before returning.
    pub async fn convert(
        &self,
        converter: &dyn Converter,
        input: &ConversionInput,
        name: &OutputName,
        extension: &str,
    ) -> Result<ScopedArtifact, ConverterError> {
        let artifact = self.artifacts.create(name.as_str(), extension)?;
        debug!(
            converter = converter.name(),
            input = %input,
            output = %artifact.path().display(),
            "Starting conversion"
        );

        self.limiter.run(converter, input, artifact.path()).await?;

        info!(
            converter = converter.name(),
            output = artifact.file_name(),
            "Conversion finished"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::TempArtifactFactory;
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct WriteConverter(&'static str);

    #[async_trait]
    impl Converter for WriteConverter {
        fn name(&self) -> &str {
            "write"
        }

        async fn convert(&self, _: &ConversionInput, output: &Path) -> Result<(), ConverterError> {
            tokio::fs::write(output, self.0).await?;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct SlowConverter(Duration);

    #[async_trait]
    impl Converter for SlowConverter {
        fn name(&self) -> &str {
            "slow"
        }

        async fn convert(&self, _: &ConversionInput, _: &Path) -> Result<(), ConverterError> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingConverter;

    #[async_trait]
    impl Converter for FailingConverter {
        fn name(&self) -> &str {
            "failing"
        }

        async fn convert(&self, _: &ConversionInput, _: &Path) -> Result<(), ConverterError> {
            Err(ConverterError::parse("json", "unexpected end of input"))
        }
    }

    fn input() -> ConversionInput {
        ConversionInput::File("/nonexistent/source.json".into())
    }

    fn service(root: &Path, limiter: ConversionLimiter) -> ConversionService {
        ConversionService::new(Arc::new(TempArtifactFactory::new(root)), limiter)
    }

    fn limiter() -> ConversionLimiter {
        ConversionLimiter::new(2, Duration::from_millis(200), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_convert_names_output_after_custom_name() {
        let root = TempDir::new().unwrap();
        let service = service(root.path(), limiter());
        let name = OutputName::parse("out").unwrap();

        let artifact = service
            .convert(&WriteConverter("a: 1\n"), &input(), &name, "yml")
            .await
            .unwrap();

        assert_eq!(artifact.file_name(), "out.yml");
        assert_eq!(std::fs::read_to_string(artifact.path()).unwrap(), "a: 1\n");
    }

    #[tokio::test]
    async fn test_failed_conversion_leaves_nothing_behind() {
        let root = TempDir::new().unwrap();
        let service = service(root.path(), limiter());
        let name = OutputName::parse("out").unwrap();

        let result = service
            .convert(&FailingConverter, &input(), &name, "yml")
            .await;

        assert!(matches!(result, Err(ConverterError::Parse { .. })));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_slow_conversion_times_out() {
        let root = TempDir::new().unwrap();
        let limiter = ConversionLimiter::new(1, Duration::from_secs(1), Duration::from_millis(20));
        let service = service(root.path(), limiter);
        let name = OutputName::parse("slow").unwrap();

        let result = service
            .convert(&SlowConverter(Duration::from_secs(5)), &input(), &name, "pdf")
            .await;

        assert!(matches!(result, Err(ConverterError::TimedOut { .. })));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_full_pool_reports_busy() {
        let limiter = ConversionLimiter::new(1, Duration::from_millis(20), Duration::from_secs(5));
        let held = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), 0);

        let result = limiter
            .run(&WriteConverter("x"), &input(), Path::new("/nonexistent/out"))
            .await;

        assert!(matches!(result, Err(ConverterError::Busy { .. })));
        drop(held);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn test_permit_is_released_after_run() {
        let root = TempDir::new().unwrap();
        let limiter = limiter();
        let service = service(root.path(), limiter.clone());
        let name = OutputName::parse("out").unwrap();

        let _artifact = service
            .convert(&WriteConverter("{}"), &input(), &name, "json")
            .await
            .unwrap();

        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test]
    async fn test_invalid_artifact_name_surfaces_as_artifact_error() {
        let root = TempDir::new().unwrap();
        let service = service(root.path(), limiter());
        let name = OutputName::parse("out").unwrap();

        let result = service
            .convert(&WriteConverter("x"), &input(), &name, "a/b")
            .await;

        assert!(matches!(result, Err(ConverterError::Artifact(_))));
    }
}
