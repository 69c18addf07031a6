//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs:
//! identify a source (dimensions + decoded format) and encode a derivative.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically
//! linked. Tests use the recording `MockBackend` below.

use super::params::{DerivativeParams, SourceFormat};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub format: SourceFormat,
}

impl SourceInfo {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Sync` because a single backend is shared by all derivative encodes of an
/// image, which run on the rayon pool.
pub trait ImageBackend: Sync {
    /// Read dimensions and the content-detected format of a source image.
    fn identify(&self, path: &Path) -> Result<SourceInfo, BackendError>;

    /// Decode the source, resize if needed, and write the derivative.
    fn encode(&self, params: &DerivativeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{Encoding, Quality};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that records operations and writes placeholder outputs.
    ///
    /// Sources are looked up by file name; an unknown name fails `identify`.
    /// Outputs whose file name is listed in `failing_outputs` fail `encode`.
    /// Each successful encode writes `width` bytes so manifest sizes are
    /// distinguishable. Uses Mutex so it is Sync for rayon.
    #[derive(Default)]
    pub struct MockBackend {
        pub sources: Mutex<HashMap<String, SourceInfo>>,
        pub failing_outputs: Mutex<Vec<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Encode {
            source: String,
            output: String,
            width: u32,
            height: u32,
            encoding: Encoding,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_source(
            self,
            file_name: &str,
            width: u32,
            height: u32,
            format: SourceFormat,
        ) -> Self {
            self.sources.lock().unwrap().insert(
                file_name.to_string(),
                SourceInfo {
                    width,
                    height,
                    format,
                },
            );
            self
        }

        pub fn failing_output(self, file_name: &str) -> Self {
            self.failing_outputs
                .lock()
                .unwrap()
                .push(file_name.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Encode operations only, sorted by output path (encodes run concurrently).
        pub fn encoded_outputs(&self) -> Vec<String> {
            let mut outputs: Vec<String> = self
                .get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Encode { output, .. } => Some(output),
                    RecordedOp::Identify(_) => None,
                })
                .collect();
            outputs.sort();
            outputs
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<SourceInfo, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.sources
                .lock()
                .unwrap()
                .get(&file_name(path))
                .copied()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock source".to_string()))
        }

        fn encode(&self, params: &DerivativeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                encoding: params.encoding,
                quality: params.quality.value(),
            });

            if self
                .failing_outputs
                .lock()
                .unwrap()
                .contains(&file_name(&params.output))
            {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock encode failure: {}",
                    params.output.display()
                )));
            }
            std::fs::write(&params.output, vec![0u8; params.width as usize])?;
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::new().with_source("image.jpg", 800, 600, SourceFormat::Jpeg);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.dimensions(), (800, 600));
        assert_eq!(result.format, SourceFormat::Jpeg);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_identify_unknown_source_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/test/missing.png")).is_err());
    }

    #[test]
    fn mock_encode_writes_placeholder() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out-small.avif");
        let backend = MockBackend::new();

        backend
            .encode(&DerivativeParams {
                source: "/source.jpg".into(),
                output: output.clone(),
                width: 40,
                height: 30,
                encoding: Encoding::Avif,
                quality: Quality::new(80),
            })
            .unwrap();

        assert_eq!(std::fs::metadata(&output).unwrap().len(), 40);
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Encode {
                width: 40,
                height: 30,
                encoding: Encoding::Avif,
                quality: 80,
                ..
            }
        ));
    }

    #[test]
    fn mock_encode_failure_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("bad.avif");
        let backend = MockBackend::new().failing_output("bad.avif");

        let result = backend.encode(&DerivativeParams {
            source: "/source.jpg".into(),
            output: output.clone(),
            width: 10,
            height: 10,
            encoding: Encoding::Avif,
            quality: Quality::default(),
        });

        assert!(result.is_err());
        assert!(!output.exists());
    }
}
