//! Batch Orchestrator
//!
//! Collects up to [`MAX_BATCH_SIZE`] independent images, then runs one
//! operation over all of them in a single remote call. Results land
//! atomically in a [`BatchResult`]; a failed job exposes nothing partial.
//! Batch runs never write to the edit history.

use crate::error::EditorError;
use chrono::{DateTime, Utc};
use pixlab_document::BinaryRef;
use pixlab_remote::{
    BatchItem, BatchOperation, BatchRequest, Parameters, RemoteService, MAX_BATCH_SIZE,
};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use ulid::Ulid;

/// Unique batch job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(Ulid);

impl JobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job_{}", self.0)
    }
}

/// Outcome of [`BatchOrchestrator::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Number of files added to the pending set
    pub accepted: usize,
    /// Files refused because the set was full, in submission order
    pub rejected: Vec<String>,
}

impl SubmitOutcome {
    /// Whether any file was refused for capacity
    #[inline]
    #[must_use]
    pub fn capacity_exceeded(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Ordered, all-or-nothing result of one batch job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub job_id: JobId,
    pub operation: BatchOperation,
    pub items: Vec<BatchItem>,
    pub completed_at: DateTime<Utc>,
}

impl BatchResult {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(filename, payload)` pairs in input order
    pub fn per_file(&self) -> impl Iterator<Item = (&str, &BinaryRef)> {
        self.items.iter().map(|i| (i.filename.as_str(), &i.image))
    }

    /// Write every item into `dir`, one file each
    ///
    /// Names are reduced to their final path component; an item whose name
    /// has none falls back to `processed_<n>.png`.
    ///
    /// # Errors
    /// Any I/O failure creating the directory or writing a file
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let name = Path::new(&item.filename)
                    .file_name()
                    .map_or_else(|| format!("processed_{}.png", i + 1), |n| n.to_string_lossy().into_owned());
                let path = dir.join(name);
                std::fs::write(&path, item.image.bytes())?;
                Ok(path)
            })
            .collect()
    }
}

/// A validated job waiting for its remote call
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub job_id: JobId,
    pub request: BatchRequest,
}

/// Pending input set plus the last result
#[derive(Debug, Default)]
pub struct BatchOrchestrator {
    pending: Vec<BinaryRef>,
    result: Option<BatchResult>,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add files to the pending set
    ///
    /// Files beyond the remaining capacity are rejected, not queued.
    pub fn submit(&mut self, files: impl IntoIterator<Item = BinaryRef>) -> SubmitOutcome {
        let mut accepted = 0;
        let mut rejected = Vec::new();
        for file in files {
            if self.pending.len() < MAX_BATCH_SIZE {
                self.pending.push(file);
                accepted += 1;
            } else {
                rejected.push(file.name().to_string());
            }
        }
        if rejected.is_empty() {
            info!(accepted, pending = self.pending.len(), "batch files added");
        } else {
            warn!(accepted, rejected = rejected.len(), "batch capacity exceeded");
        }
        SubmitOutcome { accepted, rejected }
    }

    /// Remove one pending file
    ///
    /// # Errors
    /// `BatchIndex` outside the pending set
    pub fn remove(&mut self, index: usize) -> Result<BinaryRef, EditorError> {
        if index >= self.pending.len() {
            return Err(EditorError::BatchIndex {
                index,
                len: self.pending.len(),
            });
        }
        Ok(self.pending.remove(index))
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> &[BinaryRef] {
        &self.pending
    }

    #[inline]
    #[must_use]
    pub fn result(&self) -> Option<&BatchResult> {
        self.result.as_ref()
    }

    /// Validate a run over the pending set
    ///
    /// # Errors
    /// `BatchEmpty` with nothing pending, `InvalidRequest` for bad parameters
    pub fn prepare(
        &self,
        operation: BatchOperation,
        params: &Parameters,
    ) -> Result<BatchJob, EditorError> {
        if self.pending.is_empty() {
            return Err(EditorError::BatchEmpty);
        }
        let request = BatchRequest::new(operation, params, self.pending.clone())?;
        Ok(BatchJob {
            job_id: JobId::new(),
            request,
        })
    }

    /// Issue the aggregated remote call
    ///
    /// # Errors
    /// `Remote` or `Decode` for the whole job
    pub async fn execute(
        remote: &dyn RemoteService,
        job: BatchJob,
    ) -> Result<BatchResult, EditorError> {
        let operation = job.request.operation;
        let count = job.request.inputs.len();
        info!(job = %job.job_id, %operation, count, "batch dispatching");
        let items = remote.process_batch(job.request).await.map_err(|source| {
            warn!(job = %job.job_id, error = %source, "batch failed");
            EditorError::from_remote(format!("Batch {operation}"), source)
        })?;
        Ok(BatchResult {
            job_id: job.job_id,
            operation,
            items,
            completed_at: Utc::now(),
        })
    }

    /// Store a finished job's result and consume the pending set
    pub fn complete(&mut self, result: BatchResult) -> &BatchResult {
        info!(job = %result.job_id, items = result.len(), "batch complete");
        self.pending.clear();
        self.result.insert(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixlab_test_utils::{sample_images, FakeRemote, Failure};
    use pretty_assertions::assert_eq;

    #[test]
    fn twelve_files_yield_ten_accepted() {
        let mut batch = BatchOrchestrator::new();
        let outcome = batch.submit(sample_images(12));
        assert_eq!(outcome.accepted, 10);
        assert_eq!(outcome.rejected, vec!["img_10.png", "img_11.png"]);
        assert!(outcome.capacity_exceeded());
        assert_eq!(batch.pending().len(), 10);
    }

    #[test]
    fn clipping_uses_remaining_capacity() {
        let mut batch = BatchOrchestrator::new();
        batch.submit(sample_images(7));
        let outcome = batch.submit(sample_images(5));
        assert_eq!(outcome.accepted, 3);
        assert_eq!(outcome.rejected.len(), 2);
    }

    #[test]
    fn remove_and_clear() {
        let mut batch = BatchOrchestrator::new();
        batch.submit(sample_images(3));
        assert_eq!(batch.remove(1).unwrap().name(), "img_1.png");
        assert_eq!(batch.remove(5).unwrap_err(), EditorError::BatchIndex { index: 5, len: 2 });
        batch.clear_pending();
        assert!(batch.pending().is_empty());
    }

    #[test]
    fn empty_run_is_precondition() {
        let err = BatchOrchestrator::new()
            .prepare(BatchOperation::Blur, &Parameters::new())
            .unwrap_err();
        assert_eq!(err, EditorError::BatchEmpty);
    }

    #[tokio::test]
    async fn success_replaces_result_and_consumes_pending() {
        let fake = FakeRemote::new();
        let mut batch = BatchOrchestrator::new();
        batch.submit(sample_images(3));

        let job = batch.prepare(BatchOperation::Grayscale, &Parameters::new()).unwrap();
        let result = BatchOrchestrator::execute(&fake, job).await.unwrap();
        batch.complete(result);

        let result = batch.result().unwrap();
        let names: Vec<_> = result.per_file().map(|(name, _)| name).collect();
        assert_eq!(names, ["processed_1_img_0.png", "processed_2_img_1.png", "processed_3_img_2.png"]);
        assert!(batch.pending().is_empty());
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_pending_and_previous_result() {
        let fake = FakeRemote::new();
        fake.fail_next(Failure::Decode);
        let mut batch = BatchOrchestrator::new();
        batch.submit(sample_images(2));

        let job = batch.prepare(BatchOperation::Blur, &Parameters::new()).unwrap();
        let err = BatchOrchestrator::execute(&fake, job).await.unwrap_err();

        assert!(err.is_remote());
        assert_eq!(err.label(), Some("Batch blur"));
        assert_eq!(batch.pending().len(), 2);
        assert!(batch.result().is_none());
    }

    #[tokio::test]
    async fn write_to_dir_strips_directories() {
        let fake = FakeRemote::new();
        let mut batch = BatchOrchestrator::new();
        batch.submit(sample_images(2));
        let job = batch.prepare(BatchOperation::Sharpen, &Parameters::new()).unwrap();
        let mut result = BatchOrchestrator::execute(&fake, job).await.unwrap();
        result.items[0].filename = "../../escape.png".into();

        let dir = tempfile::tempdir().unwrap();
        let written = result.write_to_dir(dir.path()).unwrap();

        assert_eq!(written[0], dir.path().join("escape.png"));
        assert_eq!(written[1], dir.path().join("processed_2_img_1.png"));
        assert_eq!(std::fs::read(&written[1]).unwrap(), result.items[1].image.bytes());
    }

    proptest::proptest! {
        #[test]
        fn pending_never_exceeds_capacity(
            sizes in proptest::collection::vec(0usize..8, 0..6),
            removals in proptest::collection::vec(0usize..12, 0..4),
        ) {
            let mut batch = BatchOrchestrator::new();
            for (round, size) in sizes.iter().enumerate() {
                let before = batch.pending().len();
                let outcome = batch.submit(sample_images(*size));
                proptest::prop_assert_eq!(outcome.accepted + outcome.rejected.len(), *size);
                proptest::prop_assert_eq!(batch.pending().len(), before + outcome.accepted);
                proptest::prop_assert!(batch.pending().len() <= MAX_BATCH_SIZE);
                if let Some(index) = removals.get(round) {
                    let len = batch.pending().len();
                    proptest::prop_assert_eq!(batch.remove(*index).is_ok(), *index < len);
                }
            }
        }
    }
}
