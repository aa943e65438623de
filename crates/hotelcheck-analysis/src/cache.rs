//! Process-wide embedding cache keyed by exact text.
//!
//! Each distinct text owns one slot. A slot is filled at most once by a
//! successful computation; concurrent misses on the same text wait on the
//! same slot instead of issuing duplicate calls. A failed slot is released
//! once nobody waits on it, so the next request computes again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;

use crate::error::AnalysisError;
use crate::types::EmbeddingVector;

type Slot = Arc<OnceCell<EmbeddingVector>>;

#[derive(Debug, Default)]
pub struct EmbeddingCache {
    slots: Mutex<HashMap<String, Slot>>,
    expected_dimensions: Option<usize>,
}

impl EmbeddingCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that only serves vectors of `dimensions` length.
    ///
    /// Entries of another length (left over from a model change) are treated
    /// as misses and replaced; freshly computed vectors of another length are
    /// rejected with [`AnalysisError::DimensionMismatch`] and not stored.
    #[must_use]
    pub fn with_expected_dimensions(dimensions: usize) -> Self {
        Self {
            slots: Mutex::default(),
            expected_dimensions: Some(dimensions),
        }
    }

    /// Return the cached embedding for `text`, or run `compute` and cache its
    /// result.
    ///
    /// `compute` receives an owned copy of `text` and is not invoked on a hit.
    ///
    /// # Errors
    ///
    /// Propagates the error from `compute` unchanged, or returns
    /// [`AnalysisError::DimensionMismatch`] if the computed vector does not
    /// have the expected length. Nothing is cached in either case.
    pub async fn get_or_compute<F, Fut>(
        &self,
        text: &str,
        compute: F,
    ) -> Result<EmbeddingVector, AnalysisError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<EmbeddingVector, AnalysisError>>,
    {
        let slot = self.slot_for(text);

        if let Some(cached) = slot.get() {
            tracing::debug!(chars = text.chars().count(), "embedding cache hit");
            return Ok(cached.clone());
        }

        let owned = text.to_owned();
        let result = slot
            .get_or_try_init(|| async move {
                let vector = compute(owned).await?;
                self.check_dimensions(&vector)?;
                Ok::<_, AnalysisError>(vector)
            })
            .await
            .cloned();

        if result.is_err() {
            self.release_empty_slot(text, &slot);
        }
        result
    }

    /// Number of texts with a stored embedding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_for(&self, text: &str) -> Slot {
        let mut slots = self.lock();

        let stale = slots
            .get(text)
            .and_then(|slot| slot.get())
            .is_some_and(|vector| self.check_dimensions(vector).is_err());
        if stale {
            tracing::warn!(
                expected = ?self.expected_dimensions,
                "cached embedding has unexpected dimensions; recomputing"
            );
            slots.remove(text);
        }

        Arc::clone(
            slots
                .entry(text.to_owned())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    /// Drop the slot for `text` after a failed computation, unless another
    /// caller is still waiting on it or it has since been filled.
    fn release_empty_slot(&self, text: &str, slot: &Slot) {
        let mut slots = self.lock();
        // One reference in the map plus the caller's own.
        let unused = slots.get(text).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(current) == 2
        });
        if unused {
            slots.remove(text);
        }
    }

    fn check_dimensions(&self, vector: &EmbeddingVector) -> Result<(), AnalysisError> {
        match self.expected_dimensions {
            Some(expected) if vector.dimensions() != expected => {
                Err(AnalysisError::DimensionMismatch {
                    left: vector.dimensions(),
                    right: expected,
                })
            }
            _ => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
