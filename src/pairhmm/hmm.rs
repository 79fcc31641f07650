//! The public aligner façade.
//!
//! `PairHmm` pins a SIMD backend at construction time (runtime detection by
//! default) and validates input shapes against that backend's band size
//! before entering the main loop. The per-backend entry points below are
//! thin monomorphic wrappers over the generic kernel; the AVX2 pair carries
//! `#[target_feature]` so the engine's intrinsics inline into an
//! AVX2-enabled region.

use crate::simd::scalar::ScalarEngine;
use crate::simd::vector::PhmmSimd;
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use crate::simd::Engine128;
#[cfg(target_arch = "x86_64")]
use crate::simd::Engine256;
use crate::simd::{backend_description, detect_optimal_backend, SimdBackend};

use super::kernel::{self, FlatGap, TableGap};
use super::scoring::finalise_score;
use super::trace::{self, TraceStore};
use super::types::{Alignment, AlignmentError, AlignmentTask, GapPenalty};

/// A pair-HMM aligner bound to one SIMD backend.
///
/// Construction is cheap and the value is `Copy`-sized; distinct calls
/// share no mutable state, so one `PairHmm` may be used from many threads.
#[derive(Debug, Clone, Copy)]
pub struct PairHmm {
    backend: SimdBackend,
}

impl PairHmm {
    /// Binds the widest backend the CPU supports.
    pub fn new() -> Self {
        let backend = detect_optimal_backend();
        log::debug!("pair-HMM aligner using {}", backend_description(backend));
        PairHmm { backend }
    }

    /// Binds an explicit backend, failing if the CPU cannot run it.
    pub fn with_backend(backend: SimdBackend) -> Result<Self, AlignmentError> {
        if !backend.is_available() {
            return Err(AlignmentError::BackendUnavailable(backend));
        }
        Ok(PairHmm { backend })
    }

    pub fn backend(&self) -> SimdBackend {
        self.backend
    }

    /// The band width callers must shape their inputs for:
    /// `truth.len() == target.len() + 2 * band_size() - 1`.
    pub fn band_size(&self) -> usize {
        self.backend.band_size()
    }

    /// Minimum score of any global alignment of the target against the
    /// truth within the anti-diagonal band. Side-effect free and
    /// allocation free; a saturated value is returned when the packed
    /// scores overflowed.
    pub fn score(&self, task: &AlignmentTask) -> Result<i32, AlignmentError> {
        self.validate(task)?;
        // Backend availability was checked at construction.
        let score = match self.backend {
            SimdBackend::Scalar => unsafe { score_with::<ScalarEngine<8>>(task) },
            SimdBackend::ScalarWide => unsafe { score_with::<ScalarEngine<16>>(task) },
            #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
            SimdBackend::Simd128 => unsafe { score_with::<Engine128>(task) },
            #[cfg(target_arch = "x86_64")]
            SimdBackend::Simd256 => unsafe { score_simd256(task) },
        };
        Ok(score)
    }

    /// As [`score`](Self::score), but also recovers the gapped alignment
    /// and the truth offset where it begins. Score overflow is reported as
    /// [`AlignmentError::ScoreOverflow`].
    pub fn align(&self, task: &AlignmentTask) -> Result<Alignment, AlignmentError> {
        self.validate(task)?;
        match self.backend {
            SimdBackend::Scalar => unsafe { align_with::<ScalarEngine<8>>(task) },
            SimdBackend::ScalarWide => unsafe { align_with::<ScalarEngine<16>>(task) },
            #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
            SimdBackend::Simd128 => unsafe { align_with::<Engine128>(task) },
            #[cfg(target_arch = "x86_64")]
            SimdBackend::Simd256 => unsafe { align_simd256(task) },
        }
    }

    fn validate(&self, task: &AlignmentTask) -> Result<(), AlignmentError> {
        let band_size = self.band_size();
        let truth_len = task.truth.len();
        let target_len = task.target.len();

        if truth_len <= band_size {
            return Err(AlignmentError::TruthTooShort {
                truth_len,
                band_size,
            });
        }
        if truth_len != target_len + 2 * band_size - 1 {
            return Err(AlignmentError::ShapeMismatch {
                truth_len,
                target_len,
                band_size,
            });
        }
        if task.qualities.len() != target_len {
            return Err(AlignmentError::QualityLengthMismatch {
                qualities: task.qualities.len(),
                target_len,
            });
        }
        for penalties in [task.gap_open, task.gap_extend] {
            if let GapPenalty::PerBase(table) = penalties {
                if table.len() != truth_len {
                    return Err(AlignmentError::GapPenaltyLengthMismatch {
                        penalties: table.len(),
                        truth_len,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for PairHmm {
    fn default() -> Self {
        Self::new()
    }
}

/// Monomorphises the kernel over the four gap-model combinations.
macro_rules! with_gap_models {
    ($task:expr, |$open:ident, $extend:ident| $body:expr) => {
        match ($task.gap_open, $task.gap_extend) {
            (GapPenalty::Flat(open), GapPenalty::Flat(extend)) => {
                let $open = FlatGap(open);
                let $extend = FlatGap(extend);
                $body
            }
            (GapPenalty::Flat(open), GapPenalty::PerBase(extend)) => {
                let $open = FlatGap(open);
                let $extend = TableGap(extend);
                $body
            }
            (GapPenalty::PerBase(open), GapPenalty::Flat(extend)) => {
                let $open = TableGap(open);
                let $extend = FlatGap(extend);
                $body
            }
            (GapPenalty::PerBase(open), GapPenalty::PerBase(extend)) => {
                let $open = TableGap(open);
                let $extend = TableGap(extend);
                $body
            }
        }
    };
}

#[inline(always)]
unsafe fn score_with<E: PhmmSimd>(task: &AlignmentTask) -> i32 {
    unsafe {
        with_gap_models!(task, |open, extend| {
            kernel::score_only::<E, _, _>(
                task.truth,
                task.target,
                task.qualities,
                open,
                extend,
                task.nuc_prior,
            )
        })
    }
}

#[inline(always)]
unsafe fn align_with<E: PhmmSimd>(task: &AlignmentTask) -> Result<Alignment, AlignmentError> {
    unsafe {
        let half_steps = 2 * (task.truth.len() + E::LANES);
        let mut store = TraceStore::new(E::LANES, half_steps);
        let (min_raw, argmin) = with_gap_models!(task, |open, extend| {
            kernel::score_and_trace::<E, _, _>(
                task.truth,
                task.target,
                task.qualities,
                open,
                extend,
                task.nuc_prior,
                &mut store,
            )
        });
        let seed = argmin.ok_or(AlignmentError::ScoreOverflow)?;
        let walk = trace::walk_back(&store, task.truth, task.target, seed)
            .ok_or(AlignmentError::ScoreOverflow)?;
        Ok(Alignment {
            score: finalise_score(min_raw),
            first_pos: walk.first_pos,
            aligned_truth: walk.truth_row,
            aligned_target: walk.target_row,
        })
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn score_simd256(task: &AlignmentTask) -> i32 {
    unsafe { score_with::<Engine256>(task) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn align_simd256(task: &AlignmentTask) -> Result<Alignment, AlignmentError> {
    unsafe { align_with::<Engine256>(task) }
}
