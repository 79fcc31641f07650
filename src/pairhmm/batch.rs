//! Parallel scoring of independent alignment tasks.
//!
//! A variant caller evaluates every read against every candidate
//! haplotype; the tasks share nothing mutable, so they parallelise freely.
//! Each individual alignment stays single-threaded.

use rayon::prelude::*;

use super::hmm::PairHmm;
use super::types::{AlignmentError, AlignmentTask};

impl PairHmm {
    /// Scores every task, in parallel, preserving order. Equivalent to
    /// calling [`PairHmm::score`] element-wise.
    pub fn score_batch(
        &self,
        tasks: &[AlignmentTask],
    ) -> Vec<Result<i32, AlignmentError>> {
        tasks.par_iter().map(|task| self.score(task)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairhmm::types::GapPenalty;
    use crate::simd::SimdBackend;

    #[test]
    fn batch_matches_single_calls() {
        let hmm = PairHmm::with_backend(SimdBackend::Scalar).unwrap();
        let quals = [40i8; 4];
        let truths: [&[u8]; 3] = [
            b"ACGTACGTACGTACGAAAA",
            b"ACGTACGTACGTACGAATA",
            b"ACGTACGAAGCTACGTACG",
        ];
        let tasks: Vec<AlignmentTask> = truths
            .iter()
            .map(|truth| AlignmentTask {
                truth,
                target: b"AAAA",
                qualities: &quals,
                gap_open: GapPenalty::Flat(90),
                gap_extend: GapPenalty::Flat(1),
                nuc_prior: 4,
            })
            .collect();

        let batch = hmm.score_batch(&tasks);
        for (task, result) in tasks.iter().zip(&batch) {
            assert_eq!(*result, hmm.score(task));
        }
    }

    #[test]
    fn batch_reports_per_task_errors() {
        let hmm = PairHmm::with_backend(SimdBackend::Scalar).unwrap();
        let quals = [40i8; 4];
        let good = AlignmentTask {
            truth: b"ACGTACGTACGTACGAAAA",
            target: b"AAAA",
            qualities: &quals,
            gap_open: GapPenalty::Flat(10),
            gap_extend: GapPenalty::Flat(1),
            nuc_prior: 4,
        };
        let mut bad = good;
        bad.truth = b"ACGT";

        let results = hmm.score_batch(&[good, bad]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
