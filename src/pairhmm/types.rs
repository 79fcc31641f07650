//! Input and output types of the aligner.

use std::fmt;

/// Affine-gap penalty source: one value for the whole truth sequence, or
/// one signed 8-bit value per truth position. Per-position values must be
/// non-negative and small enough that accumulated penalties stay below the
/// packed score range (`0x7800 >> 2`).
#[derive(Debug, Clone, Copy)]
pub enum GapPenalty<'a> {
    /// The same penalty at every truth position.
    Flat(i8),
    /// One penalty per truth position; length must equal the truth length.
    PerBase(&'a [i8]),
}

/// One alignment problem: a read (`target`) scored against a candidate
/// haplotype (`truth`).
///
/// Shape requirements, checked by [`PairHmm`](super::hmm::PairHmm) against
/// its band size `B`:
///
/// - `truth.len() > B`
/// - `truth.len() == target.len() + 2 * B - 1`
/// - `qualities.len() == target.len()`
/// - per-base gap penalties have length `truth.len()`
///
/// `qualities` are Phred-like per-base emission penalties; `nuc_prior` is a
/// single non-negative insertion prior.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentTask<'a> {
    pub truth: &'a [u8],
    pub target: &'a [u8],
    pub qualities: &'a [i8],
    pub gap_open: GapPenalty<'a>,
    pub gap_extend: GapPenalty<'a>,
    pub nuc_prior: i16,
}

/// A recovered gapped alignment.
///
/// `aligned_truth` and `aligned_target` are equal-length rows over the
/// input alphabets plus `b'-'`; stripping gaps from `aligned_target` yields
/// the whole target, stripping gaps from `aligned_truth` yields the truth
/// substring starting at `first_pos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub score: i32,
    /// 0-based offset in the truth where the alignment begins.
    pub first_pos: usize,
    pub aligned_truth: Vec<u8>,
    pub aligned_target: Vec<u8>,
}

/// Errors reported by the aligner façade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    /// The truth sequence does not cover even one band.
    TruthTooShort { truth_len: usize, band_size: usize },

    /// `truth.len() != target.len() + 2 * band_size - 1`.
    ShapeMismatch {
        truth_len: usize,
        target_len: usize,
        band_size: usize,
    },

    /// Base-quality vector length differs from the target length.
    QualityLengthMismatch { qualities: usize, target_len: usize },

    /// Per-base gap penalty length differs from the truth length.
    GapPenaltyLengthMismatch { penalties: usize, truth_len: usize },

    /// The requested backend cannot run on this CPU.
    BackendUnavailable(crate::simd::SimdBackend),

    /// Packed scores saturated; the recovered trace is unusable. Retry with
    /// smaller penalties or a shorter read.
    ScoreOverflow,
}

impl fmt::Display for AlignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentError::TruthTooShort {
                truth_len,
                band_size,
            } => {
                write!(
                    f,
                    "truth length {} does not exceed the band size {}",
                    truth_len, band_size
                )
            }
            AlignmentError::ShapeMismatch {
                truth_len,
                target_len,
                band_size,
            } => {
                write!(
                    f,
                    "truth length {} != target length {} + 2 * {} - 1",
                    truth_len, target_len, band_size
                )
            }
            AlignmentError::QualityLengthMismatch {
                qualities,
                target_len,
            } => {
                write!(
                    f,
                    "{} base qualities for a target of length {}",
                    qualities, target_len
                )
            }
            AlignmentError::GapPenaltyLengthMismatch {
                penalties,
                truth_len,
            } => {
                write!(
                    f,
                    "{} per-base gap penalties for a truth of length {}",
                    penalties, truth_len
                )
            }
            AlignmentError::BackendUnavailable(backend) => {
                write!(f, "backend {:?} is not available on this CPU", backend)
            }
            AlignmentError::ScoreOverflow => {
                write!(f, "packed score overflow; alignment not recoverable")
            }
        }
    }
}

impl std::error::Error for AlignmentError {}
