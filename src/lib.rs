//! Banded SIMD pair-HMM aligner.
//!
//! Scores, and optionally traces back, the alignment of a sequencing read
//! against a candidate haplotype under a position-dependent affine-gap
//! error model. The dynamic program runs over an anti-diagonal band whose
//! width equals the lane count of the selected SIMD backend (8 for the
//! 128-bit engines, 16 for AVX2), updating every cell of a diagonal in
//! parallel with only in-register shifts.
//!
//! ```
//! use pairhmm::{AlignmentTask, GapPenalty, PairHmm, SimdBackend};
//!
//! let hmm = PairHmm::with_backend(SimdBackend::Scalar).unwrap();
//! let qualities = [40i8; 4];
//! let task = AlignmentTask {
//!     truth: b"ACGTACGTACGTACGAAAA",
//!     target: b"AAAA",
//!     qualities: &qualities,
//!     gap_open: GapPenalty::Flat(10),
//!     gap_extend: GapPenalty::Flat(1),
//!     nuc_prior: 4,
//! };
//! assert_eq!(hmm.score(&task).unwrap(), 0);
//!
//! let alignment = hmm.align(&task).unwrap();
//! assert_eq!(alignment.first_pos, 15);
//! assert_eq!(alignment.aligned_target, b"AAAA");
//! ```

#![warn(unsafe_op_in_unsafe_fn)]

pub mod pairhmm;
pub mod simd;

pub use pairhmm::{Alignment, AlignmentError, AlignmentTask, GapPenalty, PairHmm};
pub use simd::{available_backends, backend_description, detect_optimal_backend, SimdBackend};
