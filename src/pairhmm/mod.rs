//! Banded pair-HMM alignment of reads against candidate haplotypes.
//!
//! The target (read) is scored against the truth (haplotype) under a
//! three-state HMM with position-dependent affine-gap penalties; scores are
//! negative-log-probability-like, so lower is better and a perfect match
//! scores 0. Evaluation is confined to an anti-diagonal band whose width
//! equals the SIMD lane count of the chosen backend.

pub mod batch;
pub mod hmm;
pub(crate) mod kernel;
pub mod scoring;
pub(crate) mod trace;
pub mod types;

pub use hmm::PairHmm;
pub use types::{Alignment, AlignmentError, AlignmentTask, GapPenalty};
