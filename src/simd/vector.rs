//! The vector capability required by the band engine.
//!
//! A backend exposes `LANES` lanes of signed 16-bit integers and a small set
//! of lane-wise operations. The band engine is written once against this
//! trait and monomorphised per backend, so the trait deliberately stays
//! narrow: broadcast, window load/store, lane access, add/min/max, the
//! bitwise quartet, equality masks, whole-register one-word shifts, and
//! per-lane bit shifts.
//!
//! All operations are pure and must be bit-for-bit identical across
//! backends of the same width; `ScalarEngine` is the reference the SIMD
//! engines are held to.

/// Widest band any engine provides. Sizing constant for stack buffers.
pub const MAX_LANES: usize = 16;

/// A SIMD backend over `LANES` lanes of `i16`.
///
/// # Safety
///
/// Implementations backed by CPU intrinsics require the matching instruction
/// set to be present; callers must verify availability (at backend selection
/// time) before invoking any method. The scalar engines have no such
/// requirement.
pub trait PhmmSimd: Copy {
    /// Number of 16-bit lanes; equals the band width of the aligner.
    const LANES: usize;

    /// The register type.
    type V: Copy;

    /// All lanes set to `x`.
    unsafe fn set1_epi16(x: i16) -> Self::V;

    /// Lane `i` set to `lanes[i]`. `lanes` must hold at least `LANES` values.
    unsafe fn loadu_epi16(lanes: &[i16]) -> Self::V;

    /// Writes lane `i` to `out[i]`. `out` must hold at least `LANES` slots.
    unsafe fn storeu_epi16(v: Self::V, out: &mut [i16]);

    /// Reads one lane. `lane` must be in `0..LANES`.
    unsafe fn extract_epi16(v: Self::V, lane: usize) -> i16;

    /// Replaces one lane. `lane` must be in `0..LANES`.
    unsafe fn insert_epi16(v: Self::V, x: i16, lane: usize) -> Self::V;

    /// Lane-wise wrapping add.
    unsafe fn add_epi16(a: Self::V, b: Self::V) -> Self::V;

    /// Lane-wise signed minimum.
    unsafe fn min_epi16(a: Self::V, b: Self::V) -> Self::V;

    /// Lane-wise signed maximum.
    unsafe fn max_epi16(a: Self::V, b: Self::V) -> Self::V;

    /// Lane-wise equality: all-ones on equal lanes, zero otherwise.
    unsafe fn cmpeq_epi16(a: Self::V, b: Self::V) -> Self::V;

    /// Bitwise `a & b`.
    unsafe fn and_si(a: Self::V, b: Self::V) -> Self::V;

    /// Bitwise `a | b`.
    unsafe fn or_si(a: Self::V, b: Self::V) -> Self::V;

    /// Bitwise `!a & b`.
    unsafe fn andnot_si(a: Self::V, b: Self::V) -> Self::V;

    /// Whole-register shift by one 16-bit word toward higher lanes; lane 0
    /// is zero-filled.
    unsafe fn slli_si_word(v: Self::V) -> Self::V;

    /// Whole-register shift by one 16-bit word toward lower lanes; the top
    /// lane is zero-filled.
    unsafe fn srli_si_word(v: Self::V) -> Self::V;

    /// Per-lane logical left shift by `BITS`.
    unsafe fn slli_epi16<const BITS: i32>(v: Self::V) -> Self::V;

    /// Per-lane logical right shift by `BITS`.
    unsafe fn srli_epi16<const BITS: i32>(v: Self::V) -> Self::V;
}
