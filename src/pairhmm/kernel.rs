//! The banded anti-diagonal recurrence.
//!
//! The engine holds two interleaved generations of the three HMM state
//! vectors (`m1/i1/d1` and `m2/i2/d2`) and advances them by half steps: the
//! even half step consumes one target base, the odd half step one truth
//! base. All cross-cell data movement happens through one-word register
//! shifts, so every cell of the current anti-diagonal updates in parallel.
//!
//! Score layout and tag handling are described in [`super::scoring`]. The
//! band entry cells are seeded with `-0x8000` through a pair of init masks
//! that walk up one lane per iteration and fall out of the register after
//! `B` iterations, which is what limits alignment start offsets to the
//! first `2 * B` truth positions.

use crate::simd::vector::{PhmmSimd, MAX_LANES};

use super::scoring::{
    DELETE_TAG, INSERT_TAG, MAX_N_QUALITY, N_SCORE, PAD_TARGET_BASE, SCORE_INFINITY, TRACE_BITS,
    finalise_score,
};
use super::trace::TraceStore;

/// Gap penalty source, statically dispatched so the flat case compiles to
/// a no-op window advance.
pub(crate) trait GapModel: Copy {
    /// Window over the first `B` truth positions, pre-shifted by the trace
    /// bits.
    unsafe fn window<E: PhmmSimd>(&self) -> E::V;

    /// Advances the window by one truth position, pulling in `idx`.
    unsafe fn advance<E: PhmmSimd>(&self, current: E::V, idx: usize) -> E::V;
}

/// One penalty for every truth position.
#[derive(Clone, Copy)]
pub(crate) struct FlatGap(pub i8);

/// One penalty per truth position.
#[derive(Clone, Copy)]
pub(crate) struct TableGap<'a>(pub &'a [i8]);

impl GapModel for FlatGap {
    #[inline(always)]
    unsafe fn window<E: PhmmSimd>(&self) -> E::V {
        unsafe { E::set1_epi16((self.0 as i16) << TRACE_BITS) }
    }

    #[inline(always)]
    unsafe fn advance<E: PhmmSimd>(&self, current: E::V, _idx: usize) -> E::V {
        current
    }
}

impl GapModel for TableGap<'_> {
    #[inline(always)]
    unsafe fn window<E: PhmmSimd>(&self) -> E::V {
        let mut lanes = [0i16; MAX_LANES];
        for (lane, &penalty) in self.0[..E::LANES].iter().enumerate() {
            lanes[lane] = (penalty as i16) << TRACE_BITS;
        }
        unsafe { E::loadu_epi16(&lanes[..E::LANES]) }
    }

    #[inline(always)]
    unsafe fn advance<E: PhmmSimd>(&self, current: E::V, idx: usize) -> E::V {
        unsafe {
            E::insert_epi16(
                E::srli_si_word(current),
                (self.0[idx] as i16) << TRACE_BITS,
                E::LANES - 1,
            )
        }
    }
}

/// Working state of one alignment: six state vectors plus the sliding
/// windows over both sequences and the penalty tables.
struct BandEngine<'a, E: PhmmSimd, O: GapModel, X: GapModel> {
    truth: &'a [u8],
    target: &'a [u8],
    qualities: &'a [i8],
    gap_open: O,
    gap_extend: X,

    m1: E::V,
    i1: E::V,
    d1: E::V,
    m2: E::V,
    i2: E::V,
    d2: E::V,

    truth_win: E::V,
    target_win: E::V,
    quality_win: E::V,
    truth_nqual: E::V,
    gap_open_win: E::V,
    gap_extend_win: E::V,
    init_mask: E::V,
    init_mask2: E::V,

    nuc_prior: E::V,
    three: E::V,
    one: E::V,
}

impl<'a, E: PhmmSimd, O: GapModel, X: GapModel> BandEngine<'a, E, O, X> {
    #[inline(always)]
    unsafe fn new(
        truth: &'a [u8],
        target: &'a [u8],
        qualities: &'a [i8],
        gap_open: O,
        gap_extend: X,
        nuc_prior: i16,
    ) -> Self {
        unsafe {
            let inf = E::set1_epi16(SCORE_INFINITY);

            let mut lanes = [0i16; MAX_LANES];
            for (lane, &base) in truth[..E::LANES].iter().enumerate() {
                lanes[lane] = base as i16;
            }
            let truth_win = E::loadu_epi16(&lanes[..E::LANES]);

            // INFINITY everywhere except N positions, which cap the
            // emission penalty at N_SCORE.
            let truth_nqual = E::add_epi16(
                E::and_si(
                    E::cmpeq_epi16(truth_win, E::set1_epi16(b'N' as i16)),
                    E::set1_epi16(N_SCORE - SCORE_INFINITY),
                ),
                inf,
            );

            let zero = E::set1_epi16(0);
            BandEngine {
                truth,
                target,
                qualities,
                gap_open,
                gap_extend,
                m1: inf,
                i1: inf,
                d1: inf,
                m2: inf,
                i2: inf,
                d2: inf,
                truth_win,
                target_win: inf,
                quality_win: E::set1_epi16(MAX_N_QUALITY << TRACE_BITS),
                truth_nqual,
                gap_open_win: gap_open.window::<E>(),
                gap_extend_win: gap_extend.window::<E>(),
                init_mask: E::insert_epi16(zero, -1, 0),
                init_mask2: E::insert_epi16(zero, i16::MIN, 0),
                nuc_prior: E::set1_epi16(nuc_prior << TRACE_BITS),
                three: E::set1_epi16(3),
                one: E::set1_epi16(1),
            }
        }
    }

    /// Slides the target and quality windows one lane up and feeds in base
    /// `k`, or the pad sentinel once the read is exhausted.
    #[inline(always)]
    unsafe fn advance_target(&mut self, k: usize) {
        unsafe {
            self.target_win = E::slli_si_word(self.target_win);
            self.quality_win = E::slli_si_word(self.quality_win);
            if k < self.target.len() {
                self.target_win = E::insert_epi16(self.target_win, self.target[k] as i16, 0);
                self.quality_win = E::insert_epi16(
                    self.quality_win,
                    (self.qualities[k] as i16) << TRACE_BITS,
                    0,
                );
            } else {
                self.target_win = E::insert_epi16(self.target_win, PAD_TARGET_BASE as i16, 0);
                self.quality_win =
                    E::insert_epi16(self.quality_win, MAX_N_QUALITY << TRACE_BITS, 0);
            }
        }
    }

    /// Exit-column read: the packed cell value at the band lane from which
    /// a global alignment of the whole target can terminate at iteration
    /// `k`. The final iteration asks for the lane one past the band, which
    /// does not exist and is skipped.
    #[inline(always)]
    unsafe fn exit_cell(&self, m: E::V, k: usize) -> Option<i16> {
        if k < self.target.len() {
            return None;
        }
        let lane = k - self.target.len();
        if lane >= E::LANES {
            return None;
        }
        unsafe { Some(E::extract_epi16(m, lane)) }
    }

    /// Even half step: the target has just advanced; truth is current.
    /// Returns the exit-column value when iteration `k` has one.
    #[inline(always)]
    unsafe fn half_step_even(&mut self, k: usize) -> Option<i16> {
        unsafe {
            self.m1 = E::or_si(self.init_mask2, E::andnot_si(self.init_mask, self.m1));
            self.m2 = E::or_si(self.init_mask2, E::andnot_si(self.init_mask, self.m2));
            self.m1 = E::min_epi16(self.m1, E::min_epi16(self.i1, self.d1));

            let exit = self.exit_cell(self.m1, k);

            let mismatch = E::andnot_si(
                E::cmpeq_epi16(self.target_win, self.truth_win),
                self.quality_win,
            );
            self.m1 = E::add_epi16(self.m1, E::min_epi16(mismatch, self.truth_nqual));

            // I -> D is permitted; the open penalty comes from one truth
            // position ahead because d1 is shifted up a lane afterwards.
            self.d1 = E::min_epi16(
                E::add_epi16(self.d2, self.gap_extend_win),
                E::add_epi16(
                    E::min_epi16(self.m2, self.i2),
                    E::srli_si_word(self.gap_open_win),
                ),
            );
            self.d1 = E::insert_epi16(E::slli_si_word(self.d1), SCORE_INFINITY, 0);

            self.i1 = E::add_epi16(
                E::min_epi16(
                    E::add_epi16(self.i2, self.gap_extend_win),
                    E::add_epi16(self.m2, self.gap_open_win),
                ),
                self.nuc_prior,
            );

            exit
        }
    }

    /// Odd half step: advances the truth-side windows and masks, then runs
    /// the mirrored recurrence.
    #[inline(always)]
    unsafe fn half_step_odd(&mut self, k: usize) -> Option<i16> {
        unsafe {
            let pos = E::LANES + k;
            let (base, gap_idx) = if pos < self.truth.len() {
                (self.truth[pos], pos)
            } else {
                (b'N', self.truth.len() - 1)
            };
            self.truth_win = E::insert_epi16(
                E::srli_si_word(self.truth_win),
                base as i16,
                E::LANES - 1,
            );
            self.truth_nqual = E::insert_epi16(
                E::srli_si_word(self.truth_nqual),
                if base == b'N' { N_SCORE } else { SCORE_INFINITY },
                E::LANES - 1,
            );
            self.gap_open_win = self.gap_open.advance::<E>(self.gap_open_win, gap_idx);
            self.gap_extend_win = self.gap_extend.advance::<E>(self.gap_extend_win, gap_idx);
            self.init_mask = E::slli_si_word(self.init_mask);
            self.init_mask2 = E::slli_si_word(self.init_mask2);

            self.m2 = E::min_epi16(self.m2, E::min_epi16(self.i2, self.d2));

            let exit = self.exit_cell(self.m2, k);

            let mismatch = E::andnot_si(
                E::cmpeq_epi16(self.target_win, self.truth_win),
                self.quality_win,
            );
            self.m2 = E::add_epi16(self.m2, E::min_epi16(mismatch, self.truth_nqual));

            self.d2 = E::min_epi16(
                E::add_epi16(self.d1, self.gap_extend_win),
                E::add_epi16(E::min_epi16(self.m1, self.i1), self.gap_open_win),
            );

            self.i2 = E::insert_epi16(
                E::add_epi16(
                    E::min_epi16(
                        E::add_epi16(E::srli_si_word(self.i1), self.gap_extend_win),
                        E::add_epi16(E::srli_si_word(self.m1), self.gap_open_win),
                    ),
                    self.nuc_prior,
                ),
                SCORE_INFINITY,
                E::LANES - 1,
            );

            exit
        }
    }

    /// Packs the three state tags of one half step into a back-pointer
    /// word per lane: `(m & 3) | ((i & 3) << 2) | ((d & 3) << 6)`.
    #[inline(always)]
    unsafe fn pack_backpointers(&self, m: E::V, i: E::V, d: E::V) -> E::V {
        unsafe {
            E::or_si(
                E::or_si(
                    E::and_si(self.three, m),
                    E::slli_epi16::<{ 2 * INSERT_TAG }>(E::and_si(self.three, i)),
                ),
                E::slli_epi16::<{ 2 * DELETE_TAG }>(E::and_si(self.three, d)),
            )
        }
    }

    /// Records the even half step's back-pointers and stamps fresh state
    /// tags so the next half step carries correct predecessors forward.
    #[inline(always)]
    unsafe fn record_even(&mut self, trace: &mut TraceStore) {
        unsafe {
            let bp = self.pack_backpointers(self.m1, self.i1, self.d1);
            trace.push::<E>(bp);
            self.m1 = E::andnot_si(self.three, self.m1);
            self.i1 = E::or_si(E::andnot_si(self.three, self.i1), self.one);
            self.d1 = E::or_si(E::andnot_si(self.three, self.d1), self.three);
        }
    }

    #[inline(always)]
    unsafe fn record_odd(&mut self, trace: &mut TraceStore) {
        unsafe {
            let bp = self.pack_backpointers(self.m2, self.i2, self.d2);
            trace.push::<E>(bp);
            self.m2 = E::andnot_si(self.three, self.m2);
            self.i2 = E::or_si(E::andnot_si(self.three, self.i2), self.one);
            self.d2 = E::or_si(E::andnot_si(self.three, self.d2), self.three);
        }
    }
}

/// Score-only evaluation. Allocates nothing; returns the bias-corrected
/// minimum over the exit column (the saturated value if nothing beat
/// `INFINITY`).
///
/// # Safety
///
/// `E`'s instruction set must be available, and the shape preconditions of
/// [`super::types::AlignmentTask`] must hold for `E::LANES`.
#[inline(always)]
pub(crate) unsafe fn score_only<E: PhmmSimd, O: GapModel, X: GapModel>(
    truth: &[u8],
    target: &[u8],
    qualities: &[i8],
    gap_open: O,
    gap_extend: X,
    nuc_prior: i16,
) -> i32 {
    unsafe {
        let mut engine =
            BandEngine::<E, O, X>::new(truth, target, qualities, gap_open, gap_extend, nuc_prior);
        let mut min_raw = SCORE_INFINITY;
        for s in (0..=2 * (target.len() + E::LANES)).step_by(2) {
            let k = s / 2;
            engine.advance_target(k);
            if let Some(cell) = engine.half_step_even(k) {
                min_raw = min_raw.min(cell);
            }
            if let Some(cell) = engine.half_step_odd(k) {
                min_raw = min_raw.min(cell);
            }
        }
        finalise_score(min_raw)
    }
}

/// Scoring plus back-pointer recording. Returns the packed minimum and the
/// half-step index at which it was attained; `None` means the minimum was
/// never beaten, i.e. the scores saturated.
///
/// # Safety
///
/// As [`score_only`].
#[inline(always)]
pub(crate) unsafe fn score_and_trace<E: PhmmSimd, O: GapModel, X: GapModel>(
    truth: &[u8],
    target: &[u8],
    qualities: &[i8],
    gap_open: O,
    gap_extend: X,
    nuc_prior: i16,
    trace: &mut TraceStore,
) -> (i16, Option<usize>) {
    unsafe {
        let mut engine =
            BandEngine::<E, O, X>::new(truth, target, qualities, gap_open, gap_extend, nuc_prior);
        let mut min_raw = SCORE_INFINITY;
        let mut argmin = None;
        for s in (0..=2 * (target.len() + E::LANES)).step_by(2) {
            let k = s / 2;
            engine.advance_target(k);
            if let Some(cell) = engine.half_step_even(k) {
                if cell < min_raw {
                    min_raw = cell;
                    argmin = Some(s);
                }
            }
            engine.record_even(trace);
            if let Some(cell) = engine.half_step_odd(k) {
                if cell < min_raw {
                    min_raw = cell;
                    argmin = Some(s + 1);
                }
            }
            engine.record_odd(trace);
        }
        (min_raw, argmin)
    }
}
