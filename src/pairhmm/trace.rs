//! Back-pointer storage and alignment reconstruction.
//!
//! The band engine appends one packed back-pointer vector per half step.
//! The store keeps them as a flat table of 16-bit words indexed by
//! `(half_step, lane)` rather than reinterpreting the vector buffer, so a
//! walk that strays outside the recorded band is caught instead of reading
//! a neighbouring record.

use smallvec::SmallVec;

use crate::simd::vector::{PhmmSimd, MAX_LANES};

use super::scoring::{predecessor_tag, DELETE_TAG, GAP, INSERT_TAG, MATCH_TAG};

/// Inline capacity of the word buffer; covers a band-8 trace for truths of
/// up to 120 bases before spilling to the heap.
const INLINE_TRACE_WORDS: usize = 2048;

/// One packed back-pointer word per `(half_step, lane)` cell.
pub(crate) struct TraceStore {
    words: SmallVec<[i16; INLINE_TRACE_WORDS]>,
    lanes: usize,
}

impl TraceStore {
    pub(crate) fn new(lanes: usize, half_steps: usize) -> Self {
        let mut words = SmallVec::new();
        words.reserve(lanes * half_steps);
        TraceStore { words, lanes }
    }

    pub(crate) fn lanes(&self) -> usize {
        self.lanes
    }

    /// Number of half steps recorded so far.
    pub(crate) fn recorded_steps(&self) -> usize {
        self.words.len() / self.lanes
    }

    /// Appends the back-pointer vector of one half step.
    ///
    /// # Safety
    ///
    /// `E`'s instruction set must be available and `E::LANES` must equal
    /// the store's lane count.
    pub(crate) unsafe fn push<E: PhmmSimd>(&mut self, v: E::V) {
        debug_assert_eq!(E::LANES, self.lanes);
        let mut buf = [0i16; MAX_LANES];
        unsafe { E::storeu_epi16(v, &mut buf[..E::LANES]) };
        self.words.extend_from_slice(&buf[..E::LANES]);
    }

    /// Predecessor tag of `state` at `(half_step, lane)`, or `None` when
    /// the position lies outside the recorded band.
    fn tag(&self, half_step: i64, lane: i64, state: i32) -> Option<u8> {
        if half_step < 0 || lane < 0 || lane >= self.lanes as i64 {
            return None;
        }
        let index = half_step as usize * self.lanes + lane as usize;
        let word = *self.words.get(index)?;
        Some(predecessor_tag(word, state))
    }
}

/// A reconstructed alignment, rows still in walk (reversed) order until
/// [`walk_back`] flips them.
pub(crate) struct Reconstruction {
    pub first_pos: usize,
    pub truth_row: Vec<u8>,
    pub target_row: Vec<u8>,
}

/// Walks the back-pointers from the arg-min half step back to the band
/// entry, emitting one alignment column per move. Returns `None` when the
/// walk leaves the recorded band or reads the reserved tag value 2 — both
/// only happen when packed scores overflowed.
pub(crate) fn walk_back(
    trace: &TraceStore,
    truth: &[u8],
    target: &[u8],
    seed_step: usize,
) -> Option<Reconstruction> {
    let band = trace.lanes() as i64;
    let mut s = seed_step as i64;
    let mut i = s / 2 - target.len() as i64;
    let mut y = target.len() as i64;
    let mut x = s - y;

    if i < 0 || i >= band || x < 0 || x > truth.len() as i64 {
        return None;
    }

    let mut truth_row = Vec::with_capacity(target.len() + trace.lanes());
    let mut target_row = Vec::with_capacity(target.len() + trace.lanes());

    // The exit cell holds a dummy match transition.
    let mut state = trace.tag(s, i, MATCH_TAG)? as i32;
    s -= 2;

    while y > 0 {
        let next = trace.tag(s, i, state)? as i32;
        match state {
            MATCH_TAG => {
                if x <= 0 {
                    return None;
                }
                s -= 2;
                x -= 1;
                y -= 1;
                truth_row.push(truth[x as usize]);
                target_row.push(target[y as usize]);
            }
            INSERT_TAG => {
                i += s & 1;
                s -= 1;
                y -= 1;
                truth_row.push(GAP);
                target_row.push(target[y as usize]);
            }
            DELETE_TAG => {
                if x <= 0 {
                    return None;
                }
                s -= 1;
                i -= s & 1;
                x -= 1;
                truth_row.push(truth[x as usize]);
                target_row.push(GAP);
            }
            _ => return None, // reserved tag 2: the trace is corrupt
        }
        state = next;
    }

    truth_row.reverse();
    target_row.reverse();
    Some(Reconstruction {
        first_pos: x as usize,
        truth_row,
        target_row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::scalar::ScalarEngine;

    type E8 = ScalarEngine<8>;

    #[test]
    fn push_and_read_roundtrip() {
        let mut store = TraceStore::new(8, 4);
        let lanes: [i16; 8] = [
            0b0100_0001, // m=I, i=M, d=I
            0b1100_0111, // m=D, i=I, d=D
            0, 0, 0, 0, 0, 0,
        ];
        unsafe {
            let v = E8::loadu_epi16(&lanes);
            store.push::<E8>(v);
        }
        assert_eq!(store.recorded_steps(), 1);
        assert_eq!(store.tag(0, 0, MATCH_TAG), Some(1));
        assert_eq!(store.tag(0, 0, INSERT_TAG), Some(0));
        assert_eq!(store.tag(0, 1, MATCH_TAG), Some(3));
        assert_eq!(store.tag(0, 1, INSERT_TAG), Some(1));
        assert_eq!(store.tag(0, 1, DELETE_TAG), Some(3));
    }

    #[test]
    fn out_of_band_reads_are_rejected() {
        let store = TraceStore::new(8, 1);
        assert_eq!(store.tag(-1, 0, MATCH_TAG), None);
        assert_eq!(store.tag(0, -1, MATCH_TAG), None);
        assert_eq!(store.tag(0, 8, MATCH_TAG), None);
        assert_eq!(store.tag(0, 0, MATCH_TAG), None); // nothing recorded yet
    }
}
