//! 128-bit backend: SSE2 on x86_64, NEON on aarch64.
//!
//! Both instruction sets are baseline for their architecture, so this
//! engine needs no runtime feature detection. Eight lanes of `i16` give the
//! aligner its narrow band width.
//!
//! The per-arch differences are kept inside the method bodies so the rest
//! of the crate sees a single `Engine128` type.

use super::vector::PhmmSimd;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64 as arch;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64 as arch;

/// Register type: `__m128i` on x86_64, a transparent wrapper over
/// `int16x8_t` on aarch64.
#[cfg(target_arch = "x86_64")]
pub type V128 = arch::__m128i;

#[cfg(target_arch = "aarch64")]
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct V128(pub arch::int16x8_t);

/// The 128-bit engine (SSE2 / NEON), band width 8.
#[derive(Debug, Clone, Copy)]
pub struct Engine128;

impl PhmmSimd for Engine128 {
    const LANES: usize = 8;
    type V = V128;

    #[inline(always)]
    unsafe fn set1_epi16(x: i16) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_set1_epi16(x) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vdupq_n_s16(x)) }
        }
    }

    #[inline(always)]
    unsafe fn loadu_epi16(lanes: &[i16]) -> Self::V {
        debug_assert!(lanes.len() >= 8);
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_loadu_si128(lanes.as_ptr() as *const arch::__m128i) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vld1q_s16(lanes.as_ptr())) }
        }
    }

    #[inline(always)]
    unsafe fn storeu_epi16(v: Self::V, out: &mut [i16]) {
        debug_assert!(out.len() >= 8);
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_storeu_si128(out.as_mut_ptr() as *mut arch::__m128i, v) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { arch::vst1q_s16(out.as_mut_ptr(), v.0) }
        }
    }

    #[inline(always)]
    unsafe fn extract_epi16(v: Self::V, lane: usize) -> i16 {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe {
                match lane {
                    0 => arch::_mm_extract_epi16::<0>(v) as i16,
                    1 => arch::_mm_extract_epi16::<1>(v) as i16,
                    2 => arch::_mm_extract_epi16::<2>(v) as i16,
                    3 => arch::_mm_extract_epi16::<3>(v) as i16,
                    4 => arch::_mm_extract_epi16::<4>(v) as i16,
                    5 => arch::_mm_extract_epi16::<5>(v) as i16,
                    6 => arch::_mm_extract_epi16::<6>(v) as i16,
                    _ => arch::_mm_extract_epi16::<7>(v) as i16,
                }
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe {
                match lane {
                    0 => arch::vgetq_lane_s16::<0>(v.0),
                    1 => arch::vgetq_lane_s16::<1>(v.0),
                    2 => arch::vgetq_lane_s16::<2>(v.0),
                    3 => arch::vgetq_lane_s16::<3>(v.0),
                    4 => arch::vgetq_lane_s16::<4>(v.0),
                    5 => arch::vgetq_lane_s16::<5>(v.0),
                    6 => arch::vgetq_lane_s16::<6>(v.0),
                    _ => arch::vgetq_lane_s16::<7>(v.0),
                }
            }
        }
    }

    #[inline(always)]
    unsafe fn insert_epi16(v: Self::V, x: i16, lane: usize) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe {
                let x = x as i32;
                match lane {
                    0 => arch::_mm_insert_epi16::<0>(v, x),
                    1 => arch::_mm_insert_epi16::<1>(v, x),
                    2 => arch::_mm_insert_epi16::<2>(v, x),
                    3 => arch::_mm_insert_epi16::<3>(v, x),
                    4 => arch::_mm_insert_epi16::<4>(v, x),
                    5 => arch::_mm_insert_epi16::<5>(v, x),
                    6 => arch::_mm_insert_epi16::<6>(v, x),
                    _ => arch::_mm_insert_epi16::<7>(v, x),
                }
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe {
                V128(match lane {
                    0 => arch::vsetq_lane_s16::<0>(x, v.0),
                    1 => arch::vsetq_lane_s16::<1>(x, v.0),
                    2 => arch::vsetq_lane_s16::<2>(x, v.0),
                    3 => arch::vsetq_lane_s16::<3>(x, v.0),
                    4 => arch::vsetq_lane_s16::<4>(x, v.0),
                    5 => arch::vsetq_lane_s16::<5>(x, v.0),
                    6 => arch::vsetq_lane_s16::<6>(x, v.0),
                    _ => arch::vsetq_lane_s16::<7>(x, v.0),
                })
            }
        }
    }

    #[inline(always)]
    unsafe fn add_epi16(a: Self::V, b: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_add_epi16(a, b) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vaddq_s16(a.0, b.0)) }
        }
    }

    #[inline(always)]
    unsafe fn min_epi16(a: Self::V, b: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_min_epi16(a, b) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vminq_s16(a.0, b.0)) }
        }
    }

    #[inline(always)]
    unsafe fn max_epi16(a: Self::V, b: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_max_epi16(a, b) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vmaxq_s16(a.0, b.0)) }
        }
    }

    #[inline(always)]
    unsafe fn cmpeq_epi16(a: Self::V, b: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_cmpeq_epi16(a, b) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vreinterpretq_s16_u16(arch::vceqq_s16(a.0, b.0))) }
        }
    }

    #[inline(always)]
    unsafe fn and_si(a: Self::V, b: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_and_si128(a, b) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vandq_s16(a.0, b.0)) }
        }
    }

    #[inline(always)]
    unsafe fn or_si(a: Self::V, b: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_or_si128(a, b) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vorrq_s16(a.0, b.0)) }
        }
    }

    #[inline(always)]
    unsafe fn andnot_si(a: Self::V, b: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_andnot_si128(a, b) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            // vbic computes b & !a, matching _mm_andnot_si128's operand order.
            unsafe { V128(arch::vbicq_s16(b.0, a.0)) }
        }
    }

    #[inline(always)]
    unsafe fn slli_si_word(v: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_slli_si128::<2>(v) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe {
                let zero = arch::vdupq_n_s16(0);
                V128(arch::vextq_s16::<7>(zero, v.0))
            }
        }
    }

    #[inline(always)]
    unsafe fn srli_si_word(v: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_srli_si128::<2>(v) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe {
                let zero = arch::vdupq_n_s16(0);
                V128(arch::vextq_s16::<1>(v.0, zero))
            }
        }
    }

    #[inline(always)]
    unsafe fn slli_epi16<const BITS: i32>(v: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_slli_epi16::<BITS>(v) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { V128(arch::vshlq_n_s16::<BITS>(v.0)) }
        }
    }

    #[inline(always)]
    unsafe fn srli_epi16<const BITS: i32>(v: Self::V) -> Self::V {
        #[cfg(target_arch = "x86_64")]
        {
            unsafe { arch::_mm_srli_epi16::<BITS>(v) }
        }
        #[cfg(target_arch = "aarch64")]
        {
            unsafe {
                V128(arch::vreinterpretq_s16_u16(arch::vshrq_n_u16::<BITS>(
                    arch::vreinterpretq_u16_s16(v.0),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::scalar::ScalarEngine;

    type Ref = ScalarEngine<8>;

    fn lanes_of(v: V128) -> [i16; 8] {
        let mut out = [0i16; 8];
        unsafe { Engine128::storeu_epi16(v, &mut out) };
        out
    }

    #[test]
    fn matches_reference_on_lane_ops() {
        let a_lanes = [3, -1, 0x7800, i16::MIN, 42, -7, 0, 1];
        let b_lanes = [3, 1, 0x7800, 5, -42, -7, 9, -1];
        unsafe {
            let a = Engine128::loadu_epi16(&a_lanes);
            let b = Engine128::loadu_epi16(&b_lanes);
            let ra = Ref::loadu_epi16(&a_lanes);
            let rb = Ref::loadu_epi16(&b_lanes);

            let mut want = [0i16; 8];
            Ref::storeu_epi16(Ref::add_epi16(ra, rb), &mut want);
            assert_eq!(lanes_of(Engine128::add_epi16(a, b)), want);

            Ref::storeu_epi16(Ref::min_epi16(ra, rb), &mut want);
            assert_eq!(lanes_of(Engine128::min_epi16(a, b)), want);

            Ref::storeu_epi16(Ref::max_epi16(ra, rb), &mut want);
            assert_eq!(lanes_of(Engine128::max_epi16(a, b)), want);

            Ref::storeu_epi16(Ref::cmpeq_epi16(ra, rb), &mut want);
            assert_eq!(lanes_of(Engine128::cmpeq_epi16(a, b)), want);

            Ref::storeu_epi16(Ref::andnot_si(ra, rb), &mut want);
            assert_eq!(lanes_of(Engine128::andnot_si(a, b)), want);
        }
    }

    #[test]
    fn word_shifts_cross_lanes() {
        unsafe {
            let v = Engine128::loadu_epi16(&[1, 2, 3, 4, 5, 6, 7, 8]);
            assert_eq!(lanes_of(Engine128::slli_si_word(v)), [0, 1, 2, 3, 4, 5, 6, 7]);
            assert_eq!(lanes_of(Engine128::srli_si_word(v)), [2, 3, 4, 5, 6, 7, 8, 0]);
        }
    }

    #[test]
    fn insert_and_extract_roundtrip() {
        unsafe {
            let mut v = Engine128::set1_epi16(0);
            for lane in 0..8 {
                v = Engine128::insert_epi16(v, lane as i16 + 100, lane);
            }
            for lane in 0..8 {
                assert_eq!(Engine128::extract_epi16(v, lane), lane as i16 + 100);
            }
        }
    }

    #[test]
    fn bit_shift_stays_in_lane() {
        unsafe {
            let v = Engine128::set1_epi16(3);
            assert_eq!(lanes_of(Engine128::slli_epi16::<6>(v)), [3 << 6; 8]);
            assert_eq!(lanes_of(Engine128::srli_epi16::<1>(Engine128::set1_epi16(-2))), [0x7FFF; 8]);
        }
    }
}
