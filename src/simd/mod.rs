//! SIMD backends and runtime backend selection.
//!
//! The aligner's band width equals the lane count of the chosen backend, so
//! selecting a backend is part of the public contract: callers must shape
//! their inputs for `SimdBackend::band_size()`. Selection happens once per
//! aligner construction, never per cell.
//!
//! Environment overrides for testing/debugging:
//! - `PAIRHMM_FORCE_SCALAR=1`: force the portable reference backend
//! - `PAIRHMM_FORCE_SIMD128=1`: force the 128-bit engine (skip AVX2)

pub mod scalar;
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
pub mod simd128;
#[cfg(target_arch = "x86_64")]
pub mod simd256;
pub mod vector;

pub use scalar::{ScalarEngine, ScalarVec};
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
pub use simd128::Engine128;
#[cfg(target_arch = "x86_64")]
pub use simd256::Engine256;
pub use vector::{PhmmSimd, MAX_LANES};

/// Available aligner backends. The scalar pair is portable and serves as
/// the bit-for-bit reference for the vector engines of the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdBackend {
    /// Portable reference, band width 8
    Scalar,
    /// Portable reference, band width 16
    ScalarWide,
    /// 128-bit SIMD (SSE2 on x86_64, NEON on aarch64), band width 8
    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    Simd128,
    /// 256-bit SIMD (AVX2), band width 16 - x86_64 only
    #[cfg(target_arch = "x86_64")]
    Simd256,
}

impl SimdBackend {
    /// Band width of the backend: the number of 16-bit lanes, and the
    /// number of diagonals the aligner evaluates.
    pub fn band_size(self) -> usize {
        match self {
            SimdBackend::Scalar => 8,
            SimdBackend::ScalarWide => 16,
            #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
            SimdBackend::Simd128 => 8,
            #[cfg(target_arch = "x86_64")]
            SimdBackend::Simd256 => 16,
        }
    }

    /// Whether the running CPU can execute this backend.
    pub fn is_available(self) -> bool {
        match self {
            SimdBackend::Scalar | SimdBackend::ScalarWide => true,
            #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
            SimdBackend::Simd128 => true,
            #[cfg(target_arch = "x86_64")]
            SimdBackend::Simd256 => is_x86_feature_detected!("avx2"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

/// Detects the widest backend the CPU supports.
///
/// Called once per `PairHmm` construction. Honours the `PAIRHMM_FORCE_*`
/// environment overrides; the chosen backend is logged at debug level.
pub fn detect_optimal_backend() -> SimdBackend {
    if env_flag("PAIRHMM_FORCE_SCALAR") {
        log::info!("PAIRHMM_FORCE_SCALAR=1: using portable scalar backend");
        return SimdBackend::Scalar;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if env_flag("PAIRHMM_FORCE_SIMD128") {
            log::info!("PAIRHMM_FORCE_SIMD128=1: using SSE2 (128-bit) backend");
            return SimdBackend::Simd128;
        }
        if is_x86_feature_detected!("avx2") {
            return SimdBackend::Simd256;
        }
        SimdBackend::Simd128
    }

    #[cfg(target_arch = "aarch64")]
    {
        // NEON is baseline on aarch64.
        SimdBackend::Simd128
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        SimdBackend::Scalar
    }
}

/// All backends the running CPU can execute.
pub fn available_backends() -> Vec<SimdBackend> {
    let mut backends = vec![SimdBackend::Scalar, SimdBackend::ScalarWide];
    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    {
        backends.push(SimdBackend::Simd128);
    }
    #[cfg(target_arch = "x86_64")]
    {
        if SimdBackend::Simd256.is_available() {
            backends.push(SimdBackend::Simd256);
        }
    }
    backends
}

/// Human-readable backend description.
pub fn backend_description(backend: SimdBackend) -> &'static str {
    match backend {
        SimdBackend::Scalar => "scalar reference (band 8)",
        SimdBackend::ScalarWide => "scalar reference (band 16)",
        #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
        SimdBackend::Simd128 => {
            #[cfg(target_arch = "x86_64")]
            {
                "SSE2 (128-bit, band 8)"
            }
            #[cfg(not(target_arch = "x86_64"))]
            {
                "NEON (128-bit, band 8)"
            }
        }
        #[cfg(target_arch = "x86_64")]
        SimdBackend::Simd256 => "AVX2 (256-bit, band 16)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_returns_an_available_backend() {
        let backend = detect_optimal_backend();
        assert!(backend.is_available());
        assert!(available_backends().contains(&backend));
        println!(
            "detected backend: {:?} ({})",
            backend,
            backend_description(backend)
        );
    }

    #[test]
    fn scalar_backends_are_always_available() {
        assert!(SimdBackend::Scalar.is_available());
        assert!(SimdBackend::ScalarWide.is_available());
        assert_eq!(SimdBackend::Scalar.band_size(), 8);
        assert_eq!(SimdBackend::ScalarWide.band_size(), 16);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn avx2_detection_matches_cpuid() {
        assert_eq!(
            SimdBackend::Simd256.is_available(),
            is_x86_feature_detected!("avx2")
        );
    }
}
