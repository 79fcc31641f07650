// tests/alignment_properties.rs
//
// Structural guarantees of the aligner, checked over randomized inputs:
// score/alignment agreement, gap-stripping consistency, the band bound on
// gap counts, and the self-alignment identity.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pairhmm::{available_backends, AlignmentTask, GapPenalty, PairHmm, SimdBackend};

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

fn random_truth(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect()
}

fn mutate(rng: &mut StdRng, sequence: &mut [u8], rate_per_mille: u32) {
    for base in sequence.iter_mut() {
        if rng.gen_range(0..1000) < rate_per_mille {
            *base = BASES[rng.gen_range(0..4)];
        }
    }
}

#[test]
fn align_score_equals_score_only() {
    let mut rng = StdRng::seed_from_u64(0xfeed_0001);
    for backend in available_backends() {
        let hmm = PairHmm::with_backend(backend).unwrap();
        let band_size = hmm.band_size();
        for _ in 0..50 {
            let target_len = rng.gen_range(4..=30);
            let truth = random_truth(&mut rng, target_len + 2 * band_size - 1);
            let offset = rng.gen_range(0..2 * band_size - 1);
            let mut target = truth[offset..offset + target_len].to_vec();
            mutate(&mut rng, &mut target, 100);
            let qualities = vec![40i8; target_len];

            let task = AlignmentTask {
                truth: &truth,
                target: &target,
                qualities: &qualities,
                gap_open: GapPenalty::Flat(50),
                gap_extend: GapPenalty::Flat(2),
                nuc_prior: 4,
            };
            let score = hmm.score(&task).unwrap();
            let alignment = hmm.align(&task).unwrap();
            assert_eq!(score, alignment.score, "backend {:?}", backend);
        }
    }
}

#[test]
fn gap_stripping_recovers_the_inputs() {
    let mut rng = StdRng::seed_from_u64(0xfeed_0002);
    for backend in available_backends() {
        let hmm = PairHmm::with_backend(backend).unwrap();
        let band_size = hmm.band_size();
        for _ in 0..50 {
            let target_len = rng.gen_range(4..=30);
            let truth = random_truth(&mut rng, target_len + 2 * band_size - 1);
            let offset = rng.gen_range(0..2 * band_size - 1);
            let mut target = truth[offset..offset + target_len].to_vec();
            mutate(&mut rng, &mut target, 80);
            let qualities = vec![40i8; target_len];

            let task = AlignmentTask {
                truth: &truth,
                target: &target,
                qualities: &qualities,
                gap_open: GapPenalty::Flat(45),
                gap_extend: GapPenalty::Flat(1),
                nuc_prior: 4,
            };
            let alignment = hmm.align(&task).unwrap();
            assert_eq!(alignment.aligned_truth.len(), alignment.aligned_target.len());

            // The whole target comes back, in order.
            let stripped_target: Vec<u8> = alignment
                .aligned_target
                .iter()
                .copied()
                .filter(|&base| base != b'-')
                .collect();
            assert_eq!(stripped_target, target, "backend {:?}", backend);

            // The truth row is the contiguous slice starting at first_pos.
            let stripped_truth: Vec<u8> = alignment
                .aligned_truth
                .iter()
                .copied()
                .filter(|&base| base != b'-')
                .collect();
            let end = alignment.first_pos + stripped_truth.len();
            assert!(end <= truth.len());
            assert_eq!(stripped_truth, truth[alignment.first_pos..end]);
        }
    }
}

#[test]
fn gap_runs_stay_inside_the_band() {
    let mut rng = StdRng::seed_from_u64(0xfeed_0003);
    for backend in available_backends() {
        let hmm = PairHmm::with_backend(backend).unwrap();
        let band_size = hmm.band_size();
        for _ in 0..50 {
            let target_len = rng.gen_range(6..=30);
            let truth = random_truth(&mut rng, target_len + 2 * band_size - 1);
            let offset = rng.gen_range(0..2 * band_size - 1);
            let mut target = truth[offset..offset + target_len].to_vec();
            mutate(&mut rng, &mut target, 60);
            let qualities = vec![40i8; target_len];

            let task = AlignmentTask {
                truth: &truth,
                target: &target,
                qualities: &qualities,
                gap_open: GapPenalty::Flat(60),
                gap_extend: GapPenalty::Flat(4),
                nuc_prior: 4,
            };
            let alignment = hmm.align(&task).unwrap();
            let truth_gaps = alignment
                .aligned_truth
                .iter()
                .filter(|&&base| base == b'-')
                .count();
            let target_gaps = alignment
                .aligned_target
                .iter()
                .filter(|&&base| base == b'-')
                .count();
            assert!(truth_gaps < band_size, "backend {:?}", backend);
            assert!(target_gaps < band_size, "backend {:?}", backend);
        }
    }
}

#[test]
fn embedded_read_aligns_back_to_itself() {
    let mut rng = StdRng::seed_from_u64(0xfeed_0004);
    for backend in available_backends() {
        let hmm = PairHmm::with_backend(backend).unwrap();
        let band_size = hmm.band_size();
        for _ in 0..25 {
            let target_len = rng.gen_range(10..=30);
            let truth = random_truth(&mut rng, target_len + 2 * band_size - 1);
            let target = truth[band_size - 1..band_size - 1 + target_len].to_vec();
            let qualities = vec![40i8; target_len];

            let task = AlignmentTask {
                truth: &truth,
                target: &target,
                qualities: &qualities,
                gap_open: GapPenalty::Flat(40),
                gap_extend: GapPenalty::Flat(1),
                nuc_prior: 4,
            };
            assert_eq!(hmm.score(&task).unwrap(), 0, "backend {:?}", backend);

            let alignment = hmm.align(&task).unwrap();
            assert_eq!(alignment.score, 0);
            assert_eq!(alignment.aligned_truth, target, "backend {:?}", backend);
            assert_eq!(alignment.aligned_target, target, "backend {:?}", backend);
        }
    }
}

#[test]
fn batch_scoring_agrees_with_single_calls() {
    let mut rng = StdRng::seed_from_u64(0xfeed_0005);
    let hmm = PairHmm::with_backend(SimdBackend::Scalar).unwrap();
    let band_size = hmm.band_size();

    let target_len = 20;
    let truths: Vec<Vec<u8>> = (0..16)
        .map(|_| random_truth(&mut rng, target_len + 2 * band_size - 1))
        .collect();
    let target = truths[0][band_size - 1..band_size - 1 + target_len].to_vec();
    let qualities = vec![40i8; target_len];

    let tasks: Vec<AlignmentTask> = truths
        .iter()
        .map(|truth| AlignmentTask {
            truth,
            target: &target,
            qualities: &qualities,
            gap_open: GapPenalty::Flat(50),
            gap_extend: GapPenalty::Flat(1),
            nuc_prior: 4,
        })
        .collect();

    let batch = hmm.score_batch(&tasks);
    assert_eq!(batch.len(), tasks.len());
    for (task, result) in tasks.iter().zip(batch) {
        assert_eq!(result, hmm.score(task));
    }
}
