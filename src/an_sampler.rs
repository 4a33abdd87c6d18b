//! Discretised Bernoulli trials.
//!
//! Every stochastic transition in the simulation goes through [`sample`]. A trial is
//! resolved on a board of [`CELLS`] cells: `ceil(p * CELLS)` distinct cells are marked as
//! successes, then a single cell is drawn and checked. The acceptance rate is therefore
//! `ceil(p * 100) / 100`, which is at least `p` and rounds upward for any probability that
//! is not a whole percentage. Results downstream are calibrated against this rate, so it
//! must not be replaced by a continuous `gen_bool`.

use rand::seq::index;
use rand::Rng;

use crate::an_error::SamplerError;

/// Resolution of the sampler: probabilities are resolved to 1/CELLS
pub const CELLS: usize = 100;

/// Number of cells marked as success for probability `p`
pub fn success_cells(p: f64) -> usize {
    ((p * CELLS as f64).ceil() as usize).min(CELLS)
}

/// Effective acceptance rate of [`sample`] for `p`
pub fn effective_rate(p: f64) -> f64 {
    if p == 1.0 {
        return 1.0;
    }
    success_cells(p) as f64 / CELLS as f64
}

/// Draw one discretised Bernoulli trial with success probability `p`.
///
/// `p == 1` always succeeds without consuming randomness. `p == 0` marks no cell and
/// therefore always fails.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, p: f64) -> Result<bool, SamplerError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SamplerError::ProbabilityOutOfRange(p));
    }
    if p == 1.0 {
        return Ok(true);
    }

    let marked = index::sample(rng, CELLS, success_cells(p));
    let drawn = rng.gen_range(0..CELLS);
    Ok(marked.iter().any(|cell| cell == drawn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hit_rate(rng: &mut StdRng, p: f64, trials: usize) -> f64 {
        let mut hits = 0;
        for _ in 0..trials {
            if sample(rng, p).unwrap() {
                hits += 1;
            }
        }
        hits as f64 / trials as f64
    }

    #[test]
    fn test_zero_never_succeeds() {
        let mut rng = StdRng::from_seed([1u8; 32]);
        for _ in 0..10_000 {
            assert!(!sample(&mut rng, 0.0).unwrap());
        }
    }

    #[test]
    fn test_one_always_succeeds() {
        let mut rng = StdRng::from_seed([2u8; 32]);
        for _ in 0..10_000 {
            assert!(sample(&mut rng, 1.0).unwrap());
        }
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut rng = StdRng::from_seed([3u8; 32]);
        assert_eq!(
            sample(&mut rng, 1.5),
            Err(SamplerError::ProbabilityOutOfRange(1.5))
        );
        assert!(sample(&mut rng, -0.01).is_err());
        assert!(sample(&mut rng, f64::NAN).is_err());
    }

    #[test]
    fn test_success_cells_round_up() {
        assert_eq!(success_cells(0.0), 0);
        assert_eq!(success_cells(0.25), 25);
        assert_eq!(success_cells(0.255), 26);
        assert_eq!(success_cells(0.001), 1);
        assert_eq!(success_cells(1.0), 100);
    }

    #[test]
    fn test_empirical_rate_matches_discretised_rate() {
        let mut rng = StdRng::from_seed([4u8; 32]);
        let trials = 100_000;

        for p in [0.25, 0.255, 0.001, 0.5] {
            let observed = hit_rate(&mut rng, p, trials);
            let expected = effective_rate(p);
            assert!(
                (observed - expected).abs() < 0.01,
                "p={} observed={} expected={}",
                p,
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_small_probability_is_biased_upward() {
        let mut rng = StdRng::from_seed([5u8; 32]);
        // 0.001 resolves to one cell out of a hundred
        let observed = hit_rate(&mut rng, 0.001, 100_000);
        assert!(observed > 0.005, "observed={}", observed);
    }

    #[test]
    fn test_matches_full_board_draw() {
        fn board_draw(rng: &mut StdRng, p: f64) -> bool {
            let mut board = [false; CELLS];
            for cell in index::sample(rng, CELLS, success_cells(p)).iter() {
                board[cell] = true;
            }
            board[rng.gen_range(0..CELLS)]
        }

        let mut rng = StdRng::from_seed([6u8; 32]);
        let mut reference = rng.clone();
        for i in 0..5_000 {
            let p = (i % 100) as f64 / 100.0 + 0.003;
            assert_eq!(sample(&mut rng, p).unwrap(), board_draw(&mut reference, p));
        }
    }
}
