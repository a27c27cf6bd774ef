// Token sampling over raw logits.
//
// Temperature 0 means greedy argmax (the study's deterministic runs);
// otherwise softmax with temperature followed by top-p nucleus truncation.
// The random draw is passed in as a unit-interval value so the selection
// logic itself is deterministic and testable.

use rand::Rng;

/// Index of the largest logit. Ties resolve to the first occurrence.
pub fn argmax(logits: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in logits.iter().enumerate() {
        if v > logits[best] {
            best = i;
        }
    }
    best
}

/// Numerically stable softmax with temperature scaling.
pub fn softmax_with_temperature(logits: &[f32], temperature: f64) -> Vec<f64> {
    let t = temperature.max(1e-6);
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| ((l as f64 - max) / t).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum <= 0.0 {
        // Degenerate input (all -inf); fall back to uniform
        return vec![1.0 / logits.len() as f64; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Sample from a probability distribution restricted to the smallest set of
/// tokens whose cumulative mass reaches `top_p`. `draw` is a uniform value
/// in [0, 1).
pub fn sample_top_p(probs: &[f64], top_p: f64, draw: f64) -> usize {
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[b].partial_cmp(&probs[a]).unwrap_or(std::cmp::Ordering::Equal));

    // Keep tokens until the nucleus mass is reached (always at least one)
    let mut nucleus = Vec::new();
    let mut mass = 0.0;
    for &i in &order {
        nucleus.push(i);
        mass += probs[i];
        if mass >= top_p {
            break;
        }
    }

    // Renormalize within the nucleus and walk the CDF
    let target = draw * mass;
    let mut acc = 0.0;
    for &i in &nucleus {
        acc += probs[i];
        if acc >= target {
            return i;
        }
    }
    *nucleus.last().expect("nucleus is never empty")
}

/// Pick the next token id from raw logits using the configured decoding mode.
pub fn next_token(logits: &[f32], temperature: f64, top_p: f64, rng: &mut impl Rng) -> usize {
    if temperature <= 0.0 {
        return argmax(logits);
    }
    let probs = softmax_with_temperature(logits, temperature);
    sample_top_p(&probs, top_p.clamp(0.0, 1.0).max(f64::EPSILON), rng.random::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 3.0, -2.0, 1.5]), 1);
    }

    #[test]
    fn argmax_ties_resolve_first() {
        assert_eq!(argmax(&[2.0, 2.0, 1.0]), 0);
    }

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax_with_temperature(&[1.0, 2.0, 3.0], 0.7);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lower_temperature_sharpens() {
        let hot = softmax_with_temperature(&[1.0, 2.0], 2.0);
        let cold = softmax_with_temperature(&[1.0, 2.0], 0.2);
        assert!(cold[1] > hot[1], "cold distribution should concentrate mass");
    }

    #[test]
    fn top_p_one_covers_whole_distribution() {
        // draw near 1.0 should be able to land on the tail token
        let probs = vec![0.5, 0.3, 0.2];
        assert_eq!(sample_top_p(&probs, 1.0, 0.999), 2);
        assert_eq!(sample_top_p(&probs, 1.0, 0.0), 0);
    }

    #[test]
    fn small_top_p_truncates_to_head() {
        // Nucleus of 0.5 keeps only the most probable token
        let probs = vec![0.6, 0.3, 0.1];
        for draw in [0.0, 0.5, 0.99] {
            assert_eq!(sample_top_p(&probs, 0.5, draw), 0);
        }
    }

    #[test]
    fn zero_temperature_is_greedy() {
        let mut rng = rand::rng();
        for _ in 0..10 {
            assert_eq!(next_token(&[0.0, 5.0, 1.0], 0.0, 0.9, &mut rng), 1);
        }
    }

    #[test]
    fn sampled_token_is_in_range() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let tok = next_token(&[1.0, 2.0, 3.0, 4.0], 0.8, 0.9, &mut rng);
            assert!(tok < 4);
        }
    }
}
