//! Temperature + nucleus sampling over raw logits.

use rand::Rng;

/// Sample an index from `logits` with temperature and top-p (nucleus) sampling.
///
/// * `temperature` - scales logits before softmax (lower = more deterministic)
/// * `top_p` - keep the smallest prefix of the sorted distribution whose mass
///   reaches this threshold, then renormalize
///
/// Returns `None` only for empty input.
pub fn sample_index<R: Rng + ?Sized>(
    logits: &[f64],
    temperature: f64,
    top_p: f64,
    rng: &mut R,
) -> Option<usize> {
    if logits.is_empty() {
        return None;
    }

    // Apply temperature
    let scaled: Vec<f64> = if temperature > 0.0 && temperature != 1.0 {
        logits.iter().map(|x| x / temperature).collect()
    } else {
        logits.to_vec()
    };

    // Softmax
    let max_val = scaled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp_vals: Vec<f64> = scaled.iter().map(|x| (x - max_val).exp()).collect();
    let sum: f64 = exp_vals.iter().sum();

    // Sort by probability (descending) for top-p
    let mut indexed: Vec<(usize, f64)> = exp_vals.iter().map(|x| x / sum).enumerate().collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut cumsum = 0.0;
    let mut cutoff = indexed.len();
    for (i, (_, prob)) in indexed.iter().enumerate() {
        cumsum += prob;
        if cumsum >= top_p {
            cutoff = i + 1;
            break;
        }
    }
    let nucleus = &indexed[..cutoff];
    let nucleus_mass: f64 = nucleus.iter().map(|(_, p)| p).sum();

    let target = rng.gen::<f64>() * nucleus_mass;
    let mut cumsum = 0.0;
    for &(idx, prob) in nucleus {
        cumsum += prob;
        if target < cumsum {
            return Some(idx);
        }
    }

    // Rounding fallback: highest probability entry
    Some(indexed[0].0)
}
