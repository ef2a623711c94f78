/// Symmetric exponential window of `len` points centred on `(len - 1) / 2`:
/// `w[n] = exp(-|n - centre| / tau)`.
pub fn exponential_weights(len: usize, tau: f64) -> Vec<f64> {
    let centre = (len as f64 - 1.0) / 2.0;
    (0..len)
        .map(|n| (-(n as f64 - centre).abs() / tau).exp())
        .collect()
}

/// Weighted arithmetic mean. Returns `None` for empty input, a length
/// mismatch or a zero weight sum.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    if values.is_empty() || values.len() != weights.len() {
        return None;
    }
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum == 0.0 {
        return None;
    }
    let total: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Some(total / weight_sum)
}
