/// Simple moving average of the trailing `period` values.
/// Returns `None` when fewer than `period` values are available.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let tail = &data[data.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Span-based exponential moving average at the last value.
///
/// `alpha = 2 / (span + 1)`, seeded with the first value and run over the
/// whole slice. Returns `None` for empty input.
pub fn ema(data: &[f64], span: usize) -> Option<f64> {
    let (&first, rest) = data.split_first()?;
    let alpha = 2.0 / (span as f64 + 1.0);
    Some(
        rest.iter()
            .fold(first, |prev, &value| alpha * value + (1.0 - alpha) * prev),
    )
}
