//! Emission designator to bandwidth conversion.

/// Parse the leading four characters of an emission designator into a
/// bandwidth in MHz.
///
/// The multiplier letter (H, K, M, G) doubles as the decimal point:
/// `"20M0F7W"` is 20.0 MHz, `"2K50..."` 2.5 kHz. Returns None when no
/// multiplier letter appears in the first four characters or the numeric
/// part does not parse.
pub fn emission_designator_to_bandwidth_mhz(designator: &str) -> Option<f64> {
    let freq_part: String = designator.chars().take(4).collect();

    let (multiplier, unit) = if freq_part.contains('H') {
        (1.0, 'H')
    } else if freq_part.contains('K') {
        (1.0e3, 'K')
    } else if freq_part.contains('M') {
        (1.0e6, 'M')
    } else if freq_part.contains('G') {
        (1.0e9, 'G')
    } else {
        return None;
    };

    let num: String = freq_part
        .chars()
        .map(|c| if c == unit { '.' } else { c })
        .collect();
    let value: f64 = num.parse().ok()?;

    Some(value * multiplier / 1.0e6)
}
