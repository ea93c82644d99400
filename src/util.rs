pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Format whole seconds as an m:ss countdown clock.
pub fn fmt_clock(secs: f64) -> String {
    let whole = secs.max(0.0).floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_fmt_clock() {
        assert_eq!(fmt_clock(0.0), "0:00");
        assert_eq!(fmt_clock(9.4), "0:09");
        assert_eq!(fmt_clock(60.0), "1:00");
        assert_eq!(fmt_clock(125.9), "2:05");
    }

    #[test]
    fn test_fmt_clock_negative_clamps() {
        assert_eq!(fmt_clock(-3.0), "0:00");
    }
}
