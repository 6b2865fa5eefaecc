//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) values are undefined.

use super::finite;

pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = vec![None; values.len()];
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = finite(ema);

    for (i, &value) in values.iter().enumerate().skip(period) {
        ema = value * k + ema * (1.0 - k);
        out[i] = finite(ema);
    }
    out
}

/// EMA over a column whose leading rows are undefined.
///
/// The smoothing starts at the first defined value; the leading undefined
/// rows stay undefined and do not count toward the warm-up.
pub fn calculate_ema_of_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let Some(start) = values.iter().position(Option::is_some) else {
        return vec![None; values.len()];
    };
    let tail: Vec<f64> = values[start..].iter().map_while(|v| *v).collect();

    let mut out = vec![None; start];
    out.extend(calculate_ema(&tail, period));
    out.resize(values.len(), None);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup() {
        let values = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        assert!(values[0].is_none());
        assert!(values[1].is_none());
        assert!(values[2].is_some());
        assert!(values[3].is_some());
        assert!(values[4].is_some());
    }

    #[test]
    fn ema_period_1() {
        let values = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(values, vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn ema_seed_is_sma() {
        let values = calculate_ema(&[10.0, 20.0, 30.0], 3);
        let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((values[2].unwrap() - expected_sma).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let values = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((values[3].unwrap() - ema_3).abs() < f64::EPSILON);
        assert!((values[4].unwrap() - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let values = calculate_ema(&[100.0; 5], 3);
        for v in values.iter().skip(2) {
            assert!((v.unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_empty_and_zero_period() {
        assert!(calculate_ema(&[], 3).is_empty());
        assert_eq!(calculate_ema(&[10.0, 20.0], 0), vec![None, None]);
    }

    #[test]
    fn ema_of_defined_skips_leading_undefined() {
        let values = calculate_ema_of_defined(&[None, None, Some(1.0), Some(2.0), Some(3.0)], 2);
        assert!(values[..3].iter().all(Option::is_none));
        assert!((values[3].unwrap() - 1.5).abs() < f64::EPSILON);
        // k = 2/3: 3*2/3 + 1.5/3
        assert!((values[4].unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn ema_of_defined_all_undefined() {
        assert_eq!(calculate_ema_of_defined(&[None, None], 2), vec![None, None]);
    }
}
