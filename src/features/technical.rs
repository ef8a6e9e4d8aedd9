//! Technical indicators for feature engineering
//!
//! Every indicator maps an ordered price series to a series of the same
//! length. Positions without enough history hold `NaN`; the matching
//! `*_warmup` function returns how many leading positions that is, so
//! callers can trim exactly the undefined prefix.

/// Exponentially weighted mean in recursive form, seeded at the first
/// defined input
///
/// Leading `NaN` inputs are skipped. An output is defined once at least
/// `min_periods` observations have been seen.
fn ewm(values: &[f64], alpha: f64, min_periods: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };

    let mut mean = values[start];
    for (seen, (value, out)) in values[start..]
        .iter()
        .zip(result[start..].iter_mut())
        .enumerate()
    {
        if seen > 0 {
            mean = alpha * value + (1.0 - alpha) * mean;
        }
        if seen + 1 >= min_periods {
            *out = mean;
        }
    }

    result
}

/// Exponential Moving Average with smoothing `2 / (period + 1)`
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    ewm(prices, alpha, period)
}

pub fn ema_warmup(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Relative Strength Index (RSI) with Wilder smoothing
///
/// Gains and losses are averaged with `alpha = 1 / period`; the first row
/// has no prior close and counts as an unchanged step. When the average
/// loss is zero the index is 100.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let n = prices.len();
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];

    for i in 1..n {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else if change < 0.0 {
            losses[i] = -change;
        }
    }

    let alpha = 1.0 / period as f64;
    let avg_gain = ewm(&gains, alpha, period);
    let avg_loss = ewm(&losses, alpha, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&gain, &loss)| {
            if gain.is_nan() || loss.is_nan() {
                f64::NAN
            } else if loss == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + gain / loss)
            }
        })
        .collect()
}

pub fn rsi_warmup(period: usize) -> usize {
    period.saturating_sub(1)
}

/// Moving Average Convergence Divergence (MACD)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
}

pub fn macd(prices: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    let fast_ema = ema(prices, fast_period);
    let slow_ema = ema(prices, slow_period);

    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    // Signal seeds at the first defined MACD value
    let signal_line = ema(&macd_line, signal_period);

    MacdResult {
        macd_line,
        signal_line,
    }
}

/// Undefined prefix of the MACD line
pub fn macd_warmup(fast_period: usize, slow_period: usize) -> usize {
    ema_warmup(fast_period).max(ema_warmup(slow_period))
}

/// Undefined prefix of the MACD signal line
pub fn macd_signal_warmup(fast_period: usize, slow_period: usize, signal_period: usize) -> usize {
    macd_warmup(fast_period, slow_period) + ema_warmup(signal_period)
}

/// Rolling sample standard deviation (denominator `window - 1`)
///
/// Windows shorter than two points have no sample deviation, so every
/// position is undefined for them.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if window < 2 {
        return result;
    }

    for i in (window - 1)..values.len() {
        let slice = &values[(i + 1 - window)..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        result[i] = variance.sqrt();
    }

    result
}

pub fn rolling_std_warmup(window: usize) -> usize {
    window.saturating_sub(1)
}
