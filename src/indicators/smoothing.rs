//! 遞迴平滑與滾動窗口的基礎運算
//!
//! EMA、RSI（Wilder）、KDJ 的 K/D 線都是同一種遞迴：
//! `y[t] = y[t-1] + alpha * (x[t] - y[t-1])`，
//! 差別只在種子規則與平滑係數，因此以 [`Smoothing`] 明確描述。

/// 遞迴平滑的種子規則
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Seed {
    /// 以第一個完整窗口（連續 n 個已定義值）的算術平均作為種子，
    /// 種子之前的輸出未定義
    WindowMean(usize),
    /// 以固定值作為第 -1 期的狀態，第一個已定義輸入即產生輸出
    Constant(f64),
}

/// 遞迴平滑參數：種子規則加平滑係數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    pub seed: Seed,
    pub alpha: f64,
}

impl Smoothing {
    /// EMA：alpha = 2 / (n + 1)，以 MA(n) 為種子
    pub fn ema(period: usize) -> Self {
        Self {
            seed: Seed::WindowMean(period),
            alpha: 2.0 / (period as f64 + 1.0),
        }
    }

    /// Wilder 平滑：alpha = 1 / n，以前 n 期平均為種子
    pub fn wilder(period: usize) -> Self {
        Self {
            seed: Seed::WindowMean(period),
            alpha: 1.0 / period.max(1) as f64,
        }
    }

    /// 固定初值平滑：alpha = 1 / n，初值為 `initial`
    pub fn anchored(initial: f64, period: usize) -> Self {
        Self {
            seed: Seed::Constant(initial),
            alpha: 1.0 / period.max(1) as f64,
        }
    }

    #[inline]
    pub fn step(&self, previous: f64, input: f64) -> f64 {
        previous + self.alpha * (input - previous)
    }
}

#[derive(Debug, Default)]
struct ScanState {
    level: Option<f64>,
    /// 種子建立前連續已定義輸入的數量
    run: usize,
}

/// 以掃描（scan）方式執行遞迴平滑
///
/// 輸出與輸入等長。種子建立後若遇到未定義輸入，該點輸出未定義，
/// 狀態保持不變。
pub fn scan_smooth(values: &[Option<f64>], smoothing: Smoothing) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .scan(ScanState::default(), |state, (i, value)| {
            let output = match (*value, state.level) {
                (None, Some(_)) => None,
                (None, None) => {
                    state.run = 0;
                    None
                }
                (Some(x), Some(previous)) => {
                    let next = smoothing.step(previous, x);
                    state.level = Some(next);
                    Some(next)
                }
                (Some(x), None) => {
                    state.run += 1;
                    match smoothing.seed {
                        Seed::Constant(initial) => {
                            let next = smoothing.step(initial, x);
                            state.level = Some(next);
                            Some(next)
                        }
                        Seed::WindowMean(n) => {
                            let n = n.max(1);
                            if state.run >= n {
                                let seed = values[i + 1 - n..=i].iter().flatten().sum::<f64>()
                                    / n as f64;
                                state.level = Some(seed);
                                Some(seed)
                            } else {
                                None
                            }
                        }
                    }
                }
            };
            Some(output)
        })
        .collect()
}

/// 滾動窗口運算
///
/// 第 i 點的輸出為 `f(values[i+1-window..=i])`；窗口不完整或包含未定義值時輸出未定義。
pub fn rolling<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let window = window.max(1);
    // 重用緩衝區，避免每個窗口重新分配
    let mut buffer: Vec<f64> = Vec::with_capacity(window);

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            buffer.clear();
            for value in &values[i + 1 - window..=i] {
                buffer.push((*value)?);
            }
            f(&buffer)
        })
        .collect()
}

/// 算術平均
pub fn mean(window: &[f64]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    Some(window.iter().sum::<f64>() / window.len() as f64)
}
