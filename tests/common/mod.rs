#![allow(dead_code)]

use chrono::NaiveDate;
use pozole::data::{Bar, PriceSeries};

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()
}

//one flat bar per day, every price equal to the close
pub fn flat_series(symbol: &str, closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::flat(start_date() + chrono::Duration::days(i as i64), c))
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}

//opens at the previous close and trades a little beyond both ends
pub fn ohlc_series(symbol: &str, closes: &[f64]) -> PriceSeries {
    let mut prev = closes[0];
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = prev;
            prev = close;
            Bar::new(
                start_date() + chrono::Duration::days(i as i64),
                open,
                open.max(close) * 1.01,
                open.min(close) * 0.99,
                close,
                1_000.0,
            )
            .unwrap()
        })
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}

//falls one point a bar for 40 bars, then rises one point a bar for 60
pub fn v_shape() -> Vec<f64> {
    (0..100)
        .map(|i| if i < 40 { 100.0 - i as f64 } else { 61.0 + (i - 39) as f64 })
        .collect()
}
