//daily bars from the yahoo v8 chart api

use crate::data::bar::Bar;
use crate::data::series::PriceSeries;
use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

//blocking client for the yahoo chart endpoint
pub struct YahooClient {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) pozole")
            .build()?;

        Ok(YahooClient {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn chart_url(symbol: &str, from: NaiveDate, to: NaiveDate) -> String {
        let start = from.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end = to
            .succ_opt()
            .unwrap_or(to)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start}&period2={end}&interval=1d"
        )
    }

    //downloads daily bars for symbol in [from, to]
    pub fn fetch(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<PriceSeries> {
        if from > to {
            return Err(BacktestError::config(format!(
                "fromdate {} is after todate {}",
                from, to
            )));
        }

        let url = Self::chart_url(symbol, from, to);
        let mut attempt = 0;

        let body = loop {
            match self.request(&url) {
                Ok(body) => break body,
                Err(err) if attempt < self.max_retries => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        symbol,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "download failed, retrying"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        let response: ChartResponse = serde_json::from_str(&body)?;
        let series = parse_chart(symbol, response)?;
        tracing::info!(symbol, bars = series.len(), "downloaded price history");
        series.between(from, to)
    }

    fn request(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.text()?)
    }
}

fn parse_chart(symbol: &str, response: ChartResponse) -> Result<PriceSeries> {
    let data = match (response.chart.result, response.chart.error) {
        (Some(result), _) => result.into_iter().next(),
        (None, Some(err)) => {
            return Err(BacktestError::data(format!(
                "{}: {} ({})",
                symbol, err.description, err.code
            )))
        }
        (None, None) => None,
    }
    .ok_or_else(|| BacktestError::data(format!("{}: empty chart response", symbol)))?;

    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| BacktestError::data(format!("{}: no quote data", symbol)))?;

    let mut bars = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| BacktestError::data(format!("{}: invalid timestamp {}", symbol, ts)))?;

        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();

        //holidays and halted sessions come back with null prices
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };

        let volume = field(&quote.volume).unwrap_or(0.0);

        match Bar::new(date, open, high, low, close, volume) {
            Ok(bar) => bars.push(bar),
            Err(e) => tracing::warn!(symbol, %date, error = %e, "skipping malformed bar"),
        }
    }

    //intraday timestamps can map two rows onto one date, keep the later
    bars.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            *earlier = *later;
            true
        } else {
            false
        }
    });

    PriceSeries::new(symbol, bars)
}
