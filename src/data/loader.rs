use crate::data::bar::Bar;
use crate::data::series::PriceSeries;
use crate::error::{BacktestError, Result};
use chrono::{DateTime, NaiveDate};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "timestamp")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

//accepts plain dates as well as rfc3339 timestamps
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

//loads daily bars for one symbol from a csv file
pub fn load_csv<P: AsRef<Path>>(path: P, symbol: &str) -> Result<PriceSeries> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut bars = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let line = index + 2;
        let record: CsvRecord = result?;

        let date = parse_date(&record.date).ok_or_else(|| {
            BacktestError::data(format!(
                "{:?} line {}: unparseable date '{}'",
                path, line, record.date
            ))
        })?;

        let bar = Bar::new(
            date,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        )
        .map_err(|e| BacktestError::data(format!("{:?} line {}: {}", path, line, e)))?;

        bars.push(bar);
    }

    //sort by date to ensure chronological order
    bars.sort_by_key(|bar| bar.date);

    PriceSeries::new(symbol, bars)
}

//writes a series to csv with a date,open,high,low,close,volume header
pub fn save_csv<P: AsRef<Path>>(series: &PriceSeries, path: P) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path.as_ref())?;
    for bar in series.bars() {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}
