//! Quote CSV loading.
//!
//! Reads an exchange "historical quote" export into a [`BarSeries`]:
//! - header names are matched after trimming and lowercasing (exports often
//!   carry trailing spaces such as `"close "`)
//! - numbers may contain thousands separators (`"1,634.25"`)
//! - dates may be `02-Jan-2024`, `2024-01-02`, `02-01-2024` or `02/01/2024`
//! - rows arrive newest-first in most exports and are sorted ascending here
//!
//! Only `date` and `close` are required. An empty close cell is kept as a
//! missing value so the indicator engine can report which bar lacks it.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use macdlab_core::{Bar, BarSeries, CoreError};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' not found in header")]
    MissingColumn(&'static str),

    #[error("line {line}: cannot parse {column} value '{value}'")]
    InvalidCell {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("duplicate bar for {0}")]
    DuplicateDate(NaiveDate),

    #[error("no data rows")]
    Empty,

    #[error(transparent)]
    Series(#[from] CoreError),
}

const DATE_FORMATS: [&str; 4] = ["%d-%b-%Y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Column positions resolved from the header row.
#[derive(Debug)]
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    prev_close: Option<usize>,
    last_traded_price: Option<usize>,
    vwap: Option<usize>,
    volume: Option<usize>,
    value: Option<usize>,
}

impl Columns {
    fn resolve(header: &StringRecord) -> Result<Self, LoadError> {
        let names: Vec<String> = header
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));

        Ok(Self {
            date: find(&["date", "timestamp"]).ok_or(LoadError::MissingColumn("date"))?,
            close: find(&["close", "close price"]).ok_or(LoadError::MissingColumn("close"))?,
            open: find(&["open", "open price"]),
            high: find(&["high", "high price"]),
            low: find(&["low", "low price"]),
            prev_close: find(&["prev. close", "prev close", "prev_close"]),
            last_traded_price: find(&["ltp", "last traded price", "last"]),
            vwap: find(&["vwap", "average price"]),
            volume: find(&["volume", "total traded quantity"]),
            value: find(&["value", "turnover"]),
        })
    }
}

/// Load a quote CSV from disk.
pub fn load_csv(path: &Path) -> Result<BarSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = parse_csv(file)?;
    tracing::info!(
        path = %path.display(),
        bars = series.len(),
        first = %series.first().date,
        last = %series.last().date,
        "loaded bar series"
    );
    Ok(series)
}

/// Parse quote CSV data from any reader.
pub fn parse_csv<R: Read>(reader: R) -> Result<BarSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::resolve(rdr.headers()?)?;

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        bars.push(parse_row(&record, &columns, line)?);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }

    bars.sort_by_key(|b| b.date);
    if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(LoadError::DuplicateDate(pair[0].date));
    }
    tracing::debug!(rows = bars.len(), "parsed quote rows");
    Ok(BarSeries::new(bars)?)
}

fn parse_row(record: &StringRecord, cols: &Columns, line: u64) -> Result<Bar, LoadError> {
    let cell = |idx: usize| record.get(idx).unwrap_or("");
    let price = |idx: Option<usize>, column: &'static str| -> Result<f64, LoadError> {
        match idx {
            Some(i) => Ok(parse_number(cell(i), column, line)?.unwrap_or(f64::NAN)),
            None => Ok(f64::NAN),
        }
    };

    let date = parse_date(cell(cols.date)).ok_or_else(|| LoadError::InvalidCell {
        line,
        column: "date",
        value: cell(cols.date).to_string(),
    })?;

    let volume = match cols.volume {
        Some(i) => match parse_number(cell(i), "volume", line)? {
            Some(v) if v >= 0.0 => v.round() as u64,
            Some(_) => {
                return Err(LoadError::InvalidCell {
                    line,
                    column: "volume",
                    value: cell(i).to_string(),
                })
            }
            None => 0,
        },
        None => 0,
    };

    Ok(Bar {
        date,
        open: price(cols.open, "open")?,
        high: price(cols.high, "high")?,
        low: price(cols.low, "low")?,
        prev_close: price(cols.prev_close, "prev_close")?,
        last_traded_price: price(cols.last_traded_price, "ltp")?,
        close: price(Some(cols.close), "close")?,
        vwap: price(cols.vwap, "vwap")?,
        volume,
        value: price(cols.value, "value")?,
    })
}

/// Parse a number that may carry thousands separators. Blank or `-` is missing.
fn parse_number(raw: &str, column: &'static str, line: u64) -> Result<Option<f64>, LoadError> {
    let cleaned: String = raw.trim().chars().filter(|&c| c != ',').collect();
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| LoadError::InvalidCell {
            line,
            column,
            value: raw.to_string(),
        })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE_EXPORT: &str = "\
Date ,series ,OPEN ,HIGH ,LOW ,PREV. CLOSE ,ltp ,close ,vwap ,52W H ,52W L ,VOLUME ,VALUE ,No of trades 
03-Jan-2024,EQ,\"1,700.00\",\"1,712.50\",\"1,690.10\",\"1,703.95\",\"1,705.00\",\"1,706.40\",\"1,701.22\",\"1,757.50\",\"1,363.55\",\"12,345,678\",\"21,002,345,678.90\",\"234,567\"
02-Jan-2024,EQ,\"1,690.00\",\"1,710.00\",\"1,685.00\",\"1,690.45\",\"1,704.00\",\"1,703.95\",\"1,699.80\",\"1,757.50\",\"1,363.55\",\"9,876,543\",\"16,789,012,345.00\",\"198,765\"
";

    #[test]
    fn parses_exchange_export_and_sorts_ascending() {
        let series = parse_csv(QUOTE_EXPORT.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());

        let bar = &series[1];
        assert_eq!(bar.open, 1700.0);
        assert_eq!(bar.high, 1712.5);
        assert_eq!(bar.low, 1690.1);
        assert_eq!(bar.prev_close, 1703.95);
        assert_eq!(bar.last_traded_price, 1705.0);
        assert_eq!(bar.close, 1706.4);
        assert_eq!(bar.vwap, 1701.22);
        assert_eq!(bar.volume, 12_345_678);
        assert_eq!(bar.value, 21_002_345_678.9);
    }

    #[test]
    fn minimal_date_close_file() {
        let csv = "date,close\n2024-01-02,10\n2024-01-03,11.5\n";
        let series = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].close, 11.5);
        assert!(series[1].open.is_nan());
        assert_eq!(series[1].volume, 0);
    }

    #[test]
    fn accepts_alternative_date_formats() {
        for raw in ["02-Jan-2024", "2024-01-02", "02-01-2024", "02/01/2024"] {
            assert_eq!(
                parse_date(raw),
                NaiveDate::from_ymd_opt(2024, 1, 2),
                "format {raw}"
            );
        }
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn blank_close_is_kept_as_missing() {
        let csv = "date,close\n2024-01-02,10\n2024-01-03,\n";
        let series = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(series[1].close_price(), None);
    }

    #[test]
    fn missing_close_column_is_an_error() {
        let csv = "date,open\n2024-01-02,10\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("close")));
    }

    #[test]
    fn garbage_number_reports_line() {
        let csv = "date,close\n2024-01-02,10\n2024-01-03,abc\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        match err {
            LoadError::InvalidCell { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, "close");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_date_is_an_error() {
        let csv = "date,close\nnot-a-date,10\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidCell { column: "date", .. }));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let csv = "date,close\n2024-01-02,10\n2024-01-02,11\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateDate(_)));
    }

    #[test]
    fn header_only_is_empty() {
        let err = parse_csv("date,close\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let csv = "date,close\n2024-01-02,10\n,\n2024-01-03,11\n";
        let series = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
    }
}
