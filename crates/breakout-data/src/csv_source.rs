//! CSV bar source.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use breakout_core::{Bar, DataError};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Column layout of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarFormat {
    /// `datetime,open,high,low,close[,spread]`
    #[default]
    Generic,
    /// MetaTrader 5 export: `<DATE> <TIME> <OPEN> <HIGH> <LOW> <CLOSE> ... <SPREAD>`
    Mt5,
}

impl FromStr for BarFormat {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "csv" => Ok(BarFormat::Generic),
            "mt5" | "metatrader" => Ok(BarFormat::Mt5),
            other => Err(DataError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Loader options.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub format: BarFormat,
    /// Minutes added to every timestamp (server time to reference zone)
    pub shift_minutes: i64,
    /// First date kept (inclusive, after shifting)
    pub from: Option<NaiveDate>,
    /// Last date kept (inclusive, after shifting)
    pub to: Option<NaiveDate>,
}

impl LoadOptions {
    pub fn new(format: BarFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_shift_minutes(mut self, minutes: i64) -> Self {
        self.shift_minutes = minutes;
        self
    }

    pub fn with_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    fn keeps(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }
}

/// Timestamp headers of the generic format, most preferred first.
///
/// Processed datasets carry both a UTC `datetime` and a reference-zone
/// `datetime_ist`; the reference-zone column wins.
const TIMESTAMP_COLUMNS: [&str; 3] = ["datetime_ist", "datetime", "timestamp"];

/// Column positions of a generic file, resolved from its header.
#[derive(Debug, Clone, PartialEq)]
struct GenericColumns {
    timestamp: usize,
    /// Separate time-of-day column joined to a `date` column
    time: Option<usize>,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    spread: Option<usize>,
}

impl GenericColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self, DataError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| DataError::ParseError(format!("missing column '{}'", name)))
        };

        let (timestamp, time) = match TIMESTAMP_COLUMNS.iter().find_map(|&c| find(c)) {
            Some(idx) => (idx, None),
            None => match (find("date"), find("time")) {
                (Some(date), time) => (date, time),
                (None, Some(time)) => (time, None),
                (None, None) => {
                    return Err(DataError::ParseError(
                        "no timestamp column (datetime_ist, datetime, timestamp, date)".into(),
                    ))
                }
            },
        };

        Ok(Self {
            timestamp,
            time,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            spread: find("spread"),
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<Bar, DataError> {
        let field = |idx: usize| {
            record.get(idx).ok_or_else(|| {
                DataError::ParseError(format!("short record at line {}", line_of(record)))
            })
        };
        let stamp = match self.time {
            Some(time) => format!("{} {}", field(self.timestamp)?, field(time)?),
            None => field(self.timestamp)?.to_string(),
        };
        build_bar(
            parse_timestamp(&stamp)?,
            field(self.open)?,
            field(self.high)?,
            field(self.low)?,
            field(self.close)?,
            self.spread.and_then(|idx| record.get(idx)),
        )
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

/// MetaTrader 5 export record.
#[derive(Debug, Deserialize)]
struct Mt5Record {
    #[serde(rename = "<DATE>")]
    date: String,
    #[serde(rename = "<TIME>", default)]
    time: Option<String>,
    #[serde(rename = "<OPEN>")]
    open: String,
    #[serde(rename = "<HIGH>")]
    high: String,
    #[serde(rename = "<LOW>")]
    low: String,
    #[serde(rename = "<CLOSE>")]
    close: String,
    #[serde(rename = "<SPREAD>", default)]
    spread: Option<String>,
}

/// CSV file of bars.
pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    /// Create a new CSV bar source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NotFound(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Load, shift, filter, sort and check the bars.
    pub fn load(&self, options: &LoadOptions) -> Result<Vec<Bar>, DataError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DataError::ParseError(format!("{}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        let bars = parse_bars(&content, options)?;
        info!(
            path = %self.path.display(),
            bars = bars.len(),
            format = ?options.format,
            "loaded bars"
        );
        Ok(bars)
    }
}

/// Parse bars from CSV text.
pub(crate) fn parse_bars(content: &str, options: &LoadOptions) -> Result<Vec<Bar>, DataError> {
    let first_line = content.lines().next().unwrap_or_default();
    let delimiter = if first_line.contains('\t') { b'\t' } else { b',' };
    debug!(delimiter = %(delimiter as char).escape_default(), "detected delimiter");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut bars = Vec::new();
    match options.format {
        BarFormat::Generic => {
            let headers = reader
                .headers()
                .map_err(|e| DataError::ParseError(e.to_string()))?;
            let columns = GenericColumns::from_headers(headers)?;
            debug!(?columns, "resolved generic columns");
            for result in reader.records() {
                let record = result.map_err(|e| DataError::ParseError(e.to_string()))?;
                bars.push(columns.parse(&record)?);
            }
        }
        BarFormat::Mt5 => {
            for result in reader.deserialize() {
                let r: Mt5Record = result.map_err(|e| DataError::ParseError(e.to_string()))?;
                let stamp = match &r.time {
                    Some(time) => format!("{} {}", r.date, time),
                    None => r.date.clone(),
                };
                let timestamp = parse_timestamp(&stamp)?;
                bars.push(build_bar(timestamp, &r.open, &r.high, &r.low, &r.close, r.spread.as_deref())?);
            }
        }
    }

    let shift = Duration::minutes(options.shift_minutes);
    let mut bars: Vec<Bar> = bars
        .into_iter()
        .map(|mut b| {
            b.timestamp += shift;
            b
        })
        .filter(|b| options.keeps(b.date()))
        .collect();

    bars.sort_by_key(|b| b.timestamp);
    if let Some(dup) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(DataError::Duplicate(dup[1].timestamp));
    }

    if bars.is_empty() {
        warn!("no bars left after filtering");
    }
    Ok(bars)
}

fn build_bar(
    timestamp: NaiveDateTime,
    open: &str,
    high: &str,
    low: &str,
    close: &str,
    spread: Option<&str>,
) -> Result<Bar, DataError> {
    let bar = Bar::new(
        timestamp,
        parse_decimal(open)?,
        parse_decimal(high)?,
        parse_decimal(low)?,
        parse_decimal(close)?,
    );
    match spread.filter(|s| !s.is_empty()) {
        Some(s) => Ok(bar.with_spread(parse_decimal(s)?)),
        None => Ok(bar),
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, DataError> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| DataError::ParseError(format!("Could not parse number: {}", s)))
}

/// Parse the timestamp formats seen in exports.
///
/// Offsets are converted to UTC; naive stamps are taken as-is.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DataError> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y.%m.%d %H:%M:%S",
        "%Y.%m.%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.naive_utc());
    }

    for format in ["%Y-%m-%d", "%Y.%m.%d"] {
        if let Some(dt) = NaiveDate::parse_from_str(s, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt);
        }
    }

    // Unix timestamp, milliseconds if > 10 digits
    if let Ok(ts) = s.parse::<i64>() {
        let dt = if ts > 10_000_000_000 {
            DateTime::from_timestamp_millis(ts)
        } else {
            DateTime::from_timestamp(ts, 0)
        };
        if let Some(dt) = dt {
            return Ok(dt.naive_utc());
        }
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", s)))
}
