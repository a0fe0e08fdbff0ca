//! Calendar support for date projections: patterns, intervals and bounds.
//!
//! Patterns use the Java `DateTimeFormatter` letters that table properties
//! are written in (`yyyy-MM-dd`, `yyyy/MM/dd/HH`, ...) and are compiled to a
//! chrono strftime program once. Formatting and parsing are exact inverses:
//! a string only parses if re-formatting it reproduces the input.

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{Datelike, Duration, Months, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// INTERVAL UNITS
// ============================================================================

/// Calendar unit of a date projection interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntervalUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl IntervalUnit {
    /// Length in seconds for fixed-length units, `None` for calendar units.
    pub fn fixed_seconds(self) -> Option<i64> {
        match self {
            IntervalUnit::Seconds => Some(1),
            IntervalUnit::Minutes => Some(60),
            IntervalUnit::Hours => Some(3_600),
            IntervalUnit::Days => Some(86_400),
            IntervalUnit::Weeks => Some(604_800),
            IntervalUnit::Months | IntervalUnit::Years => None,
        }
    }

    /// Length in months for calendar units, `None` for fixed-length units.
    pub fn calendar_months(self) -> Option<u32> {
        match self {
            IntervalUnit::Months => Some(1),
            IntervalUnit::Years => Some(12),
            _ => None,
        }
    }

    /// Move `ts` by `amount` units (negative moves backwards).
    pub fn shift(self, ts: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
        if let Some(months) = self.calendar_months() {
            let total = amount.checked_mul(i64::from(months))?;
            let magnitude = Months::new(u32::try_from(total.unsigned_abs()).ok()?);
            if total >= 0 {
                ts.checked_add_months(magnitude)
            } else {
                ts.checked_sub_months(magnitude)
            }
        } else {
            let seconds = self.fixed_seconds()?.checked_mul(amount)?;
            ts.checked_add_signed(Duration::try_seconds(seconds)?)
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntervalUnit::Seconds => "SECONDS",
            IntervalUnit::Minutes => "MINUTES",
            IntervalUnit::Hours => "HOURS",
            IntervalUnit::Days => "DAYS",
            IntervalUnit::Weeks => "WEEKS",
            IntervalUnit::Months => "MONTHS",
            IntervalUnit::Years => "YEARS",
        };
        f.write_str(name)
    }
}

impl FromStr for IntervalUnit {
    type Err = String;

    /// Accepts singular or plural names in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let singular = upper.strip_suffix('S').unwrap_or(&upper);
        match singular {
            "SECOND" => Ok(IntervalUnit::Seconds),
            "MINUTE" => Ok(IntervalUnit::Minutes),
            "HOUR" => Ok(IntervalUnit::Hours),
            "DAY" => Ok(IntervalUnit::Days),
            "WEEK" => Ok(IntervalUnit::Weeks),
            "MONTH" => Ok(IntervalUnit::Months),
            "YEAR" => Ok(IntervalUnit::Years),
            _ => Err(format!("unknown interval unit '{}'", s.trim())),
        }
    }
}

// ============================================================================
// DATE INTERVAL
// ============================================================================

/// Step between successive date partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    pub magnitude: u32,
    pub unit: IntervalUnit,
}

impl DateInterval {
    pub fn new(magnitude: u32, unit: IntervalUnit) -> Self {
        Self { magnitude, unit }
    }

    /// The grid point `origin + steps * interval`.
    ///
    /// Always computed from the origin so that month arithmetic never drifts
    /// (Jan 31 + 1 month is Feb 29, + 2 months is Mar 31).
    pub fn advance(&self, origin: NaiveDateTime, steps: u64) -> Option<NaiveDateTime> {
        let amount = i64::try_from(steps)
            .ok()?
            .checked_mul(i64::from(self.magnitude))?;
        self.unit.shift(origin, amount)
    }

    /// Largest `k` with `advance(origin, k) <= target`, or `None` when the
    /// target precedes the origin.
    pub fn steps_within(&self, origin: NaiveDateTime, target: NaiveDateTime) -> Option<u64> {
        if target < origin || self.magnitude == 0 {
            return None;
        }
        let mut k = self.estimate_steps(origin, target);
        while k > 0 && self.advance(origin, k).map_or(true, |ts| ts > target) {
            k -= 1;
        }
        while let Some(next) = self.advance(origin, k + 1) {
            if next > target {
                break;
            }
            k += 1;
        }
        Some(k)
    }

    /// Smallest `k` with `advance(origin, k) >= target`, or `None` when no
    /// representable grid point reaches the target.
    pub fn steps_to_reach(&self, origin: NaiveDateTime, target: NaiveDateTime) -> Option<u64> {
        if target <= origin {
            return Some(0);
        }
        let floor = self.steps_within(origin, target)?;
        if self.advance(origin, floor)? == target {
            Some(floor)
        } else {
            self.advance(origin, floor + 1)?;
            Some(floor + 1)
        }
    }

    /// Whether `ts` lies exactly on the grid anchored at `origin`.
    pub fn is_on_grid(&self, origin: NaiveDateTime, ts: NaiveDateTime) -> bool {
        self.steps_within(origin, ts)
            .and_then(|k| self.advance(origin, k))
            .is_some_and(|grid| grid == ts)
    }

    /// Arithmetic guess for the number of whole steps, refined by the callers.
    fn estimate_steps(&self, origin: NaiveDateTime, target: NaiveDateTime) -> u64 {
        let magnitude = i64::from(self.magnitude);
        let raw = match (self.unit.fixed_seconds(), self.unit.calendar_months()) {
            (Some(seconds), _) => (target - origin).num_seconds() / (seconds * magnitude),
            (None, Some(months)) => {
                let origin_months = i64::from(origin.year()) * 12 + i64::from(origin.month0());
                let target_months = i64::from(target.year()) * 12 + i64::from(target.month0());
                (target_months - origin_months) / (i64::from(months) * magnitude)
            }
            (None, None) => 0,
        };
        u64::try_from(raw).unwrap_or(0)
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

// ============================================================================
// DATE PATTERN
// ============================================================================

/// Which calendar fields a pattern renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
struct PatternFields {
    year: bool,
    month: bool,
    day: bool,
    hour: bool,
    minute: bool,
    second: bool,
}

/// A compiled date format pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatePattern {
    pattern: String,
    strftime: String,
    fields: PatternFields,
}

impl DatePattern {
    /// Compile a Java-style pattern.
    ///
    /// Supported letters: `yyyy`, `yy`, `uuuu`, `M`, `MM`, `MMM`, `MMMM`,
    /// `d`, `dd`, `H`, `HH`, `m`, `mm`, `s`, `ss`. Text inside single quotes
    /// and any non-letter character is copied literally.
    pub fn compile(pattern: &str) -> Result<Self, String> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut strftime = String::new();
        let mut fields = PatternFields::default();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '\'' {
                // '' is an escaped quote, otherwise read up to the closing quote
                if chars.get(i + 1) == Some(&'\'') {
                    strftime.push('\'');
                    i += 2;
                    continue;
                }
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => return Err(format!("unterminated quote in pattern '{}'", pattern)),
                        Some('\'') if chars.get(j + 1) == Some(&'\'') => {
                            strftime.push('\'');
                            j += 2;
                        }
                        Some('\'') => break,
                        Some(&literal) => {
                            push_literal(&mut strftime, literal);
                            j += 1;
                        }
                    }
                }
                i = j + 1;
                continue;
            }

            if !c.is_ascii_alphabetic() {
                push_literal(&mut strftime, c);
                i += 1;
                continue;
            }

            let mut count = 1;
            while chars.get(i + count) == Some(&c) {
                count += 1;
            }
            let spec = match (c, count) {
                ('y' | 'u', 2) => {
                    fields.year = true;
                    "%y"
                }
                ('y' | 'u', 4) => {
                    fields.year = true;
                    "%Y"
                }
                ('M', 1) => {
                    fields.month = true;
                    "%-m"
                }
                ('M', 2) => {
                    fields.month = true;
                    "%m"
                }
                ('M', 3) => {
                    fields.month = true;
                    "%b"
                }
                ('M', 4) => {
                    fields.month = true;
                    "%B"
                }
                ('d', 1) => {
                    fields.day = true;
                    "%-d"
                }
                ('d', 2) => {
                    fields.day = true;
                    "%d"
                }
                ('H', 1) => {
                    fields.hour = true;
                    "%-H"
                }
                ('H', 2) => {
                    fields.hour = true;
                    "%H"
                }
                ('m', 1) => {
                    fields.minute = true;
                    "%-M"
                }
                ('m', 2) => {
                    fields.minute = true;
                    "%M"
                }
                ('s', 1) => {
                    fields.second = true;
                    "%-S"
                }
                ('s', 2) => {
                    fields.second = true;
                    "%S"
                }
                _ => {
                    return Err(format!(
                        "unsupported field '{}' in pattern '{}'",
                        c.to_string().repeat(count),
                        pattern
                    ))
                }
            };
            strftime.push_str(spec);
            i += count;
        }

        if !fields.year {
            return Err(format!("pattern '{}' has no year field", pattern));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            strftime,
            fields,
        })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, ts: NaiveDateTime) -> String {
        ts.format(&self.strftime).to_string()
    }

    /// Parse `text`, filling absent fields with the start of the period.
    ///
    /// Returns `None` unless `format(parse(text)) == text`.
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let mut parsed = Parsed::new();
        parse(&mut parsed, text, StrftimeItems::new(&self.strftime)).ok()?;
        if !self.fields.month {
            parsed.set_month(1).ok()?;
        }
        if !self.fields.day {
            parsed.set_day(1).ok()?;
        }
        if !self.fields.hour {
            parsed.set_hour(0).ok()?;
        }
        if !self.fields.minute {
            parsed.set_minute(0).ok()?;
        }
        if !self.fields.second {
            parsed.set_second(0).ok()?;
        }
        let ts = parsed.to_naive_date().ok()?.and_time(parsed.to_naive_time().ok()?);
        (self.format(ts) == text).then_some(ts)
    }

    /// Drop every field finer than the pattern renders.
    pub fn truncate(&self, ts: NaiveDateTime) -> Option<NaiveDateTime> {
        self.parse(&self.format(ts))
    }

    /// The finest unit the pattern distinguishes, used as the default
    /// interval unit.
    pub fn finest_unit(&self) -> IntervalUnit {
        let f = self.fields;
        if f.second {
            IntervalUnit::Seconds
        } else if f.minute {
            IntervalUnit::Minutes
        } else if f.hour {
            IntervalUnit::Hours
        } else if f.day {
            IntervalUnit::Days
        } else if f.month {
            IntervalUnit::Months
        } else {
            IntervalUnit::Years
        }
    }
}

fn push_literal(strftime: &mut String, c: char) {
    if c == '%' {
        strftime.push_str("%%");
    } else {
        strftime.push(c);
    }
}

impl TryFrom<String> for DatePattern {
    type Error = String;

    fn try_from(pattern: String) -> Result<Self, Self::Error> {
        DatePattern::compile(&pattern)
    }
}

impl From<DatePattern> for String {
    fn from(pattern: DatePattern) -> Self {
        pattern.pattern
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

// ============================================================================
// DATE BOUNDS
// ============================================================================

static NOW_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*NOW\s*(?:([+-])\s*([0-9]+)\s*([A-Z]+))?\s*$")
        .unwrap_or_else(|e| panic!("NOW expression regex is invalid: {}", e))
});

/// One end of a date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateBound {
    /// An absolute instant, already truncated to the pattern.
    Fixed(NaiveDateTime),
    /// The evaluation instant shifted by `offset` units.
    Now { offset: i64, unit: IntervalUnit },
}

impl DateBound {
    /// The plain `NOW` sentinel.
    pub fn now() -> Self {
        DateBound::Now {
            offset: 0,
            unit: IntervalUnit::Days,
        }
    }

    /// Parse `NOW`, `NOW-3DAYS`, `NOW+1HOURS` or a value in `pattern`.
    pub fn parse(text: &str, pattern: &DatePattern) -> Result<Self, String> {
        if let Some(caps) = NOW_EXPR.captures(text) {
            let (Some(sign), Some(amount), Some(unit)) = (caps.get(1), caps.get(2), caps.get(3))
            else {
                return Ok(DateBound::now());
            };
            let amount: i64 = amount
                .as_str()
                .parse()
                .map_err(|_| format!("offset '{}' is too large", amount.as_str()))?;
            let unit: IntervalUnit = unit.as_str().parse()?;
            let offset = if sign.as_str() == "-" { -amount } else { amount };
            return Ok(DateBound::Now { offset, unit });
        }
        pattern
            .parse(text.trim())
            .map(DateBound::Fixed)
            .ok_or_else(|| {
                format!(
                    "'{}' is neither a NOW expression nor a date in pattern '{}'",
                    text.trim(),
                    pattern
                )
            })
    }

    /// Resolve against the evaluation instant and truncate to the pattern.
    pub fn resolve(&self, now: NaiveDateTime, pattern: &DatePattern) -> Option<NaiveDateTime> {
        match self {
            DateBound::Fixed(ts) => Some(*ts),
            DateBound::Now { offset, unit } => pattern.truncate(unit.shift(now, *offset)?),
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, DateBound::Now { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================
