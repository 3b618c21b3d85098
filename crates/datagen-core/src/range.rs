//! Range grammar shared by the numeric and pattern generators.
//!
//! Three textual forms are accepted:
//!
//! - `min..max`: integers in `[min, max)`.
//! - `min..max!e1|e2`: same, without the listed exclusions.
//! - `v1|v2|v3`: one of the enumerated values.
//!
//! The literal width of each token is recorded so sampled values can be
//! rendered with the same zero padding (`007..120` renders `8` as `008`).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::error::RangeError;

static RANGE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]+\.\.[0-9]+[!0-9|]*|[0-9|]+").expect("range token pattern compiles")
});

/// Parsed numeric domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Range {
    Bounded(BoundedRange),
    Discrete(DiscreteSet),
}

/// Continuous range `[min, max)` with optional exclusions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedRange {
    min: i64,
    max: i64,
    exclusions: BTreeSet<i64>,
    min_digits: usize,
    max_digits: usize,
}

/// Enumerated values, sampled by index in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscreteSet {
    values: Vec<i64>,
    digit_widths: Vec<usize>,
}

/// Range expression embedded in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeToken {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Parse a range expression.
pub fn parse_range(expr: &str) -> Result<Range, RangeError> {
    if expr.contains("..") {
        parse_bounded(expr).map(Range::Bounded)
    } else {
        parse_discrete(expr).map(Range::Discrete)
    }
}

/// Locate every range expression inside `text`, left to right.
pub fn find_range_tokens(text: &str) -> Vec<RangeToken> {
    RANGE_TOKEN
        .find_iter(text)
        .map(|found| RangeToken {
            start: found.start(),
            end: found.end(),
            text: found.as_str().to_string(),
        })
        .collect()
}

fn parse_bounded(expr: &str) -> Result<BoundedRange, RangeError> {
    let parts: Vec<&str> = expr.split("..").collect();
    let [min_token, max_token] = parts.as_slice() else {
        return Err(RangeError::Malformed(expr.to_string()));
    };
    let min_token = min_token.trim();
    let (max_token, exclusions) = match max_token.split_once('!') {
        Some((max_token, excluded)) => {
            let excluded = parse_discrete(excluded)?;
            (max_token.trim(), excluded.values.into_iter().collect())
        }
        None => (max_token.trim(), BTreeSet::new()),
    };

    let range = BoundedRange {
        min: parse_int(expr, min_token)?,
        max: parse_int(expr, max_token)?,
        exclusions,
        min_digits: min_token.len(),
        max_digits: max_token.len(),
    };

    if range.min >= range.max {
        return Err(RangeError::Empty(expr.to_string()));
    }
    let span = i128::from(range.max) - i128::from(range.min);
    let excluded_inside = range
        .exclusions
        .range(range.min..range.max)
        .count();
    if excluded_inside as i128 >= span {
        return Err(RangeError::FullyExcluded(expr.to_string()));
    }

    Ok(range)
}

fn parse_discrete(expr: &str) -> Result<DiscreteSet, RangeError> {
    let mut values = Vec::new();
    let mut digit_widths = Vec::new();
    for token in expr.split('|') {
        let token = token.trim();
        values.push(parse_int(expr, token)?);
        digit_widths.push(token.len());
    }
    Ok(DiscreteSet {
        values,
        digit_widths,
    })
}

fn parse_int(expr: &str, token: &str) -> Result<i64, RangeError> {
    token.parse::<i64>().map_err(|_| RangeError::InvalidNumber {
        expr: expr.to_string(),
        token: token.to_string(),
    })
}

fn pad(value: i64, width: usize) -> String {
    format!("{value:0>width$}")
}

impl Range {
    /// Lowest and highest bound of the domain.
    ///
    /// For a bounded range `max` stays exclusive, for a discrete set both
    /// bounds are values of the set.
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            Range::Bounded(range) => range.bounds(),
            Range::Discrete(set) => set.bounds(),
        }
    }

    pub fn min(&self) -> i64 {
        self.bounds().0
    }

    pub fn max(&self) -> i64 {
        self.bounds().1
    }

    pub fn exclusions(&self) -> Vec<i64> {
        match self {
            Range::Bounded(range) => range.exclusions.iter().copied().collect(),
            Range::Discrete(_) => Vec::new(),
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> i64 {
        match self {
            Range::Bounded(range) => range.sample(rng),
            Range::Discrete(set) => set.sample(rng),
        }
    }

    /// Sample a value rendered with the zero padding of its source token.
    pub fn sample_padded(&self, rng: &mut impl Rng) -> String {
        match self {
            Range::Bounded(range) => range.sample_padded(rng),
            Range::Discrete(set) => set.sample_padded(rng),
        }
    }
}

impl BoundedRange {
    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    pub fn exclusions(&self) -> &BTreeSet<i64> {
        &self.exclusions
    }

    pub fn digit_widths(&self) -> (usize, usize) {
        (self.min_digits, self.max_digits)
    }

    /// Uniform draw in `[min, max)`, redrawn while it hits an exclusion.
    ///
    /// Terminates because parsing rejects ranges whose exclusions cover the
    /// whole domain; it slows down as exclusions approach full coverage.
    pub fn sample(&self, rng: &mut impl Rng) -> i64 {
        loop {
            let value = rng.random_range(self.min..self.max);
            if !self.exclusions.contains(&value) {
                return value;
            }
        }
    }

    pub fn sample_padded(&self, rng: &mut impl Rng) -> String {
        pad(self.sample(rng), self.min_digits)
    }
}

impl DiscreteSet {
    pub fn bounds(&self) -> (i64, i64) {
        let min = self.values.iter().copied().min().unwrap_or_default();
        let max = self.values.iter().copied().max().unwrap_or_default();
        (min, max)
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn digit_widths(&self) -> &[usize] {
        &self.digit_widths
    }

    pub fn sample(&self, rng: &mut impl Rng) -> i64 {
        self.values[rng.random_range(0..self.values.len())]
    }

    pub fn sample_padded(&self, rng: &mut impl Rng) -> String {
        let index = rng.random_range(0..self.values.len());
        pad(self.values[index], self.digit_widths[index])
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Range::Bounded(range) => write!(f, "{range}"),
            Range::Discrete(set) => write!(f, "{set}"),
        }
    }
}

impl fmt::Display for BoundedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)?;
        if !self.exclusions.is_empty() {
            let excluded: Vec<String> = self.exclusions.iter().map(i64::to_string).collect();
            write!(f, "!{}", excluded.join("|"))?;
        }
        Ok(())
    }
}

impl fmt::Display for DiscreteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.values.iter().map(i64::to_string).collect();
        write!(f, "{}", values.join("|"))
    }
}
