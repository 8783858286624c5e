// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Width-keyed breakpoint datasets.
//!
//! A [`BreakpointDataset`] maps a breakpoint width in CSS pixels to a value.
//! Entries are kept ordered by numeric width, so the first entry is always
//! the smallest breakpoint and the last the largest, regardless of the order
//! in which they were inserted or serialized.
//!
//! Datasets arrive from the rendering layer as JSON objects keyed by decimal
//! widths, e.g. `{"320": 56.25, "768": 42.5, "1200": 33.3}`.
//! [`BreakpointDataset::parse_json`] reports what went wrong;
//! [`BreakpointDataset::parse_lenient`] reports it to a tracer and returns
//! an empty dataset instead.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;

use kurbo::Size;
use serde_json::Value;

use crate::trace::{DatasetRejectedEvent, Tracer};

/// An ordered mapping from breakpoint width to value.
#[derive(Clone, Debug, PartialEq)]
pub struct BreakpointDataset<V> {
    entries: BTreeMap<u32, V>,
}

impl<V> Default for BreakpointDataset<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> BreakpointDataset<V> {
    /// Creates an empty dataset.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Inserts a breakpoint, returning the value it replaced.
    pub fn insert(&mut self, width: u32, value: V) -> Option<V> {
        self.entries.insert(width, value)
    }

    /// Removes a breakpoint.
    pub fn remove(&mut self, width: u32) -> Option<V> {
        self.entries.remove(&width)
    }

    /// Returns the value stored at exactly `width`.
    #[must_use]
    pub fn get(&self, width: u32) -> Option<&V> {
        self.entries.get(&width)
    }

    /// Number of breakpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no breakpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The smallest breakpoint and its value.
    #[must_use]
    pub fn first(&self) -> Option<(u32, &V)> {
        self.entries.first_key_value().map(|(k, v)| (*k, v))
    }

    /// The largest breakpoint and its value.
    #[must_use]
    pub fn last(&self) -> Option<(u32, &V)> {
        self.entries.last_key_value().map(|(k, v)| (*k, v))
    }

    /// Iterates breakpoints in ascending width order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (u32, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Iterates breakpoint widths in ascending order.
    pub fn widths(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }
}

impl<V: Clone> BreakpointDataset<V> {
    /// Returns a new dataset holding the entries of both; `other` wins where
    /// both define the same width. Neither input is modified.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (*k, v.clone())));
        Self { entries }
    }
}

impl<V> FromIterator<(u32, V)> for BreakpointDataset<V> {
    fn from_iter<I: IntoIterator<Item = (u32, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<V: DatasetValue> BreakpointDataset<V> {
    /// Parses a JSON object keyed by decimal breakpoint widths.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] if the text is not valid JSON, is not an
    /// object, has a key that is not a positive integer, or has a value that
    /// `V` cannot be built from.
    pub fn parse_json(text: &str) -> Result<Self, DatasetError> {
        let root: Value = serde_json::from_str(text).map_err(|err| DatasetError::Malformed {
            line: err.line(),
            column: err.column(),
        })?;
        let Value::Object(map) = root else {
            return Err(DatasetError::NotAnObject);
        };

        let mut dataset = Self::new();
        for (key, raw) in &map {
            let width = parse_width(key).ok_or_else(|| DatasetError::InvalidKey(key.clone()))?;
            let value = V::from_json(raw).ok_or(DatasetError::InvalidValue { width })?;
            dataset.insert(width, value);
        }
        Ok(dataset)
    }

    /// Parses like [`parse_json`](Self::parse_json) but never fails: any
    /// error is reported to `tracer` and an empty dataset is returned.
    #[must_use]
    pub fn parse_lenient(text: &str, tracer: &mut Tracer<'_>) -> Self {
        match Self::parse_json(text) {
            Ok(dataset) => dataset,
            Err(error) => {
                tracer.dataset_rejected(&DatasetRejectedEvent { error: &error });
                Self::new()
            }
        }
    }
}

/// Parses a breakpoint key. Keys are positive decimal integers; surrounding
/// whitespace is tolerated.
fn parse_width(key: &str) -> Option<u32> {
    key.trim().parse::<u32>().ok().filter(|w| *w > 0)
}

/// A value type that can be read from a dataset's JSON values.
pub trait DatasetValue: Sized {
    /// Builds a value from one JSON entry, or `None` if it does not fit.
    fn from_json(value: &Value) -> Option<Self>;
}

impl DatasetValue for Value {
    fn from_json(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl DatasetValue for String {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl DatasetValue for Ratio {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().and_then(Self::new),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }
}

/// A dataset of padding ratios, the shape consumed by the ratio layer.
pub type RatioDataset = BreakpointDataset<Ratio>;

/// Why a dataset could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetError {
    /// The text is not valid JSON.
    Malformed {
        /// 1-based line of the syntax error.
        line: usize,
        /// 1-based column of the syntax error.
        column: usize,
    },
    /// The JSON is valid but the root is not an object.
    NotAnObject,
    /// A key is not a positive decimal width.
    InvalidKey(String),
    /// The value at a breakpoint has the wrong type.
    InvalidValue {
        /// The breakpoint whose value was rejected.
        width: u32,
    },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { line, column } => {
                write!(f, "malformed dataset JSON at line {line}, column {column}")
            }
            Self::NotAnObject => f.write_str("dataset JSON is not an object"),
            Self::InvalidKey(key) => write!(f, "breakpoint key {key:?} is not a positive width"),
            Self::InvalidValue { width } => write!(f, "unusable value at breakpoint {width}"),
        }
    }
}

impl core::error::Error for DatasetError {}

/// A bottom-padding percentage that gives a container its aspect ratio.
///
/// `Ratio(56.25)` is a 16:9 box. Always finite and non-negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Creates a ratio, rejecting non-finite or negative percentages.
    #[must_use]
    pub fn new(percent: f64) -> Option<Self> {
        (percent.is_finite() && percent >= 0.0).then_some(Self(percent))
    }

    /// Parses `"56.25"` or `"56.25%"`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let number = text.strip_suffix('%').unwrap_or(text).trim_end();
        number.parse::<f64>().ok().and_then(Self::new)
    }

    /// Computes the padding percentage for media of the given natural size.
    ///
    /// Returns `None` for a zero, negative, or non-finite width, or a
    /// negative or non-finite height.
    #[must_use]
    pub fn from_dimensions(size: Size) -> Option<Self> {
        if !size.is_finite() || size.width <= 0.0 {
            return None;
        }
        Self::new(size.height / size.width * 100.0)
    }

    /// The percentage value.
    #[must_use]
    pub const fn percent(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Ratio {
    /// Formats as a CSS percentage, e.g. `56.25%`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec::Vec;

    #[test]
    fn keys_are_ordered_numerically() {
        let ds = RatioDataset::parse_json(r#"{"1200": 33.3, "320": 56.25, "768": 42.5}"#).unwrap();
        let widths: Vec<u32> = ds.widths().collect();
        assert_eq!(widths, [320, 768, 1200]);
        assert_eq!(ds.first().map(|(w, _)| w), Some(320));
        assert_eq!(ds.last().map(|(w, _)| w), Some(1200));
    }

    #[test]
    fn numeric_not_lexicographic_order() {
        // "90" sorts after "1000" as a string.
        let ds = RatioDataset::parse_json(r#"{"90": 10, "1000": 20}"#).unwrap();
        assert_eq!(ds.first().map(|(w, _)| w), Some(90));
    }

    #[test]
    fn string_values_are_accepted() {
        let ds = RatioDataset::parse_json(r#"{"480": "75", "960": "50%"}"#).unwrap();
        assert_eq!(ds.get(480), Ratio::new(75.0).as_ref());
        assert_eq!(ds.get(960), Ratio::new(50.0).as_ref());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = RatioDataset::parse_json("{not json").unwrap_err();
        assert!(matches!(err, DatasetError::Malformed { line: 1, .. }));
    }

    #[test]
    fn non_object_is_an_error() {
        assert_eq!(
            RatioDataset::parse_json("[1, 2]").unwrap_err(),
            DatasetError::NotAnObject
        );
    }

    #[test]
    fn bad_keys_and_values_are_errors() {
        assert_eq!(
            RatioDataset::parse_json(r#"{"wide": 1}"#).unwrap_err(),
            DatasetError::InvalidKey("wide".into())
        );
        assert_eq!(
            RatioDataset::parse_json(r#"{"0": 1}"#).unwrap_err(),
            DatasetError::InvalidKey("0".into())
        );
        assert_eq!(
            RatioDataset::parse_json(r#"{"640": true}"#).unwrap_err(),
            DatasetError::InvalidValue { width: 640 }
        );
    }

    #[test]
    fn lenient_parse_degrades_to_empty() {
        let ds = RatioDataset::parse_lenient("{not json", &mut Tracer::none());
        assert!(ds.is_empty());
    }

    #[test]
    fn structured_values_survive() {
        let ds = BreakpointDataset::<Value>::parse_json(r#"{"600": {"src": "a.jpg"}}"#).unwrap();
        assert_eq!(ds.get(600).and_then(|v| v["src"].as_str()), Some("a.jpg"));
    }

    #[test]
    fn merged_prefers_other_and_leaves_inputs_alone() {
        let base: BreakpointDataset<u8> = [(100, 1), (200, 2)].into_iter().collect();
        let over: BreakpointDataset<u8> = [(200, 20), (300, 30)].into_iter().collect();
        let merged = base.merged(&over);
        assert_eq!(merged.iter().collect::<Vec<_>>(), [(100, &1), (200, &20), (300, &30)]);
        assert_eq!(base.len(), 2);
        assert_eq!(over.len(), 2);
    }

    #[test]
    fn ratio_formats_as_css() {
        assert_eq!(format!("{}", Ratio::new(56.25).unwrap()), "56.25%");
        assert_eq!(format!("{}", Ratio::new(50.0).unwrap()), "50%");
    }

    #[test]
    fn ratio_from_dimensions() {
        let r = Ratio::from_dimensions(Size::new(1600.0, 900.0)).unwrap();
        assert_eq!(r.percent(), 56.25);
        assert!(Ratio::from_dimensions(Size::new(0.0, 900.0)).is_none());
        assert!(Ratio::from_dimensions(Size::new(f64::NAN, 900.0)).is_none());
    }

    #[test]
    fn ratio_rejects_garbage() {
        assert!(Ratio::parse("abc").is_none());
        assert!(Ratio::parse("-5").is_none());
        assert!(Ratio::new(f64::NAN).is_none());
        assert_eq!(Ratio::parse(" 42.5 % ").map(Ratio::percent), Some(42.5));
    }
}
