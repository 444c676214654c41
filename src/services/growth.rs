//! Growth comparison series
//!
//! Aligns the selected comparison subjects (portfolio, VNINDEX, individual
//! tickers) onto one date axis as cumulative percent growth from each
//! subject's first quote. Dates where a subject has no quote stay empty so
//! the chart renders a gap instead of a fabricated point.

use crate::gateway::types::PricePoint;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Upper bound on simultaneously compared subjects.
pub const MAX_COMPARISON_SUBJECTS: usize = 5;

/// A comparison subject of the growth chart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    Portfolio,
    /// The VNINDEX benchmark; its dates form the preferred base axis.
    Index,
    Ticker(String),
}

impl Subject {
    pub fn label(&self) -> &str {
        match self {
            Subject::Portfolio => "PORTFOLIO",
            Subject::Index => "VNINDEX",
            Subject::Ticker(symbol) => symbol,
        }
    }
}

/// Chart time range token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartRange {
    M1,
    M3,
    M6,
    Y1,
}

impl ChartRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartRange::M1 => "1m",
            ChartRange::M3 => "3m",
            ChartRange::M6 => "6m",
            ChartRange::Y1 => "1y",
        }
    }
}

/// One date of the aligned growth chart. `values` maps subject label to
/// percent growth; an absent entry is a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

/// Inputs of one normalization pass.
pub struct GrowthInputs<'a> {
    pub subjects: &'a [Subject],
    /// Historical close series per non-portfolio subject, ordered by date.
    pub series: &'a HashMap<Subject, Vec<PricePoint>>,
    /// Portfolio growth for the chosen range, from the performance snapshot.
    /// The portfolio series is not reconstructed from trade history here.
    pub portfolio_growth: Option<f64>,
}

/// Build the aligned growth series.
///
/// The base date axis is the VNINDEX series when present, otherwise the
/// first non-empty series in subject order. Each subject's baseline is its
/// first close; every emitted value is `(close - baseline) / baseline * 100`
/// rounded to two decimals. Fewer than two resulting points suppress the
/// chart entirely (empty output).
pub fn normalize_growth(inputs: &GrowthInputs<'_>) -> Vec<GrowthPoint> {
    let axis = base_axis(inputs);
    if axis.len() < 2 {
        return Vec::new();
    }

    struct PreparedSeries<'a> {
        label: &'a str,
        baseline: f64,
        by_date: HashMap<NaiveDate, f64>,
    }

    let mut prepared = Vec::new();
    for subject in inputs.subjects {
        if *subject == Subject::Portfolio {
            continue;
        }
        let Some(series) = inputs.series.get(subject) else {
            continue;
        };
        let Some(first) = series.first() else {
            continue;
        };
        if first.close == 0.0 {
            continue;
        }
        prepared.push(PreparedSeries {
            label: subject.label(),
            baseline: first.close,
            by_date: series.iter().map(|p| (p.date, p.close)).collect(),
        });
    }

    let portfolio_selected = inputs.subjects.contains(&Subject::Portfolio);

    axis.iter()
        .map(|date| {
            let mut values = BTreeMap::new();
            for series in &prepared {
                // No quote on this date: leave the gap, never interpolate.
                if let Some(close) = series.by_date.get(date) {
                    let pct = (close - series.baseline) / series.baseline * 100.0;
                    values.insert(series.label.to_string(), round2(pct));
                }
            }
            if portfolio_selected {
                if let Some(growth) = inputs.portfolio_growth {
                    values.insert(Subject::Portfolio.label().to_string(), round2(growth));
                }
            }
            GrowthPoint {
                date: *date,
                values,
            }
        })
        .collect()
}

fn base_axis(inputs: &GrowthInputs<'_>) -> Vec<NaiveDate> {
    if let Some(index_series) = inputs.series.get(&Subject::Index) {
        if !index_series.is_empty() {
            return index_series.iter().map(|p| p.date).collect();
        }
    }
    for subject in inputs.subjects {
        if let Some(series) = inputs.series.get(subject) {
            if !series.is_empty() {
                return series.iter().map(|p| p.date).collect();
            }
        }
    }
    Vec::new()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
