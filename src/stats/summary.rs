//! Cause Summary Module
//! Per-cause statistics over the aggregated yearly table.

use crate::charts::StackedSeries;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Yearly statistics for one aggregated cause column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CauseSummary {
    pub cause: String,
    pub total: f64,
    /// Fraction of all deaths in the table.
    pub share: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation across years, NaN with fewer than two years.
    pub std_dev: f64,
    pub peak_year: Option<i64>,
    pub peak_value: f64,
    /// Relative change between the first and last year.
    pub change: Option<f64>,
}

pub struct SummaryCalculator;

impl SummaryCalculator {
    /// Summaries for every series, in column order.
    pub fn summarize(data: &StackedSeries) -> Vec<CauseSummary> {
        let grand_total: f64 = data.series.iter().flat_map(|s| s.values.iter()).sum();

        data.series
            .par_iter()
            .map(|series| {
                Self::summarize_values(&series.name, &data.years, &series.values, grand_total)
            })
            .collect()
    }

    fn summarize_values(
        cause: &str,
        years: &[i64],
        values: &[f64],
        grand_total: f64,
    ) -> CauseSummary {
        let total: f64 = values.iter().sum();
        let share = if grand_total > 0.0 {
            total / grand_total
        } else {
            0.0
        };

        let (peak_year, peak_value) = years
            .iter()
            .zip(values)
            .fold((None, f64::NEG_INFINITY), |(best_year, best), (&year, &value)| {
                if value > best {
                    (Some(year), value)
                } else {
                    (best_year, best)
                }
            });

        let change = match (values.first(), values.last()) {
            (Some(&first), Some(&last)) if values.len() > 1 && first != 0.0 => {
                Some((last - first) / first)
            }
            _ => None,
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        CauseSummary {
            cause: cause.to_string(),
            total,
            share,
            mean: if values.is_empty() {
                f64::NAN
            } else {
                values.iter().mean()
            },
            median: Self::percentile(&sorted, 50.0),
            std_dev: values.iter().std_dev(),
            peak_year,
            peak_value: if peak_year.is_some() { peak_value } else { 0.0 },
            change,
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::NamedSeries;

    fn data() -> StackedSeries {
        StackedSeries {
            years: vec![2000, 2001, 2002],
            series: vec![
                NamedSeries {
                    name: "smoking".to_string(),
                    values: vec![10.0, 30.0, 20.0],
                },
                NamedSeries {
                    name: "Others".to_string(),
                    values: vec![5.0, 5.0, 30.0],
                },
            ],
        }
    }

    #[test]
    fn test_summaries_in_column_order() {
        let summaries = SummaryCalculator::summarize(&data());
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].cause, "smoking");
        assert_eq!(summaries[1].cause, "Others");
    }

    #[test]
    fn test_totals_and_shares() {
        let summaries = SummaryCalculator::summarize(&data());
        assert_eq!(summaries[0].total, 60.0);
        assert_eq!(summaries[1].total, 40.0);
        assert!((summaries[0].share - 0.6).abs() < 1e-12);
        let share_sum: f64 = summaries.iter().map(|s| s.share).sum();
        assert!((share_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_peak_mean_median_change() {
        let smoking = &SummaryCalculator::summarize(&data())[0];
        assert_eq!(smoking.peak_year, Some(2001));
        assert_eq!(smoking.peak_value, 30.0);
        assert!((smoking.mean - 20.0).abs() < 1e-12);
        assert_eq!(smoking.median, 20.0);
        assert!((smoking.std_dev - 10.0).abs() < 1e-12);
        assert_eq!(smoking.change, Some(1.0));
    }

    #[test]
    fn test_empty_series() {
        let data = StackedSeries {
            years: Vec::new(),
            series: vec![NamedSeries {
                name: "x".to_string(),
                values: Vec::new(),
            }],
        };
        let summary = &SummaryCalculator::summarize(&data)[0];
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.share, 0.0);
        assert_eq!(summary.peak_year, None);
        assert_eq!(summary.change, None);
        assert!(summary.median.is_nan());
    }
}
