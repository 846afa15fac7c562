//! Aggregate threshold metrics.

use crate::types::AggregateMetrics;

/// Mean and median over the thresholds that are known.
///
/// Median is sort-and-midpoint, averaging the two middle values on even
/// counts. Both metrics are `None` when no thresholds are known.
pub fn aggregate_metrics(thresholds: &[Option<i64>]) -> AggregateMetrics {
    let mut known: Vec<i64> = thresholds.iter().flatten().copied().collect();
    if known.is_empty() {
        return AggregateMetrics::default();
    }

    let count = known.len();
    let mean = known.iter().sum::<i64>() as f64 / count as f64;

    known.sort_unstable();
    let median = if count % 2 == 1 {
        known[count / 2] as f64
    } else {
        (known[count / 2 - 1] + known[count / 2]) as f64 / 2.0
    };

    AggregateMetrics {
        mean_threshold: Some(mean),
        median_threshold: Some(median),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_are_excluded() {
        let metrics = aggregate_metrics(&[Some(0), Some(50), Some(75), None, Some(100)]);
        assert_eq!(metrics.mean_threshold, Some(56.25));
        assert_eq!(metrics.median_threshold, Some(62.5));
    }

    #[test]
    fn odd_count_takes_middle_value() {
        let metrics = aggregate_metrics(&[Some(30), Some(10), Some(20)]);
        assert_eq!(metrics.mean_threshold, Some(20.0));
        assert_eq!(metrics.median_threshold, Some(20.0));
    }

    #[test]
    fn all_null_yields_no_metrics() {
        let metrics = aggregate_metrics(&[None, None]);
        assert_eq!(metrics, AggregateMetrics::default());
    }

    #[test]
    fn empty_input_yields_no_metrics() {
        assert_eq!(aggregate_metrics(&[]), AggregateMetrics::default());
    }

    #[test]
    fn single_threshold_is_its_own_mean_and_median() {
        let metrics = aggregate_metrics(&[Some(75)]);
        assert_eq!(metrics.mean_threshold, Some(75.0));
        assert_eq!(metrics.median_threshold, Some(75.0));
    }
}
