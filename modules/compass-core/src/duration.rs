//! Membership duration from possibly-overlapping role date ranges.

use chrono::NaiveDate;

/// Days per year, leap years included except thrice per 400 years.
pub const DAYS_PER_YEAR: f64 = 365.2425;

pub type DateRange = (NaiveDate, NaiveDate);

/// Reduce `(start, end)` pairs to disjoint covering ranges.
///
/// Pairs are sorted and scanned once against a running range seeded from the
/// earliest pair. Pairs that overlap, touch or sit one day away from the
/// running range are absorbed; the rest are reduced recursively.
pub fn reduce_date_ranges(ranges: &[DateRange]) -> Vec<DateRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort();

    let mut reduced = Vec::new();
    let mut pending = sorted;
    while let Some(&(first_start, first_end)) = pending.first() {
        let (mut start_, mut end_) = (first_start, first_end);
        let mut unused = Vec::new();

        for &(start, end) in &pending {
            if start < start_ && end > end_ {
                // encloses the running range
                start_ = start;
                end_ = end;
            } else if start <= end_ && end_ < end {
                end_ = end;
            } else if end >= start_ && start_ > start {
                start_ = start;
            } else if start >= start_ && end <= end_ {
                // already covered
            } else if (end_ - start).num_days().abs() == 1 || (start_ - end).num_days().abs() == 1 {
                end_ = end_.max(end);
                start_ = start_.min(start);
            } else {
                unused.push((start, end));
            }
        }

        reduced.push((start_, end_));
        pending = unused;
    }
    reduced
}

/// Inclusive days covered by `ranges`, in years.
pub fn membership_duration(ranges: &[DateRange]) -> f64 {
    let days: i64 = reduce_date_ranges(ranges)
        .iter()
        .map(|(start, end)| (*end - *start).num_days() + 1)
        .sum();
    days as f64 / DAYS_PER_YEAR
}
