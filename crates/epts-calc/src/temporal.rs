//! Calendar arithmetic shared by the calculations
//!
//! Month arithmetic is calendar based: adding a month to 31 January lands on
//! the last day of February, and a month has elapsed between two dates when
//! shifting the earlier one by a month does not pass the later one.

use chrono::{Months, NaiveDate};

/// Shift `date` by `n` calendar months, clamping the day of month when the
/// target month is shorter.
pub fn add_months(date: NaiveDate, n: i32) -> NaiveDate {
    let shifted = if n >= 0 {
        date.checked_add_months(Months::new(n.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(n.unsigned_abs()))
    };
    shifted.unwrap_or(if n >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// Whole calendar months from `earlier` to `later`; negative when `later`
/// precedes `earlier`.
pub fn months_between(earlier: NaiveDate, later: NaiveDate) -> i32 {
    if later < earlier {
        return -months_between(later, earlier);
    }
    let mut months = month_index(later) - month_index(earlier);
    if add_months(earlier, months) > later {
        months -= 1;
    }
    months
}

/// Whole days from `earlier` to `later`
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Inclusive range check
pub fn within(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    date >= start && date <= end
}

fn month_index(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.year() * 12 + date.month0() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2020, 1, 31), 1, date(2020, 2, 29))]
    #[case(date(2019, 1, 31), 1, date(2019, 2, 28))]
    #[case(date(2020, 6, 1), -9, date(2019, 9, 1))]
    #[case(date(2020, 3, 31), -1, date(2020, 2, 29))]
    #[case(date(2020, 1, 1), 7, date(2020, 8, 1))]
    #[case(date(2020, 1, 15), 0, date(2020, 1, 15))]
    fn test_add_months(#[case] start: NaiveDate, #[case] n: i32, #[case] expected: NaiveDate) {
        assert_eq!(add_months(start, n), expected);
    }

    #[rstest]
    #[case(date(2020, 1, 1), date(2020, 8, 15), 7)]
    #[case(date(2020, 1, 1), date(2020, 10, 15), 9)]
    #[case(date(2020, 1, 15), date(2020, 2, 14), 0)]
    #[case(date(2020, 1, 31), date(2020, 2, 29), 1)]
    #[case(date(2020, 1, 1), date(2021, 2, 1), 13)]
    #[case(date(2021, 2, 1), date(2020, 1, 1), -13)]
    #[case(date(2020, 5, 5), date(2020, 5, 5), 0)]
    fn test_months_between(#[case] earlier: NaiveDate, #[case] later: NaiveDate, #[case] expected: i32) {
        assert_eq!(months_between(earlier, later), expected);
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(date(2020, 1, 1), date(2020, 7, 1)), 182);
        assert_eq!(days_between(date(2020, 7, 1), date(2020, 1, 1)), -182);
    }

    proptest! {
        #[test]
        fn months_between_is_tight(days_a in 0i64..20_000, days_b in 0i64..20_000) {
            let base = date(1970, 1, 1);
            let a = base + chrono::Duration::days(days_a);
            let b = base + chrono::Duration::days(days_b);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let n = months_between(lo, hi);
            prop_assert!(n >= 0);
            prop_assert!(add_months(lo, n) <= hi);
            prop_assert!(add_months(lo, n + 1) > hi);
            prop_assert_eq!(months_between(hi, lo), -n);
        }
    }
}
