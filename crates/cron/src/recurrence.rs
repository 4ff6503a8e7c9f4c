//! 重复任务的下一次出现日期计算

use chrono::{DateTime, Duration, Months, Utc};

use studybuddy_domain::entities::RepeatPolicy;

/// 根据重复策略计算下一次到期日
///
/// 月度策略使用日历月运算，月末日期在较短的月份会被钳制到当月
/// 最后一天（2024-01-31 → 2024-02-29），而不是滚动到下个月。
/// `none`和未识别的策略没有下一次出现，返回`None`。
pub fn next_occurrence(due: DateTime<Utc>, repeat: RepeatPolicy) -> Option<DateTime<Utc>> {
    match repeat {
        RepeatPolicy::Daily => Some(due + Duration::days(1)),
        RepeatPolicy::Weekly => Some(due + Duration::days(7)),
        RepeatPolicy::Monthly => due.checked_add_months(Months::new(1)),
        RepeatPolicy::None | RepeatPolicy::Unsupported => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_daily_adds_one_day() {
        assert_eq!(
            next_occurrence(at(2024, 1, 15), RepeatPolicy::Daily),
            Some(at(2024, 1, 16))
        );
    }

    #[test]
    fn test_weekly_adds_seven_days() {
        assert_eq!(
            next_occurrence(at(2024, 1, 1), RepeatPolicy::Weekly),
            Some(at(2024, 1, 8))
        );
    }

    #[test]
    fn test_monthly_adds_one_calendar_month() {
        assert_eq!(
            next_occurrence(at(2024, 3, 15), RepeatPolicy::Monthly),
            Some(at(2024, 4, 15))
        );
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        // 1月31日 + 1个月 = 2月29日（闰年钳制，不滚动到3月）
        assert_eq!(
            next_occurrence(at(2024, 1, 31), RepeatPolicy::Monthly),
            Some(at(2024, 2, 29))
        );
        // 非闰年钳制到2月28日
        assert_eq!(
            next_occurrence(at(2023, 1, 31), RepeatPolicy::Monthly),
            Some(at(2023, 2, 28))
        );
    }

    #[test]
    fn test_monthly_preserves_time_of_day() {
        let due = Utc.with_ymd_and_hms(2024, 5, 31, 23, 45, 10).unwrap();
        let next = next_occurrence(due, RepeatPolicy::Monthly).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 30, 23, 45, 10).unwrap());
    }

    #[test]
    fn test_none_and_unsupported_have_no_occurrence() {
        assert_eq!(next_occurrence(at(2024, 1, 1), RepeatPolicy::None), None);
        assert_eq!(
            next_occurrence(at(2024, 1, 1), RepeatPolicy::Unsupported),
            None
        );
    }
}
