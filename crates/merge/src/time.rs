use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Combines a circulation date with a time-of-day into a naive UTC
/// datetime, bumping `circulation_date` forward a day whenever the
/// event's time-of-day is earlier than the last one seen.
///
/// Theoretical times past 24:00 are expressed modulo 24h, so a monotonic
/// decrease in time-of-day is the signal that the vehicle journey has
/// crossed midnight. `last_event_time` is updated to the raw time-of-day,
/// never to the combined (possibly day-bumped) datetime, so each call only
/// ever compares against the previous event's clock reading.
pub fn combine_with_rollover(
    circulation_date: &mut NaiveDate,
    last_event_time: &mut Option<NaiveTime>,
    event_time: NaiveTime,
) -> NaiveDateTime {
    if let Some(last) = *last_event_time {
        if last > event_time {
            *circulation_date += chrono::Duration::days(1);
        }
    }
    *last_event_time = Some(event_time);
    circulation_date.and_time(event_time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_on_the_same_day_while_non_decreasing() {
        let mut date = NaiveDate::from_ymd_opt(2012, 6, 15).unwrap();
        let mut last = None;

        let first = combine_with_rollover(
            &mut date,
            &mut last,
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        );
        let second = combine_with_rollover(
            &mut date,
            &mut last,
            NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        );

        assert_eq!(first.date(), NaiveDate::from_ymd_opt(2012, 6, 15).unwrap());
        assert_eq!(second.date(), NaiveDate::from_ymd_opt(2012, 6, 15).unwrap());
        assert!(first < second);
    }

    #[test]
    fn bumps_the_day_on_past_midnight_rollover() {
        let mut date = NaiveDate::from_ymd_opt(2012, 6, 15).unwrap();
        let mut last = None;

        let before_midnight = combine_with_rollover(
            &mut date,
            &mut last,
            NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
        );
        let after_midnight = combine_with_rollover(
            &mut date,
            &mut last,
            NaiveTime::from_hms_opt(0, 15, 0).unwrap(),
        );

        assert_eq!(
            after_midnight.date(),
            NaiveDate::from_ymd_opt(2012, 6, 16).unwrap()
        );
        assert!(before_midnight < after_midnight);
    }
}
