pub mod date_time {
    use core::fmt;

    use chrono::NaiveDate;
    use serde::{
        de::{self, Unexpected, Visitor},
        Deserializer, Serializer,
    };

    /// `yyyymmdd`, the format GTFS-RT uses for `trip.start_date`.
    pub fn serialize_yyyymmdd<S>(
        date: &NaiveDate,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format("%Y%m%d").to_string())
    }

    pub fn deserialize_yyyymmdd<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DateVisitor;

        impl<'de> Visitor<'de> for DateVisitor {
            type Value = NaiveDate;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string in the format YYYYMMDD")
            }

            fn visit_str<E>(self, value: &str) -> Result<NaiveDate, E>
            where
                E: de::Error,
            {
                NaiveDate::parse_from_str(value, "%Y%m%d")
                    .map_err(|_| de::Error::invalid_value(Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_str(DateVisitor)
    }
}

pub mod duration {
    use chrono::Duration;
    use serde::de::{Error as DeError, IntoDeserializer};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Signed `hh:mm:ss`, the format used for schedule-side durations
    /// elsewhere in this workspace.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(D::Error::custom)
    }

    pub fn serialize_option<S>(
        option_duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match option_duration {
            Some(d) => serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize_option<'de, D>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        match s {
            Some(s) => {
                let duration = deserialize(s.as_str().into_deserializer())?;
                Ok(Some(duration))
            }
            None => Ok(None),
        }
    }

    fn format_duration(duration: Duration) -> String {
        let negative = duration < Duration::zero();
        let total_seconds = duration.num_seconds().abs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        format!(
            "{}{:02}:{:02}:{:02}",
            if negative { "-" } else { "" },
            hours,
            minutes,
            seconds
        )
    }

    fn parse_duration(s: &str) -> Result<Duration, String> {
        let (negative, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(format!("expected format hh:mm:ss, got {:?}", s));
        }
        let hours: i64 = parts[0].parse().map_err(|e| format!("{}", e))?;
        let minutes: i64 = parts[1].parse().map_err(|e| format!("{}", e))?;
        let seconds: i64 = parts[2].parse().map_err(|e| format!("{}", e))?;
        let magnitude =
            Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds);
        Ok(if negative { -magnitude } else { magnitude })
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn round_trips_positive_and_negative_durations() {
            for seconds in [0, 90, 3661, -90, -3661] {
                let duration = Duration::seconds(seconds);
                let formatted = format_duration(duration);
                assert_eq!(parse_duration(&formatted).unwrap(), duration);
            }
        }
    }
}
