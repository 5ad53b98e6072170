use std::fmt;

use crate::rule::*;

/// Canonical RECUR text: `FREQ` first, then `UNTIL` or `COUNT`, `INTERVAL`
/// when not 1, the BY-parts in expansion order, and `WKST` when not Monday.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.freq)?;

        if let Some(until) = &self.until {
            write!(f, ";UNTIL={until}")?;
        }
        if let Some(count) = self.count {
            write!(f, ";COUNT={count}")?;
        }
        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }

        write_list(f, "BYMONTH", &self.by_month)?;
        write_list(f, "BYWEEKNO", &self.by_week_no)?;
        write_list(f, "BYYEARDAY", &self.by_year_day)?;
        write_list(f, "BYMONTHDAY", &self.by_month_day)?;
        write_list(f, "BYDAY", &self.by_day)?;
        write_list(f, "BYHOUR", &self.by_hour)?;
        write_list(f, "BYMINUTE", &self.by_minute)?;
        write_list(f, "BYSECOND", &self.by_second)?;
        write_list(f, "BYSETPOS", &self.by_set_pos)?;

        if self.week_start != Weekday::Monday {
            write!(f, ";WKST={}", self.week_start)?;
        }
        Ok(())
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, name: &str, values: &[T]) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    write!(f, ";{name}=")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse, parse_with, ParseOptions};

    fn canonical(input: &str) -> String {
        parse(input).unwrap().to_string()
    }

    #[test]
    fn test_minimal() {
        assert_eq!(canonical("FREQ=DAILY"), "FREQ=DAILY");
    }

    #[test]
    fn test_defaults_are_omitted() {
        assert_eq!(canonical("FREQ=DAILY;INTERVAL=1;WKST=MO"), "FREQ=DAILY");
        assert_eq!(canonical("FREQ=WEEKLY;WKST=SU"), "FREQ=WEEKLY;WKST=SU");
    }

    #[test]
    fn test_part_order_is_fixed() {
        assert_eq!(
            canonical("BYSETPOS=-1;BYDAY=MO,TU,WE,TH,FR;WKST=SU;FREQ=MONTHLY;COUNT=3"),
            "FREQ=MONTHLY;COUNT=3;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;WKST=SU"
        );
    }

    #[test]
    fn test_values_are_sorted() {
        assert_eq!(
            canonical("freq=yearly;bymonth=8,6,7;byday=th"),
            "FREQ=YEARLY;BYMONTH=6,7,8;BYDAY=TH"
        );
    }

    #[test]
    fn test_numbered_days() {
        assert_eq!(
            canonical("FREQ=MONTHLY;INTERVAL=2;BYDAY=-1SU,1SU"),
            "FREQ=MONTHLY;INTERVAL=2;BYDAY=-1SU,1SU"
        );
        assert_eq!(canonical("FREQ=MONTHLY;BYDAY=+1FR"), "FREQ=MONTHLY;BYDAY=1FR");
    }

    #[test]
    fn test_until_keeps_its_shape() {
        assert_eq!(
            canonical("FREQ=DAILY;UNTIL=19971224T000000Z"),
            "FREQ=DAILY;UNTIL=19971224T000000Z"
        );
        assert_eq!(canonical("FREQ=DAILY;UNTIL=19971224"), "FREQ=DAILY;UNTIL=19971224");
    }

    #[test]
    fn test_round_trip_is_stable() {
        for input in [
            "FREQ=YEARLY;INTERVAL=4;BYMONTH=11;BYMONTHDAY=2,3,4,5,6,7,8;BYDAY=TU",
            "FREQ=MINUTELY;INTERVAL=15;COUNT=6",
            "FREQ=YEARLY;BYWEEKNO=20;BYDAY=MO",
            "FREQ=DAILY;BYHOUR=9,10;BYMINUTE=0,20,40",
        ] {
            let rule = parse(input).unwrap();
            let again = parse(&rule.to_string()).unwrap();
            assert_eq!(rule, again, "{input}");
            assert_eq!(rule.to_string(), again.to_string());
        }
    }

    #[test]
    fn test_lax_output_is_strictly_valid() {
        let rule = parse_with("FREQ=DAILY;COUNT=2;UNTIL=20200101;BYFOO=1", &ParseOptions::lax())
            .unwrap();
        assert_eq!(rule.to_string(), "FREQ=DAILY;UNTIL=20200101");
        assert!(parse(&rule.to_string()).is_ok());
    }
}
