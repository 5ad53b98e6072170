//! Basic recur API walkthrough: parse, expand, skip ahead, check dates.

use jiff::civil::date;
use recur::{Instant, IterOptions, Rule, TzdbZones};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse a rule; part names and values are case-insensitive
    let rule: Rule = "freq=monthly;byday=mo,tu,we,th,fr;bysetpos=-1".parse()?;
    println!("Parsed: {rule}");

    // The last workday of each month, from a floating start
    let start: Instant = "20250101T170000".parse()?;
    println!("\nFirst 5 instances:");
    for instance in rule.iter(&start)?.take(5) {
        println!("  {instance}");
    }

    // Skip ahead without walking every month
    let mut it = rule.iter(&start)?;
    it.fast_forward(&"20300601T000000".parse()?)?;
    if let Some(next) = it.next() {
        println!("\nFirst instance from June 2030: {next}");
    }

    // A start pinned to a zone keeps its wall-clock time across DST
    let standup = Rule::parse("FREQ=WEEKLY;BYDAY=MO;COUNT=3")?;
    let start = Instant::parse_in("20250303T093000", "America/New_York", &TzdbZones)?;
    println!("\nStand-ups:");
    for instance in standup.iter(&start)? {
        println!("  {instance}");
    }

    // Floating values can be read in another zone, and infinite rules capped
    let options = IterOptions::default()
        .with_zone(jiff::tz::TimeZone::get("Asia/Tokyo")?)
        .with_limit(3);
    let daily = Rule::parse("FREQ=DAILY")?;
    let capped: Vec<_> = daily.iter_with(&"20250101T080000".parse()?, &options)?.collect();
    println!("\nCapped at {}: {:?}", capped.len(), capped.iter().map(ToString::to_string).collect::<Vec<_>>());

    // Membership
    let all_day: Instant = "20250101".parse()?;
    println!(
        "\nLast workday rule on 2025-01-31: {}",
        rule.occurs_on(&all_day, date(2025, 1, 31))?
    );
    println!(
        "Last workday rule on 2025-01-30: {}",
        rule.occurs_on(&all_day, date(2025, 1, 30))?
    );

    // Display roundtrips through parsing
    let roundtripped: Rule = rule.to_string().parse()?;
    assert_eq!(rule, roundtripped);
    println!("\nRoundtrip: {roundtripped}");

    Ok(())
}
