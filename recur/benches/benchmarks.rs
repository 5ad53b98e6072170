use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recur::{Instant, Rule};

fn start() -> Instant {
    Instant::parse("19970902T090000").unwrap()
}

// ---------------------------------------------------------------------------
// Parse benchmarks
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("simple", |b| {
        b.iter(|| Rule::parse(black_box("FREQ=DAILY")).unwrap());
    });

    group.bench_function("complex", |b| {
        b.iter(|| {
            Rule::parse(black_box(
                "FREQ=YEARLY;INTERVAL=2;UNTIL=20301231T235959Z;BYMONTH=1,4,7,10;\
                 BYDAY=MO,TU,WE,TH,FR;BYHOUR=9,17;BYMINUTE=0,30;BYSETPOS=1,-1;WKST=SU",
            ))
            .unwrap()
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Expansion benchmarks (first 100 instances)
// ---------------------------------------------------------------------------

fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");
    let start = start();

    let cases = [
        ("daily", "FREQ=DAILY"),
        ("weekly_byday", "FREQ=WEEKLY;BYDAY=MO,WE,FR"),
        ("monthly_last_workday", "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1"),
        ("yearly_weekno", "FREQ=YEARLY;BYWEEKNO=1,20,-1;BYDAY=MO"),
        ("yearly_yearday", "FREQ=YEARLY;BYYEARDAY=1,100,200,-1"),
        ("minutely_office_hours", "FREQ=MINUTELY;INTERVAL=20;BYHOUR=9,10,11,12,13,14,15,16"),
    ];
    for (name, text) in cases {
        let rule = Rule::parse(text).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| rule.iter(black_box(&start)).unwrap().take(100).count());
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// fast_forward vs. walking
// ---------------------------------------------------------------------------

fn bench_fast_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("fast_forward");
    let start = start();
    let target = Instant::parse("20250101T000000").unwrap();
    let rule = Rule::parse("FREQ=DAILY;BYHOUR=9,17").unwrap();

    group.bench_function("seek", |b| {
        b.iter(|| {
            let mut it = rule.iter(&start).unwrap();
            it.fast_forward(black_box(&target)).unwrap();
            it.next()
        });
    });

    group.bench_function("walk", |b| {
        b.iter(|| {
            rule.iter(&start)
                .unwrap()
                .find(|i| i >= black_box(&target))
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn bench_display(c: &mut Criterion) {
    let rule = Rule::parse("FREQ=MONTHLY;COUNT=10;BYDAY=1SU,-1SU;BYHOUR=9;WKST=SU").unwrap();
    c.bench_function("display", |b| {
        b.iter(|| black_box(&rule).to_string());
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_expand,
    bench_fast_forward,
    bench_display
);
criterion_main!(benches);
