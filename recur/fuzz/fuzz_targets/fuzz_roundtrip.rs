#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(rule) = recur::Rule::parse(s) {
            let displayed = rule.to_string();
            let reparsed = recur::Rule::parse(&displayed)
                .expect("display output must be parseable");
            assert_eq!(rule, reparsed, "roundtrip changed the rule");

            // A short expansion must stay strictly increasing.
            if let Ok(start) = recur::Instant::parse("20240101T090000") {
                if let Ok(it) = rule.iter(&start) {
                    let got: Vec<_> = it.take(20).collect();
                    for pair in got.windows(2) {
                        assert!(pair[0] < pair[1], "instances out of order for {displayed}");
                    }
                }
            }
        }
    }
});
