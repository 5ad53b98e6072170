#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing never panics, in either mode.
        let _ = recur::Rule::parse(s);
        let _ = recur::Rule::parse_with(s, &recur::ParseOptions::lax());
        let _ = recur::Instant::parse(s);
    }
});
