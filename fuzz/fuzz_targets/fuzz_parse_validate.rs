#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);

    let policy = match mpl::parse(&s, "fuzz.yaml") {
        Ok(p) => p,
        Err(_) => return,
    };

    let first = mpl::validate(&policy);
    let second = mpl::validate(&policy);
    if first.as_slice() != second.as_slice() {
        panic!(
            "Validation is not repeatable.\nInput (lossy): {:?}\nFirst:\n{}\nSecond:\n{}",
            s.get(..200).unwrap_or(&s),
            first,
            second,
        );
    }

    // Rendering with context must not panic on any location the parser produced.
    let source = mpl::SourceMap::single("fuzz.yaml", s.to_string());
    let _ = first.with_context(&source).to_string();
});
