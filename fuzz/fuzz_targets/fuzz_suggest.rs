#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    unknown: &'a str,
    candidates: Vec<&'a str>,
}

fuzz_target!(|input: Input<'_>| {
    let suggestion = mpl::diagnostic::suggest(input.unknown, input.candidates.as_slice(), "names");
    assert_eq!(suggestion.is_none(), input.candidates.is_empty());
});
