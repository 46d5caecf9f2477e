#![no_main]

use libfuzzer_sys::fuzz_target;
use noema::filter::parse;

fuzz_target!(|src: String| {
    // The parser must reject malformed input with an error, never panic.
    let _ = parse(&src);
});
