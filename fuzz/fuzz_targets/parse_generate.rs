#![no_main]

use libfuzzer_sys::fuzz_target;
use yaml_anchor_codec::{generate, parse};

// Whatever parses must generate text that parses again.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = parse(text) else {
        return;
    };
    let yaml = generate(&value);
    if let Err(err) = parse(&yaml) {
        panic!("generated YAML does not parse: {err}\ninput:\n{text}\noutput:\n{yaml}");
    }
});
