#![no_main]

use libfuzzer_sys::fuzz_target;
use yaml_anchor_codec::{generate, options, parse_with_options};

// Biases inputs toward anchors, aliases and merge keys (<<) by embedding
// the fuzz text into small documents that use them.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);

    let docs = [
        format!("a: &A {s}\nb: *A\nseq: &S [1, 2, 3]\nseq_alias: *S\n"),
        format!("base1: &B1 {{k: 1, v: x}}\nbase2: &B2 {{w: {s}}}\nmerged:\n  <<: [*B1, *B2]\n  extra: 2\n"),
        format!("base: &B\n  {s}\nderived:\n  <<: *B\n  k: {s}\n"),
    ];

    for doc in &docs {
        let options = options! {
            max_expanded_nodes: 10_000,
        };
        if let Ok(value) = parse_with_options(doc, options) {
            let _ = generate(&value);
        }
    }
});
