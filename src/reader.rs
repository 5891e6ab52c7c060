//! Parsing from `std::io::Read` sources.
//!
//! Input is decoded to UTF-8 first: a UTF-8 or UTF-16 byte order mark
//! selects the encoding, anything else must already be UTF-8.

use std::io::Read;

use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::error::Error;
use crate::options::Options;
use crate::value::AnnotatedValue;

/// Read all of `reader` and parse it with default [`Options`].
///
/// ```rust
/// let bytes: &[u8] = b"\xEF\xBB\xBFa: &x [1]\nb: *x\n";
/// let value = yaml_anchor_codec::parse_reader(bytes).unwrap();
/// assert_eq!(value.get("b").unwrap().reference_of(), Some("x"));
/// ```
pub fn parse_reader<R: Read>(reader: R) -> Result<AnnotatedValue, Error> {
    parse_reader_with_options(reader, Options::default())
}

/// Read all of `reader` and parse it with explicit [`Options`].
pub fn parse_reader_with_options<R: Read>(reader: R, options: Options) -> Result<AnnotatedValue, Error> {
    let text = read_text(reader)?;
    crate::parse_with_options(&text, options)
}

fn read_text<R: Read>(reader: R) -> Result<String, Error> {
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(None) // sniff the BOM
        .build(reader);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}
