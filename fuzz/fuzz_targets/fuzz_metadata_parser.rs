#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must yield a record or a ParseError, never a panic
    let _ = epu_report::metadata::parse_reader(Cursor::new(data), Path::new("fuzz.xml"));

    // Same for the calibration table when the input happens to be text
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = epu_report::calibration::CalibrationTable::parse(text);
    }
});
