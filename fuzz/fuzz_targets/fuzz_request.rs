#![no_main]

use gs4_query::Request;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic or read past the datagram
    if let Ok(request) = Request::from_bytes(data) {
        assert!(request.encoded_len() <= data.len());
    }
});
