#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = core::str::from_utf8(data) {
        let _ = courier_envelope::armor::decode(text);
    }
    let _ = courier_envelope::wire::decode_wire(data);
});
