#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split = (data[0] as usize) % data.len();
    let (input, pass) = data[1..].split_at(split.min(data.len() - 1));

    let passphrase = String::from_utf8_lossy(pass).into_owned();
    let _ = courier_envelope::decrypt(input, &passphrase);
});
