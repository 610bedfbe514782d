#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the decoder; errors are fine.
    let Ok(desc) = qoac::decode_header(data) else {
        return;
    };

    // Keep the output allocation bounded while still exercising the frame
    // parser against hostile headers.
    if u64::from(desc.samples) * u64::from(desc.channels) > 1 << 20 {
        return;
    }
    let _ = qoac::decode(data);
});
