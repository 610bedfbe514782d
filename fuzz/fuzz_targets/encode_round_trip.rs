#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let channels = u32::from(data[0] % 8) + 1;
    let sample_rate = 44100;

    // Interpret the remaining bytes as little-endian samples, truncated to
    // a whole number of inter-channel frames.
    let samples: Vec<i16> = data[1..]
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();
    let samples_per_channel = samples.len() / channels as usize;
    if samples_per_channel == 0 {
        return;
    }
    let samples = &samples[..samples_per_channel * channels as usize];

    let mut encoder = qoac::Encoder::new(sample_rate, channels, samples_per_channel as u32)
        .expect("parameters are in range");
    let encoded = encoder.encode(samples).expect("buffer length matches");

    // The encoder's output must always decode back to its declared
    // geometry.
    let (desc, decoded) = qoac::decode(&encoded).expect("encoder output must be valid QOA");
    assert_eq!(desc.channels, channels);
    assert_eq!(desc.sample_rate, sample_rate);
    assert_eq!(u64::from(desc.samples), samples_per_channel as u64);
    assert_eq!(decoded.len(), samples.len());
});
