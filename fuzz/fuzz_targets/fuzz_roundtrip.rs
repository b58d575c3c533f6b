#![no_main]

use libfuzzer_sys::fuzz_target;
use netbits::prelude::*;

fuzz_target!(|data: &[u8]| {
    // Lossless encodings must decode to exactly what was written, at
    // whatever bit offset the input happens to start
    if data.is_empty() {
        return;
    }
    let offset = (data[0] & 7) as usize;
    let mut stream = BitStream::new();
    for _ in 0..offset {
        stream.write_bit(true);
    }

    let values: Vec<u32> = data[1..]
        .chunks(4)
        .map(|c| c.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
        .collect();
    for &v in &values {
        stream.write_mini(v).expect("integers always mini-encode");
        stream.write_mini_signed(v as i32);
        stream.write_ranged(v, 0, 1 << 20, true).expect("escape accepts any value");
    }
    stream.write_bits(&data[1..], (data.len() - 1) * 8, true);

    stream.skip_read(offset).expect("offset bits were written");
    for &v in &values {
        assert_eq!(stream.read_mini::<u32>().expect("mini"), v);
        assert_eq!(stream.read_mini_signed::<i32>().expect("signed"), v as i32);
        assert_eq!(stream.read_ranged(0u32, 1 << 20, true).expect("ranged"), v);
    }
    let mut raw = vec![0u8; data.len() - 1];
    stream.read_bits(&mut raw, raw.len() * 8, true).expect("raw");
    assert_eq!(raw, &data[1..]);
    stream.assert_consumed();
});
