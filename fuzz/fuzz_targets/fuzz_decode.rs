#![no_main]

use libfuzzer_sys::fuzz_target;
use netbits::prelude::*;
use std::net::SocketAddr;

fuzz_target!(|data: &[u8]| {
    // Every decoder must reject garbage with an error, never a panic
    let mut reader = BitReader::new(data);
    let _ = reader.read_mini::<u64>();
    let _ = reader.read_mini_signed::<i32>();
    let _ = reader.read_mini::<f32>();
    let _ = reader.read_ranged(-1000i32, 3000, true);
    let _ = reader.read::<SocketAddr>();
    let _ = reader.read_normal_vector::<f32>();
    let _ = reader.read_vector::<f64>();
    let _ = reader.read_normal_quat::<f32>();
    let _ = reader.read_orth_matrix::<f64>();
    let _ = reader.read_aligned_bytes_bounded(1024);
    assert!(reader.read_pos() <= data.len() * 8);

    // The same bytes through the owned stream
    let mut stream = BitStream::from_slice(data);
    let mut last = 0u16;
    while stream.read_changed(&mut last).is_ok() && !stream.is_consumed() {}
});
