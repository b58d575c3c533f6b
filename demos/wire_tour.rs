//! A tour of the wire encodings and what each one costs.
//!
//! Run with `cargo run --example wire_tour`; set `RUST_LOG=debug` to see
//! buffer growth and timing events.

use netbits::config::CodecConfig;
use netbits::error::Result;
use netbits::prelude::*;
use netbits::utils::dump::{bitify, hexlify};
use netbits::utils::logging::init_logging;
use netbits::utils::metrics::{global_metrics, Timer};
use netbits::utils::stream_pool::StreamPool;
use std::net::SocketAddr;

fn report(label: &str, stream: &BitStream) {
    println!("{label:<28} {:>4} bits  {}", stream.written_bits(), bitify(stream));
}

fn encodings() -> Result<()> {
    println!("== encodings ==");

    let mut stream = BitStream::new();
    stream.write(300_000u32);
    report("u32 300000, fixed", &stream);

    let mut stream = BitStream::new();
    stream.write_mini(300_000u32)?;
    report("u32 300000, mini", &stream);

    let mut stream = BitStream::new();
    stream.write_mini_signed(-3i32);
    report("i32 -3, signed mini", &stream);

    let mut stream = BitStream::new();
    stream.write_ranged(105u32, 100, 120, false)?;
    report("105 in [100, 120]", &stream);

    let mut stream = BitStream::new();
    stream.write_ranged(5000u32, 100, 120, true)?;
    report("5000 escaped from [100, 120]", &stream);

    let mut stream = BitStream::new();
    stream.write_changed(42u16, 42);
    report("u16 unchanged", &stream);

    let mut stream = BitStream::new();
    stream.write_normal_vector([0.0f32, 1.0, 0.0])?;
    report("normal on +y axis", &stream);

    let mut stream = BitStream::new();
    stream.write_normal_vector([0.6f32, 0.8, 0.0])?;
    println!("{:<28} {:>4} bits", "normal (0.6, 0.8, 0)", stream.written_bits());

    let mut stream = BitStream::new();
    stream.write_normal_quat([1.0f32, 0.0, 0.0, 0.0])?;
    report("identity quaternion", &stream);

    let addr: SocketAddr = "192.168.1.20:27015".parse().map_err(|e| {
        netbits::error::CodecError::Malformed(format!("bad demo address: {e}"))
    })?;
    let mut stream = BitStream::new();
    stream.write(addr);
    println!("{:<28} {:>4} bits  {}", "IPv4 socket address", stream.written_bits(), hexlify(&stream));

    Ok(())
}

fn snapshot(pool: &StreamPool) -> Result<()> {
    println!("== snapshot ==");
    let _timer = Timer::start("encode_snapshot");

    let mut stream = pool.acquire();
    for id in 0..64u32 {
        let angle = id as f32 * 0.1;
        stream.write_mini(id)?;
        stream.write_ranged(id % 4, 0, 3, false)?;
        stream.write_vector([angle.cos() * 3.0, angle.sin() * 3.0, 0.0])?;
        stream.write_normal_quat([1.0f32, 0.0, 0.0, 0.0])?;
    }
    println!("64 entities in {} bytes", stream.written_bytes());

    let packet = stream.to_vec();
    let mut reader = BitReader::new(&packet);
    for id in 0..64u32 {
        let decoded: u32 = reader.read_mini()?;
        let _kind: u32 = reader.read_ranged(0, 3, false)?;
        let _velocity = reader.read_vector::<f32>()?;
        let _orientation = reader.read_normal_quat::<f32>()?;
        assert_eq!(decoded, id);
    }
    println!("decoded, {} padding bits left", reader.payload_bits());
    Ok(())
}

fn main() -> Result<()> {
    let config = CodecConfig::from_env()?;
    config.validate_strict()?;
    init_logging(&config.logging)?;

    let pool = StreamPool::new(4);
    encodings()?;
    snapshot(&pool)?;

    // truncated input is an error, never a panic
    let mut reader = BitReader::new(&[0xFF]);
    match reader.read_mini::<u64>() {
        Err(e) => println!("truncated mini: {e}"),
        Ok(v) => println!("unexpected value {v}"),
    }

    global_metrics().log_metrics();
    Ok(())
}
