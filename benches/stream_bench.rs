use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use netbits::prelude::*;
use netbits::utils::stream_pool::StreamPool;

#[allow(clippy::unwrap_used)]
fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");
    let counts = [16usize, 256, 4096];

    for &count in &counts {
        group.throughput(Throughput::Bytes((count * 4) as u64));

        group.bench_function(format!("write_u32_aligned_{count}"), |b| {
            b.iter(|| {
                let mut stream = BitStream::new();
                for i in 0..count as u32 {
                    stream.write(black_box(i));
                }
                stream
            })
        });

        group.bench_function(format!("write_u32_unaligned_{count}"), |b| {
            b.iter(|| {
                let mut stream = BitStream::new();
                stream.write_bit(true);
                for i in 0..count as u32 {
                    stream.write(black_box(i));
                }
                stream
            })
        });

        group.bench_function(format!("read_u32_unaligned_{count}"), |b| {
            let mut stream = BitStream::new();
            stream.write_bit(true);
            for i in 0..count as u32 {
                stream.write(i);
            }
            let packet = stream.to_vec();
            b.iter(|| {
                let mut reader = BitReader::new(&packet);
                reader.read_bit().unwrap();
                for _ in 0..count {
                    black_box(reader.read::<u32>().unwrap());
                }
            })
        });
    }

    group.finish();
}

fn bench_bits(c: &mut Criterion) {
    let mut group = c.benchmark_group("bits");
    let sizes = [64usize, 1200, 65536];

    for &size in &sizes {
        let data = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("write_bits_offset_{size}b"), |b| {
            b.iter_batched(
                || {
                    let mut stream = BitStream::with_capacity(size + 1);
                    stream.write_bits(&[0b101], 3, true);
                    stream
                },
                |mut stream| {
                    stream.write_bits(&data, size * 8, true);
                    stream
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("write_aligned_bytes_{size}b"), |b| {
            b.iter_batched(
                || BitStream::with_capacity(size),
                |mut stream| {
                    stream.write_aligned_bytes(&data);
                    stream
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation");
    let pool = StreamPool::default();

    group.bench_function("fresh_stream_small_message", |b| {
        b.iter(|| {
            let mut stream = BitStream::new();
            stream.write(black_box(0xDEAD_BEEFu32));
            stream.into_bytes()
        })
    });
    group.bench_function("pooled_stream_small_message", |b| {
        b.iter(|| {
            let mut stream = pool.acquire();
            stream.write(black_box(0xDEAD_BEEFu32));
            black_box(stream.written_bits());
        })
    });
    group.bench_function("spill_to_heap", |b| {
        let block = [0u8; 64];
        b.iter(|| {
            let mut stream = BitStream::new();
            for _ in 0..8 {
                stream.write_bytes(&block);
            }
            stream
        })
    });

    group.finish();
}

criterion_group!(benches, bench_primitives, bench_bits, bench_allocation);
criterion_main!(benches);
