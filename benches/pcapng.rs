use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pcapng_codec::*;
use std::io::Cursor;
use std::sync::atomic::AtomicBool;

const NUM_PACKETS: u64 = 5000;

fn build_capture(packet_size: usize) -> Vec<u8> {
    let writer = PcapNGWriter::with_default_group(Vec::new(), false).expect("writer");
    for i in 0..NUM_PACKETS {
        let packet = RawPacket::new(1_432_723_816 + i, i % 1_000_000, vec![0xa5; packet_size]);
        writer.write_packet(&packet).expect("write_packet");
    }
    writer.into_inner()
}

fn do_read_packets(bytes: &[u8]) {
    let reader = PcapNGReader::new(Cursor::new(bytes), false).expect("could not create reader");
    let mut num_packets = 0;
    reader
        .read_packets(&AtomicBool::new(false), &mut |_, _| num_packets += 1, None)
        .expect("read_packets");
    assert_eq!(num_packets, NUM_PACKETS);
}

fn do_parse_blocks(bytes: &[u8]) {
    let mut errors = ErrorReporter::fatal();
    let mut i = bytes;
    let mut offset = 0;
    let mut num_blocks = 0;
    while !i.is_empty() {
        let (rem, _block) = parse_block(i, false, offset, &mut errors).expect("parse_block");
        offset += (i.len() - rem.len()) as u64;
        i = rem;
        num_blocks += 1;
    }
    assert_eq!(num_blocks, NUM_PACKETS + 2);
}

fn bench_read_packets(c: &mut Criterion) {
    let bytes = build_capture(98);
    c.bench_function("read_packets 5000x98", |b| b.iter(|| do_read_packets(&bytes)));
}

fn bench_parse_blocks(c: &mut Criterion) {
    let bytes = build_capture(98);
    c.bench_function("parse_block 5000x98", |b| b.iter(|| do_parse_blocks(&bytes)));
}

fn bench_write_packets(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_packets packet_size");
    for packet_size in [64usize, 512, 1500, 9000].iter() {
        group.throughput(Throughput::Bytes(*packet_size as u64 * NUM_PACKETS));
        group.bench_with_input(
            BenchmarkId::from_parameter(packet_size),
            packet_size,
            |b, &size| b.iter(|| build_capture(size)),
        );
    }
}

criterion_group!(
    benches,
    bench_read_packets,
    bench_parse_blocks,
    bench_write_packets
);
criterion_main!(benches);
