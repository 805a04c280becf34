use std::hint::black_box;

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use opcode_socket::core::frame::LittleEndianLength;
use opcode_socket::transport::framer::Framer;
use opcode_socket::{DispatchTable, Opcode, PacketReader, PacketWriter, SessionId};

fn sample_packet(fields: usize) -> Bytes {
    let mut w = PacketWriter::with_capacity(fields * 16);
    0x0101u16.write_to(&mut w);
    for i in 0..fields {
        w.write_u32(i as u32);
        w.write_u16(i as u16);
        w.write_ascii_string("ロード");
    }
    w.into_bytes()
}

fn bench_reader_writer(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_codec");

    for &fields in &[4usize, 64, 1024] {
        let packet = sample_packet(fields);
        group.throughput(Throughput::Bytes(packet.len() as u64));

        group.bench_function(format!("write_{fields}_fields"), |b| {
            b.iter(|| black_box(sample_packet(fields)))
        });

        group.bench_function(format!("read_{fields}_fields"), |b| {
            b.iter_batched(
                || PacketReader::with_time(packet.clone(), 0),
                |mut reader| {
                    let _ = u16::read_from(&mut reader);
                    for _ in 0..fields {
                        black_box(reader.read_u32());
                        black_box(reader.read_u16());
                        black_box(reader.read_ascii_string());
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_framing_and_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing");
    let body = sample_packet(16);
    let mut wire = (body.len() as u32).to_le_bytes().to_vec();
    wire.extend_from_slice(&body);
    group.throughput(Throughput::Bytes(wire.len() as u64));

    let table = DispatchTable::<u16>::builder()
        .register(0x0101, |_, mut reader| {
            black_box(reader.read_u32());
        })
        .build();
    let session = SessionId::from_u128(1);

    group.bench_function("assemble_and_dispatch", |b| {
        b.iter_batched(
            || Framer::new(4, 65535),
            |mut framer| {
                let mut offset = 0;
                while offset < wire.len() {
                    let spare = framer.spare();
                    let n = spare.len().min(wire.len() - offset);
                    spare[..n].copy_from_slice(&wire[offset..offset + n]);
                    framer.advance(n);
                    offset += n;
                    if let Some(body) = framer.next_body(&LittleEndianLength).unwrap() {
                        let reader = PacketReader::with_time(body.freeze(), 0);
                        black_box(table.dispatch(session, reader));
                    }
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_reader_writer, bench_framing_and_dispatch);
criterion_main!(benches);
