use bgcode::compress::compress;
use bgcode::decompress::Decompressor;
use bgcode::header::CompressionKind;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn gcode_corpus(size: usize) -> Vec<u8> {
    let line = b"G1 X10.500 Y20.250 Z0.200 E0.03321 F1800\n";
    line.iter().copied().cycle().take(size).collect()
}

fn bench_compression(c: &mut Criterion) {
    let data = gcode_corpus(1024 * 1024);

    c.bench_function("deflate_compress_1mb_gcode", |b| {
        b.iter(|| compress(CompressionKind::Deflate, black_box(&data)))
    });

    let deflated = compress(CompressionKind::Deflate, &data).unwrap();
    c.bench_function("deflate_decompress_1mb_gcode", |b| {
        b.iter(|| {
            let mut decompressor = Decompressor::new();
            decompressor.reset(CompressionKind::Deflate);
            let mut workbuf = vec![0u8; 64 * 1024];
            let mut out = Vec::with_capacity(data.len());
            let mut sink = |bytes: &[u8]| -> bgcode::Result<()> {
                out.extend_from_slice(bytes);
                Ok(())
            };
            decompressor.finish(&mut sink, black_box(&deflated), &mut workbuf).unwrap();
        })
    });
}

criterion_group!(benches, bench_compression);
criterion_main!(benches);
