use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use convnd_core::Tensor;
use convnd_neural::initializers;
use convnd_neural::{ConvNd, ConvNdConfig, ConvTransposeNd, Initializers};

/// Decomposed 4D convolution against growing cubes
fn bench_convnd_4d(c: &mut Criterion) {
    let mut group = c.benchmark_group("convnd_4d_forward");
    group.sample_size(20);

    let kernel = initializers::xavier_uniform::<f32>(42);
    let conv = ConvNd::with_initializers(
        ConvNdConfig::uniform(2, 4, 4, 3, 1, 1),
        Initializers::new().with_kernel(&kernel),
    )
    .unwrap();

    for size in [4usize, 6, 8] {
        let input = Tensor::<f32>::ones(&[1, 2, size, size, size, size]);
        group.throughput(Throughput::Elements(input.numel() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| black_box(conv.apply(input).unwrap()));
        });
    }
    group.finish();
}

fn bench_conv_transpose_4d(c: &mut Criterion) {
    let mut group = c.benchmark_group("conv_transpose_4d_forward");
    group.sample_size(20);

    let kernel = initializers::xavier_uniform::<f32>(7);
    let conv = ConvTransposeNd::with_initializers(
        ConvNdConfig::uniform(4, 2, 4, 2, 2, 0),
        Initializers::new().with_kernel(&kernel),
    )
    .unwrap();

    for size in [2usize, 3, 4] {
        let input = Tensor::<f32>::ones(&[1, 4, size, size, size, size]);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| black_box(conv.apply(input).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_convnd_4d, bench_conv_transpose_4d);
criterion_main!(benches);
