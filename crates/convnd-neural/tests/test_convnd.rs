use approx::assert_abs_diff_eq;
use convnd_core::{ops, PaddingMode, Tensor};
use convnd_neural::initializers;
use convnd_neural::{ConvNd, ConvNdConfig, Initializers, Layer};

fn ramp(shape: &[usize]) -> Tensor<f64> {
    let numel: usize = shape.iter().product();
    let data = (0..numel)
        .map(|i| ((i * 37 + 11) % 23) as f64 / 8.0 - 1.3)
        .collect();
    Tensor::from_vec(data, shape).unwrap()
}

fn random_conv(config: ConvNdConfig, seed: u64) -> ConvNd<f64> {
    let kernel = initializers::uniform(-1.0, 1.0, seed);
    let bias = initializers::uniform(-0.5, 0.5, seed + 1);
    ConvNd::with_initializers(
        config,
        Initializers::new().with_kernel(&kernel).with_bias(&bias),
    )
    .unwrap()
}

fn assert_close(actual: &Tensor<f64>, expected: &Tensor<f64>) {
    assert_eq!(actual.shape(), expected.shape());
    for (a, e) in actual.to_vec().iter().zip(expected.to_vec()) {
        assert_abs_diff_eq!(*a, e, epsilon = 1e-9);
    }
}

/// Compare the decomposed operator against the direct N-d kernel with the same
/// dense weights
fn check_against_direct(config: ConvNdConfig, input_shape: &[usize], seed: u64) {
    let conv = random_conv(config.clone(), seed);
    let input = ramp(input_shape);

    let actual = conv.apply(&input).unwrap();
    let expected = ops::conv_nd(
        &input,
        &conv.kernel().unwrap(),
        conv.bias(),
        &config.stride,
        &config.padding,
        config.padding_mode,
        config.groups,
    )
    .unwrap();

    assert_eq!(
        actual.shape().dims(),
        conv.output_shape(input_shape).unwrap().as_slice()
    );
    assert_close(&actual, &expected);
}

#[test]
fn test_one_dim_matches_conv1d() {
    let config = ConvNdConfig::new(2, 3, 1, vec![4], vec![3], vec![2]);
    let conv = random_conv(config, 1);
    let input = ramp(&[2, 2, 9]);

    let actual = conv.apply(&input).unwrap();
    let expected = ops::conv1d(
        &input,
        &conv.kernel().unwrap(),
        conv.bias(),
        3,
        2,
        PaddingMode::Zeros,
        1,
    )
    .unwrap();
    assert_eq!(actual.shape().dims(), &[2, 3, 4]);
    assert_close(&actual, &expected);
}

#[test]
fn test_one_dim_reflect() {
    let config = ConvNdConfig::new(1, 2, 1, vec![3], vec![1], vec![2])
        .with_padding_mode(PaddingMode::Reflect);
    check_against_direct(config, &[1, 1, 6], 2);
}

#[test]
fn test_two_dims_matches_conv2d() {
    let config = ConvNdConfig::new(3, 2, 2, vec![3, 2], vec![2, 3], vec![1, 0]);
    let conv = random_conv(config, 3);
    let input = ramp(&[2, 3, 7, 6]);

    let actual = conv.apply(&input).unwrap();
    let expected = ops::conv2d(
        &input,
        &conv.kernel().unwrap(),
        conv.bias(),
        (2, 3),
        (1, 0),
        PaddingMode::Zeros,
        1,
    )
    .unwrap();
    assert_eq!(actual.shape().dims(), &[2, 2, 4, 2]);
    assert_close(&actual, &expected);
}

#[test]
fn test_two_dims_even_kernel_uneven_stride() {
    let config = ConvNdConfig::new(1, 1, 2, vec![2, 4], vec![3, 2], vec![1, 2]);
    check_against_direct(config, &[1, 1, 8, 7], 4);
}

#[test]
fn test_three_dims_matches_conv3d() {
    let config = ConvNdConfig::new(2, 2, 3, vec![2, 3, 3], vec![1, 2, 1], vec![0, 1, 2]);
    let conv = random_conv(config, 5);
    let input = ramp(&[1, 2, 5, 4, 6]);

    let actual = conv.apply(&input).unwrap();
    let expected = ops::conv3d(
        &input,
        &conv.kernel().unwrap(),
        conv.bias(),
        (1, 2, 1),
        (0, 1, 2),
        PaddingMode::Zeros,
        1,
    )
    .unwrap();
    assert_eq!(actual.shape().dims(), &[1, 2, 4, 2, 8]);
    assert_close(&actual, &expected);
}

#[test]
fn test_three_dims_reflect() {
    let config = ConvNdConfig::uniform(1, 2, 3, 3, 1, 1).with_padding_mode(PaddingMode::Reflect);
    check_against_direct(config, &[1, 1, 4, 3, 5], 6);
}

#[test]
fn test_four_dims() {
    let config = ConvNdConfig::new(2, 3, 4, vec![3, 2, 2, 3], vec![2, 1, 1, 2], vec![1, 0, 1, 1]);
    check_against_direct(config, &[1, 2, 5, 3, 4, 5], 7);
}

#[test]
fn test_five_dims_nests_and_pads_leading_axes() {
    let config = ConvNdConfig::new(1, 2, 5, vec![2, 3, 1, 2, 2], vec![1, 2, 1, 1, 1], vec![1, 1, 0, 0, 1]);
    check_against_direct(config, &[2, 1, 3, 4, 2, 3, 3], 8);
}

#[test]
fn test_five_dims_reflect() {
    let config = ConvNdConfig::uniform(1, 1, 5, 2, 1, 1).with_padding_mode(PaddingMode::Reflect);
    check_against_direct(config, &[1, 1, 3, 3, 2, 2, 3], 9);
}

#[test]
fn test_grouped() {
    let config = ConvNdConfig::uniform(4, 6, 4, 2, 1, 1).with_groups(2);
    check_against_direct(config, &[1, 4, 3, 3, 3, 3], 10);
}

#[test]
fn test_apply_is_idempotent() {
    let conv = random_conv(ConvNdConfig::uniform(2, 2, 4, 3, 2, 1), 11);
    let input = ramp(&[1, 2, 5, 4, 4, 3]);
    let first = conv.apply(&input).unwrap();
    let second = conv.apply(&input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_bias_added_once() {
    let zero = initializers::zeros::<f64>();
    let bias = |b: &mut Tensor<f64>| {
        b.as_slice_mut()
            .unwrap()
            .iter_mut()
            .enumerate()
            .for_each(|(c, v)| *v = c as f64 + 0.5);
    };
    let conv = ConvNd::with_initializers(
        ConvNdConfig::uniform(2, 3, 5, 2, 1, 1),
        Initializers::new().with_kernel(&zero).with_bias(&bias),
    )
    .unwrap();

    let out = conv.apply(&ramp(&[2, 2, 3, 3, 3, 3, 3])).unwrap();
    assert_eq!(out.shape().dims(), &[2, 3, 4, 4, 4, 4, 4]);
    let per_channel: usize = out.shape().dims()[2..].iter().product();
    for (i, v) in out.to_vec().into_iter().enumerate() {
        let channel = (i / per_channel) % 3;
        assert_eq!(v, channel as f64 + 0.5);
    }
}

#[test]
fn test_all_ones_cube() {
    let ones = initializers::ones::<f32>();
    let conv = ConvNd::with_initializers(
        ConvNdConfig::uniform(1, 1, 3, 2, 1, 0),
        Initializers::new().with_kernel(&ones),
    )
    .unwrap();
    assert_eq!(conv.bias().unwrap().to_vec(), vec![0.0]);

    let out = conv.forward(&Tensor::ones(&[1, 1, 3, 3, 3])).unwrap();
    assert_eq!(out.shape().dims(), &[1, 1, 2, 2, 2]);
    assert!(out.to_vec().iter().all(|&v| v == 8.0));
}

#[test]
fn test_config_errors_raised_before_building() {
    let mismatched = ConvNdConfig::new(1, 1, 3, vec![2, 2], vec![1, 1, 1], vec![0, 0, 0]);
    assert!(ConvNd::<f32>::new(mismatched)
        .err()
        .unwrap()
        .is_configuration_error());

    let dilated = ConvNdConfig::uniform(1, 1, 3, 2, 1, 0).with_dilation(2);
    assert!(ConvNd::<f32>::new(dilated)
        .err()
        .unwrap()
        .is_configuration_error());
}

#[test]
fn test_wrong_channel_count_is_shape_error() {
    let conv = ConvNd::<f32>::new(ConvNdConfig::uniform(3, 1, 2, 3, 1, 1)).unwrap();
    let err = conv.apply(&Tensor::ones(&[1, 2, 5, 5])).unwrap_err();
    assert!(err.is_shape_error());
}

#[test]
fn test_parameters_cover_the_tree() {
    let mut conv = ConvNd::<f32>::new(ConvNdConfig::uniform(1, 2, 6, 2, 1, 0)).unwrap();
    // 2 * 2 * 2 base layers (6 -> 5 -> 4 -> 3D leaves) plus the bias
    assert_eq!(conv.parameters().len(), 9);

    for param in conv.parameters_mut() {
        param.array_mut().fill(1.0);
    }
    let kernel = conv.kernel().unwrap();
    assert_eq!(kernel.shape().dims(), &[2, 1, 2, 2, 2, 2, 2, 2]);
    assert!(kernel.to_vec().iter().all(|&v| v == 1.0));

    let boxed = conv.clone_box();
    assert_eq!(boxed.parameters().len(), 9);
}
