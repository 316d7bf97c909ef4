use approx::assert_relative_eq;
use convnd_core::ops::{self, PaddingMode};
use convnd_core::Tensor;

/// Naive 2D convolution through element access, single group
fn reference_conv2d(
    input: &Tensor<f64>,
    weight: &Tensor<f64>,
    stride: (usize, usize),
    padding: (usize, usize),
) -> Vec<f64> {
    let x = input.shape().dims().to_vec();
    let w = weight.shape().dims().to_vec();
    let out_h = (x[2] + 2 * padding.0 - w[2]) / stride.0 + 1;
    let out_w = (x[3] + 2 * padding.1 - w[3]) / stride.1 + 1;
    let mut out = Vec::new();
    for b in 0..x[0] {
        for oc in 0..w[0] {
            for oh in 0..out_h {
                for ow in 0..out_w {
                    let mut sum = 0.0;
                    for ic in 0..w[1] {
                        for kh in 0..w[2] {
                            for kw in 0..w[3] {
                                let ih = (oh * stride.0 + kh) as isize - padding.0 as isize;
                                let iw = (ow * stride.1 + kw) as isize - padding.1 as isize;
                                if ih < 0 || iw < 0 {
                                    continue;
                                }
                                if let Some(v) = input.get(&[b, ic, ih as usize, iw as usize]) {
                                    sum += v * weight.get(&[oc, ic, kh, kw]).unwrap();
                                }
                            }
                        }
                    }
                    out.push(sum);
                }
            }
        }
    }
    out
}

fn sequence(shape: &[usize], scale: f64) -> Tensor<f64> {
    let numel: usize = shape.iter().product();
    Tensor::from_vec(
        (0..numel).map(|i| ((i % 7) as f64 - 3.0) * scale).collect(),
        shape,
    )
    .unwrap()
}

#[test]
fn test_conv2d_matches_reference() {
    let input = sequence(&[2, 3, 6, 5], 0.5);
    let weight = sequence(&[4, 3, 3, 2], 0.25);
    for (stride, padding) in [((1, 1), (0, 0)), ((2, 1), (1, 1)), ((3, 2), (2, 0))] {
        let out = ops::conv2d(&input, &weight, None, stride, padding, PaddingMode::Zeros, 1).unwrap();
        let expected = reference_conv2d(&input, &weight, stride, padding);
        assert_eq!(out.numel(), expected.len());
        for (a, e) in out.to_vec().iter().zip(&expected) {
            assert_relative_eq!(*a, *e, epsilon = 1e-12);
        }
    }
}

/// Naive 3D convolution through element access, single group
fn reference_conv3d(
    input: &Tensor<f64>,
    weight: &Tensor<f64>,
    stride: [usize; 3],
    padding: [usize; 3],
) -> (Vec<usize>, Vec<f64>) {
    let x = input.shape().dims().to_vec();
    let w = weight.shape().dims().to_vec();
    let out: Vec<usize> = (0..3)
        .map(|d| (x[d + 2] + 2 * padding[d] - w[d + 2]) / stride[d] + 1)
        .collect();
    let mut values = Vec::new();
    for b in 0..x[0] {
        for oc in 0..w[0] {
            for od in 0..out[0] {
                for oh in 0..out[1] {
                    for ow in 0..out[2] {
                        let mut sum = 0.0;
                        for ic in 0..w[1] {
                            for kd in 0..w[2] {
                                for kh in 0..w[3] {
                                    for kw in 0..w[4] {
                                        let pos = [(od, kd), (oh, kh), (ow, kw)]
                                            .iter()
                                            .enumerate()
                                            .map(|(d, &(o, k))| {
                                                (o * stride[d] + k) as isize - padding[d] as isize
                                            })
                                            .collect::<Vec<_>>();
                                        if pos.iter().any(|&p| p < 0) {
                                            continue;
                                        }
                                        let index =
                                            [b, ic, pos[0] as usize, pos[1] as usize, pos[2] as usize];
                                        if let Some(v) = input.get(&index) {
                                            sum += v * weight.get(&[oc, ic, kd, kh, kw]).unwrap();
                                        }
                                    }
                                }
                            }
                        }
                        values.push(sum);
                    }
                }
            }
        }
    }
    let mut shape = vec![x[0], w[0]];
    shape.extend(out);
    (shape, values)
}

#[test]
fn test_conv_nd_matches_reference_in_3d() {
    let input = sequence(&[2, 2, 5, 4, 6], 0.4);
    let weight = sequence(&[3, 2, 2, 3, 3], 0.2);
    for (stride, padding) in [
        ([1, 1, 1], [0, 0, 0]),
        ([2, 1, 3], [1, 0, 2]),
        ([1, 3, 2], [2, 1, 1]),
    ] {
        let out = ops::conv_nd(&input, &weight, None, &stride, &padding, PaddingMode::Zeros, 1)
            .unwrap();
        let (shape, expected) = reference_conv3d(&input, &weight, stride, padding);
        assert_eq!(out.shape().dims(), shape.as_slice());
        for (a, e) in out.to_vec().iter().zip(&expected) {
            assert_relative_eq!(*a, *e, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_transpose_is_adjoint_of_conv() {
    // <conv(x), y> == <x, conv_transpose(y)> with the same kernel
    let x = sequence(&[1, 2, 5, 6], 0.3);
    let weight = sequence(&[3, 2, 3, 2], 0.7);
    let y_conv = ops::conv2d(&x, &weight, None, (2, 2), (1, 0), PaddingMode::Zeros, 1).unwrap();
    let y = sequence(y_conv.shape().dims(), 0.9);

    // conv weight [out, in, ..] doubles as transposed weight [in', out', ..] with in' = out
    let x_back = ops::conv_transpose2d(&y, &weight, None, (2, 2), (1, 0), 1).unwrap();
    let lhs: f64 = y_conv.to_vec().iter().zip(y.to_vec()).map(|(a, b)| a * b).sum();

    // the transposed output may be shorter than x when the forward stride dropped a tail
    let xb = x_back.shape().dims().to_vec();
    let mut rhs = 0.0;
    for c in 0..xb[1] {
        for h in 0..xb[2] {
            for w in 0..xb[3] {
                rhs += x.get(&[0, c, h, w]).unwrap() * x_back.get(&[0, c, h, w]).unwrap();
            }
        }
    }
    assert_relative_eq!(lhs, rhs, epsilon = 1e-9);
}

#[test]
fn test_stack_of_selected_frames_rebuilds_input() {
    let t = sequence(&[2, 3, 4, 2], 1.0);
    let frames: Vec<Tensor<f64>> = (0..4).map(|j| ops::select(&t, 2, j).unwrap()).collect();
    let refs: Vec<&Tensor<f64>> = frames.iter().collect();
    assert_eq!(ops::stack(&refs, 2).unwrap(), t);
}

#[test]
fn test_channel_bias_broadcast() {
    let t = Tensor::<f64>::zeros(&[2, 3, 2, 2]);
    let bias = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
    let out = ops::add_channel_bias(&t, &bias).unwrap();
    assert_eq!(out.get(&[1, 2, 1, 0]), Some(3.0));
    assert_eq!(out.get(&[0, 0, 0, 1]), Some(1.0));
    assert!(ops::add_channel_bias(&t, &Tensor::zeros(&[2])).is_err());
}
