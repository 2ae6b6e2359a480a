//! Subsampling layers as defined in the LeNet paper.
//!
//! These are not the average or max pooling usually substituted for them:
//! the paper's subsampling operator is trainable. Each output is
//! `activation(w * (sum of window entries) + b)`.

use crate::utils::activation::Activation;
use burn::module::Param;
use burn::nn::pool::{AvgPool2d, AvgPool2dConfig};
use burn::nn::{Initializer, PaddingConfig2d};
use burn::prelude::*;

/// Configuration to create a [Subsampling](Subsampling) layer.
#[derive(Config, Debug)]
pub struct SubsamplingConfig {
    /// Number of input (and output) channels.
    pub channels: usize,

    /// Pooling window size.
    #[config(default = "[2, 2]")]
    pub pool_size: [usize; 2],

    /// Window strides; copied from `pool_size` when unset.
    pub strides: Option<[usize; 2]>,

    #[config(default = "PaddingConfig2d::Valid")]
    pub padding: PaddingConfig2d,

    #[config(default = "Activation::Identity")]
    pub activation: Activation,
}

impl SubsamplingConfig {
    /// Returns the initialized layer.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Subsampling<B> {
        assert!(self.channels > 0);
        assert_valid_padding(&self.padding);
        let strides = self.strides.unwrap_or(self.pool_size);
        let initializer = Initializer::Normal {
            mean: 0.0,
            std: 0.05,
        };

        Subsampling {
            pool: AvgPool2dConfig::new(self.pool_size)
                .with_strides(strides)
                .with_padding(self.padding.clone())
                .init(),
            weight: initializer.init([self.channels], device),
            bias: initializer.init([self.channels], device),
            pool_size: self.pool_size,
            activation: self.activation.clone(),
        }
    }
}

/// Subsampling layer as described in the LeNet paper: one trainable
/// `(w, b)` pair per channel.
///
/// The window sum is recovered by scaling average pooling back up by the
/// window area, since no pooling primitive produces the plain sum.
#[derive(Module, Debug)]
pub struct Subsampling<B: Backend> {
    pub pool: AvgPool2d,

    /// # Shape
    /// [channels]
    pub weight: Param<Tensor<B, 1>>,

    /// # Shape
    /// [channels]
    pub bias: Param<Tensor<B, 1>>,

    pub pool_size: [usize; 2],
    pub activation: Activation,
}

impl<B: Backend> Subsampling<B> {
    /// # Shapes
    ///   - Input [batch, channels, height, width]
    ///   - Output [batch, channels, out_height, out_width]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, channels, _, _] = x.dims();
        let [weight_channels] = self.weight.dims();
        assert_eq!(channels, weight_channels);

        // The average times the window area is the window sum.
        let area = (self.pool_size[0] * self.pool_size[1]) as f64;
        let sum = self.pool.forward(x) * area;
        let [batch, _, out_height, out_width] = sum.dims();
        let out_shape = [batch, channels, out_height, out_width];

        let weight = self.weight.val().unsqueeze_dims(&[0, 2, 3]);
        assert_eq!([1, channels, 1, 1], weight.dims());
        let weight = weight.expand(out_shape);

        let bias = self.bias.val().unsqueeze_dims(&[0, 2, 3]);
        assert_eq!([1, channels, 1, 1], bias.dims());
        let bias = bias.expand(out_shape);

        self.activation.forward(sum * weight + bias)
    }
}

/// Configuration to create a [SubsamplingPerCell](SubsamplingPerCell) layer.
#[derive(Config, Debug)]
pub struct SubsamplingPerCellConfig {
    /// Number of input (and output) channels.
    pub channels: usize,

    /// Spatial size `[height, width]` of the incoming feature map; the
    /// per-cell parameter grid is sized from it.
    pub input_size: [usize; 2],

    /// Pooling window size.
    #[config(default = "[2, 2]")]
    pub pool_size: [usize; 2],

    /// Window strides; copied from `pool_size` when unset.
    pub strides: Option<[usize; 2]>,

    #[config(default = "PaddingConfig2d::Valid")]
    pub padding: PaddingConfig2d,

    #[config(default = "Activation::Identity")]
    pub activation: Activation,
}

impl SubsamplingPerCellConfig {
    /// Spatial size of the layer output for the configured input size.
    pub fn output_size(&self) -> [usize; 2] {
        let strides = self.strides.unwrap_or(self.pool_size);
        let span = |axis: usize| match self.padding {
            PaddingConfig2d::Same => self.input_size[axis].div_ceil(strides[axis]),
            _ => (self.input_size[axis] - self.pool_size[axis] + 1).div_ceil(strides[axis]),
        };
        [span(0), span(1)]
    }

    /// Returns the initialized layer.
    pub fn init<B: Backend>(&self, device: &B::Device) -> SubsamplingPerCell<B> {
        assert!(self.channels > 0);
        assert_valid_padding(&self.padding);
        assert!(
            self.input_size[0] >= self.pool_size[0] && self.input_size[1] >= self.pool_size[1],
            "input size {:?} is smaller than the pooling window {:?}",
            self.input_size,
            self.pool_size
        );

        let strides = self.strides.unwrap_or(self.pool_size);
        let [out_height, out_width] = self.output_size();
        let param_shape = [self.channels, out_height, out_width];
        let initializer = Initializer::Normal {
            mean: 0.0,
            std: 0.05,
        };

        SubsamplingPerCell {
            pool: AvgPool2dConfig::new(self.pool_size)
                .with_strides(strides)
                .with_padding(self.padding.clone())
                .init(),
            weight: initializer.init(param_shape, device),
            bias: initializer.init(param_shape, device),
            pool_size: self.pool_size,
            activation: self.activation.clone(),
        }
    }
}

/// Extension of the LeNet subsampling layer with one `(w, b)` pair per cell
/// of the output, rather than a single pair per channel.
#[derive(Module, Debug)]
pub struct SubsamplingPerCell<B: Backend> {
    pub pool: AvgPool2d,

    /// # Shape
    /// [channels, out_height, out_width]
    pub weight: Param<Tensor<B, 3>>,

    /// # Shape
    /// [channels, out_height, out_width]
    pub bias: Param<Tensor<B, 3>>,

    pub pool_size: [usize; 2],
    pub activation: Activation,
}

impl<B: Backend> SubsamplingPerCell<B> {
    /// # Shapes
    ///   - Input [batch, channels, height, width]
    ///   - Output [batch, channels, out_height, out_width]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let area = (self.pool_size[0] * self.pool_size[1]) as f64;
        let sum = self.pool.forward(x) * area;

        let [batch, channels, out_height, out_width] = sum.dims();
        assert_eq!(
            [channels, out_height, out_width],
            self.weight.dims(),
            "input spatial size does not match the configured parameter grid"
        );
        let out_shape = [batch, channels, out_height, out_width];

        let weight = self.weight.val().unsqueeze_dim(0);
        assert_eq!([1, channels, out_height, out_width], weight.dims());
        let weight = weight.expand(out_shape);

        let bias = self.bias.val().unsqueeze_dim(0);
        assert_eq!([1, channels, out_height, out_width], bias.dims());
        let bias = bias.expand(out_shape);

        self.activation.forward(sum * weight + bias)
    }
}

fn assert_valid_padding(padding: &PaddingConfig2d) {
    assert!(
        matches!(padding, PaddingConfig2d::Valid | PaddingConfig2d::Same),
        "padding must be Valid or Same; received: {padding:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn computes_the_window_sum_with_unit_parameters() {
        let device = Default::default();
        let mut layer: Subsampling<TestBackend> = SubsamplingConfig::new(1).init(&device);
        layer.weight = Param::from_tensor(Tensor::ones([1], &device));
        layer.bias = Param::from_tensor(Tensor::zeros([1], &device));

        let output = layer.forward(Tensor::ones([1, 1, 4, 4], &device));
        assert_eq!([1, 1, 2, 2], output.dims());
        // Each 2x2 window of ones sums to 4.
        let values = output.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|value| (value - 4.0).abs() < 1e-6));
    }

    #[test]
    fn applies_bias_and_activation() {
        let device = Default::default();
        let mut layer: Subsampling<TestBackend> =
            SubsamplingConfig::new(1).with_activation(Activation::Relu).init(&device);
        layer.weight = Param::from_tensor(Tensor::ones([1], &device));
        layer.bias = Param::from_tensor(Tensor::from_floats([-5.0], &device));

        // Window sum is 4, bias pushes it to -1, relu clamps to 0.
        let output = layer.forward(Tensor::ones([1, 1, 2, 2], &device));
        let values = output.into_data().to_vec::<f32>().unwrap();
        assert_eq!(vec![0.0], values);
    }

    #[test]
    fn per_channel_parameters_are_independent() {
        let device = Default::default();
        let mut layer: Subsampling<TestBackend> = SubsamplingConfig::new(2).init(&device);
        layer.weight = Param::from_tensor(Tensor::from_floats([1.0, 10.0], &device));
        layer.bias = Param::from_tensor(Tensor::zeros([2], &device));

        let output = layer.forward(Tensor::ones([1, 2, 2, 2], &device));
        let values = output.into_data().to_vec::<f32>().unwrap();
        assert!((values[0] - 4.0).abs() < 1e-6);
        assert!((values[1] - 40.0).abs() < 1e-6);
    }

    #[test]
    fn per_cell_parameter_grid_matches_the_output() {
        let config = SubsamplingPerCellConfig::new(3, [8, 8]);
        assert_eq!([4, 4], config.output_size());

        let device = Default::default();
        let layer: SubsamplingPerCell<TestBackend> = config.init(&device);
        assert_eq!([3, 4, 4], layer.weight.dims());
        assert_eq!([3, 4, 4], layer.bias.dims());

        let output = layer.forward(Tensor::ones([2, 3, 8, 8], &device));
        assert_eq!([2, 3, 4, 4], output.dims());
    }

    #[test]
    fn per_cell_output_size_with_same_padding() {
        let config = SubsamplingPerCellConfig::new(1, [8, 8])
            .with_pool_size([2, 2])
            .with_strides(Some([3, 3]))
            .with_padding(PaddingConfig2d::Same);
        assert_eq!([3, 3], config.output_size());
    }

    #[test]
    fn strides_default_to_the_pool_size() {
        let config = SubsamplingPerCellConfig::new(1, [9, 9]).with_pool_size([3, 3]);
        // Valid padding: ceil((9 - 3 + 1) / 3) = 3.
        assert_eq!([3, 3], config.output_size());
    }

    #[test]
    #[should_panic(expected = "padding must be Valid or Same")]
    fn explicit_padding_is_rejected() {
        let device: <TestBackend as Backend>::Device = Default::default();
        SubsamplingConfig::new(1)
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init::<TestBackend>(&device);
    }
}
