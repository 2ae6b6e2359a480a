//! LeNet-5 as published in "Gradient-Based Learning Applied to Document
//! Recognition" (LeCun et al., 1998), for 28x28 single-channel digit images.

use crate::lenet::{Subsampling, SubsamplingConfig, SubsamplingPerCell, SubsamplingPerCellConfig};
use crate::utils::activation::Activation;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AvgPool2d, AvgPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation::softmax;

/// Selects what fills the S2/S4 subsampling slots of [`LeNet5`].
#[derive(Config, Debug, PartialEq)]
pub enum SubsamplingKind {
    /// Plain untrainable average pooling, the usual LeNet substitution.
    Average,
    /// The paper's trainable subsampling, one `(w, b)` pair per channel.
    Trainable,
    /// Trainable subsampling with one `(w, b)` pair per output cell.
    TrainablePerCell,
}

/// One S2/S4 slot, filled according to [`SubsamplingKind`].
#[derive(Module, Debug)]
pub enum PoolingLayer<B: Backend> {
    Average(AvgPool2d),
    Trainable(Subsampling<B>),
    TrainablePerCell(SubsamplingPerCell<B>),
}

impl<B: Backend> PoolingLayer<B> {
    /// # Shapes
    ///   - Input [batch, channels, height, width]
    ///   - Output [batch, channels, height / 2, width / 2]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            PoolingLayer::Average(pool) => pool.forward(x),
            PoolingLayer::Trainable(layer) => layer.forward(x),
            PoolingLayer::TrainablePerCell(layer) => layer.forward(x),
        }
    }
}

#[derive(Config, Debug)]
pub struct LeNet5Config {
    /// What to use for the S2/S4 subsampling slots.
    #[config(default = "SubsamplingKind::Average")]
    pub subsampling: SubsamplingKind,

    /// Hidden activation; the paper's choice is tanh.
    #[config(default = "Activation::Tanh")]
    pub activation: Activation,
}

impl LeNet5Config {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LeNet5<B> {
        LeNet5 {
            c1: Conv2dConfig::new([1, 6], [5, 5])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            s2: self.subsampling_layer(6, [28, 28], device),
            c3: Conv2dConfig::new([6, 16], [5, 5]).init(device),
            s4: self.subsampling_layer(16, [10, 10], device),
            c5: Conv2dConfig::new([16, 120], [5, 5]).init(device),
            f6: LinearConfig::new(120, 84).init(device),
            output: LinearConfig::new(84, 10).init(device),
            activation: self.activation.clone(),
        }
    }

    fn subsampling_layer<B: Backend>(
        &self,
        channels: usize,
        input_size: [usize; 2],
        device: &B::Device,
    ) -> PoolingLayer<B> {
        match self.subsampling {
            SubsamplingKind::Average => PoolingLayer::Average(
                AvgPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            ),
            SubsamplingKind::Trainable => {
                PoolingLayer::Trainable(SubsamplingConfig::new(channels).init(device))
            }
            SubsamplingKind::TrainablePerCell => PoolingLayer::TrainablePerCell(
                SubsamplingPerCellConfig::new(channels, input_size).init(device),
            ),
        }
    }
}

#[derive(Module, Debug)]
pub struct LeNet5<B: Backend> {
    pub c1: Conv2d<B>,
    pub s2: PoolingLayer<B>,
    pub c3: Conv2d<B>,
    pub s4: PoolingLayer<B>,
    pub c5: Conv2d<B>,
    pub f6: Linear<B>,
    pub output: Linear<B>,
    pub activation: Activation,
}

impl<B: Backend> LeNet5<B> {
    /// # Shapes
    ///   - Input [batch, 1, 28, 28]
    ///   - Output [batch, 10] (class probabilities)
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch, _, _, _] = x.dims();

        let x = self.activation.forward(self.c1.forward(x));
        debug_assert_eq!([batch, 6, 28, 28], x.dims());

        let x = self.activation.forward(self.s2.forward(x));
        debug_assert_eq!([batch, 6, 14, 14], x.dims());

        let x = self.activation.forward(self.c3.forward(x));
        debug_assert_eq!([batch, 16, 10, 10], x.dims());

        let x = self.activation.forward(self.s4.forward(x));
        debug_assert_eq!([batch, 16, 5, 5], x.dims());

        let x = self.activation.forward(self.c5.forward(x));
        debug_assert_eq!([batch, 120, 1, 1], x.dims());

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.activation.forward(self.f6.forward(x));
        debug_assert_eq!([batch, 84], x.dims());

        softmax(self.output.forward(x), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn assert_classifies(model: &LeNet5<TestBackend>) {
        let device = Default::default();
        let input = Tensor::<TestBackend, 4>::zeros([2, 1, 28, 28], &device);
        let output = model.forward(input);
        assert_eq!([2, 10], output.dims());

        let sums = output.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn forward_with_average_pooling() {
        let device = Default::default();
        let model = LeNet5Config::new().init(&device);
        assert!(matches!(model.s2, PoolingLayer::Average(_)));
        assert_classifies(&model);
    }

    #[test]
    fn forward_with_trainable_subsampling() {
        let device = Default::default();
        let model = LeNet5Config::new()
            .with_subsampling(SubsamplingKind::Trainable)
            .init(&device);
        assert!(matches!(model.s2, PoolingLayer::Trainable(_)));
        assert_classifies(&model);
    }

    #[test]
    fn forward_with_per_cell_subsampling() {
        let device = Default::default();
        let model = LeNet5Config::new()
            .with_subsampling(SubsamplingKind::TrainablePerCell)
            .init(&device);
        match &model.s4 {
            PoolingLayer::TrainablePerCell(layer) => assert_eq!([16, 5, 5], layer.weight.dims()),
            other => panic!("expected per-cell subsampling, got {other:?}"),
        }
        assert_classifies(&model);
    }

    #[test]
    fn layer_dimensions_follow_the_paper() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model: LeNet5<TestBackend> = LeNet5Config::new().init(&device);
        // [channels_out, channels_in, kernel_h, kernel_w]
        assert_eq!([6, 1, 5, 5], model.c1.weight.dims());
        assert_eq!([16, 6, 5, 5], model.c3.weight.dims());
        assert_eq!([120, 16, 5, 5], model.c5.weight.dims());
        assert_eq!([120, 84], model.f6.weight.dims());
        assert_eq!([84, 10], model.output.weight.dims());
    }
}
