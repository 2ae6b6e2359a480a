//! The CIFAR-10 adaptation of AlexNet, following the layer stack of the
//! TensorFlow CIFAR-10 tutorial model.

use crate::utils::lrn::{LocalResponseNorm, LocalResponseNormConfig};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation::{relu, softmax};

#[derive(Config, Debug)]
pub struct AlexNetCifarConfig {
    /// Number of output classes.
    #[config(default = 10)]
    pub num_classes: usize,

    #[config(default = "LocalResponseNormConfig::new()")]
    pub lrn: LocalResponseNormConfig,
}

impl AlexNetCifarConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> AlexNetCifar<B> {
        let conv_same = |channels: [usize; 2], kernel: usize| {
            Conv2dConfig::new(channels, [kernel, kernel])
                .with_padding(PaddingConfig2d::Same)
                .init(device)
        };
        let max_pool = || MaxPool2dConfig::new([3, 3]).with_strides([2, 2]).init();

        AlexNetCifar {
            conv1: conv_same([3, 64], 5),
            pool1: max_pool(),
            lrn1: self.lrn.init(),
            conv2: conv_same([64, 64], 5),
            lrn2: self.lrn.init(),
            pool2: max_pool(),
            local3: conv_same([64, 64], 3),
            local4: conv_same([64, 32], 3),
            output: LinearConfig::new(32 * 7 * 7, self.num_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct AlexNetCifar<B: Backend> {
    pub conv1: Conv2d<B>,
    pub pool1: MaxPool2d,
    pub lrn1: LocalResponseNorm,
    pub conv2: Conv2d<B>,
    pub lrn2: LocalResponseNorm,
    pub pool2: MaxPool2d,
    pub local3: Conv2d<B>,
    pub local4: Conv2d<B>,
    pub output: Linear<B>,
}

impl<B: Backend> AlexNetCifar<B> {
    /// # Shapes
    ///   - Input [batch, 3, 32, 32]
    ///   - Output [batch, num_classes] (class probabilities)
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch, _, _, _] = x.dims();

        let x = relu(self.conv1.forward(x));
        debug_assert_eq!([batch, 64, 32, 32], x.dims());
        let x = self.lrn1.forward(self.pool1.forward(x));
        debug_assert_eq!([batch, 64, 15, 15], x.dims());

        let x = relu(self.conv2.forward(x));
        let x = self.pool2.forward(self.lrn2.forward(x));
        debug_assert_eq!([batch, 64, 7, 7], x.dims());

        let x = relu(self.local3.forward(x));
        let x = relu(self.local4.forward(x));
        debug_assert_eq!([batch, 32, 7, 7], x.dims());

        let x: Tensor<B, 2> = x.flatten(1, 3);
        softmax(self.output.forward(x), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn forward_produces_class_probabilities() {
        let device = Default::default();
        let model: AlexNetCifar<TestBackend> = AlexNetCifarConfig::new().init(&device);
        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        let output = model.forward(input);
        assert_eq!([2, 10], output.dims());

        let sums = output.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn classifier_width_matches_the_conv_stack() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model: AlexNetCifar<TestBackend> = AlexNetCifarConfig::new().init(&device);
        assert_eq!([32 * 7 * 7, 10], model.output.weight.dims());
        assert_eq!([32, 64, 3, 3], model.local4.weight.dims());
    }
}
