//! AlexNet as published in "ImageNet Classification with Deep Convolutional
//! Neural Networks" (Krizhevsky et al., 2012), for 227x227 RGB images.

use crate::utils::lrn::{LocalResponseNorm, LocalResponseNormConfig};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation::{relu, softmax};

#[derive(Config, Debug)]
pub struct AlexNetConfig {
    /// Number of output classes.
    #[config(default = 1000)]
    pub num_classes: usize,

    #[config(default = 0.5)]
    pub dropout: f64,

    #[config(default = "LocalResponseNormConfig::new()")]
    pub lrn: LocalResponseNormConfig,
}

impl AlexNetConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> AlexNet<B> {
        let max_pool = || MaxPool2dConfig::new([3, 3]).with_strides([2, 2]).init();

        AlexNet {
            conv1: Conv2dConfig::new([3, 96], [11, 11])
                .with_stride([4, 4])
                .init(device),
            lrn1: self.lrn.init(),
            pool1: max_pool(),
            conv2: Conv2dConfig::new([96, 256], [5, 5])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            lrn2: self.lrn.init(),
            pool2: max_pool(),
            conv3: Conv2dConfig::new([256, 384], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            conv4: Conv2dConfig::new([384, 384], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            conv5: Conv2dConfig::new([384, 256], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            pool3: max_pool(),
            fc1: LinearConfig::new(256 * 6 * 6, 4096).init(device),
            dropout1: DropoutConfig::new(self.dropout).init(),
            fc2: LinearConfig::new(4096, 4096).init(device),
            dropout2: DropoutConfig::new(self.dropout).init(),
            output: LinearConfig::new(4096, self.num_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct AlexNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub lrn1: LocalResponseNorm,
    pub pool1: MaxPool2d,
    pub conv2: Conv2d<B>,
    pub lrn2: LocalResponseNorm,
    pub pool2: MaxPool2d,
    pub conv3: Conv2d<B>,
    pub conv4: Conv2d<B>,
    pub conv5: Conv2d<B>,
    pub pool3: MaxPool2d,
    pub fc1: Linear<B>,
    pub dropout1: Dropout,
    pub fc2: Linear<B>,
    pub dropout2: Dropout,
    pub output: Linear<B>,
}

impl<B: Backend> AlexNet<B> {
    /// # Shapes
    ///   - Input [batch, 3, 227, 227]
    ///   - Output [batch, num_classes] (class probabilities)
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch, _, _, _] = x.dims();

        let x = relu(self.conv1.forward(x));
        debug_assert_eq!([batch, 96, 55, 55], x.dims());
        let x = self.pool1.forward(self.lrn1.forward(x));
        debug_assert_eq!([batch, 96, 27, 27], x.dims());

        let x = relu(self.conv2.forward(x));
        let x = self.pool2.forward(self.lrn2.forward(x));
        debug_assert_eq!([batch, 256, 13, 13], x.dims());

        let x = relu(self.conv3.forward(x));
        let x = relu(self.conv4.forward(x));
        let x = relu(self.conv5.forward(x));
        let x = self.pool3.forward(x);
        debug_assert_eq!([batch, 256, 6, 6], x.dims());

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.dropout1.forward(relu(self.fc1.forward(x)));
        let x = self.dropout2.forward(relu(self.fc2.forward(x)));

        softmax(self.output.forward(x), 1)
    }
}
