//! The Inception module from "Going Deeper with Convolutions"
//! (Szegedy et al., 2014).

use burn::nn::PaddingConfig2d;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;

#[derive(Config, Debug)]
pub struct InceptionConfig {
    /// Channels of the incoming feature map.
    pub in_channels: usize,

    /// 1x1 convolution branch width.
    pub filters_1x1: usize,

    /// 1x1 reduction in front of the 3x3 branch.
    pub reduce_3x3: usize,

    /// 3x3 convolution branch width.
    pub filters_3x3: usize,

    /// 1x1 reduction in front of the 5x5 branch.
    pub reduce_5x5: usize,

    /// 5x5 convolution branch width.
    pub filters_5x5: usize,

    /// 1x1 projection behind the max-pool branch.
    pub pool_proj: usize,
}

impl InceptionConfig {
    /// Channels of the concatenated output.
    pub fn out_channels(&self) -> usize {
        self.filters_1x1 + self.filters_3x3 + self.filters_5x5 + self.pool_proj
    }

    /// Returns the initialized module.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Inception<B> {
        let conv = |channels: [usize; 2], kernel: usize| {
            Conv2dConfig::new(channels, [kernel, kernel])
                .with_padding(PaddingConfig2d::Same)
                .init(device)
        };

        Inception {
            conv_1x1: conv([self.in_channels, self.filters_1x1], 1),
            reduce_3x3: conv([self.in_channels, self.reduce_3x3], 1),
            conv_3x3: conv([self.reduce_3x3, self.filters_3x3], 3),
            reduce_5x5: conv([self.in_channels, self.reduce_5x5], 1),
            conv_5x5: conv([self.reduce_5x5, self.filters_5x5], 5),
            pool: MaxPool2dConfig::new([3, 3])
                .with_strides([1, 1])
                .with_padding(PaddingConfig2d::Same)
                .init(),
            pool_proj: conv([self.in_channels, self.pool_proj], 1),
        }
    }
}

/// Four parallel views of the same input, concatenated on the channel axis:
/// a 1x1 convolution, reduced 3x3 and 5x5 convolutions, and a max-pool
/// projection. All convolutions are same-padded with relu.
#[derive(Module, Debug)]
pub struct Inception<B: Backend> {
    pub conv_1x1: Conv2d<B>,
    pub reduce_3x3: Conv2d<B>,
    pub conv_3x3: Conv2d<B>,
    pub reduce_5x5: Conv2d<B>,
    pub conv_5x5: Conv2d<B>,
    pub pool: MaxPool2d,
    pub pool_proj: Conv2d<B>,
}

impl<B: Backend> Inception<B> {
    /// # Shapes
    ///   - Input [batch, in_channels, height, width]
    ///   - Output [batch, out_channels, height, width]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, _, height, width] = x.dims();

        let branch_1x1 = relu(self.conv_1x1.forward(x.clone()));
        let branch_3x3 = relu(self.conv_3x3.forward(relu(self.reduce_3x3.forward(x.clone()))));
        let branch_5x5 = relu(self.conv_5x5.forward(relu(self.reduce_5x5.forward(x.clone()))));
        let branch_pool = relu(self.pool_proj.forward(self.pool.forward(x)));

        let out = Tensor::cat(vec![branch_1x1, branch_3x3, branch_5x5, branch_pool], 1);
        debug_assert_eq!([batch, height, width], [out.dims()[0], out.dims()[2], out.dims()[3]]);
        out
    }
}
