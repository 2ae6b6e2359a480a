//! GoogLeNet as published in "Going Deeper with Convolutions"
//! (Szegedy et al., 2014), for 224x224 RGB images.
//!
//! The network is deeply supervised: besides the main classifier it carries
//! two auxiliary softmax heads, fed from the Inception 4a and 4d outputs.

use crate::googlenet::{Inception, InceptionConfig};
use crate::utils::lrn::{LocalResponseNorm, LocalResponseNormConfig};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AvgPool2d, AvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation::{relu, softmax};

/// Configuration to create an [AuxClassifier](AuxClassifier) head.
#[derive(Config, Debug)]
pub struct AuxClassifierConfig {
    /// Channels of the incoming feature map.
    pub in_channels: usize,

    /// Spatial size of the incoming feature map.
    #[config(default = 14)]
    pub input_size: usize,

    #[config(default = 1000)]
    pub num_classes: usize,
}

impl AuxClassifierConfig {
    /// Returns the initialized head.
    pub fn init<B: Backend>(&self, device: &B::Device) -> AuxClassifier<B> {
        // 5x5 window, stride 3, no padding.
        let pooled = (self.input_size - 5) / 3 + 1;

        AuxClassifier {
            pool: AvgPool2dConfig::new([5, 5]).with_strides([3, 3]).init(),
            conv: Conv2dConfig::new([self.in_channels, 128], [1, 1])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            fc1: LinearConfig::new(128 * pooled * pooled, 1000).init(device),
            dropout: DropoutConfig::new(0.7).init(),
            fc2: LinearConfig::new(1000, self.num_classes).init(device),
        }
    }
}

/// Auxiliary softmax head, attached to an intermediate Inception output for
/// deep supervision during training.
#[derive(Module, Debug)]
pub struct AuxClassifier<B: Backend> {
    pub pool: AvgPool2d,
    pub conv: Conv2d<B>,
    pub fc1: Linear<B>,
    pub dropout: Dropout,
    pub fc2: Linear<B>,
}

impl<B: Backend> AuxClassifier<B> {
    /// # Shapes
    ///   - Input [batch, in_channels, height, width]
    ///   - Output [batch, num_classes] (class probabilities)
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(x);
        let x = relu(self.conv.forward(x));
        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.dropout.forward(relu(self.fc1.forward(x)));
        softmax(self.fc2.forward(x), 1)
    }
}

#[derive(Config, Debug)]
pub struct GoogLeNetConfig {
    /// Number of output classes.
    #[config(default = 1000)]
    pub num_classes: usize,

    #[config(default = 0.4)]
    pub dropout: f64,

    #[config(default = "LocalResponseNormConfig::new()")]
    pub lrn: LocalResponseNormConfig,
}

impl GoogLeNetConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> GoogLeNet<B> {
        let max_pool = || {
            MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Same)
                .init()
        };

        GoogLeNet {
            conv1: Conv2dConfig::new([3, 64], [7, 7])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            pool1: max_pool(),
            lrn1: self.lrn.init(),
            conv2: Conv2dConfig::new([64, 192], [1, 1]).init(device),
            conv3: Conv2dConfig::new([192, 192], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            lrn2: self.lrn.init(),
            pool2: max_pool(),
            inception_3a: InceptionConfig::new(192, 64, 96, 128, 16, 32, 32).init(device),
            inception_3b: InceptionConfig::new(256, 128, 128, 192, 32, 96, 64).init(device),
            pool3: max_pool(),
            inception_4a: InceptionConfig::new(480, 192, 96, 208, 16, 48, 64).init(device),
            aux1: AuxClassifierConfig::new(512)
                .with_num_classes(self.num_classes)
                .init(device),
            inception_4b: InceptionConfig::new(512, 160, 112, 224, 24, 64, 64).init(device),
            inception_4c: InceptionConfig::new(512, 128, 128, 256, 24, 64, 64).init(device),
            inception_4d: InceptionConfig::new(512, 112, 144, 288, 32, 96, 64).init(device),
            aux2: AuxClassifierConfig::new(528)
                .with_num_classes(self.num_classes)
                .init(device),
            inception_4e: InceptionConfig::new(528, 256, 160, 320, 32, 128, 128).init(device),
            pool4: max_pool(),
            inception_5a: InceptionConfig::new(832, 256, 160, 320, 32, 128, 128).init(device),
            inception_5b: InceptionConfig::new(832, 384, 192, 384, 48, 128, 128).init(device),
            avg_pool: AvgPool2dConfig::new([7, 7]).with_strides([1, 1]).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc: LinearConfig::new(1024, self.num_classes).init(device),
        }
    }
}

/// Output of the full forward pass: the main classifier plus the two
/// auxiliary heads.
#[derive(Debug, Clone)]
pub struct GoogLeNetOutput<B: Backend> {
    /// Head fed by the Inception 4a output.
    pub aux1: Tensor<B, 2>,
    /// Head fed by the Inception 4d output.
    pub aux2: Tensor<B, 2>,
    /// The main classifier.
    pub main: Tensor<B, 2>,
}

#[derive(Module, Debug)]
pub struct GoogLeNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub pool1: MaxPool2d,
    pub lrn1: LocalResponseNorm,
    pub conv2: Conv2d<B>,
    pub conv3: Conv2d<B>,
    pub lrn2: LocalResponseNorm,
    pub pool2: MaxPool2d,
    pub inception_3a: Inception<B>,
    pub inception_3b: Inception<B>,
    pub pool3: MaxPool2d,
    pub inception_4a: Inception<B>,
    pub aux1: AuxClassifier<B>,
    pub inception_4b: Inception<B>,
    pub inception_4c: Inception<B>,
    pub inception_4d: Inception<B>,
    pub aux2: AuxClassifier<B>,
    pub inception_4e: Inception<B>,
    pub pool4: MaxPool2d,
    pub inception_5a: Inception<B>,
    pub inception_5b: Inception<B>,
    pub avg_pool: AvgPool2d,
    pub dropout: Dropout,
    pub fc: Linear<B>,
}

impl<B: Backend> GoogLeNet<B> {
    /// Full forward pass, auxiliary heads included.
    ///
    /// # Shapes
    ///   - Input [batch, 3, 224, 224]
    ///   - Output [batch, num_classes] per head (class probabilities)
    pub fn forward(&self, x: Tensor<B, 4>) -> GoogLeNetOutput<B> {
        let [batch, _, _, _] = x.dims();

        let x = relu(self.conv1.forward(x));
        debug_assert_eq!([batch, 64, 112, 112], x.dims());
        let x = self.lrn1.forward(self.pool1.forward(x));
        debug_assert_eq!([batch, 64, 56, 56], x.dims());

        let x = relu(self.conv2.forward(x));
        let x = relu(self.conv3.forward(x));
        let x = self.pool2.forward(self.lrn2.forward(x));
        debug_assert_eq!([batch, 192, 28, 28], x.dims());

        let x = self.inception_3a.forward(x);
        let x = self.inception_3b.forward(x);
        let x = self.pool3.forward(x);
        let x = self.inception_4a.forward(x);
        debug_assert_eq!([batch, 512, 14, 14], x.dims());

        let aux1 = self.aux1.forward(x.clone());

        let x = self.inception_4b.forward(x);
        let x = self.inception_4c.forward(x);
        let x = self.inception_4d.forward(x);
        debug_assert_eq!([batch, 528, 14, 14], x.dims());

        let aux2 = self.aux2.forward(x.clone());

        let x = self.inception_4e.forward(x);
        let x = self.pool4.forward(x);
        let x = self.inception_5a.forward(x);
        let x = self.inception_5b.forward(x);
        debug_assert_eq!([batch, 1024, 7, 7], x.dims());

        let x = self.avg_pool.forward(x);
        debug_assert_eq!([batch, 1024, 1, 1], x.dims());
        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.dropout.forward(x);
        let main = softmax(relu(self.fc.forward(x)), 1);

        GoogLeNetOutput { aux1, aux2, main }
    }

    /// Main classifier only; shorthand for `self.forward(x).main`.
    pub fn forward_main(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(x).main
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn aux_head_produces_class_probabilities() {
        let device = Default::default();
        let head: AuxClassifier<TestBackend> = AuxClassifierConfig::new(512).init(&device);
        let input = Tensor::<TestBackend, 4>::zeros([2, 512, 14, 14], &device);
        let output = head.forward(input);
        assert_eq!([2, 1000], output.dims());

        let sums = output.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn channel_progression_follows_the_paper() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model: GoogLeNet<TestBackend> = GoogLeNetConfig::new().init(&device);
        assert_eq!([64, 3, 7, 7], model.conv1.weight.dims());
        // Inception output channels chain: 256, 480, 512, 512, 512, 528, 832, 832, 1024.
        assert_eq!([128, 256, 1, 1], model.inception_3b.conv_1x1.weight.dims());
        assert_eq!([192, 480, 1, 1], model.inception_4a.conv_1x1.weight.dims());
        assert_eq!([256, 528, 1, 1], model.inception_4e.conv_1x1.weight.dims());
        assert_eq!([384, 832, 1, 1], model.inception_5b.conv_1x1.weight.dims());
        assert_eq!([1024, 1000], model.fc.weight.dims());
        assert_eq!([2048, 1000], model.aux1.fc1.weight.dims());
    }

    #[test]
    #[ignore = "full-resolution forward pass; slow without optimizations"]
    fn forward_produces_three_heads() {
        let device = Default::default();
        let model: GoogLeNet<TestBackend> = GoogLeNetConfig::new().init(&device);
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 224, 224], &device);
        let output = model.forward(input);
        assert_eq!([1, 1000], output.main.dims());
        assert_eq!([1, 1000], output.aux1.dims());
        assert_eq!([1, 1000], output.aux2.dims());
    }
}
