//! The VGG family from "Very Deep Convolutional Networks for Large-Scale
//! Image Recognition" (Simonyan & Zisserman, 2014), for 224x224 RGB images.
//!
//! All six columns of Table 1 are supported. Every convolution has stride 1
//! and same padding with relu; every pooling layer is 2x2 with stride 2.

use crate::utils::lrn::{LocalResponseNorm, LocalResponseNormConfig};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation::{relu, softmax};

/// The VGG column to build (Table 1 of the paper).
#[derive(Config, Debug, PartialEq)]
pub enum VggVariant {
    A,
    /// Variant A with local response normalization in the first block.
    ALrn,
    B,
    C,
    D,
    E,
}

impl VggVariant {
    /// `(filters, kernel)` pairs for each of the five conv blocks.
    pub fn blocks(&self) -> [Vec<(usize, usize)>; 5] {
        match self {
            VggVariant::A | VggVariant::ALrn => [
                vec![(64, 3)],
                vec![(128, 3)],
                vec![(256, 3), (256, 3)],
                vec![(512, 3), (512, 3)],
                vec![(512, 3), (512, 3)],
            ],
            VggVariant::B => [
                vec![(64, 3), (64, 3)],
                vec![(128, 3), (128, 3)],
                vec![(256, 3), (256, 3)],
                vec![(512, 3), (512, 3)],
                vec![(512, 3), (512, 3)],
            ],
            // C deepens the last three blocks with 1x1 convolutions, D with
            // 3x3 ones.
            VggVariant::C => [
                vec![(64, 3), (64, 3)],
                vec![(128, 3), (128, 3)],
                vec![(256, 3), (256, 3), (256, 1)],
                vec![(512, 3), (512, 3), (512, 1)],
                vec![(512, 3), (512, 3), (512, 1)],
            ],
            VggVariant::D => [
                vec![(64, 3), (64, 3)],
                vec![(128, 3), (128, 3)],
                vec![(256, 3), (256, 3), (256, 3)],
                vec![(512, 3), (512, 3), (512, 3)],
                vec![(512, 3), (512, 3), (512, 3)],
            ],
            VggVariant::E => [
                vec![(64, 3), (64, 3)],
                vec![(128, 3), (128, 3)],
                vec![(256, 3), (256, 3), (256, 3), (256, 3)],
                vec![(512, 3), (512, 3), (512, 3), (512, 3)],
                vec![(512, 3), (512, 3), (512, 3), (512, 3)],
            ],
        }
    }

    /// Number of convolutional weight layers.
    pub fn num_convs(&self) -> usize {
        self.blocks().iter().map(Vec::len).sum()
    }
}

#[derive(Config, Debug)]
pub struct VggConfig {
    pub variant: VggVariant,

    /// Number of output classes.
    #[config(default = 1000)]
    pub num_classes: usize,

    #[config(default = 0.5)]
    pub dropout: f64,

    #[config(default = "LocalResponseNormConfig::new()")]
    pub lrn: LocalResponseNormConfig,
}

impl VggConfig {
    pub fn vgg_a() -> Self {
        Self::new(VggVariant::A)
    }

    pub fn vgg_a_lrn() -> Self {
        Self::new(VggVariant::ALrn)
    }

    pub fn vgg_b() -> Self {
        Self::new(VggVariant::B)
    }

    pub fn vgg_c() -> Self {
        Self::new(VggVariant::C)
    }

    pub fn vgg_d() -> Self {
        Self::new(VggVariant::D)
    }

    pub fn vgg_e() -> Self {
        Self::new(VggVariant::E)
    }

    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Vgg<B> {
        let mut in_channels = 3;
        let mut blocks = Vec::with_capacity(5);
        for (index, specs) in self.variant.blocks().into_iter().enumerate() {
            let mut convs = Vec::with_capacity(specs.len());
            for (filters, kernel) in specs {
                convs.push(
                    Conv2dConfig::new([in_channels, filters], [kernel, kernel])
                        .with_padding(PaddingConfig2d::Same)
                        .init(device),
                );
                in_channels = filters;
            }
            blocks.push(VggBlock {
                convs,
                lrn: (index == 0 && self.variant == VggVariant::ALrn).then(|| self.lrn.init()),
                pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            });
        }

        Vgg {
            blocks,
            fc1: LinearConfig::new(512 * 7 * 7, 4096).init(device),
            dropout1: DropoutConfig::new(self.dropout).init(),
            fc2: LinearConfig::new(4096, 4096).init(device),
            dropout2: DropoutConfig::new(self.dropout).init(),
            fc3: LinearConfig::new(4096, self.num_classes).init(device),
        }
    }
}

/// One conv block: same-padded relu convolutions, optionally normalized,
/// then a halving max-pool.
#[derive(Module, Debug)]
pub struct VggBlock<B: Backend> {
    pub convs: Vec<Conv2d<B>>,
    pub lrn: Option<LocalResponseNorm>,
    pub pool: MaxPool2d,
}

impl<B: Backend> VggBlock<B> {
    /// # Shapes
    ///   - Input [batch, in_channels, height, width]
    ///   - Output [batch, out_channels, height / 2, width / 2]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = x;
        for conv in self.convs.iter() {
            x = relu(conv.forward(x));
        }
        if let Some(lrn) = &self.lrn {
            x = lrn.forward(x);
        }
        self.pool.forward(x)
    }
}

#[derive(Module, Debug)]
pub struct Vgg<B: Backend> {
    pub blocks: Vec<VggBlock<B>>,
    pub fc1: Linear<B>,
    pub dropout1: Dropout,
    pub fc2: Linear<B>,
    pub dropout2: Dropout,
    pub fc3: Linear<B>,
}

impl<B: Backend> Vgg<B> {
    /// # Shapes
    ///   - Input [batch, 3, 224, 224]
    ///   - Output [batch, num_classes] (class probabilities)
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch, _, _, _] = x.dims();

        let mut x = x;
        for block in self.blocks.iter() {
            x = block.forward(x);
        }
        debug_assert_eq!([batch, 512, 7, 7], x.dims());

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.dropout1.forward(relu(self.fc1.forward(x)));
        let x = self.dropout2.forward(relu(self.fc2.forward(x)));

        softmax(relu(self.fc3.forward(x)), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn conv_counts_per_variant() {
        // 11, 11, 13, 16, 16, and 19 weight layers including the three FCs.
        assert_eq!(8, VggVariant::A.num_convs());
        assert_eq!(8, VggVariant::ALrn.num_convs());
        assert_eq!(10, VggVariant::B.num_convs());
        assert_eq!(13, VggVariant::C.num_convs());
        assert_eq!(13, VggVariant::D.num_convs());
        assert_eq!(16, VggVariant::E.num_convs());
    }

    #[test]
    fn only_the_lrn_variant_normalizes() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let plain: Vgg<TestBackend> = VggConfig::vgg_a().init(&device);
        assert!(plain.blocks.iter().all(|block| block.lrn.is_none()));

        let normalized: Vgg<TestBackend> = VggConfig::vgg_a_lrn().init(&device);
        assert!(normalized.blocks[0].lrn.is_some());
        assert!(normalized.blocks[1..].iter().all(|block| block.lrn.is_none()));
    }

    #[test]
    fn variant_c_uses_one_by_one_convs() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model: Vgg<TestBackend> = VggConfig::vgg_c().init(&device);
        let last = model.blocks[2].convs.last().unwrap();
        assert_eq!([256, 256, 1, 1], last.weight.dims());

        let deep: Vgg<TestBackend> = VggConfig::vgg_d().init(&device);
        let last = deep.blocks[2].convs.last().unwrap();
        assert_eq!([256, 256, 3, 3], last.weight.dims());
    }

    #[test]
    fn channel_progression_reaches_the_classifier() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model: Vgg<TestBackend> = VggConfig::vgg_b().init(&device);
        assert_eq!(5, model.blocks.len());
        assert_eq!([64, 3, 3, 3], model.blocks[0].convs[0].weight.dims());
        assert_eq!([512, 512, 3, 3], model.blocks[4].convs[1].weight.dims());
        assert_eq!([512 * 7 * 7, 4096], model.fc1.weight.dims());
        assert_eq!([4096, 1000], model.fc3.weight.dims());
    }

    #[test]
    #[ignore = "full-resolution forward pass; slow without optimizations"]
    fn forward_produces_class_probabilities() {
        let device = Default::default();
        let model: Vgg<TestBackend> = VggConfig::vgg_a().init(&device);
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 224, 224], &device);
        let output = model.forward(input);
        assert_eq!([1, 1000], output.dims());

        let sums = output.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        assert!((sums[0] - 1.0).abs() < 1e-4);
    }
}
