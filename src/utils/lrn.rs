use burn::module::{Content, DisplaySettings, ModuleDisplay};
use burn::prelude::*;

/// Configuration to create a [LocalResponseNorm](LocalResponseNorm) layer.
#[derive(Config, Debug)]
pub struct LocalResponseNormConfig {
    /// Additive constant `k` in the normalization denominator.
    #[config(default = 2.0)]
    pub bias: f64,

    /// Half-width `n` of the channel window the sum of squares runs over.
    #[config(default = 5)]
    pub depth_radius: usize,

    #[config(default = 1.0e-4)]
    pub alpha: f64,

    #[config(default = 0.75)]
    pub beta: f64,
}

impl LocalResponseNormConfig {
    /// Initialize a new [LocalResponseNorm](LocalResponseNorm) module.
    pub fn init(&self) -> LocalResponseNorm {
        LocalResponseNorm {
            bias: self.bias,
            depth_radius: self.depth_radius,
            alpha: self.alpha,
            beta: self.beta,
        }
    }
}

/// Local response normalization over adjacent channels, as described in
/// Section 3.3 of the AlexNet paper.
///
/// Each activation is divided by `(k + alpha * S)^beta`, where `S` is the sum
/// of squared activations over the channel window `[c - n, c + n]`, clamped
/// to the valid channel range. The layer has no trainable parameters.
#[derive(Module, Clone, Debug)]
#[module(custom_display)]
pub struct LocalResponseNorm {
    pub bias: f64,
    pub depth_radius: usize,
    pub alpha: f64,
    pub beta: f64,
}

impl LocalResponseNorm {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///   - Input [batch, channels, height, width]
    ///   - Output [batch, channels, height, width]
    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = input.dims();

        let squared = input.clone() * input.clone();

        // One windowed sum per channel; the window is clamped at both ends,
        // so edge channels normalize over fewer neighbors.
        let mut windows = Vec::with_capacity(channels);
        for channel in 0..channels {
            let low = channel.saturating_sub(self.depth_radius);
            let high = usize::min(channel + self.depth_radius, channels - 1);
            let sum = squared.clone().narrow(1, low, high - low + 1).sum_dim(1);
            debug_assert_eq!([batch, 1, height, width], sum.dims());
            windows.push(sum);
        }

        let sqr_sum = Tensor::cat(windows, 1);
        debug_assert_eq!([batch, channels, height, width], sqr_sum.dims());

        input / (sqr_sum * self.alpha + self.bias).powf_scalar(self.beta)
    }
}

impl ModuleDisplay for LocalResponseNorm {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content
            .add("bias", &self.bias)
            .add("depth_radius", &self.depth_radius)
            .add("alpha", &self.alpha)
            .add("beta", &self.beta)
            .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn preserves_shape() {
        let device = Default::default();
        let layer = LocalResponseNormConfig::new().init();
        let input = Tensor::<TestBackend, 4>::ones([2, 5, 4, 3], &device);
        let output = layer.forward(input);
        assert_eq!([2, 5, 4, 3], output.dims());
    }

    #[test]
    fn window_clamps_at_channel_edges() {
        let device = Default::default();
        // With k = 0, alpha = 1, beta = 1 on all-ones input, each output is
        // the reciprocal of its window width.
        let layer = LocalResponseNormConfig::new()
            .with_bias(0.0)
            .with_depth_radius(1)
            .with_alpha(1.0)
            .with_beta(1.0)
            .init();
        let input = Tensor::<TestBackend, 4>::ones([1, 3, 1, 1], &device);
        let output = layer.forward(input);
        let values = output.into_data().to_vec::<f32>().unwrap();
        let expected = [1.0 / 2.0, 1.0 / 3.0, 1.0 / 2.0];
        for (value, expected) in values.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn near_identity_for_small_activations() {
        let device = Default::default();
        // With the AlexNet constants, tiny activations are barely scaled:
        // the denominator is (2 + 1e-4 * S)^0.75 with S close to zero.
        let layer = LocalResponseNormConfig::new().init();
        let input = Tensor::<TestBackend, 4>::from_floats([[[[1.0e-3]], [[-1.0e-3]]]], &device);
        let output = layer.forward(input.clone());
        let expected = 1.0e-3 / 2.0f32.powf(0.75);
        let values = output.into_data().to_vec::<f32>().unwrap();
        assert!((values[0] - expected).abs() < 1e-7);
        assert!((values[1] + expected).abs() < 1e-7);
    }
}
