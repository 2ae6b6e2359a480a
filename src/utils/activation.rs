use burn::prelude::*;

/// Pointwise activation selector, for layers whose activation is part of the
/// model configuration rather than fixed by the architecture.
#[derive(Module, Default, Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Activation {
    /// Passes the input through unchanged.
    #[default]
    Identity,
    Tanh,
    Relu,
    Sigmoid,
}

impl Activation {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        use burn::tensor::activation;

        match self {
            Activation::Identity => input,
            Activation::Tanh => activation::tanh(input),
            Activation::Relu => activation::relu(input),
            Activation::Sigmoid => activation::sigmoid(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn identity_returns_input() {
        let device = Default::default();
        let input = Tensor::<TestBackend, 2>::from_floats([[-2.0, 0.5], [3.0, -0.25]], &device);
        let output = Activation::Identity.forward(input.clone());
        assert_eq!(
            input.into_data().to_vec::<f32>().unwrap(),
            output.into_data().to_vec::<f32>().unwrap()
        );
    }

    #[test]
    fn relu_clamps_negatives() {
        let device = Default::default();
        let input = Tensor::<TestBackend, 1>::from_floats([-1.0, 0.0, 2.0], &device);
        let output = Activation::Relu.forward(input);
        assert_eq!(vec![0.0, 0.0, 2.0], output.into_data().to_vec::<f32>().unwrap());
    }

    #[test]
    fn tanh_is_bounded() {
        let device = Default::default();
        let input = Tensor::<TestBackend, 1>::from_floats([-10.0, 0.0, 10.0], &device);
        let output = Activation::Tanh.forward(input);
        let values = output.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (-1.0..=1.0).contains(v)));
        assert!(values[0] < -0.99 && values[1] == 0.0 && values[2] > 0.99);
    }
}
