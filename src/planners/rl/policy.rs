//! Value network using Burn framework
//!
//! A plain MLP: state vector in, one raw score per action index out. Dropout
//! is only active when the backend records gradients, so the same module is
//! used for batched training and single-state inference.

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::state::{ACTION_SPACE_SIZE, VECTOR_LEN};

/// Configuration for the value network
#[derive(Config, Debug)]
pub struct ValueNetworkConfig {
    /// Encoded state length
    pub input_size: usize,
    /// Number of action indices scored
    pub output_size: usize,
    /// First hidden layer size
    #[config(default = 512)]
    pub hidden_size1: usize,
    /// Second hidden layer size
    #[config(default = 256)]
    pub hidden_size2: usize,
    /// Dropout probability after each hidden activation (training only)
    #[config(default = 0.3)]
    pub dropout: f64,
}

impl ValueNetworkConfig {
    /// Sizes for the standard board
    pub fn standard() -> Self {
        Self::new(VECTOR_LEN, ACTION_SPACE_SIZE)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ValueNetwork<B> {
        tracing::info!(
            "Initialized value network: input={}, hidden=[{}, {}], output={}, dropout={}",
            self.input_size,
            self.hidden_size1,
            self.hidden_size2,
            self.output_size,
            self.dropout
        );

        ValueNetwork {
            fc1: LinearConfig::new(self.input_size, self.hidden_size1).init(device),
            fc2: LinearConfig::new(self.hidden_size1, self.hidden_size2).init(device),
            fc3: LinearConfig::new(self.hidden_size2, self.output_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            activation: Relu::new(),
        }
    }
}

/// Feed-forward scorer: two ReLU hidden layers and a linear output layer
#[derive(Module, Debug)]
pub struct ValueNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    /// Output layer (one score per action index, no activation)
    fc3: Linear<B>,
    dropout: Dropout,
    activation: Relu,
}

impl<B: Backend> ValueNetwork<B> {
    /// Forward pass returning raw scores
    /// obs: [batch_size, input_size] -> [batch_size, output_size]
    pub fn forward(&self, obs: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.fc1.forward(obs));
        let x = self.dropout.forward(x);
        let x = self.activation.forward(self.fc2.forward(x));
        let x = self.dropout.forward(x);

        self.fc3.forward(x)
    }

    /// Scores at the given action index only, one per sample
    /// actions: [batch_size, 1]
    pub fn action_values(&self, obs: Tensor<B, 2>, actions: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        self.forward(obs).gather(1, actions).squeeze(1)
    }

    /// Width of the output layer
    pub fn output_size(&self) -> usize {
        self.fc3.weight.val().dims()[1]
    }

    /// Width of the input layer
    pub fn input_size(&self) -> usize {
        self.fc1.weight.val().dims()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_value_network_config_default() {
        let config = ValueNetworkConfig::standard();
        assert_eq!(config.input_size, 687);
        assert_eq!(config.output_size, 201);
        assert_eq!(config.hidden_size1, 512);
        assert_eq!(config.hidden_size2, 256);
        assert!((config.dropout - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = ValueNetworkConfig::new(10, 4)
            .with_hidden_size1(16)
            .with_hidden_size2(8)
            .init::<B>(&device);

        let obs = Tensor::<B, 2>::zeros([3, 10], &device);
        assert_eq!(model.forward(obs).dims(), [3, 4]);
        assert_eq!(model.input_size(), 10);
        assert_eq!(model.output_size(), 4);
    }

    #[test]
    fn test_action_values_gathers_selected_unit() {
        let device = Default::default();
        let model = ValueNetworkConfig::new(6, 5)
            .with_hidden_size1(8)
            .with_hidden_size2(8)
            .init::<B>(&device);

        let obs = Tensor::<B, 2>::ones([2, 6], &device);
        let scores: Vec<f32> = model.forward(obs.clone()).into_data().to_vec().unwrap();
        let actions = Tensor::<B, 1, Int>::from_ints([3, 1], &device).reshape([2, 1]);
        let values: Vec<f32> = model.action_values(obs, actions).into_data().to_vec().unwrap();

        assert!((values[0] - scores[3]).abs() < 1e-5);
        assert!((values[1] - scores[5 + 1]).abs() < 1e-5);
    }

    #[test]
    fn test_inference_is_deterministic() {
        let device = Default::default();
        let model = ValueNetworkConfig::new(6, 5).init::<B>(&device);
        let obs = Tensor::<B, 2>::ones([1, 6], &device);

        let a: Vec<f32> = model.forward(obs.clone()).into_data().to_vec().unwrap();
        let b: Vec<f32> = model.forward(obs).into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }
}
