//! Burn models for trajectory generation.
//!
//! `Cvae` is a conditional variational autoencoder: it reconstructs an
//! animation trajectory `x` conditioned on a human-input trajectory `c`, and
//! can sample novel animations for a condition by decoding `z ~ N(0, 1)`.
//!
//! These are pure Burn modules; losses and the training loop live in the
//! `training` crate.

use burn::module::Module;
use burn::nn;
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};
use serde::{Deserialize, Serialize};

/// Layer sizes; `x_*` describe the animation target, `c_*` the human-input condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvaeConfig {
    pub x_len: usize,
    pub x_channels: usize,
    pub c_len: usize,
    pub c_channels: usize,
    pub h_dim1: usize,
    pub h_dim2: usize,
    pub z_dim: usize,
}

impl Default for CvaeConfig {
    fn default() -> Self {
        Self {
            x_len: 150,
            x_channels: 2,
            c_len: 150,
            c_channels: 2,
            h_dim1: 128,
            h_dim2: 64,
            z_dim: 10,
        }
    }
}

impl CvaeConfig {
    pub fn x_dim(&self) -> usize {
        self.x_len * self.x_channels
    }

    pub fn c_dim(&self) -> usize {
        self.c_len * self.c_channels
    }
}

#[derive(Debug, Clone)]
pub struct CvaeOutput<B: Backend> {
    /// Shape `[batch, x_len, x_channels]`, each value in (0, 1).
    pub reconstruction: Tensor<B, 3>,
    /// Shape `[batch, z_dim]`.
    pub mu: Tensor<B, 2>,
    /// Shape `[batch, z_dim]`.
    pub log_var: Tensor<B, 2>,
}

#[derive(Debug, Module)]
pub struct Cvae<B: Backend> {
    fc1: nn::Linear<B>,
    fc2: nn::Linear<B>,
    fc31: nn::Linear<B>,
    fc32: nn::Linear<B>,
    fc4: nn::Linear<B>,
    fc5: nn::Linear<B>,
    fc6: nn::Linear<B>,
    x_len: usize,
    x_channels: usize,
    z_dim: usize,
}

fn flatten<B: Backend>(t: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, len, channels] = t.dims();
    t.reshape([batch, len * channels])
}

impl<B: Backend> Cvae<B> {
    pub fn new(cfg: &CvaeConfig, device: &B::Device) -> Self {
        let (x_dim, c_dim) = (cfg.x_dim(), cfg.c_dim());
        Self {
            fc1: nn::LinearConfig::new(x_dim + c_dim, cfg.h_dim1).init(device),
            fc2: nn::LinearConfig::new(cfg.h_dim1, cfg.h_dim2).init(device),
            fc31: nn::LinearConfig::new(cfg.h_dim2, cfg.z_dim).init(device),
            fc32: nn::LinearConfig::new(cfg.h_dim2, cfg.z_dim).init(device),
            fc4: nn::LinearConfig::new(cfg.z_dim + c_dim, cfg.h_dim2).init(device),
            fc5: nn::LinearConfig::new(cfg.h_dim2, cfg.h_dim1).init(device),
            fc6: nn::LinearConfig::new(cfg.h_dim1, x_dim).init(device),
            x_len: cfg.x_len,
            x_channels: cfg.x_channels,
            z_dim: cfg.z_dim,
        }
    }

    pub fn z_dim(&self) -> usize {
        self.z_dim
    }

    /// Returns `(mu, log_var)` for the joint (target, condition) input.
    pub fn encode(&self, x: Tensor<B, 3>, c: Tensor<B, 3>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let input = Tensor::cat(vec![flatten(x), flatten(c)], 1);
        let h = relu(self.fc1.forward(input));
        let h = relu(self.fc2.forward(h));
        (self.fc31.forward(h.clone()), self.fc32.forward(h))
    }

    /// Reparameterization: `mu + eps * exp(0.5 * log_var)`.
    pub fn sample_latent(&self, mu: Tensor<B, 2>, log_var: Tensor<B, 2>) -> Tensor<B, 2> {
        let sigma = log_var.mul_scalar(0.5).exp();
        let eps =
            Tensor::<B, 2>::random(sigma.shape(), Distribution::Normal(0.0, 1.0), &sigma.device());
        eps * sigma + mu
    }

    pub fn decode(&self, z: Tensor<B, 2>, c: Tensor<B, 3>) -> Tensor<B, 3> {
        let batch = z.dims()[0];
        let input = Tensor::cat(vec![z, flatten(c)], 1);
        let h = relu(self.fc4.forward(input));
        let h = relu(self.fc5.forward(h));
        sigmoid(self.fc6.forward(h)).reshape([batch, self.x_len, self.x_channels])
    }

    pub fn forward(&self, x: Tensor<B, 3>, c: Tensor<B, 3>) -> CvaeOutput<B> {
        let (mu, log_var) = self.encode(x, c.clone());
        let z = self.sample_latent(mu.clone(), log_var.clone());
        CvaeOutput {
            reconstruction: self.decode(z, c),
            mu,
            log_var,
        }
    }

    /// Decode a prior sample for each condition in the batch.
    pub fn generate(&self, c: Tensor<B, 3>) -> Tensor<B, 3> {
        let batch = c.dims()[0];
        let z = Tensor::<B, 2>::random(
            [batch, self.z_dim],
            Distribution::Normal(0.0, 1.0),
            &c.device(),
        );
        self.decode(z, c)
    }
}

pub mod prelude {
    pub use super::{Cvae, CvaeConfig, CvaeOutput};
}

#[cfg(test)]
mod tests {
    use super::*;

    type B = burn_ndarray::NdArray<f32>;

    fn small_cfg() -> CvaeConfig {
        CvaeConfig {
            x_len: 6,
            x_channels: 2,
            c_len: 6,
            c_channels: 3,
            h_dim1: 16,
            h_dim2: 8,
            z_dim: 3,
        }
    }

    #[test]
    fn forward_shapes_follow_config() {
        let device = Default::default();
        let cfg = small_cfg();
        let model = Cvae::<B>::new(&cfg, &device);
        let x = Tensor::<B, 3>::ones([4, 6, 2], &device).mul_scalar(0.5);
        let c = Tensor::<B, 3>::zeros([4, 6, 3], &device);
        let out = model.forward(x, c);
        assert_eq!(out.reconstruction.dims(), [4, 6, 2]);
        assert_eq!(out.mu.dims(), [4, 3]);
        assert_eq!(out.log_var.dims(), [4, 3]);
    }

    #[test]
    fn reconstruction_is_bounded_by_sigmoid() {
        let device = Default::default();
        let model = Cvae::<B>::new(&small_cfg(), &device);
        let x = Tensor::<B, 3>::random([2, 6, 2], Distribution::Default, &device);
        let c = Tensor::<B, 3>::random([2, 6, 3], Distribution::Default, &device);
        let values = model
            .forward(x, c)
            .reconstruction
            .into_data()
            .to_vec::<f32>()
            .unwrap_or_default();
        assert_eq!(values.len(), 24);
        assert!(values.iter().all(|v| *v >= 0.0 && *v <= 1.0));
    }

    #[test]
    fn generate_decodes_one_sample_per_condition() {
        let device = Default::default();
        let model = Cvae::<B>::new(&small_cfg(), &device);
        let c = Tensor::<B, 3>::zeros([5, 6, 3], &device);
        assert_eq!(model.generate(c).dims(), [5, 6, 2]);
        assert_eq!(model.z_dim(), 3);
    }
}
