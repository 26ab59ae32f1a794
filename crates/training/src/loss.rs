use burn::nn::loss::{MseLoss, Reduction};
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};

/// `-0.5 * sum(1 + log_var - mu^2 - exp(log_var))`, summed over batch and latent dims.
pub fn kl_divergence<B: Backend>(mu: Tensor<B, 2>, log_var: Tensor<B, 2>) -> Tensor<B, 1> {
    (log_var.clone().add_scalar(1.0) - mu.powf_scalar(2.0) - log_var.exp())
        .sum()
        .mul_scalar(-0.5)
}

/// Summed squared reconstruction error plus KL divergence.
///
/// Both terms are sums over the batch, so callers divide by sample count for per-sample loss.
pub fn cvae_loss<B: Backend>(
    reconstruction: Tensor<B, 3>,
    target: Tensor<B, 3>,
    mu: Tensor<B, 2>,
    log_var: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let mse = MseLoss::new().forward(reconstruction, target, Reduction::Sum);
    mse + kl_divergence(mu, log_var)
}

pub fn scalar_value<B: Backend>(t: Tensor<B, 1>) -> f64 {
    t.into_scalar().elem::<f64>()
}
