// ============================================================
// Layer 5 — Gaze Model
// ============================================================
// The training loop only needs one capability from a model:
//
//   forward(frames [B, T, C, H, W]) → coordinates [B, T, 2]
//
// GazeRegressor is that seam. GazeNet is a compact
// implementation of it:
//
//   frames ──► per-frame conv backbone (2 strided 3x3 stages)
//          ──► global average pool        → [B, T, d_model]
//          ──► diagonal state-space scan  → [B, T, d_model]
//          ──► linear head                → [B, T, 2]
//
// The scan keeps one hidden state per channel:
//   h_t = sigmoid(a) ⊙ h_{t-1} + W_in x_t
//   y_t = x_t + W_out gelu(h_t)
//
// Reference: Burn Book §3 (Building Blocks)
//            Gu et al. (2022) S4D, diagonal state spaces

use burn::{
    module::Param,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::{
        activation::{gelu, relu, sigmoid},
        TensorData,
    },
};

/// Anything that maps frame sequences to per-frame (x, y) predictions.
pub trait GazeRegressor<B: Backend> {
    /// `[batch, seq, channels, height, width]` → `[batch, seq, 2]`
    fn forward(&self, frames: Tensor<B, 5>) -> Tensor<B, 3>;
}

/// Smooth-L1 (Huber, beta = 1) loss, mean over every element.
///
///   0.5 * d²      if |d| < 1
///   |d| - 0.5     otherwise
pub fn smooth_l1_loss<B: Backend, const D: usize>(
    predictions: Tensor<B, D>,
    targets:     Tensor<B, D>,
) -> Tensor<B, 1> {
    let abs_diff  = (predictions - targets).abs();
    let quadratic = abs_diff.clone().clamp_max(1.0);
    let linear    = abs_diff - quadratic.clone();
    (quadratic.powf_scalar(2.0).mul_scalar(0.5) + linear).mean()
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
#[derive(Config, Debug)]
pub struct GazeNetConfig {
    /// Input channels per frame
    #[config(default = 1)]
    pub in_channels: usize,
    /// Channels of the first conv stage; the second doubles it
    #[config(default = 16)]
    pub channels: usize,
    /// Hidden states of the temporal scan
    #[config(default = 16)]
    pub d_state: usize,
}

impl GazeNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GazeNet<B> {
        let d_model = self.channels * 2;

        let stem = Conv2dConfig::new([self.in_channels, self.channels], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let stage = Conv2dConfig::new([self.channels, d_model], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let temporal = StateSpaceConfig::new(d_model, self.d_state).init(device);
        let head     = LinearConfig::new(d_model, 2).init(device);

        GazeNet { stem, stage, pool, temporal, head }
    }
}

#[derive(Module, Debug)]
pub struct GazeNet<B: Backend> {
    pub stem:     Conv2d<B>,
    pub stage:    Conv2d<B>,
    pub pool:     AdaptiveAvgPool2d,
    pub temporal: StateSpace<B>,
    pub head:     Linear<B>,
}

impl<B: Backend> GazeRegressor<B> for GazeNet<B> {
    fn forward(&self, frames: Tensor<B, 5>) -> Tensor<B, 3> {
        let [batch, steps, channels, height, width] = frames.dims();

        // Fold time into the batch so every frame goes through the backbone
        let x = frames.reshape([batch * steps, channels, height, width]);
        let x = relu(self.stem.forward(x));
        let x = relu(self.stage.forward(x));
        let x = self.pool.forward(x); // [B*T, d_model, 1, 1]

        let d_model = x.dims()[1];
        let x = x.reshape([batch, steps, d_model]);

        let x = self.temporal.forward(x);
        self.head.forward(x)
    }
}

// ─── Temporal state space ─────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct StateSpaceConfig {
    pub d_model: usize,
    pub d_state: usize,
}

impl StateSpaceConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> StateSpace<B> {
        // Spread decays over sigmoid(0)..sigmoid(3) ≈ 0.5..0.95
        let steps = self.d_state.max(2) - 1;
        let decay: Vec<f32> = (0..self.d_state)
            .map(|i| 3.0 * i as f32 / steps as f32)
            .collect();
        let decay = Tensor::<B, 1>::from_data(TensorData::new(decay, [self.d_state]), device);

        StateSpace {
            in_proj:  LinearConfig::new(self.d_model, self.d_state).init(device),
            out_proj: LinearConfig::new(self.d_state, self.d_model).init(device),
            decay:    Param::from_tensor(decay),
        }
    }
}

#[derive(Module, Debug)]
pub struct StateSpace<B: Backend> {
    pub in_proj:  Linear<B>,
    pub out_proj: Linear<B>,
    /// Pre-sigmoid per-state decay
    pub decay:    Param<Tensor<B, 1>>,
}

impl<B: Backend> StateSpace<B> {
    /// `[batch, seq, d_model]` → `[batch, seq, d_model]`
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, steps, _] = x.dims();
        let u       = self.in_proj.forward(x.clone());
        let d_state = u.dims()[2];

        let decay = sigmoid(self.decay.val())
            .reshape([1, d_state])
            .expand([batch, d_state]);

        let mut h      = Tensor::<B, 2>::zeros([batch, d_state], &x.device());
        let mut states = Vec::with_capacity(steps);
        for t in 0..steps {
            let u_t = u.clone()
                .slice([0..batch, t..t + 1, 0..d_state])
                .reshape([batch, d_state]);
            h = h * decay.clone() + u_t;
            states.push(h.clone().reshape([batch, 1, d_state]));
        }

        let h_seq = Tensor::cat(states, 1);
        x + self.out_proj.forward(gelu(h_seq))
    }
}
