use ndarray::{Array, Array1, Array2, Axis, Dimension};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::ModelConfig;

// ---------------------------------------------------------------------------
// Adam optimiser
// ---------------------------------------------------------------------------

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
struct Moments<D: Dimension> {
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> Moments<D> {
    fn zeros_like(param: &Array<f64, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: i32,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
        }
    }

    /// Advance the shared time step; call once per batch.
    fn tick(&mut self) {
        self.t += 1;
    }

    fn apply<D: Dimension>(
        &self,
        param: &mut Array<f64, D>,
        grad: &Array<f64, D>,
        moments: &mut Moments<D>,
    ) {
        moments.m = &moments.m * self.beta1 + grad * (1.0 - self.beta1);
        moments.v = &moments.v * self.beta2 + &grad.mapv(|g| g * g) * (1.0 - self.beta2);

        let m_hat = &moments.m / (1.0 - self.beta1.powi(self.t));
        let v_hat = &moments.v / (1.0 - self.beta2.powi(self.t));

        let update = &m_hat / &(v_hat.mapv(f64::sqrt) + self.epsilon) * self.learning_rate;
        *param -= &update;
    }
}

// ---------------------------------------------------------------------------
// Dense regressor: inputs → hidden (ReLU) → 1 (linear)
// ---------------------------------------------------------------------------

struct Gradients {
    w1: Array2<f64>,
    b1: Array1<f64>,
    w2: Array2<f64>,
    b2: Array1<f64>,
}

/// Two-layer feed-forward network with a single linear output.
#[derive(Debug, Clone)]
pub struct DenseRegressor {
    w1: Array2<f64>,
    b1: Array1<f64>,
    w2: Array2<f64>,
    b2: Array1<f64>,
}

impl DenseRegressor {
    /// Glorot-uniform kernels, zero biases.
    pub fn new<R: Rng + ?Sized>(inputs: usize, hidden: usize, rng: &mut R) -> Self {
        DenseRegressor {
            w1: glorot_uniform(inputs, hidden, rng),
            b1: Array1::zeros(hidden),
            w2: glorot_uniform(hidden, 1, rng),
            b2: Array1::zeros(1),
        }
    }

    pub fn hidden_units(&self) -> usize {
        self.b1.len()
    }

    /// Predict one value per input row.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        let (_, _, out) = self.forward(x);
        out.column(0).to_owned()
    }

    /// Mean squared error over `x`, `y`.
    pub fn loss(&self, x: &Array2<f64>, y: &Array1<f64>) -> f64 {
        mse(&self.predict(x), y)
    }

    /// Train with shuffled mini-batches; returns the final full-data loss.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        config: &ModelConfig,
        rng: &mut R,
    ) -> f64 {
        debug_assert_eq!(x.nrows(), y.len());
        let n = x.nrows();
        if n == 0 {
            return 0.0;
        }

        let mut adam = Adam::new(config.learning_rate);
        let mut m_w1 = Moments::zeros_like(&self.w1);
        let mut m_b1 = Moments::zeros_like(&self.b1);
        let mut m_w2 = Moments::zeros_like(&self.w2);
        let mut m_b2 = Moments::zeros_like(&self.b2);

        let batch_size = config.batch_size.max(1);
        let mut order: Vec<usize> = (0..n).collect();

        for epoch in 0..config.epochs {
            order.shuffle(rng);
            for batch in order.chunks(batch_size) {
                let xb = x.select(Axis(0), batch);
                let yb = y.select(Axis(0), batch);
                let grads = self.gradients(&xb, &yb);

                adam.tick();
                adam.apply(&mut self.w1, &grads.w1, &mut m_w1);
                adam.apply(&mut self.b1, &grads.b1, &mut m_b1);
                adam.apply(&mut self.w2, &grads.w2, &mut m_w2);
                adam.apply(&mut self.b2, &grads.b2, &mut m_b2);
            }
            if log::log_enabled!(log::Level::Trace) {
                log::trace!("epoch {epoch}: loss {:.4}", self.loss(x, y));
            }
        }

        self.loss(x, y)
    }

    /// Returns (pre-activation, hidden activation, output).
    fn forward(&self, x: &Array2<f64>) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
        let z1 = x.dot(&self.w1) + &self.b1;
        let a1 = z1.mapv(|v| v.max(0.0));
        let out = a1.dot(&self.w2) + &self.b2;
        (z1, a1, out)
    }

    /// Back-propagate the MSE loss of one batch.
    fn gradients(&self, x: &Array2<f64>, y: &Array1<f64>) -> Gradients {
        let n = x.nrows() as f64;
        let (z1, a1, out) = self.forward(x);

        let target = y.view().insert_axis(Axis(1));
        let d_out = (&out - &target) * (2.0 / n);

        let w2 = a1.t().dot(&d_out);
        let b2 = d_out.sum_axis(Axis(0));

        let relu_mask = z1.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        let d_z1 = d_out.dot(&self.w2.t()) * &relu_mask;

        let w1 = x.t().dot(&d_z1);
        let b1 = d_z1.sum_axis(Axis(0));

        Gradients { w1, b1, w2, b2 }
    }
}

fn glorot_uniform<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Array2::from_shape_fn((fan_in, fan_out), |_| rng.random_range(-limit..limit))
}

pub fn mse(predictions: &Array1<f64>, targets: &Array1<f64>) -> f64 {
    let n = predictions.len();
    if n == 0 {
        return 0.0;
    }
    (predictions - targets).mapv(|d| d * d).sum() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(epochs: usize) -> ModelConfig {
        ModelConfig {
            epochs,
            seed: Some(1),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn predict_returns_one_value_per_row() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = DenseRegressor::new(2, 64, &mut rng);
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 2.0]];
        assert_eq!(net.predict(&x).len(), 3);
        assert_eq!(net.hidden_units(), 64);
    }

    #[test]
    fn training_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut net = DenseRegressor::new(2, 64, &mut rng);
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 2.0], [4.0, 3.0], [5.0, 4.0]];
        let y = array![10.0, 12.0, 14.0, 16.0, 18.0];

        let before = net.loss(&x, &y);
        let after = net.fit(&x, &y, &config(200), &mut rng);
        assert!(after < before / 10.0, "loss went from {before} to {after}");
    }

    #[test]
    fn same_seed_gives_same_model() {
        let x = array![[1.0, 0.0], [2.0, 1.0]];
        let y = array![10.0, 15.0];
        let run = || {
            let mut rng = StdRng::seed_from_u64(5);
            let mut net = DenseRegressor::new(2, 8, &mut rng);
            net.fit(&x, &y, &config(20), &mut rng);
            net.predict(&array![[3.0, 2.0]])[0]
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn adam_moves_against_the_gradient() {
        let mut adam = Adam::new(0.1);
        let mut param = array![1.0, -1.0];
        let grad = array![0.5, -0.5];
        let mut moments = Moments::zeros_like(&param);
        adam.tick();
        adam.apply(&mut param, &grad, &mut moments);
        assert!(param[0] < 1.0);
        assert!(param[1] > -1.0);
    }

    #[test]
    fn mse_of_identical_vectors_is_zero() {
        let a = array![1.0, 2.0, 3.0];
        assert_eq!(mse(&a, &a), 0.0);
        assert!((mse(&array![0.0, 0.0], &array![1.0, 3.0]) - 5.0).abs() < 1e-12);
    }
}
