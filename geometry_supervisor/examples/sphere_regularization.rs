//! Example: fitting the scale of a sphere SDF with geometry regularization.
//!
//! The field `f(p) = s * |p| - r` is only a true distance field for `s = 1`.
//! Starting from a wrong scale, the Eikonal and curvature terms drive `s`
//! back towards 1 with plain gradient descent.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run -p geometry_supervisor --example sphere_regularization
//! ```

use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;
use burn::tensor::ElementConversion;

use geometry_supervisor::prelude::*;

type MyBackend = Autodiff<NdArray>;

const RADIUS: f32 = 0.5;
const NUM_POINTS: usize = 64;
const STEPS: usize = 200;
const LEARNING_RATE: f32 = 0.05;

/// Points on a spiral around the origin, `[1, NUM_POINTS, 3]`.
fn sample_points(device: &<MyBackend as Backend>::Device) -> Tensor<MyBackend, 3> {
    let mut coords = Vec::with_capacity(NUM_POINTS * 3);
    for i in 0..NUM_POINTS {
        let t = i as f32 / NUM_POINTS as f32;
        let theta = t * std::f32::consts::PI * 8.0;
        let radius = 0.2 + 0.6 * t;
        coords.extend_from_slice(&[radius * theta.cos(), radius * theta.sin(), t - 0.5]);
    }
    Tensor::from_data(
        burn::tensor::TensorData::new(coords, [1, NUM_POINTS, 3]),
        device,
    )
}

/// Scaled sphere SDF at `points`, `[1, n, 1]`.
fn sphere_sdf(points: Tensor<MyBackend, 3>, scale: Tensor<MyBackend, 3>) -> Tensor<MyBackend, 3> {
    let norm = (points.clone() * points).sum_dim(2).sqrt();
    (norm * scale).sub_scalar(RADIUS)
}

fn render(
    points: &Tensor<MyBackend, 3>,
    scale: &Tensor<MyBackend, 1>,
    delta: f32,
) -> RenderOutput<MyBackend> {
    let device = points.device();
    let scale = scale.clone().reshape([1, 1, 1]).repeat_dim(1, NUM_POINTS);

    // Analytic gradient: s * p / |p|
    let norm = (points.clone() * points.clone()).sum_dim(2).sqrt().repeat_dim(2, 3);
    let gradients = points.clone() / norm * scale.clone().repeat_dim(2, 3);

    let sdf = sphere_sdf(points.clone(), scale.clone());
    let mut samples = Vec::with_capacity(6);
    for axis in 0..3 {
        for sign in [1.0f32, -1.0] {
            let mut offset = [0.0f32; 3];
            offset[axis] = sign * delta;
            let offset = Tensor::<MyBackend, 3>::from_data([[offset]], &device)
                .repeat_dim(1, NUM_POINTS);
            samples.push(sphere_sdf(points.clone() + offset, scale.clone()));
        }
    }
    let sampled_sdf = Tensor::cat(samples, 2);

    RenderOutput::new()
        .with_gradients(gradients)
        .with_sdf_samples(sdf, sampled_sdf)
}

fn main() -> Result<()> {
    env_logger::init();

    let device = Default::default();
    let config = GeometrySupervisorConfig::default()
        .with_eikonal_loss_weight(1.0)
        .with_curvature_loss_weight(1e-3);
    config.validate()?;
    let supervisor = GeometrySupervisor::new(&config)?;
    let network = FiniteDiffState::new(0.01, 1.0);

    let points = sample_points(&device);
    let mut scale = Tensor::<MyBackend, 1>::from_floats([2.0], &device).require_grad();
    let mut tracker = StatsTracker::new(20);

    for step in 0..STEPS {
        let output = render(&points, &scale, network.finite_diff_delta());
        let result = supervisor.supervise(&network, &output, &Batch::empty(), &device)?;
        tracker.add(&result.scalar_stats.summary());

        let grads = result.loss.backward();
        let Some(grad) = scale.grad(&grads) else {
            log::warn!("scale received no gradient at step {}", step);
            break;
        };
        scale = Tensor::from_inner(scale.inner() - grad.mul_scalar(LEARNING_RATE)).require_grad();

        if (step + 1) % 50 == 0 {
            log::info!("step {}: {}", step + 1, tracker.average());
        }
    }

    let final_scale = scale.into_scalar().elem::<f32>();
    println!("final scale: {:.4} (target 1.0)", final_scale);

    Ok(())
}
