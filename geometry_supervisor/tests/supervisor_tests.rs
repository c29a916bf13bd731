//! End-to-end supervisor tests.

use burn::backend::{Autodiff, NdArray};
use burn::config::Config;
use burn::prelude::*;
use proptest::prelude::*;

use geometry_supervisor::loss::{eikonal, lossfun_zip_outer, PULSE_WIDTHS};
use geometry_supervisor::prelude::*;

type TestBackend = NdArray;
type AutodiffBackend = Autodiff<NdArray>;

fn scalar<B: Backend>(t: Tensor<B, 1>) -> f32 {
    t.into_data().to_vec().unwrap()[0]
}

/// Output with every geometry input filled in.
fn full_output<B: Backend>(device: &B::Device, scale: f32) -> RenderOutput<B> {
    let gradients = Tensor::<B, 3>::from_data(
        [[[scale, 0.0, 0.0], [0.0, 0.5, 0.0], [0.3, 0.4, 0.0]]],
        device,
    );
    let sdf = Tensor::<B, 3>::from_data([[[0.1f32], [0.2], [-0.1]]], device);
    let sampled = Tensor::<B, 3>::from_data(
        [[
            [0.12f32, 0.09, 0.1, 0.1, 0.11, 0.1],
            [0.2, 0.2, 0.25, 0.18, 0.2, 0.2],
            [-0.1, -0.1, -0.1, -0.1, -0.08, -0.11],
        ]],
        device,
    );
    let s_vals = Tensor::<B, 3>::from_data(
        [[[0.0f32, 0.25, 0.5, 0.75, 1.0], [0.0, 0.2, 0.4, 0.6, 1.0]]],
        device,
    );
    let weights = Tensor::<B, 3>::from_data([[[0.1f32, 0.6, 0.2, 0.1], [0.5, 0.2, 0.1, 0.1]]], device);
    let s_prop = Tensor::<B, 3>::from_data([[[0.0f32, 0.5, 1.0], [0.0, 0.5, 1.0]]], device);
    let w_prop = Tensor::<B, 3>::from_data([[[0.3f32, 0.2], [0.4, 0.4]]], device);

    RenderOutput::new()
        .with_gradients(gradients)
        .with_sdf_samples(sdf, sampled)
        .with_samples(s_vals, weights)
        .with_proposal(s_prop, w_prop)
}

fn geometry_config(eikonal: f32, curvature: f32, zip: f32) -> GeometrySupervisorConfig {
    GeometrySupervisorConfig::default()
        .with_eikonal_loss_weight(eikonal)
        .with_curvature_loss_weight(curvature)
        .with_zip_prop_loss_weight(zip)
}

#[test]
fn test_missing_inputs_skip_terms() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(1.0, 1.0, 1.0)).unwrap();

    // Proposal present but the final distribution missing
    let mut output = full_output::<TestBackend>(&device, 2.0);
    output.gradients = None;
    output.sampled_sdf = None;
    output.weights = None;

    let result = supervisor
        .supervise(&FiniteDiffState::default(), &output, &Batch::empty(), &device)
        .unwrap();

    assert_eq!(result.loss_value(), 0.0);
    assert!(!result.scalar_stats.contains("eikonal_loss"));
    assert!(!result.scalar_stats.contains("curvature_loss"));
    assert!(!result.scalar_stats.contains("zip_prop_loss"));
}

#[test]
fn test_empty_proposal_lists_skip_zip_term() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(0.0, 0.0, 1.0)).unwrap();

    let mut output = full_output::<TestBackend>(&device, 1.0);
    output.weights_prop.clear();

    assert!(supervisor.zip_prop_term(&output).unwrap().is_none());
}

#[test]
fn test_single_proposal_level_uses_first_pulse_width() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(0.0, 0.0, 2.0)).unwrap();
    let output = full_output::<TestBackend>(&device, 1.0);
    assert_eq!(output.num_proposal_levels(), 1);

    let result = supervisor
        .supervise(&FiniteDiffState::default(), &output, &Batch::empty(), &device)
        .unwrap();

    let flatten = |t: &Tensor<TestBackend, 3>| {
        let [b, r, n] = t.dims();
        t.clone().reshape([b * r, n])
    };
    let expected = scalar(
        lossfun_zip_outer(
            flatten(output.s_vals.as_ref().unwrap()),
            flatten(output.weights.as_ref().unwrap()),
            flatten(&output.s_vals_prop[0]),
            flatten(&output.weights_prop[0]),
            PULSE_WIDTHS[0],
        )
        .unwrap(),
    );

    let recorded = result.scalar_stats.value("zip_prop_loss").unwrap();
    assert!((recorded - expected).abs() < 1e-6);
    assert!((result.loss_value() - 2.0 * expected).abs() < 1e-5);
}

#[test]
fn test_three_levels_sum() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(0.0, 0.0, 1.0)).unwrap();

    let single = full_output::<TestBackend>(&device, 1.0);
    let one_level = supervisor.zip_prop_term(&single).unwrap().map(scalar).unwrap();

    let s_prop = single.s_vals_prop[0].clone();
    let w_prop = single.weights_prop[0].clone();
    let triple = single
        .clone()
        .with_proposal(s_prop.clone(), w_prop.clone())
        .with_proposal(s_prop, w_prop);
    let three_levels = supervisor.zip_prop_term(&triple).unwrap().map(scalar).unwrap();

    // Later levels use narrower pulses, so the sum differs from 3x level 0
    assert!(three_levels >= one_level);
    assert!(three_levels.is_finite());
}

#[test]
fn test_too_many_proposal_levels() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(0.0, 0.0, 1.0)).unwrap();

    let mut output = full_output::<TestBackend>(&device, 1.0);
    for _ in 0..3 {
        let s = output.s_vals_prop[0].clone();
        let w = output.weights_prop[0].clone();
        output = output.with_proposal(s, w);
    }

    let err = supervisor
        .supervise(&FiniteDiffState::default(), &output, &Batch::empty(), &device)
        .unwrap_err();
    assert_eq!(err, SupervisorError::TooManyProposalLevels { levels: 4, max: 3 });
}

#[test]
fn test_batch_and_image_stats_untouched() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(1.0, 1.0, 1.0)).unwrap();
    let output = full_output::<TestBackend>(&device, 2.0);
    let batch = Batch::<TestBackend>::empty();

    let mut scalar_stats = ScalarStats::new();
    let mut image_stats = ImageStats::new();
    let loss = supervisor
        .compute_loss(
            &FiniteDiffState::default(),
            &output,
            &batch,
            Tensor::zeros([1], &device),
            &mut scalar_stats,
            &mut image_stats,
        )
        .unwrap();

    assert!(scalar(loss) > 0.0);
    assert!(image_stats.is_empty());
    assert!(batch.rgb.is_none());
    assert_eq!(scalar_stats.len(), 3);
}

#[test]
fn test_zip_targets_are_detached() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(0.0, 0.0, 1.0)).unwrap();

    let s_vals = Tensor::<AutodiffBackend, 3>::from_data([[[0.0f32, 0.25, 0.5, 0.75, 1.0]]], &device)
        .require_grad();
    let weights =
        Tensor::<AutodiffBackend, 3>::from_data([[[0.1f32, 0.6, 0.2, 0.1]]], &device).require_grad();
    let s_prop =
        Tensor::<AutodiffBackend, 3>::from_data([[[0.0f32, 0.5, 1.0]]], &device).require_grad();
    let w_prop = Tensor::<AutodiffBackend, 3>::from_data([[[0.1f32, 0.1]]], &device).require_grad();

    let output = RenderOutput::new()
        .with_samples(s_vals.clone(), weights.clone())
        .with_proposal(s_prop, w_prop.clone());

    let result = supervisor
        .supervise(&FiniteDiffState::default(), &output, &Batch::empty(), &device)
        .unwrap();
    let grads = result.loss.backward();

    assert!(s_vals.grad(&grads).is_none());
    assert!(weights.grad(&grads).is_none());

    // Raising under-covering proposal weights lowers the loss
    let w_grad: Vec<f32> = w_prop
        .grad(&grads)
        .expect("proposal weights should receive gradient")
        .into_data()
        .to_vec()
        .unwrap();
    assert!(w_grad.iter().all(|g| *g <= 0.0));
    assert!(w_grad.iter().any(|g| *g < 0.0));
}

#[test]
fn test_eikonal_gradient_flows_to_network_output() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(1.0, 0.0, 0.0)).unwrap();

    let gradients =
        Tensor::<AutodiffBackend, 3>::from_data([[[2.0f32, 0.0, 0.0]]], &device).require_grad();
    let output = RenderOutput::new().with_gradients(gradients.clone());

    let result = supervisor
        .supervise(&FiniteDiffState::default(), &output, &Batch::empty(), &device)
        .unwrap();
    let grads = result.loss.backward();

    // d/dx (|x| - 1)² = 2(|x| - 1) x/|x| = 2 at x = (2, 0, 0)
    let g: Vec<f32> = gradients.grad(&grads).unwrap().into_data().to_vec().unwrap();
    assert!((g[0] - 2.0).abs() < 1e-5, "got {:?}", g);
}

#[test]
fn test_eikonal_zero_gradient_stays_finite() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(1.0, 0.0, 0.0)).unwrap();

    // Flat region: one sample has a zero SDF gradient
    let gradients = Tensor::<AutodiffBackend, 3>::from_data(
        [[[0.0f32, 0.0, 0.0], [2.0, 0.0, 0.0]]],
        &device,
    )
    .require_grad();
    let output = RenderOutput::new().with_gradients(gradients.clone());

    let result = supervisor
        .supervise(&FiniteDiffState::default(), &output, &Batch::empty(), &device)
        .unwrap();
    let loss = scalar(result.loss.clone());
    assert!((loss - 1.0).abs() < 1e-5, "got {}", loss);

    let grads = result.loss.backward();
    let g: Vec<f32> = gradients.grad(&grads).unwrap().into_data().to_vec().unwrap();
    assert!(g.iter().all(|v| v.is_finite()), "got {:?}", g);

    // Zero row contributes nothing; (2, 0, 0) gives 2(2 - 1)/2 = 1 after the mean
    let expected = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    for (got, want) in g.iter().zip(expected) {
        assert!((got - want).abs() < 1e-5, "got {:?}", g);
    }
}

#[test]
fn test_config_save_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("supervisor.json");

    let config = GeometrySupervisorConfig::neus().with_eikonal_loss_weight(0.25);
    config.save(&path).unwrap();

    let loaded = GeometrySupervisorConfig::load(&path).unwrap();
    assert_eq!(loaded.eikonal_loss_weight, 0.25);
    assert_eq!(loaded.zip_prop_loss_weight, config.zip_prop_loss_weight);
    assert_eq!(loaded.base.img_loss_weight, config.base.img_loss_weight);
}

#[test]
fn test_stats_tracker_over_steps() {
    let device = Default::default();
    let supervisor = GeometrySupervisor::new(&geometry_config(1.0, 0.0, 0.0)).unwrap();
    let mut tracker = StatsTracker::new(4);

    for step in 0..8 {
        let output = RenderOutput::<TestBackend>::new()
            .with_gradients(Tensor::from_data([[[1.0 + step as f32, 0.0, 0.0]]], &device));
        let result = supervisor
            .supervise(&FiniteDiffState::default(), &output, &Batch::empty(), &device)
            .unwrap();
        tracker.add(&result.scalar_stats.summary());
    }

    // Last four eikonal values: 16, 25, 36, 49
    let avg = tracker.average();
    assert_eq!(tracker.total_steps(), 8);
    assert!((avg.get("eikonal_loss").unwrap() - 31.5).abs() < 1e-3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn loss_is_input_plus_weighted_terms(
        w_eik in prop_oneof![Just(0.0f32), 0.01f32..2.0],
        w_curv in prop_oneof![Just(0.0f32), 0.01f32..2.0],
        w_zip in prop_oneof![Just(0.0f32), 0.01f32..2.0],
        start in -1.0f32..1.0,
        scale in 0.1f32..3.0,
    ) {
        let device = Default::default();
        let supervisor = GeometrySupervisor::new(&geometry_config(w_eik, w_curv, w_zip)).unwrap();
        let output = full_output::<TestBackend>(&device, scale);
        let network = FiniteDiffState::new(0.05, 1.0);

        let mut scalar_stats = ScalarStats::new();
        let mut image_stats = ImageStats::new();
        let loss = supervisor
            .compute_loss(
                &network,
                &output,
                &Batch::empty(),
                Tensor::from_floats([start], &device),
                &mut scalar_stats,
                &mut image_stats,
            )
            .unwrap();

        prop_assert_eq!(scalar_stats.contains("eikonal_loss"), w_eik > 0.0);
        prop_assert_eq!(scalar_stats.contains("curvature_loss"), w_curv > 0.0);
        prop_assert_eq!(scalar_stats.contains("zip_prop_loss"), w_zip > 0.0);

        let term = |name: &str| scalar_stats.value(name).unwrap_or(0.0);
        let expected = start
            + w_eik * term("eikonal_loss")
            + w_curv * term("curvature_loss")
            + w_zip * term("zip_prop_loss");
        let got = scalar(loss);
        prop_assert!((got - expected).abs() <= 1e-4 * (1.0 + expected.abs()), "got {}, expected {}", got, expected);

        if w_eik > 0.0 {
            let direct = scalar(eikonal(output.gradients.clone().unwrap(), 1.0));
            prop_assert!((term("eikonal_loss") - direct).abs() < 1e-6);
        }
    }
}
