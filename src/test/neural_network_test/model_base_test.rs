use super::*;

fn cosine_batch() -> (Tensor, Tensor) {
    // rows 0 and 1 match, rows 2 and 3 are orthogonal
    let left = array![[1.0f32, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]].into_dyn();
    let right = array![[1.0f32, 0.0], [0.0, 2.0], [0.0, 1.0], [3.0, 0.0]].into_dyn();
    (left, right)
}

#[test]
fn unsupported_criterion_fails_at_every_dispatch_point_test() {
    let mut model = ModelBase::new(ModelConfig::new("foo"), 2);
    let left = Tensor::ones(IxDyn(&[2, 2]));
    let scores = Tensor::zeros(IxDyn(&[2, 2]));
    let targets = array![1.0f32, 0.0].into_dyn();

    let err = model.build_output_op().unwrap_err();
    assert_eq!(
        err,
        ModelError::UnrecognizedConfig("Unknown criterion: foo".to_string())
    );
    assert!(model.output_op().is_none());

    assert!(
        model
            .compute_similarity(&left, &left)
            .unwrap_err()
            .is_unrecognized_config()
    );
    assert!(
        model
            .compute_loss(&scores, &targets)
            .unwrap_err()
            .is_unrecognized_config()
    );
    assert!(
        model
            .compute_loss_grad(&scores, &targets)
            .unwrap_err()
            .is_unrecognized_config()
    );
    assert!(model.backward(&scores).unwrap_err().is_unrecognized_config());
}

#[test]
fn head_must_be_built_first_test() {
    let mut model = ModelBase::new(ModelConfig::new("cosine"), 2);
    let left = Tensor::ones(IxDyn(&[2, 2]));
    let similarity = array![1.0f32, 0.0].into_dyn();
    let targets = array![1.0f32, 0.0].into_dyn();

    assert_eq!(
        model.compute_similarity(&left, &left).unwrap_err(),
        ModelError::NotBuilt
    );
    assert_eq!(
        model.compute_loss(&similarity, &targets).unwrap_err(),
        ModelError::NotBuilt
    );

    model.build_output_op().unwrap();
    assert!(model.compute_similarity(&left, &left).is_ok());
}

#[test]
fn param_count_per_criterion_test() {
    let expected = [
        ("classification", 4 + 1),
        ("classification2", 4 * 2 + 2),
        ("cosine", 0),
    ];
    for (criterion, count) in expected {
        let mut model = ModelBase::new(ModelConfig::new(criterion), 4);
        assert_eq!(model.param_count(), 0);
        model.build_output_op().unwrap();
        assert_eq!(model.param_count(), count);
        assert_eq!(model.criterion().unwrap().as_str(), criterion);
    }
}

#[test]
fn cosine_hinge_loss_test() {
    let mut model = ModelBase::new(ModelConfig::new("cosine"), 2);
    model.build_output_op().unwrap();

    let (left, right) = cosine_batch();
    let similarity = model.compute_similarity(&left, &right).unwrap();
    assert_tensors_close(&similarity, &array![1.0f32, 1.0, 0.0, 0.0].into_dyn(), 1e-5);

    let targets = array![1.0f32, 1.0, 0.0, 0.0].into_dyn();
    let loss = model.compute_loss(&similarity, &targets).unwrap();
    assert_abs_diff_eq!(loss, 0.0, epsilon = 1e-6);

    let reversed = array![0.0f32, 0.0, 1.0, 1.0].into_dyn();
    assert!(matches!(
        model.compute_loss(&similarity, &reversed),
        Err(ModelError::InputValidationError(_))
    ));
}

#[test]
fn same_seed_same_head_test() {
    let config = ModelConfig::new("classification2").with_seed(99);
    let mut a = ModelBase::new(config.clone(), 3);
    let mut b = ModelBase::new(config, 3);
    a.build_output_op().unwrap();
    b.build_output_op().unwrap();

    let wa = a.output_op().unwrap().linear().unwrap().get_weights();
    let wb = b.output_op().unwrap().linear().unwrap().get_weights();
    assert_eq!(wa, wb);
}

#[test]
fn train_step_reduces_classification_loss_test() {
    let left = array![[1.0f32, 1.0], [1.0, 1.0]].into_dyn();
    let right = array![[1.0f32, 1.0], [-1.0, -1.0]].into_dyn();
    let targets = array![1.0f32, 0.0].into_dyn();

    for criterion in ["classification", "classification2"] {
        let mut model = ModelBase::new(ModelConfig::new(criterion), 2);
        model.build_output_op().unwrap();
        let mut sgd = SGD::new(0.5).unwrap();

        let (first_loss, grad_left, grad_right) =
            model.train_step(&left, &right, &targets, &mut sgd).unwrap();
        assert_eq!(grad_left.shape(), &[2, 2]);
        assert_eq!(grad_right.shape(), &[2, 2]);

        let mut last_loss = first_loss;
        for _ in 0..50 {
            let (loss, _, _) = model.train_step(&left, &right, &targets, &mut sgd).unwrap();
            last_loss = loss;
        }
        assert!(
            last_loss < first_loss,
            "{}: loss went from {} to {}",
            criterion,
            first_loss,
            last_loss
        );
    }
}

#[test]
fn summary_test() {
    let mut model = ModelBase::new(ModelConfig::new("cosine"), 8);
    assert!(model.summary().contains("<output head not built>"));

    model.build_output_op().unwrap();
    let summary = model.summary();
    assert!(summary.starts_with("ModelBase (criterion: cosine, n_out: 8)\n"));
    assert!(summary.contains("\n  Cosine: cosine similarity"));
    assert!(summary.ends_with("  Trainable parameters: 0\n"));
}
