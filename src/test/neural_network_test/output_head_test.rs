use super::*;

fn separable_pairs() -> (Tensor, Tensor) {
    // row 0 is a matching pair (positive product), row 1 a non-matching one (negative product)
    let left = array![[2.0f32, 2.0], [2.0, 2.0]].into_dyn();
    let right = array![[2.0f32, 2.0], [-2.0, -2.0]].into_dyn();
    (left, right)
}

#[test]
fn build_heads_test() {
    let head = OutputHead::build(Criterion::Classification, 4, 10).unwrap();
    assert_eq!(head.criterion(), Criterion::Classification);
    assert_eq!(head.param_count(), 4 + 1);
    assert!(
        head.linear()
            .unwrap()
            .get_weights()
            .iter()
            .all(|&w| w >= MIN_POSITIVE_WEIGHT)
    );

    let head = OutputHead::build(Criterion::Classification2, 4, 10).unwrap();
    assert_eq!(head.criterion(), Criterion::Classification2);
    assert_eq!(head.param_count(), 4 * 2 + 2);

    let head = OutputHead::build(Criterion::Cosine, 4, 10).unwrap();
    assert_eq!(head.criterion(), Criterion::Cosine);
    assert_eq!(head.param_count(), 0);
    assert!(head.linear().is_none());

    assert!(OutputHead::build(Criterion::Cosine, 0, 10).is_err());
}

#[test]
fn classification_forward_reapplies_floor_test() {
    let mut head = OutputHead::build(Criterion::Classification, 2, 10).unwrap();
    head.linear_mut()
        .unwrap()
        .set_weights(array![[-1.0], [0.5]], array![[0.25]])
        .unwrap();

    let left = array![[1.0f32, 2.0], [3.0, -1.0]].into_dyn();
    let right = array![[1.0f32, 1.0], [1.0, 1.0]].into_dyn();
    let scores = head.forward(&left, &right).unwrap();

    let weights = head.linear().unwrap().get_weights();
    assert_eq!(weights[[0, 0]], MIN_POSITIVE_WEIGHT);
    assert_eq!(weights[[1, 0]], 0.5);

    assert_eq!(scores.shape(), &[2, 2]);
    for row in scores.axis_iter(Axis(0)) {
        assert_eq!(row[0], -row[1]);
    }
    // h = 1e-6 * 1 + 0.5 * 2 + 0.25
    assert_abs_diff_eq!(scores[[0, 1]], 1.25, epsilon = 1e-5);
}

#[test]
fn two_class_forward_pins_class_zero_test() {
    let mut head = OutputHead::build(Criterion::Classification2, 2, 10).unwrap();
    head.linear_mut()
        .unwrap()
        .set_weights(array![[0.7, -0.3], [-0.2, 0.9]], array![[0.1, -0.1]])
        .unwrap();

    let left = array![[1.0f32, 2.0], [-3.0, 0.5], [0.0, 0.0]].into_dyn();
    let right = array![[0.5f32, 1.0], [1.0, 4.0], [1.0, 1.0]].into_dyn();
    let scores = head.forward(&left, &right).unwrap();

    let weights = head.linear().unwrap().get_weights();
    assert!(weights.column(0).iter().all(|&w| w == 0.0));
    assert_eq!(weights[[0, 1]], MIN_POSITIVE_WEIGHT);
    assert_eq!(weights[[1, 1]], 0.9);

    // class 0 scores only its bias
    for row in scores.axis_iter(Axis(0)) {
        assert_abs_diff_eq!(row[0], 0.1, epsilon = 1e-6);
    }
}

#[test]
fn classification_loss_separated_vs_reversed_test() {
    let (left, right) = separable_pairs();
    let matched = array![1.0f32, 0.0].into_dyn();
    let reversed = array![0.0f32, 1.0].into_dyn();

    let mut head = OutputHead::build(Criterion::Classification, 2, 10).unwrap();
    head.linear_mut()
        .unwrap()
        .set_weights(array![[1.0], [1.0]], array![[0.0]])
        .unwrap();
    let scores = head.forward(&left, &right).unwrap();
    let good = head.compute_loss(&scores, &matched).unwrap();
    let bad = head.compute_loss(&scores, &reversed).unwrap();
    assert!(good < bad);
    assert!(good < 1e-3);

    let mut head = OutputHead::build(Criterion::Classification2, 2, 10).unwrap();
    head.linear_mut()
        .unwrap()
        .set_weights(array![[0.0, 1.0], [0.0, 1.0]], array![[0.0, 0.0]])
        .unwrap();
    let scores = head.forward(&left, &right).unwrap();
    let good = head.compute_loss(&scores, &matched).unwrap();
    let bad = head.compute_loss(&scores, &reversed).unwrap();
    assert!(good < bad);
}

#[test]
fn cosine_head_forward_and_loss_test() {
    let mut head = OutputHead::build(Criterion::Cosine, 2, 10).unwrap();
    let left = array![[1.0f32, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]].into_dyn();
    let right = array![[3.0f32, 0.0], [0.0, 0.5], [0.0, 2.0], [4.0, 0.0]].into_dyn();

    let similarity = head.forward(&left, &right).unwrap();
    assert_tensors_close(&similarity, &array![1.0f32, 1.0, 0.0, 0.0].into_dyn(), 1e-5);

    let targets = PairBatch::targets_for(2);
    let loss = head.compute_loss(&similarity, &targets).unwrap();
    assert_abs_diff_eq!(loss, 0.0, epsilon = 1e-6);

    let reversed = array![0.0f32, 0.0, 1.0, 1.0].into_dyn();
    assert!(head.compute_loss(&similarity, &reversed).is_err());
}

#[test]
fn forward_rejects_bad_embeddings_test() {
    let mut head = OutputHead::build(Criterion::Classification, 3, 10).unwrap();
    let a = Tensor::ones(IxDyn(&[2, 3]));
    let b = Tensor::ones(IxDyn(&[2, 2]));
    let flat = Tensor::ones(IxDyn(&[3]));

    assert!(head.forward(&a, &b).is_err());
    assert!(head.forward(&flat, &flat).is_err());
    // width differs from n_out
    assert!(head.forward(&b, &b).is_err());
    // empty batch
    let empty = Tensor::zeros(IxDyn(&[0, 3]));
    assert!(head.forward(&empty, &empty).is_err());
}

#[test]
fn backward_before_forward_test() {
    for criterion in Criterion::ALL {
        let mut head = OutputHead::build(criterion, 2, 10).unwrap();
        assert!(matches!(
            head.backward(&array![[1.0f32, 1.0]].into_dyn()),
            Err(ModelError::ProcessingError(_))
        ));
    }
}

#[test]
fn backward_retry_after_bad_gradient_test() {
    let left = array![[1.0f32, 0.5], [0.2, 1.0]].into_dyn();
    let right = array![[0.3f32, 1.0], [1.0, -0.4]].into_dyn();
    let bad_grads = [
        array![[1.0f32, 1.0, 1.0]].into_dyn(),
        array![[1.0f32, 1.0, 1.0]].into_dyn(),
        array![1.0f32, 1.0, 1.0].into_dyn(),
    ];
    let good_grads = [
        Tensor::zeros(IxDyn(&[2, 2])),
        Tensor::zeros(IxDyn(&[2, 2])),
        Tensor::zeros(IxDyn(&[2])),
    ];

    for ((criterion, bad), good) in Criterion::ALL.into_iter().zip(bad_grads).zip(good_grads) {
        let mut head = OutputHead::build(criterion, 2, 10).unwrap();
        head.forward(&left, &right).unwrap();

        assert!(matches!(
            head.backward(&bad),
            Err(ModelError::ProcessingError(_))
        ));
        // the forward cache is still there
        let (grad_left, grad_right) = head.backward(&good).unwrap();
        assert_eq!(grad_left.shape(), &[2, 2]);
        assert_eq!(grad_right.shape(), &[2, 2]);

        // and consumed by the successful call
        assert!(head.backward(&good).is_err());
    }
}

#[test]
fn cosine_head_checks_width_test() {
    let mut head = OutputHead::build(Criterion::Cosine, 3, 10).unwrap();
    assert_eq!(head.n_out(), 3);

    let narrow = Tensor::ones(IxDyn(&[2, 2]));
    assert!(matches!(
        head.forward(&narrow, &narrow),
        Err(ModelError::InputValidationError(_))
    ));

    let matching = Tensor::ones(IxDyn(&[2, 3]));
    assert!(head.forward(&matching, &matching).is_ok());
}

/// Checks the embedding gradients of a head against finite differences of its loss
fn check_head_gradients(criterion: Criterion) {
    // pairs 0/1 are the positive half, 2/3 the negative half; both hinge terms are active
    let left = array![
        [-1.1f32, 0.2, 0.7],
        [0.8, -0.4, 1.2],
        [0.3, 0.9, -0.5],
        [0.6, -0.8, 0.1]
    ]
    .into_dyn();
    let right = array![
        [0.9f32, -0.6, 0.2],
        [0.5, 0.7, -0.3],
        [-0.2, 1.0, 0.4],
        [-0.4, -0.1, 1.3]
    ]
    .into_dyn();
    let targets = PairBatch::targets_for(2);

    let mut head = OutputHead::build(criterion, 3, 10).unwrap();
    let output = head.forward(&left, &right).unwrap();
    let grad_output = head.compute_loss_grad(&output, &targets).unwrap();
    let (grad_left, grad_right) = head.backward(&grad_output).unwrap();

    let mut reference = OutputHead::build(criterion, 3, 10).unwrap();
    let mut loss_at = |l: &Tensor, r: &Tensor| -> f32 {
        let out = reference.forward(l, r).unwrap();
        reference.compute_loss(&out, &targets).unwrap()
    };

    let mut expected_left = Tensor::zeros(left.raw_dim());
    let mut expected_right = Tensor::zeros(right.raw_dim());
    let h = 1e-2f32;
    for (idx, _) in left.indexed_iter() {
        let mut plus = left.clone();
        plus[&idx] += h;
        let mut minus = left.clone();
        minus[&idx] -= h;
        expected_left[&idx] = (loss_at(&plus, &right) - loss_at(&minus, &right)) / (2.0 * h);

        let mut plus = right.clone();
        plus[&idx] += h;
        let mut minus = right.clone();
        minus[&idx] -= h;
        expected_right[&idx] = (loss_at(&left, &plus) - loss_at(&left, &minus)) / (2.0 * h);
    }

    assert_tensors_close(&grad_left, &expected_left, 2e-3);
    assert_tensors_close(&grad_right, &expected_right, 2e-3);
}

#[test]
fn classification_gradients_test() {
    check_head_gradients(Criterion::Classification);
}

#[test]
fn two_class_gradients_test() {
    check_head_gradients(Criterion::Classification2);
}

#[test]
fn cosine_gradients_test() {
    check_head_gradients(Criterion::Cosine);
}

#[test]
fn update_keeps_constraints_test() {
    let (left, right) = separable_pairs();
    let targets = array![0.0f32, 1.0].into_dyn();
    let mut sgd = SGD::new(10.0).unwrap();

    for criterion in [Criterion::Classification, Criterion::Classification2] {
        let mut head = OutputHead::build(criterion, 2, 10).unwrap();
        for _ in 0..5 {
            let output = head.forward(&left, &right).unwrap();
            let grad = head.compute_loss_grad(&output, &targets).unwrap();
            head.backward(&grad).unwrap();
            head.update(&mut sgd).unwrap();

            let weights = head.linear().unwrap().get_weights();
            match criterion {
                Criterion::Classification => {
                    assert!(weights.iter().all(|&w| w >= MIN_POSITIVE_WEIGHT));
                }
                _ => {
                    assert!(weights.column(0).iter().all(|&w| w == 0.0));
                    assert!(weights.column(1).iter().all(|&w| w >= MIN_POSITIVE_WEIGHT));
                }
            }
        }
    }

    // cosine has nothing to update
    let mut head = OutputHead::build(Criterion::Cosine, 2, 10).unwrap();
    assert!(head.update(&mut sgd).is_ok());
}

#[test]
fn describe_test() {
    let head = OutputHead::build(Criterion::Cosine, 2, 10).unwrap();
    assert!(head.describe().contains("margin 0.25"));

    let head = OutputHead::build(Criterion::Classification2, 5, 10).unwrap();
    assert!(head.describe().starts_with("Classification2: Linear(5 -> 2)"));
}
