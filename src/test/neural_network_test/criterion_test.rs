use super::*;

#[test]
fn parse_criterion_test() {
    assert_eq!(
        "classification".parse::<Criterion>().unwrap(),
        Criterion::Classification
    );
    assert_eq!(
        "classification2".parse::<Criterion>().unwrap(),
        Criterion::Classification2
    );
    assert_eq!("cosine".parse::<Criterion>().unwrap(), Criterion::Cosine);
}

#[test]
fn unknown_criterion_test() {
    for name in ["foo", "", "Cosine", "classification3", " cosine"] {
        let err = name.parse::<Criterion>().unwrap_err();
        assert!(err.is_unrecognized_config(), "{:?} should be rejected", name);
    }

    assert_eq!(
        "foo".parse::<Criterion>().unwrap_err().to_string(),
        "Unrecognized configuration value: Unknown criterion: foo"
    );
}

#[test]
fn criterion_display_round_trip_test() {
    for criterion in Criterion::ALL {
        assert_eq!(criterion.to_string().parse::<Criterion>().unwrap(), criterion);
    }
    assert!(Criterion::Classification.is_classification());
    assert!(Criterion::Classification2.is_classification());
    assert!(!Criterion::Cosine.is_classification());
}
