use gest_types::*;
use proptest::prelude::*;
use serde_json::json;

fn full_vocs() -> Vocs {
    Vocs::builder()
        .with_variables(json!({
            "x": [-5.0, 5.0],
            "n": {
                "type": "ContinuousVariable",
                "domain": [1, 10],
                "default_value": 3.0,
                "dtype": "int"
            },
            "arr": {"type": "ContinuousVariable", "domain": [0, 1], "dtype": ["float", [3]]},
        }))
        .variable("mode", Raw::<Variable>::set(["a", "b", "c"]))
        .with_objectives(json!({"f": "MINIMIZE", "g": {"type": "ExploreObjective"}}))
        .with_constraints(json!({
            "c1": ["LESS_THAN", 1.0],
            "c2": ["greater_than", -1.0],
            "c3": ["BOUNDS", 0.0, 2.0],
        }))
        .with_constants(json!({"label": "run-1", "weights": [1, 2, 3]}))
        .with_observables(json!({"o1": "float", "o2": ["float", 4]}))
        .build()
        .expect("valid vocs")
}

#[test]
fn round_trip_all_registry_kinds() {
    let vocs = full_vocs();
    let dump = vocs.to_json_value().unwrap();
    let rebuilt = Vocs::from_value(dump.clone()).unwrap();

    assert_eq!(rebuilt, vocs);
    assert_eq!(rebuilt.to_json_value().unwrap(), dump);
}

#[test]
fn round_trip_preserves_order() {
    let vocs = full_vocs();
    let text = serde_json::to_string(&vocs).unwrap();
    let rebuilt: Vocs = serde_json::from_str(&text).unwrap();
    assert_eq!(rebuilt.variable_names(), vec!["x", "n", "arr", "mode"]);
    assert_eq!(rebuilt.constraint_names(), vec!["c1", "c2", "c3"]);
}

#[test]
fn unsupported_entries_leave_registry_unchanged() {
    let mut vocs = full_vocs();
    let before = vocs.clone();

    assert!(vocs.objectives_mut().set("h", json!(3.0)).is_err());
    assert!(vocs.constraints_mut().set("c4", "LESS_THAN").is_err());
    assert!(vocs.observables_mut().set("o3", json!(false)).is_err());
    assert!(vocs.constants_mut().set("k", json!({"value": 1})).is_err());
    assert!(vocs
        .constraints_mut()
        .update([("c5", json!(["LESS_THAN", 1.0])), ("c6", json!(null))])
        .is_err());

    assert_eq!(vocs, before);
}

#[test]
fn from_json_str_reports_unknown_tags() {
    let err = Vocs::from_json_str(r#"{"variables": {"x": {"type": "Mystery"}}}"#).unwrap_err();
    assert!(err.to_string().contains("Mystery"));

    let err = Vocs::from_json_str("not json").unwrap_err();
    assert!(matches!(err, GestError::Serialization(_)));
}

proptest! {
    #[test]
    fn continuous_domain_ordering(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
        let result = ContinuousVariable::new(a, b);
        if b > a {
            let variable = result.unwrap();
            let dump = serde_json::to_value(&variable).unwrap();
            let back: ContinuousVariable = serde_json::from_value(dump).unwrap();
            prop_assert_eq!(back.domain(), [a, b]);
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn bounds_check_is_closed(
        low in -1.0e3f64..0.0,
        width in 1.0e-3f64..1.0e3,
        x in -2.0e3f64..2.0e3,
    ) {
        let high = low + width;
        let bounds = BoundsConstraint::new(low, high).unwrap();
        prop_assert!(bounds.check(low));
        prop_assert!(bounds.check(high));
        prop_assert_eq!(bounds.check(x), low <= x && x <= high);
    }

    #[test]
    fn discrete_values_are_unique(values in proptest::collection::vec(0i64..20, 1..40)) {
        let variable = DiscreteVariable::new(values.clone()).unwrap();
        let mut expected = values;
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(variable.len(), expected.len());
    }
}
