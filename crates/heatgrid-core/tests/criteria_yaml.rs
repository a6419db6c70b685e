use heatgrid_core::serde_io::from_yaml_slice;
use heatgrid_core::{
    CriteriaRegistry, CriteriaSet, CriteriaSetDef, Coordinate, Criterion, CriterionKind,
    HeatgridError, RuleDef,
};

const SCHOOLS: &str = r#"
name: schools
criteria:
  nearby_school:
    weight: 2.0
    kind: proximity
    radius_m: 800
    dataset: schools
  calm:
    weight: 1.0
    kind: avoidance
    radius_m: 300
    features: [[4.832, 45.757]]
  baseline:
    weight: 0.5
    kind: constant
    value: 0.5
"#;

fn point(lon: f64, lat: f64) -> Coordinate {
    Coordinate::from_lon_lat(lon, lat).expect("coordinate")
}

fn constant(name: &str, weight: f64, value: f64) -> Criterion {
    Criterion::new(name, weight, CriterionKind::Constant { value }).expect("criterion")
}

#[test]
fn yaml_definition_parses_into_rules() {
    let def: CriteriaSetDef = from_yaml_slice(SCHOOLS.as_bytes()).expect("parse");
    assert_eq!(def.name, "schools");
    assert_eq!(def.criteria.len(), 3);
    match &def.criteria["nearby_school"].rule {
        RuleDef::Proximity {
            radius_m, dataset, ..
        } => {
            assert_eq!(*radius_m, 800.0);
            assert_eq!(dataset.as_deref(), Some("schools"));
        }
        other => panic!("unexpected rule {other:?}"),
    }
    assert_eq!(def.criteria["calm"].weight, 1.0);
}

#[test]
fn datasets_are_resolved_through_the_loader() {
    let def: CriteriaSetDef = from_yaml_slice(SCHOOLS.as_bytes()).expect("parse");
    let mut requested = Vec::new();
    let set = CriteriaSet::from_def(def, |name| {
        requested.push(name.to_string());
        Ok(vec![point(4.85, 45.75), point(4.86, 45.76)])
    })
    .expect("resolve");
    assert_eq!(requested, vec!["schools".to_string()]);
    match set.get("nearby_school").expect("criterion").kind() {
        CriterionKind::Proximity { features, .. } => assert_eq!(features.len(), 2),
        other => panic!("unexpected kind {other:?}"),
    }
    assert_eq!(set.total_weight(), 3.5);
}

#[test]
fn dataset_errors_propagate() {
    let def: CriteriaSetDef = from_yaml_slice(SCHOOLS.as_bytes()).expect("parse");
    let err = CriteriaSet::from_def(def, |name| {
        Err(HeatgridError::StoreIo(heatgrid_core::ErrorInfo::new(
            "dataset-missing",
            format!("no dataset {name}"),
        )))
    })
    .expect_err("missing dataset");
    assert!(matches!(err, HeatgridError::StoreIo(_)));
}

#[test]
fn invalid_parameters_are_rejected() {
    let err = Criterion::new("w", 0.0, CriterionKind::Constant { value: 1.0 }).expect_err("weight");
    assert_eq!(err.info().map(|info| info.code.as_str()), Some("criterion-weight"));

    let err = Criterion::new(
        "r",
        1.0,
        CriterionKind::Proximity {
            features: Vec::new(),
            radius_m: -5.0,
        },
    )
    .expect_err("radius");
    assert_eq!(err.info().map(|info| info.code.as_str()), Some("criterion-radius"));

    let err = Criterion::new(
        "d",
        1.0,
        CriterionKind::Density {
            features: Vec::new(),
            radius_m: 100.0,
            saturation: 0,
        },
    )
    .expect_err("saturation");
    assert!(matches!(err, HeatgridError::InvalidCriteria(_)));
}

#[test]
fn duplicate_names_are_rejected() {
    let err = CriteriaSet::new("dup", [constant("a", 1.0, 0.5), constant("a", 2.0, 0.1)])
        .expect_err("duplicate criterion");
    assert!(matches!(err, HeatgridError::InvalidCriteria(_)));

    let first = CriteriaSet::new("set", [constant("a", 1.0, 0.5)]).expect("set");
    let err = CriteriaRegistry::new([first.clone(), first]).expect_err("duplicate set");
    assert!(matches!(err, HeatgridError::InvalidCriteria(_)));
}

#[test]
fn criteria_iterate_in_name_order() {
    let forward = CriteriaSet::new("s", [constant("b", 1.0, 0.1), constant("a", 1.0, 0.2)])
        .expect("forward");
    let backward = CriteriaSet::new("s", [constant("a", 1.0, 0.2), constant("b", 1.0, 0.1)])
        .expect("backward");
    let names: Vec<&str> = forward.iter().map(Criterion::name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(forward, backward);
}

#[test]
fn rule_scores_follow_distance() {
    let feature = point(4.85, 45.75);
    let proximity = CriterionKind::Proximity {
        features: vec![feature],
        radius_m: 1_000.0,
    };
    let avoidance = CriterionKind::Avoidance {
        features: vec![feature],
        radius_m: 1_000.0,
    };
    assert_eq!(proximity.evaluate(&feature), 1.0);
    assert_eq!(avoidance.evaluate(&feature), 0.0);

    let far = point(5.85, 45.75);
    assert_eq!(proximity.evaluate(&far), 0.0);
    assert_eq!(avoidance.evaluate(&far), 1.0);

    let density = CriterionKind::Density {
        features: vec![feature, point(4.8501, 45.7501), far],
        radius_m: 500.0,
        saturation: 4,
    };
    assert_eq!(density.evaluate(&feature), 0.5);

    let empty = CriterionKind::Proximity {
        features: Vec::new(),
        radius_m: 1_000.0,
    };
    assert_eq!(empty.evaluate(&feature), 0.0);
}

#[test]
fn registry_lookup_reports_known_sets() {
    let registry = CriteriaRegistry::new([
        CriteriaSet::new("schools", [constant("a", 1.0, 0.5)]).expect("schools"),
        CriteriaSet::new("parks", [constant("a", 1.0, 0.5)]).expect("parks"),
    ])
    .expect("registry");
    assert_eq!(registry.names(), vec!["parks".to_string(), "schools".to_string()]);
    assert_eq!(registry.get("parks").expect("parks").name(), "parks");

    let err = registry.get("museums").expect_err("missing");
    assert!(matches!(err, HeatgridError::CriteriaNotFound(_)));
    let hint = err.info().and_then(|info| info.hint.clone()).expect("hint");
    assert!(hint.contains("parks") && hint.contains("schools"));
}
