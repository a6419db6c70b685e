use std::fs;

use heatgrid_core::{
    reduced_basename, Coordinate, CriteriaSetDef, CriterionDef, Grid, HeatgridError,
    HeatmapArtifact, HeatmapPoint, Precision, Provenance, ReducedGrid, ReductionMethod,
    ResolutionUnit, RuleDef, ARTIFACT_SCHEMA,
};
use heatgrid_store::GridStore;

fn point(lon: f64, lat: f64) -> Coordinate {
    Coordinate::from_lon_lat(lon, lat).expect("coordinate")
}

fn sample_grid() -> Grid {
    Grid::new(
        "lyon_part1",
        vec![point(4.85, 45.75), point(4.851, 45.751), point(4.95, 45.80)],
    )
}

fn sample_artifact() -> HeatmapArtifact {
    HeatmapArtifact {
        schema: ARTIFACT_SCHEMA,
        grid: "lyon_part1".into(),
        criteria: "schools".into(),
        points: sample_grid()
            .points
            .into_iter()
            .zip([0.1, 1.0 / 3.0, 0.987_654_321_012_345_6])
            .map(|(coordinate, mark)| HeatmapPoint { coordinate, mark })
            .collect(),
        rejected: 0,
        provenance: Provenance::now("input".into(), "criteria".into()),
    }
}

#[test]
fn grid_round_trips_as_lon_lat_array() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    store.dump_grid(&sample_grid()).expect("dump");

    let raw = fs::read_to_string(temp.path().join("grids/lyon_part1.json")).expect("read");
    assert!(raw.starts_with("[[4.85,45.75],"));

    let loaded = store.load_grid("lyon_part1").expect("load");
    assert_eq!(loaded.grid, sample_grid());
    assert!(loaded.rejected.is_empty());
}

#[test]
fn heatmap_load_dump_load_is_identity() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    let artifact = sample_artifact();
    assert!(!store.heatmap_exists("lyon_part1", "schools"));
    store.dump_heatmap(&artifact).expect("dump");
    assert!(store.heatmap_exists("lyon_part1", "schools"));

    let first = store.load_heatmap("lyon_part1", "schools").expect("first load");
    assert_eq!(first, artifact);
    let first_bytes = fs::read(temp.path().join("heatmaps/lyon_part1/schools.json")).expect("read");

    store.dump_heatmap(&first).expect("redump");
    let second = store.load_heatmap("lyon_part1", "schools").expect("second load");
    let second_bytes =
        fs::read(temp.path().join("heatmaps/lyon_part1/schools.json")).expect("read");
    assert_eq!(second, first);
    assert_eq!(second_bytes, first_bytes);
}

#[test]
fn missing_heatmap_is_a_store_error() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    let err = store.load_heatmap("nowhere", "schools").expect_err("missing");
    assert!(matches!(err, HeatgridError::StoreIo(_)));
}

#[test]
fn missing_grid_is_grid_not_found() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    let err = store.load_grid("nowhere").expect_err("missing");
    assert!(matches!(err, HeatgridError::GridNotFound(_)));
    assert_eq!(err.info().map(|info| info.code.as_str()), Some("grid-missing"));
}

#[test]
fn reduced_grids_load_through_the_grid_path() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    let precision = Precision::new(50.0).expect("precision");
    let basename = reduced_basename("lyon_part1", ReductionMethod::Fgr, precision);
    assert_eq!(basename, "lyon_part1.fgr-50");
    let reduced = ReducedGrid {
        schema: ARTIFACT_SCHEMA,
        basename: basename.clone(),
        source: "lyon_part1".into(),
        method: ReductionMethod::Fgr,
        precision,
        unit: ResolutionUnit::Meters,
        points: vec![point(4.85, 45.75)],
        provenance: Provenance::now("input".into(), String::new()),
    };
    store.dump_reduced(&reduced).expect("dump");

    assert_eq!(store.load_reduced(&basename).expect("reduced"), reduced);
    let loaded = store.load_grid(&basename).expect("grid view");
    assert_eq!(loaded.grid, reduced.to_grid());
    assert_eq!(store.list_reduced_grids().expect("list"), vec![basename]);
}

#[test]
fn criteria_files_resolve_datasets() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    fs::create_dir_all(temp.path().join("datasets")).expect("datasets dir");
    fs::write(
        temp.path().join("datasets/schools.json"),
        "[[4.85, 45.75], [4.86, 45.76], \"oops\"]",
    )
    .expect("dataset");

    let def = CriteriaSetDef {
        name: "schools".into(),
        criteria: [(
            "nearby".to_string(),
            CriterionDef {
                weight: 1.0,
                rule: RuleDef::Proximity {
                    radius_m: 500.0,
                    features: Vec::new(),
                    dataset: Some("schools".into()),
                },
            },
        )]
        .into_iter()
        .collect(),
    };
    store.dump_criteria(&def).expect("dump criteria");
    assert_eq!(store.list_criteria().expect("list"), vec!["schools".to_string()]);

    let registry = store.load_registry().expect("registry");
    let set = registry.get("schools").expect("set");
    let criterion = set.get("nearby").expect("criterion");
    match criterion.kind() {
        heatgrid_core::CriterionKind::Proximity { features, .. } => assert_eq!(features.len(), 2),
        other => panic!("unexpected kind {other:?}"),
    }

    let err = store.load_criteria("parks").expect_err("missing criteria");
    assert!(matches!(err, HeatgridError::CriteriaNotFound(_)));
}
