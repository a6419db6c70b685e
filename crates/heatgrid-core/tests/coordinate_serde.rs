use heatgrid_core::serde_io::{from_json_slice, to_canonical_json_bytes};
use heatgrid_core::{
    haversine_m, BoundingBox, Coordinate, HeatgridError, HeatmapPoint, Precision,
    ReductionMethod,
};
use proptest::prelude::*;

#[test]
fn coordinates_serialize_longitude_first() {
    let point = Coordinate::new(45.75, 4.85).expect("coordinate");
    let bytes = to_canonical_json_bytes(&point).expect("serialize");
    assert_eq!(String::from_utf8(bytes).expect("utf8"), "[4.85,45.75]");

    let decoded: Coordinate = from_json_slice(b"[4.85,45.75]").expect("deserialize");
    assert_eq!(decoded.lat(), 45.75);
    assert_eq!(decoded.lon(), 4.85);
}

#[test]
fn out_of_range_coordinates_are_rejected() {
    let err = Coordinate::new(91.0, 0.0).expect_err("latitude");
    assert!(matches!(err, HeatgridError::InvalidCoordinate(_)));
    assert_eq!(err.info().map(|info| info.code.as_str()), Some("latitude-range"));

    let err = Coordinate::new(0.0, -180.5).expect_err("longitude");
    assert_eq!(err.info().map(|info| info.code.as_str()), Some("longitude-range"));

    assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    assert!(from_json_slice::<Coordinate>(b"[200.0, 10.0]").is_err());
}

#[test]
fn heatmap_points_serialize_as_pairs() {
    let point = HeatmapPoint {
        coordinate: Coordinate::new(45.0, 4.0).expect("coordinate"),
        mark: 0.25,
    };
    let bytes = to_canonical_json_bytes(&point).expect("serialize");
    assert_eq!(String::from_utf8(bytes.clone()).expect("utf8"), "[[4.0,45.0],0.25]");
    let decoded: HeatmapPoint = from_json_slice(&bytes).expect("deserialize");
    assert_eq!(decoded, point);
}

#[test]
fn centroid_of_empty_input_is_none() {
    let empty: Vec<Coordinate> = Vec::new();
    assert!(Coordinate::centroid(&empty).is_none());
}

#[test]
fn haversine_matches_known_distance() {
    let lyon = Coordinate::new(45.764, 4.8357).expect("lyon");
    let paris = Coordinate::new(48.8566, 2.3522).expect("paris");
    let distance = haversine_m(&lyon, &paris);
    assert!((distance - 392_000.0).abs() < 5_000.0, "distance {distance}");
    assert_eq!(haversine_m(&lyon, &lyon), 0.0);
}

#[test]
fn method_tags_parse_case_insensitively() {
    assert_eq!("fgr".parse::<ReductionMethod>().expect("fgr"), ReductionMethod::Fgr);
    assert_eq!("QCGR".parse::<ReductionMethod>().expect("qcgr"), ReductionMethod::Qcgr);
    let err = "kmeans".parse::<ReductionMethod>().expect_err("unknown");
    assert!(matches!(err, HeatgridError::UnknownMethod(_)));
}

#[test]
fn precision_must_be_positive_and_finite() {
    for raw in [0.0, -1.0, f64::INFINITY, f64::NAN] {
        let err = Precision::new(raw).expect_err("invalid precision");
        assert!(matches!(err, HeatgridError::InvalidPrecision(_)));
    }
    assert_eq!(Precision::new(50.0).expect("valid").value(), 50.0);
}

fn coordinate() -> impl Strategy<Value = Coordinate> {
    (-90.0f64..=90.0, -180.0f64..=180.0)
        .prop_map(|(lat, lon)| Coordinate::new(lat, lon).expect("in range"))
}

proptest! {
    #[test]
    fn centroid_stays_inside_bounding_box(points in prop::collection::vec(coordinate(), 1..40)) {
        let centroid = Coordinate::centroid(&points).expect("non-empty");
        let bbox = BoundingBox::from_points(&points).expect("non-empty");
        prop_assert!(bbox.contains(&centroid));
    }

    #[test]
    fn coordinates_round_trip_exactly(point in coordinate()) {
        let bytes = to_canonical_json_bytes(&point).expect("serialize");
        let decoded: Coordinate = from_json_slice(&bytes).expect("deserialize");
        prop_assert_eq!(decoded, point);
    }
}
