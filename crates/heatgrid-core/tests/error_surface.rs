use heatgrid_core::errors::{BatchFailure, ErrorInfo, HeatgridError, ItemFailure};
use heatgrid_core::serde_io::{from_json_slice, to_canonical_json_bytes};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("grid", "lyon_part1")
        .with_context("reason", "example")
}

#[test]
fn grid_not_found_surface() {
    let err = HeatgridError::GridNotFound(sample_info("grid-missing", "no grid"));
    let info = err.info().expect("info");
    assert_eq!(info.code, "grid-missing");
    assert!(info.context.contains_key("grid"));
    assert_eq!(err.family(), "GridNotFound");
}

#[test]
fn display_includes_code_and_context() {
    let err = HeatgridError::InvalidPrecision(
        ErrorInfo::new("precision-range", "precision must be finite and > 0")
            .with_context("precision", "-1"),
    );
    let text = err.to_string();
    assert!(text.starts_with("invalid precision"));
    assert!(text.contains("precision-range"));
    assert!(text.contains("precision=-1"));
}

#[test]
fn hint_is_carried() {
    let err = HeatgridError::CriteriaNotFound(
        sample_info("criteria-missing", "unknown set").with_hint("known sets: schools"),
    );
    assert_eq!(
        err.info().and_then(|info| info.hint.as_deref()),
        Some("known sets: schools")
    );
}

#[test]
fn partial_batch_failure_round_trips_json() {
    let err = HeatgridError::PartialBatchFailure(BatchFailure {
        operation: "reduce_all".into(),
        succeeded: 4,
        failures: vec![ItemFailure {
            unit: "broken@FGR-50".into(),
            error: HeatgridError::GridNotFound(sample_info("grid-malformed", "bad json")),
        }],
    });
    assert!(err.info().is_none());
    assert_eq!(err.family(), "PartialBatchFailure");

    let bytes = to_canonical_json_bytes(&err).expect("serialize");
    let text = String::from_utf8(bytes.clone()).expect("utf8");
    assert!(text.contains("\"family\":\"PartialBatchFailure\""));
    let decoded: HeatgridError = from_json_slice(&bytes).expect("deserialize");
    assert_eq!(decoded, err);
}
