#![allow(dead_code)]

use std::fs;
use std::path::Path;

use heatgrid_core::{Coordinate, CriteriaSetDef, CriterionDef, Grid, RuleDef};
use heatgrid_store::GridStore;

pub const GOOD_GRIDS: [&str; 4] = ["lyon_part1", "lyon_part2", "lyon_part3", "lyon_part4"];
pub const CRITERIA: [&str; 2] = ["density", "schools"];

pub fn point(lon: f64, lat: f64) -> Coordinate {
    Coordinate::from_lon_lat(lon, lat).expect("coordinate")
}

fn grid(basename: &str, offset: f64) -> Grid {
    Grid::new(
        basename,
        vec![
            point(4.80 + offset, 45.75),
            point(4.80005 + offset, 45.75005),
            point(4.81 + offset, 45.75),
            point(4.95 + offset, 45.80),
        ],
    )
}

fn criteria(name: &str, rule: RuleDef) -> CriteriaSetDef {
    CriteriaSetDef {
        name: name.into(),
        criteria: [(name.to_string(), CriterionDef { weight: 1.0, rule })]
            .into_iter()
            .collect(),
    }
}

/// Four valid grids, one unparseable grid and two criteria sets.
pub fn seed_store(root: &Path) {
    let store = GridStore::new(root);
    for (idx, name) in GOOD_GRIDS.iter().enumerate() {
        store.dump_grid(&grid(name, idx as f64 * 0.01)).expect("dump grid");
    }
    fs::write(root.join("grids/broken.json"), "{ not a grid").expect("broken grid");

    store
        .dump_criteria(&criteria(
            "density",
            RuleDef::Density {
                radius_m: 1_000.0,
                saturation: 2,
                features: vec![point(4.80, 45.75), point(4.95, 45.80)],
                dataset: None,
            },
        ))
        .expect("density criteria");
    store
        .dump_criteria(&criteria(
            "schools",
            RuleDef::Proximity {
                radius_m: 2_000.0,
                features: vec![point(4.82, 45.76)],
                dataset: None,
            },
        ))
        .expect("schools criteria");
}
