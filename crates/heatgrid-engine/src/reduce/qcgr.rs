//! Quad/Cluster Grid Reduction: adaptive quad-tree leaves.

use heatgrid_core::{BoundingBox, Coordinate, Precision, ResolutionUnit, METERS_PER_DEGREE};

use super::params::ReducerConfig;

/// Nodes with more points than this split their children across threads.
const PARALLEL_THRESHOLD: usize = 4096;

/// One quad-tree leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    /// Input indices in ascending order.
    pub members: Vec<usize>,
    /// Subdivision depth, zero for the root.
    pub depth: u32,
}

#[derive(Debug, Clone, Copy)]
struct Region {
    bbox: BoundingBox,
    depth: u32,
}

/// Quad-tree partitioner.
#[derive(Debug, Clone, Copy)]
pub struct QuadTree {
    precision: Precision,
    unit: ResolutionUnit,
    leaf_capacity: usize,
    max_depth: u32,
}

impl QuadTree {
    /// Partitioner for `precision` using the QCGR knobs in `config`.
    pub fn new(precision: Precision, config: &ReducerConfig) -> Self {
        let config = config.sanitised();
        Self {
            precision,
            unit: config.unit,
            leaf_capacity: config.leaf_capacity,
            max_depth: config.max_depth,
        }
    }

    /// Splits `points` into leaves ordered by their first member.
    ///
    /// A node is a leaf once it holds no more points than its threshold or
    /// sits at `max_depth`. Only nodes whose larger side fits within the
    /// precision may hold up to `leaf_capacity` points; wider nodes split
    /// down to single points.
    pub fn partition(&self, points: &[Coordinate]) -> Vec<Leaf> {
        let Some(bbox) = BoundingBox::from_points(points) else {
            return Vec::new();
        };
        let members: Vec<usize> = (0..points.len()).collect();
        let mut leaves = self.split(points, members, Region { bbox, depth: 0 });
        leaves.sort_by_key(|leaf| leaf.members[0]);
        leaves
    }

    /// Largest point count a node covering `region` may keep unsplit.
    fn threshold(&self, region: &Region) -> usize {
        if self.extent(&region.bbox) <= self.precision.value() {
            self.leaf_capacity
        } else {
            1
        }
    }

    fn is_leaf(&self, count: usize, region: &Region) -> bool {
        count <= self.threshold(region) || region.depth >= self.max_depth
    }

    fn extent(&self, bbox: &BoundingBox) -> f64 {
        match self.unit {
            ResolutionUnit::Degrees => bbox.height_deg().max(bbox.width_deg()),
            ResolutionUnit::Meters => {
                let height = bbox.height_deg() * METERS_PER_DEGREE;
                let width = bbox.width_deg() * METERS_PER_DEGREE * bbox.mid_lat().to_radians().cos();
                height.max(width)
            }
        }
    }

    fn split(&self, points: &[Coordinate], members: Vec<usize>, region: Region) -> Vec<Leaf> {
        if self.is_leaf(members.len(), &region) {
            return vec![Leaf {
                members,
                depth: region.depth,
            }];
        }
        let [sw, se, nw, ne] = quadrants(points, members, &region);
        let parallel = sw.0.len() + se.0.len() + nw.0.len() + ne.0.len() > PARALLEL_THRESHOLD;
        let recurse = |(members, region): (Vec<usize>, Region)| {
            if members.is_empty() {
                Vec::new()
            } else {
                self.split(points, members, region)
            }
        };
        let (mut south, north) = if parallel {
            rayon::join(
                || merge(recurse(sw), recurse(se)),
                || merge(recurse(nw), recurse(ne)),
            )
        } else {
            (merge(recurse(sw), recurse(se)), merge(recurse(nw), recurse(ne)))
        };
        south.extend(north);
        south
    }
}

fn merge(mut left: Vec<Leaf>, right: Vec<Leaf>) -> Vec<Leaf> {
    left.extend(right);
    left
}

fn quadrants(
    points: &[Coordinate],
    members: Vec<usize>,
    region: &Region,
) -> [(Vec<usize>, Region); 4] {
    let bbox = region.bbox;
    let (mid_lat, mid_lon) = (bbox.mid_lat(), bbox.mid_lon());
    let child = |min_lat, max_lat, min_lon, max_lon| Region {
        bbox: BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        },
        depth: region.depth + 1,
    };
    let mut buckets: [Vec<usize>; 4] = Default::default();
    for idx in members {
        let point = &points[idx];
        let north = point.lat() >= mid_lat;
        let east = point.lon() >= mid_lon;
        buckets[usize::from(north) * 2 + usize::from(east)].push(idx);
    }
    let [sw, se, nw, ne] = buckets;
    [
        (sw, child(bbox.min_lat, mid_lat, bbox.min_lon, mid_lon)),
        (se, child(bbox.min_lat, mid_lat, mid_lon, bbox.max_lon)),
        (nw, child(mid_lat, bbox.max_lat, bbox.min_lon, mid_lon)),
        (ne, child(mid_lat, bbox.max_lat, mid_lon, bbox.max_lon)),
    ]
}
