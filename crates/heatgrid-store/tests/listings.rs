use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use heatgrid_core::{Coordinate, Grid};
use heatgrid_store::{GridStore, KeyLocks};
use serde_json::json;

fn grid(basename: &str) -> Grid {
    Grid::new(
        basename,
        vec![Coordinate::from_lon_lat(4.85, 45.75).expect("coordinate")],
    )
}

#[test]
fn listings_are_sorted_and_ignore_foreign_files() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    assert!(store.list_heatmap_grids().expect("empty").is_empty());

    for name in ["villeurbanne", "lyon_part2", "lyon_part1"] {
        store.dump_grid(&grid(name)).expect("dump");
    }
    fs::write(temp.path().join("grids/notes.txt"), "ignored").expect("write");
    assert_eq!(
        store.list_heatmap_grids().expect("list"),
        vec!["lyon_part1", "lyon_part2", "villeurbanne"]
    );
}

#[test]
fn heatmap_listing_is_nested_by_grid() {
    let temp = tempfile::tempdir().expect("tmp dir");
    for (grid, criteria) in [("b", "parks"), ("a", "schools"), ("a", "parks")] {
        let dir = temp.path().join("heatmaps").join(grid);
        fs::create_dir_all(&dir).expect("dir");
        fs::write(dir.join(format!("{criteria}.json")), "{}").expect("write");
    }
    let store = GridStore::new(temp.path());
    let pairs = store.list_heatmaps().expect("list");
    let expected: Vec<(String, String)> = [("a", "parks"), ("a", "schools"), ("b", "parks")]
        .into_iter()
        .map(|(g, c)| (g.to_string(), c.to_string()))
        .collect();
    assert_eq!(pairs, expected);
}

#[test]
fn atomic_writes_leave_no_temporary_files() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    store.dump_grid(&grid("lyon_part1")).expect("first");
    store.dump_grid(&grid("lyon_part1")).expect("overwrite");
    let path = store
        .write_static("areas.json", &json!({"lyon_part1": 1}))
        .expect("static");
    assert!(path.ends_with("static/areas.json"));

    let names: Vec<String> = fs::read_dir(temp.path().join("grids"))
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["lyon_part1.json".to_string()]);
    assert_eq!(store.list_static().expect("static"), vec!["areas.json".to_string()]);
}

#[test]
fn reports_are_written_under_reports_dir() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let store = GridStore::new(temp.path());
    let path = store
        .write_report("reduce_all", &json!({"succeeded": 4}))
        .expect("report");
    assert_eq!(path, temp.path().join("reports/reduce_all.json"));
    let body = fs::read_to_string(path).expect("read");
    assert_eq!(body, r#"{"succeeded":4}"#);
}

#[test]
fn same_key_holders_never_overlap() {
    let locks = Arc::new(KeyLocks::default());
    let inside = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let overlaps = Arc::clone(&overlaps);
            thread::spawn(move || {
                for _ in 0..50 {
                    locks.with_key("lyon_part1/schools", || {
                        if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}
