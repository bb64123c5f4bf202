//! Example of scoring many routes against one green-space set.
//!
//! Run with: cargo run --example batch_exposure --features parallel

use green_exposure::{compute_exposure, compute_exposures_parallel, GeoPoint, GreenPolygon};
use std::time::Instant;

fn main() {
    println!("Batch Green Exposure Example\n");

    // A 20x20 grid of small parks over central London
    let mut parks = Vec::new();
    for i in 0..20 {
        for j in 0..20 {
            let lat = 51.48 + i as f64 * 0.004;
            let lng = -0.20 + j as f64 * 0.006;
            parks.push(GreenPolygon::new(vec![
                GeoPoint::new(lat, lng),
                GeoPoint::new(lat, lng + 0.002),
                GeoPoint::new(lat + 0.0015, lng + 0.002),
                GeoPoint::new(lat + 0.0015, lng),
            ]));
        }
    }

    // 500 zig-zag walks across the grid
    let routes: Vec<Vec<GeoPoint>> = (0..500)
        .map(|r| {
            (0..80)
                .map(|i| {
                    let t = i as f64;
                    GeoPoint::new(
                        51.48 + (t * 0.001 + r as f64 * 0.00013) % 0.08,
                        -0.20 + (t * 0.0015 * ((r % 7) + 1) as f64) % 0.12,
                    )
                })
                .collect()
        })
        .collect();

    println!("Parks: {}, routes: {} x 80 points\n", parks.len(), routes.len());

    let start = Instant::now();
    let linear: Vec<f64> = routes.iter().map(|r| compute_exposure(r, &parks)).collect();
    println!("Linear scan:        {:?}", start.elapsed());

    let start = Instant::now();
    let indexed = compute_exposures_parallel(&routes, parks);
    println!("Indexed + parallel: {:?}", start.elapsed());

    assert_eq!(linear, indexed);

    let mean = indexed.iter().sum::<f64>() / indexed.len() as f64;
    let max = indexed.iter().cloned().fold(0.0, f64::max);
    println!("\nMean exposure: {:.1}%, max: {:.1}%", mean, max);
}
