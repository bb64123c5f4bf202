//! Basic example of measuring green exposure for a few walks.
//!
//! Run with: cargo run --example basic_exposure

use green_exposure::{
    analyze_encoded_route, analyze_route, encode_polyline, AnalysisConfig, BoundingBox,
    FetchError, GeoPoint, GreenPolygon,
};

fn main() {
    // Rough outline of Hyde Park (London)
    let hyde_park = GreenPolygon::new(vec![
        GeoPoint::new(51.5030, -0.1870),
        GeoPoint::new(51.5030, -0.1520),
        GeoPoint::new(51.5120, -0.1580),
        GeoPoint::new(51.5130, -0.1870),
    ]);

    let parks = move |_: &BoundingBox| -> Result<Vec<GreenPolygon>, FetchError> {
        Ok(vec![hyde_park.clone()])
    };
    let offline = |_: &BoundingBox| -> Result<Vec<GreenPolygon>, FetchError> {
        Err(FetchError::new("provider unavailable"))
    };

    // Through the park
    let park_walk = vec![
        GeoPoint::new(51.5073, -0.1800),
        GeoPoint::new(51.5080, -0.1700),
        GeoPoint::new(51.5090, -0.1600),
    ];

    // Park, then out along Oxford Street
    let mixed_walk = vec![
        GeoPoint::new(51.5090, -0.1620),
        GeoPoint::new(51.5135, -0.1580),
        GeoPoint::new(51.5150, -0.1450),
        GeoPoint::new(51.5160, -0.1350),
    ];

    println!("Green Exposure Examples\n");

    println!("1. Walk through Hyde Park:");
    match analyze_route(&park_walk, &parks) {
        Ok(result) => println!(
            "   {:.2} km, {:.1}% green\n",
            result.total_distance_km, result.green_percentage
        ),
        Err(e) => println!("   Error: {}\n", e),
    }

    println!("2. Park then Oxford Street (encoded polyline):");
    let encoded = encode_polyline(&mixed_walk);
    println!("   Polyline: {}", encoded);
    match analyze_encoded_route(&encoded, &parks, &AnalysisConfig::default()) {
        Ok(analysis) => println!(
            "   {:.2} km, {:.1}% green ({:.2} km green)\n",
            analysis.result.total_distance_km,
            analysis.result.green_percentage,
            analysis.green_distance_km
        ),
        Err(e) => println!("   Error: {}\n", e),
    }

    println!("3. Same walk with the green-space provider offline:");
    match analyze_route(&mixed_walk, &offline) {
        Ok(result) => println!(
            "   {:.2} km, {:.1}% green (distance still measured)\n",
            result.total_distance_km, result.green_percentage
        ),
        Err(e) => println!("   Error: {}\n", e),
    }

    println!("4. A single point:");
    match analyze_route(&park_walk[..1], &parks) {
        Ok(result) => println!("   Unexpected result: {:?}", result),
        Err(e) => println!("   Error: {}", e),
    }
}
