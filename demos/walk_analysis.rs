//! End-to-end walk analysis against the public OSRM, Overpass and Nominatim servers.
//!
//! Run with: cargo run --example walk_analysis --features http -- "Marble Arch" "Kensington Palace"

use green_exposure::{ProviderConfig, WalkAnalyzer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let start = args.next().unwrap_or_else(|| "Marble Arch, London".to_string());
    let end = args.next().unwrap_or_else(|| "Kensington Palace, London".to_string());

    println!("Walk Analysis");
    println!("=============");
    println!("From: {}", start);
    println!("To:   {}\n", end);

    let analyzer = WalkAnalyzer::new(ProviderConfig::default())?;
    let walk = analyzer.analyze_walk_by_name(&start, &end).await?;
    let analysis = &walk.analysis;

    println!("Start: {}", walk.start_name.as_deref().unwrap_or("?"));
    println!("End:   {}", walk.end_name.as_deref().unwrap_or("?"));
    println!(
        "OSRM distance:     {:.2} km ({:.0} min)",
        walk.routed_distance_km,
        walk.duration_s / 60.0
    );
    println!("Measured distance: {:.2} km", analysis.result.total_distance_km);
    println!("Green distance:    {:.2} km", analysis.green_distance_km);
    println!("Green exposure:    {:.1}%", analysis.result.green_percentage);

    if analysis.green_spaces.is_available() {
        println!("Green polygons:    {}", analysis.green_spaces.polygons().len());
    } else {
        println!("Green spaces unavailable, exposure reported as 0%");
    }

    Ok(())
}
