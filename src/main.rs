use safezone::{
    AlertScan, CandidateRecord, GeoPoint, GeohashCodec, MatcherConfig, ProximityMatcher,
    SosDocument, Timestamp,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const HOUR: Duration = Duration::from_secs(3600);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("safezone {} proximity demo", safezone::VERSION);

    let config = MatcherConfig::default();
    println!(
        "\nPolicy: radius {} m, ttl {:?}, search precision {}",
        config.radius_meters, config.ttl, config.precision
    );

    // Listener in San Francisco
    let listener = GeoPoint::new(37.7749, -122.4194)?;
    let now = Timestamp::now();

    println!("\nGeohashes for {}:", listener);
    for precision in [1, 5, 8, 12] {
        let hash = GeohashCodec::encode(&listener, precision)?;
        let cell = GeohashCodec::decode_bounding_box(&hash);
        println!("  {:>2} chars: {:<12} cell {}", precision, hash, cell);
    }

    let matcher = ProximityMatcher::new(config)?;
    let range = matcher.search_range(&listener)?;
    println!("\nStore query range: {}", range);

    let candidates = vec![
        CandidateRecord::locate(
            "a",
            GeoPoint::new(37.7755, -122.4190)?,
            now.saturating_sub(HOUR),
            8,
        )?,
        CandidateRecord::locate(
            "b",
            GeoPoint::new(37.7755, -122.4190)?,
            now.saturating_sub(HOUR * 25),
            8,
        )?,
        CandidateRecord::locate(
            "c",
            GeoPoint::new(40.7128, -74.0060)?,
            now.saturating_sub(HOUR),
            8,
        )?,
    ];

    println!("\nCandidates:");
    for candidate in &candidates {
        println!(
            "  {} at {} [{}], {:.0} m away",
            candidate.id,
            candidate.point,
            candidate.geohash,
            listener.distance_to(&candidate.point)
        );
    }

    let result = matcher.match_candidates(&listener, &candidates, now)?;
    println!("\nWithin radius: {:?}", result.within_radius);
    println!("Expired:       {:?}", result.expired);
    println!("Stats:         {:?}", result.stats);

    // Same decision through the SOS document layer
    let sos_point = GeoPoint::new(37.7760, -122.4185)?;
    let sos = SosDocument::trigger("user-42", "medical", &sos_point, Some(8.0), now)?;
    println!("\nSOS document: {}", serde_json::to_string_pretty(&sos)?);

    let report = AlertScan::new(config)?.scan(&listener, [("sos-1", &sos)], now)?;
    println!(
        "Alert report: notify {:?}, purge {:?}",
        report.notify, report.purge
    );

    Ok(())
}
