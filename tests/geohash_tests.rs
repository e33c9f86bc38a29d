use safezone::{BASE32, GeoPoint, Geohash, GeohashCodec, MAX_PRECISION, SafeZoneError};

fn point(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon).unwrap()
}

#[test]
fn test_geohash_generation_precision() {
    let nyc = point(40.7128, -74.0060);

    for precision in 1..=MAX_PRECISION {
        let hash = GeohashCodec::encode(&nyc, precision).unwrap();
        assert_eq!(hash.precision(), precision);

        // Verify geohash contains only valid characters
        for ch in hash.as_str().bytes() {
            assert!(BASE32.contains(&ch));
        }
    }

    // Longer hashes extend shorter ones
    let geohash_5 = GeohashCodec::encode(&nyc, 5).unwrap();
    let geohash_8 = GeohashCodec::encode(&nyc, 8).unwrap();
    assert!(geohash_8.starts_with(&geohash_5));
    assert_eq!(geohash_5.as_str(), "dr5re");
}

#[test]
fn test_world_cities() {
    let cases = [
        ((37.7749, -122.4194), "9q8yyk8y"),
        ((40.7128, -74.0060), "dr5regw3"),
        ((51.5074, -0.1278), "gcpvj"),
        ((57.64911, 10.40744), "u4pruydqqvj"),
    ];

    for ((lat, lon), expected) in cases {
        let hash = GeohashCodec::encode(&point(lat, lon), expected.len()).unwrap();
        assert_eq!(hash.as_str(), expected, "({lat}, {lon})");
    }
}

#[test]
fn test_decoded_cell_contains_point() {
    let locations = [
        point(37.7749, -122.4194),
        point(-33.8568, 151.2153),
        point(0.0, 0.0),
        point(90.0, 180.0),
        point(-90.0, -180.0),
        point(64.1466, -21.9426),
    ];

    for location in locations {
        for precision in 1..=MAX_PRECISION {
            let hash = GeohashCodec::encode(&location, precision).unwrap();
            let cell = GeohashCodec::decode_bounding_box(&hash);
            assert!(
                cell.contains(&location),
                "{location} not in {cell} at precision {precision}"
            );
        }
    }
}

#[test]
fn test_cells_shrink_with_precision() {
    let location = point(-33.8568, 151.2153);
    let mut previous = f64::INFINITY;

    for precision in 1..=MAX_PRECISION {
        let hash = GeohashCodec::encode(&location, precision).unwrap();
        let cell = GeohashCodec::decode_bounding_box(&hash);
        assert!(cell.area() < previous);
        previous = cell.area();

        let (lat_deg, lon_deg) = GeohashCodec::cell_dimensions(precision).unwrap();
        assert_eq!(cell.lat_span(), lat_deg);
        assert_eq!(cell.lon_span(), lon_deg);
    }
}

#[test]
fn test_decode_then_encode_center_is_identity() {
    for text in ["0", "s", "9q8yy", "dr5regw3", "u4pruydqqvj", "zzzzzzzzzzzz"] {
        let hash = Geohash::parse(text).unwrap();
        let (center, _, _) = GeohashCodec::decode(&hash).unwrap();
        assert_eq!(GeohashCodec::encode(&center, hash.precision()).unwrap(), hash);
    }
}

#[test]
fn test_range_at_antimeridian_does_not_wrap() {
    let east = point(0.0, 179.999);
    let west = point(0.0, -179.999);

    let range = GeohashCodec::bounding_box_range(&east, 5).unwrap();
    assert_eq!(range.start.as_str(), "xbpbp");
    assert_eq!(range.end.as_str(), "xbpbr");

    // 222m away, but at the other end of the keyspace
    let west_hash = GeohashCodec::encode(&west, 5).unwrap();
    assert_eq!(west_hash.as_str(), "80000");
    assert!(!range.contains(&west_hash));

    let cell = GeohashCodec::decode_bounding_box(&range.start);
    assert_eq!(cell.max_lon, 180.0);
    assert!(!cell.crosses_antimeridian());
}

#[test]
fn test_invalid_inputs() {
    assert!(matches!(
        GeohashCodec::encode(&point(0.0, 0.0), 0),
        Err(SafeZoneError::InvalidPrecision(0))
    ));
    assert!(matches!(
        GeohashCodec::bounding_box_range(&point(0.0, 0.0), MAX_PRECISION + 1),
        Err(SafeZoneError::InvalidPrecision(13))
    ));
    assert!(matches!(
        Geohash::parse("hello"),
        Err(SafeZoneError::InvalidGeohash(_))
    ));
    assert!(matches!(
        GeoPoint::new(-91.0, 0.0),
        Err(SafeZoneError::InvalidCoordinate { .. })
    ));
}

#[test]
fn test_agrees_with_reference_encoder() {
    let locations = [
        (37.7749, -122.4194),
        (40.7128, -74.0060),
        (-33.8568, 151.2153),
        (35.6762, 139.6503),
        (-22.9068, -43.1729),
        (1.3521, 103.8198),
    ];

    for (lat, lon) in locations {
        for precision in [1, 4, 7, 10] {
            let ours = GeohashCodec::encode(&point(lat, lon), precision).unwrap();
            let reference = geohash::encode(geo::Coord { x: lon, y: lat }, precision).unwrap();
            assert_eq!(ours.as_str(), reference, "({lat}, {lon}) at {precision}");
        }
    }
}
