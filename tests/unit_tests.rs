// Unit tests for Spark Parking

use geo::{HaversineDistance, Point};
use spark_parking::core::{
    availability::is_open_now,
    distance::haversine_distance,
    features::{build_signals, FEATURE_COUNT, FEATURE_NAMES},
    normalize::{discount_to_bit, parse_hour, rate_to_number, yesno_to_bit},
};
use spark_parking::models::{CellValue, FacilityRecord, UserLocation};

fn text(s: &str) -> CellValue {
    CellValue::from(s)
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(14.5995, 120.9842, 14.5995, 120.9842);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_symmetric() {
    let there = haversine_distance(14.5995, 120.9842, 14.5547, 121.0244);
    let back = haversine_distance(14.5547, 121.0244, 14.5995, 120.9842);
    assert!((there - back).abs() < 1e-9);
}

#[test]
fn test_haversine_matches_geo_crate() {
    // geo uses a slightly different mean radius (6371.0088 km)
    let pairs = [
        ((14.5995, 120.9842), (14.5547, 121.0244)),
        ((14.5507, 121.0509), (10.3157, 123.8854)),
        ((40.7580, -73.9855), (40.6782, -73.9442)),
    ];

    for ((lat1, lon1), (lat2, lon2)) in pairs {
        let ours = haversine_distance(lat1, lon1, lat2, lon2);
        let theirs = Point::new(lon1, lat1).haversine_distance(&Point::new(lon2, lat2)) / 1000.0;
        let relative = (ours - theirs).abs() / theirs;
        assert!(relative < 1e-5, "{} vs {}", ours, theirs);
    }
}

#[test]
fn test_one_hundredth_degree_of_latitude() {
    let distance = haversine_distance(14.0, 121.0, 14.01, 121.0);
    assert!((distance - 1.112).abs() < 0.01);
}

#[test]
fn test_yesno_to_bit() {
    assert_eq!(yesno_to_bit(&text("yes")), 1);
    assert_eq!(yesno_to_bit(&text(" Y ")), 1);
    assert_eq!(yesno_to_bit(&text("No")), 0);
    assert_eq!(yesno_to_bit(&text("maybe")), 0);
    assert_eq!(yesno_to_bit(&CellValue::Number(1.0)), 1);
    assert_eq!(yesno_to_bit(&CellValue::Number(0.0)), 0);
    assert_eq!(yesno_to_bit(&CellValue::Empty), 0);
}

#[test]
fn test_discount_to_bit() {
    assert_eq!(discount_to_bit(&text("PWD/SC exempt")), 1);
    assert_eq!(discount_to_bit(&text("20% discount")), 1);
    assert_eq!(discount_to_bit(&text("yes")), 1);
    assert_eq!(discount_to_bit(&text("none")), 0);
    assert_eq!(discount_to_bit(&CellValue::Number(1.0)), 0);
}

#[test]
fn test_rate_to_number() {
    assert_eq!(rate_to_number(&text("PHP 1,200.50 / 3hrs")), 1200.5);
    assert_eq!(rate_to_number(&text("Php 40")), 40.0);
    assert_eq!(rate_to_number(&text("free")), 0.0);
    assert_eq!(rate_to_number(&CellValue::Number(35.0)), 35.0);
    assert_eq!(rate_to_number(&CellValue::Empty), 0.0);
}

#[test]
fn test_parse_hour() {
    assert_eq!(parse_hour(&text("7:30 AM")), Some(7));
    assert_eq!(parse_hour(&text("10:00 PM")), Some(22));
    assert_eq!(parse_hour(&text("6AM")), Some(6));
    assert_eq!(parse_hour(&text("18:45")), Some(18));
    assert_eq!(parse_hour(&text("24/7")), Some(0));
    assert_eq!(parse_hour(&text("N/A")), None);
    assert_eq!(parse_hour(&text("")), None);
    assert_eq!(parse_hour(&text("sometimes")), None);
    assert_eq!(parse_hour(&CellValue::Number(7.0)), None);
}

#[test]
fn test_open_now_examples() {
    assert!(is_open_now(&text("24/7"), &text("24/7"), 3));
    assert!(!is_open_now(&text("7:00 AM"), &text("10:00 PM"), 23));
    assert!(is_open_now(&text("10:00 PM"), &text("6:00 AM"), 2));
    assert!(is_open_now(&text("N/A"), &text("N/A"), 12));
    assert!(is_open_now(&text("8:00 AM"), &text("8:00 AM"), 3));
}

#[test]
fn test_overnight_window_closed_midday() {
    assert!(!is_open_now(&text("10:00 PM"), &text("6:00 AM"), 12));
    assert!(is_open_now(&text("10:00 PM"), &text("6:00 AM"), 22));
    assert!(!is_open_now(&text("10:00 PM"), &text("6:00 AM"), 6));
}

#[test]
fn test_feature_vector_always_seven_wide() {
    assert_eq!(FEATURE_NAMES.len(), FEATURE_COUNT);

    let user = UserLocation {
        lat: 14.5547,
        lng: 121.0244,
        time_of_day: 9,
    };
    let records = [
        FacilityRecord::at(14.56, 121.03),
        FacilityRecord {
            opening: text("gibberish"),
            guards: CellValue::Number(3.0),
            initial_rate: text("n/a"),
            ..FacilityRecord::at(14.0, 120.0)
        },
    ];

    for record in &records {
        let vector = build_signals(record, &user).unwrap().to_vector();
        assert_eq!(vector.as_slice().len(), 7);
        assert!(vector.as_slice().iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_feature_vector_order() {
    let user = UserLocation {
        lat: 14.5547,
        lng: 121.0244,
        time_of_day: 23,
    };
    let record = FacilityRecord {
        opening: text("7:00 AM"),
        closing: text("10:00 PM"),
        cctvs: text("YES"),
        guards: text("NO"),
        initial_rate: text("PHP 45"),
        pwd_discount: text("exempt"),
        street_parking: text("Y"),
        ..FacilityRecord::at(14.5547, 121.0244)
    };

    let vector = build_signals(&record, &user).unwrap().to_vector();
    assert_eq!(vector.as_slice(), &[0.0, 0.0, 1.0, 0.0, 45.0, 1.0, 1.0]);
}
