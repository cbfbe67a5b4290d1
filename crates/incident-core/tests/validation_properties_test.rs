//! Property tests for the validator and location builder

use incident_core::models::{FieldKey, GeoPoint, IncidentType};
use incident_core::validation::{build_location, validate, LOCATION_INCOMPLETE};
use proptest::prelude::*;

fn any_type() -> impl Strategy<Value = Option<IncidentType>> {
    prop_oneof![
        Just(None),
        Just(Some(IncidentType::Fire)),
        Just(Some(IncidentType::Electrical)),
        Just(Some(IncidentType::Hazmat)),
    ]
}

proptest! {
    #[test]
    fn blank_title_always_errors(
        title in "[ \t\n]{0,8}",
        incident_type in any_type(),
        lat in ".{0,12}",
        lng in ".{0,12}",
    ) {
        let errors = validate(&title, incident_type, &lat, &lng);
        prop_assert!(errors.contains(FieldKey::Title));
    }

    #[test]
    fn single_coordinate_gives_one_location_error(
        value in "-?[0-9]{1,3}(\\.[0-9]{1,4})?",
        lat_side in any::<bool>(),
    ) {
        let (lat, lng) = if lat_side { (value.as_str(), "") } else { ("", value.as_str()) };
        let errors = validate("Title", Some(IncidentType::Fire), lat, lng);

        prop_assert_eq!(errors.get(FieldKey::Location), Some(LOCATION_INCOMPLETE));
        prop_assert_eq!(errors.len(), 1);
    }

    #[test]
    fn in_range_pairs_round_trip(
        latitude in -90.0f64..=90.0,
        longitude in -180.0f64..=180.0,
    ) {
        let lat = latitude.to_string();
        let lng = longitude.to_string();

        let errors = validate("Title", Some(IncidentType::Hazmat), &lat, &lng);
        prop_assert!(!errors.contains(FieldKey::Location));
        prop_assert_eq!(build_location(&lat, &lng), Some(GeoPoint::new(latitude, longitude)));
    }

    #[test]
    fn out_of_range_latitude_errors_but_still_builds(
        latitude in 90.001f64..1.0e6,
        longitude in -180.0f64..=180.0,
    ) {
        let lat = latitude.to_string();
        let lng = longitude.to_string();

        let errors = validate("Title", Some(IncidentType::Fire), &lat, &lng);
        prop_assert!(errors.get(FieldKey::Location).unwrap().starts_with("Latitude"));
        prop_assert!(build_location(&lat, &lng).is_some());
    }

    #[test]
    fn validate_is_deterministic(
        title in ".{0,10}",
        incident_type in any_type(),
        lat in ".{0,10}",
        lng in ".{0,10}",
    ) {
        prop_assert_eq!(
            validate(&title, incident_type, &lat, &lng),
            validate(&title, incident_type, &lat, &lng)
        );
    }
}

#[test]
fn test_documented_round_trip() {
    assert_eq!(build_location("12.5", "-45.25"), Some(GeoPoint::new(12.5, -45.25)));
    assert_eq!(build_location("", ""), None);
    assert_eq!(build_location("91", "0"), Some(GeoPoint::new(91.0, 0.0)));
}
