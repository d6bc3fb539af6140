//! Static reference data: major West and Central African cities.
//!
//! Used by location-picker UIs when selecting a school location.

use serde::Serialize;

/// A selectable city with bilingual labels.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub value: &'static str,
    pub label_en: &'static str,
    pub label_fr: &'static str,
    pub country: &'static str,
    /// (latitude, longitude); absent for the generic "other" entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<(f64, f64)>,
}

/// Major cities offered for school location selection.
pub fn african_cities() -> &'static [City] {
    AFRICAN_CITIES
}

static AFRICAN_CITIES: &[City] = &[
    // Cameroon
    City {
        value: "yaounde",
        label_en: "Yaoundé",
        label_fr: "Yaoundé",
        country: "Cameroon",
        coordinates: Some((3.8480, 11.5021)),
    },
    City {
        value: "douala",
        label_en: "Douala",
        label_fr: "Douala",
        country: "Cameroon",
        coordinates: Some((4.0483, 9.7043)),
    },
    City {
        value: "bamenda",
        label_en: "Bamenda",
        label_fr: "Bamenda",
        country: "Cameroon",
        coordinates: Some((5.9631, 10.1591)),
    },
    City {
        value: "bafoussam",
        label_en: "Bafoussam",
        label_fr: "Bafoussam",
        country: "Cameroon",
        coordinates: Some((5.4781, 10.4203)),
    },
    // Nigeria
    City {
        value: "lagos",
        label_en: "Lagos",
        label_fr: "Lagos",
        country: "Nigeria",
        coordinates: Some((6.5244, 3.3792)),
    },
    City {
        value: "abuja",
        label_en: "Abuja",
        label_fr: "Abuja",
        country: "Nigeria",
        coordinates: Some((9.0765, 7.3986)),
    },
    City {
        value: "kano",
        label_en: "Kano",
        label_fr: "Kano",
        country: "Nigeria",
        coordinates: Some((12.0022, 8.5920)),
    },
    // Ghana
    City {
        value: "accra",
        label_en: "Accra",
        label_fr: "Accra",
        country: "Ghana",
        coordinates: Some((5.6037, -0.1870)),
    },
    City {
        value: "kumasi",
        label_en: "Kumasi",
        label_fr: "Kumasi",
        country: "Ghana",
        coordinates: Some((6.6885, -1.6244)),
    },
    // Ivory Coast
    City {
        value: "abidjan",
        label_en: "Abidjan",
        label_fr: "Abidjan",
        country: "Côte d'Ivoire",
        coordinates: Some((5.3600, -4.0083)),
    },
    City {
        value: "yamoussoukro",
        label_en: "Yamoussoukro",
        label_fr: "Yamoussoukro",
        country: "Côte d'Ivoire",
        coordinates: Some((6.8276, -5.2893)),
    },
    // Senegal
    City {
        value: "dakar",
        label_en: "Dakar",
        label_fr: "Dakar",
        country: "Senegal",
        coordinates: Some((14.7167, -17.4677)),
    },
    // Mali
    City {
        value: "bamako",
        label_en: "Bamako",
        label_fr: "Bamako",
        country: "Mali",
        coordinates: Some((12.6392, -8.0029)),
    },
    // Burkina Faso
    City {
        value: "ouagadougou",
        label_en: "Ouagadougou",
        label_fr: "Ouagadougou",
        country: "Burkina Faso",
        coordinates: Some((12.3714, -1.5197)),
    },
    // Generic option
    City {
        value: "other",
        label_en: "Other City",
        label_fr: "Autre Ville",
        country: "Various",
        coordinates: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_list_is_populated() {
        let cities = african_cities();
        assert_eq!(cities.len(), 15);
    }

    #[test]
    fn test_values_are_unique() {
        let cities = african_cities();
        let mut values: Vec<_> = cities.iter().map(|c| c.value).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), cities.len());
    }

    #[test]
    fn test_only_other_lacks_coordinates() {
        for city in african_cities() {
            if city.value == "other" {
                assert!(city.coordinates.is_none());
            } else {
                assert!(city.coordinates.is_some(), "{} lacks coordinates", city.value);
            }
        }
    }

    #[test]
    fn test_coordinates_are_valid() {
        for city in african_cities() {
            if let Some((lat, lon)) = city.coordinates {
                assert!(shared::validation::validate_latitude(lat).is_ok());
                assert!(shared::validation::validate_longitude(lon).is_ok());
            }
        }
    }

    #[test]
    fn test_yaounde_entry() {
        let yaounde = african_cities()
            .iter()
            .find(|c| c.value == "yaounde")
            .unwrap();
        assert_eq!(yaounde.country, "Cameroon");
        assert_eq!(yaounde.coordinates, Some((3.8480, 11.5021)));
    }

    #[test]
    fn test_serializes_with_camel_case_labels() {
        let yaounde = african_cities()
            .iter()
            .find(|c| c.value == "yaounde")
            .unwrap();
        let json = serde_json::to_string(yaounde).unwrap();
        assert!(json.contains("\"labelEn\":\"Yaoundé\""));
        assert!(json.contains("\"labelFr\""));
    }
}
