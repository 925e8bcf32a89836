// Maps user-facing filter names onto the remote API's parameter names

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::SearchFilters;

// UI name -> remote name; every other key passes through as is
const RENAMES: [(&str, &str); 5] = [
    ("yearFrom", "year_from"),
    ("minPrice", "price_from"),
    ("maxPrice", "price_to"),
    ("minMileage", "mileage_from"),
    ("maxMileage", "mileage_to"),
];

/// A single filter value. Serialized without a tag so the remote API sees
/// plain JSON strings, numbers and booleans.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl FilterValue {
    fn is_blank(&self) -> bool {
        matches!(self, FilterValue::Text(s) if s.is_empty())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Flag(value)
    }
}

// Filter state keyed by UI name; `None` is an unset field
pub type RawFilters = BTreeMap<String, Option<FilterValue>>;

// Filter state keyed by remote name, ready to send
pub type NormalizedFilters = BTreeMap<String, FilterValue>;

fn remote_name(key: &str) -> &str {
    RENAMES
        .iter()
        .find(|(ui, _)| *ui == key)
        .map_or(key, |(_, remote)| *remote)
}

/// Renames known keys to the remote convention and drops unset or empty-string
/// values. Values are never validated; the remote API is the authority on that.
pub fn normalize_filters(filters: &RawFilters) -> NormalizedFilters {
    filters
        .iter()
        .filter_map(|(key, value)| match value {
            Some(v) if !v.is_blank() => Some((remote_name(key).to_string(), v.clone())),
            _ => None,
        })
        .collect()
}

impl From<&SearchFilters> for RawFilters {
    fn from(filters: &SearchFilters) -> Self {
        let mut raw = RawFilters::new();
        raw.insert("make".into(), filters.make.clone().map(FilterValue::from));
        raw.insert("model".into(), filters.model.clone().map(FilterValue::from));
        raw.insert("yearFrom".into(), filters.year_from.map(|y| FilterValue::from(i64::from(y))));
        raw.insert("minPrice".into(), filters.min_price.map(FilterValue::from));
        raw.insert("maxPrice".into(), filters.max_price.map(FilterValue::from));
        raw.insert("minMileage".into(), filters.min_mileage.map(mileage_value));
        raw.insert("maxMileage".into(), filters.max_mileage.map(mileage_value));
        raw.insert(
            "transmission".into(),
            filters.transmission.map(|t| FilterValue::from(t.as_str())),
        );
        raw.insert("fuel".into(), filters.fuel.map(|f| FilterValue::from(f.as_str())));
        raw.insert("color".into(), filters.color.clone().map(FilterValue::from));
        raw.insert("doors".into(), filters.doors.map(|d| FilterValue::from(i64::from(d))));
        raw.insert("location".into(), filters.location.clone().map(FilterValue::from));
        raw.insert("hasImage".into(), filters.has_image.map(FilterValue::from));
        raw.insert("priceTo".into(), filters.price_to.map(FilterValue::from));
        // Unknown keys ride along when they hold a plain value
        for (key, value) in &filters.extra {
            raw.entry(key.clone())
                .or_insert_with(|| serde_json::from_value(value.clone()).ok().flatten());
        }
        raw
    }
}

fn mileage_value(km: u64) -> FilterValue {
    match i64::try_from(km) {
        Ok(v) => FilterValue::Integer(v),
        // Out of i64 range; forward as a float rather than reject
        Err(_) => FilterValue::Number(km as f64),
    }
}

impl SearchFilters {
    pub fn normalized(&self) -> NormalizedFilters {
        normalize_filters(&RawFilters::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fuel, Transmission};
    use serde_json::json;

    fn raw(entries: &[(&str, Option<FilterValue>)]) -> RawFilters {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn renames_range_keys() {
        let input = raw(&[
            ("yearFrom", Some(FilterValue::Integer(2018))),
            ("minPrice", Some(FilterValue::Integer(5_000))),
            ("maxPrice", Some(FilterValue::Integer(20_000))),
            ("minMileage", Some(FilterValue::Integer(10_000))),
            ("maxMileage", Some(FilterValue::Integer(150_000))),
        ]);
        let out = normalize_filters(&input);

        assert_eq!(out.get("year_from"), Some(&FilterValue::Integer(2018)));
        assert_eq!(out.get("price_from"), Some(&FilterValue::Integer(5_000)));
        assert_eq!(out.get("price_to"), Some(&FilterValue::Integer(20_000)));
        assert_eq!(out.get("mileage_from"), Some(&FilterValue::Integer(10_000)));
        assert_eq!(out.get("mileage_to"), Some(&FilterValue::Integer(150_000)));
        for (ui, _) in RENAMES {
            assert!(!out.contains_key(ui), "{ui} should not survive normalization");
        }
    }

    #[test]
    fn unknown_keys_pass_through() {
        let input = raw(&[
            ("make", Some("audi".into())),
            ("hasImage", Some(true.into())),
            ("priceTo", Some(FilterValue::Integer(9_000))),
        ]);
        let out = normalize_filters(&input);

        assert_eq!(out.len(), 3);
        assert_eq!(out.get("make"), Some(&FilterValue::from("audi")));
        assert_eq!(out.get("hasImage"), Some(&FilterValue::Flag(true)));
        assert_eq!(out.get("priceTo"), Some(&FilterValue::Integer(9_000)));
    }

    #[test]
    fn unset_and_empty_values_are_dropped() {
        let input = raw(&[
            ("make", Some("".into())),
            ("model", None),
            ("minPrice", None),
            ("color", Some("red".into())),
            ("doors", Some(FilterValue::Integer(0))),
            ("hasImage", Some(false.into())),
        ]);
        let out = normalize_filters(&input);

        assert_eq!(out.len(), 3);
        assert!(!out.contains_key("make"));
        assert!(!out.contains_key("model"));
        assert!(!out.contains_key("price_from"));
        // Zero and false are real values
        assert_eq!(out.get("doors"), Some(&FilterValue::Integer(0)));
        assert_eq!(out.get("hasImage"), Some(&FilterValue::Flag(false)));
    }

    #[test]
    fn malformed_values_are_forwarded() {
        let input = raw(&[("yearFrom", Some("next year".into()))]);
        let out = normalize_filters(&input);
        assert_eq!(out.get("year_from"), Some(&FilterValue::from("next year")));
    }

    #[test]
    fn typed_filters_serialize_to_wire_shape() {
        let filters = SearchFilters {
            make: Some("bmw".into()),
            model: Some(String::new()),
            year_from: Some(2016),
            max_price: Some(30_000),
            transmission: Some(Transmission::Automatic),
            fuel: Some(Fuel::Diesel),
            ..SearchFilters::default()
        };

        let wire = serde_json::to_value(filters.normalized()).expect("should serialize");
        assert_eq!(
            wire,
            json!({
                "make": "bmw",
                "year_from": 2016,
                "price_to": 30000,
                "transmission": "automatic",
                "fuel": "diesel"
            })
        );
    }

    #[test]
    fn stored_extra_keys_are_forwarded() {
        let filters: SearchFilters = serde_json::from_value(json!({
            "make": "bmw",
            "priceTo": 9000,
            "bodyType": "estate",
            "tags": ["a", "b"],
            "seats": null
        }))
        .expect("should parse");

        let wire = serde_json::to_value(filters.normalized()).expect("should serialize");
        assert_eq!(
            wire,
            json!({ "make": "bmw", "priceTo": 9000, "bodyType": "estate" })
        );
    }
}
