//! Row normalization and stable-key derivation
//!
//! Pure functions that clean one raw CSV row into a validated
//! [`ImportRow`], plus the stable-key scheme that gives every place a
//! deterministic identity across repeated imports. Malformed individual
//! fields degrade to empty strings; only a missing city, type, or name
//! makes a row invalid.

use crate::import::RawRow;
use crate::models::{Category, ImportRow};

/// Cap on the number of tags kept per place
pub const MAX_TAGS: usize = 20;

/// Canonical destination labels, matched case-insensitively against
/// common aliases. Unrecognized cities pass through trimmed as-is;
/// the directory is allowed to grow new destinations ahead of this list.
const CITY_ALIASES: &[(&[&str], &str)] = &[
    (&["singapore"], "Singapore"),
    (
        &["hcmc", "ho chi minh", "ho chi minh city"],
        "Ho Chi Minh City",
    ),
    (&["kl", "kuala lumpur"], "Kuala Lumpur"),
    (&["bkk", "bangkok"], "Bangkok"),
];

/// Venue-type aliases (lowercased input → canonical label).
/// Unmatched input is title-cased and kept.
const TYPE_ALIASES: &[(&[&str], &str)] = &[
    (&["restaurant"], "Restaurant"),
    (&["coffee", "cafe", "caf\u{e9}"], "Coffee"),
    (&["bar", "drinks", "pub"], "Bar"),
    (
        &["hawker", "hawker center", "hawker centre", "food court"],
        "Hawker Center",
    ),
    (&["bakery"], "Bakery"),
    (&["dessert"], "Dessert"),
    (&["museum"], "Museum"),
    (&["market"], "Market"),
];

/// Canonical types that imply `category = dining` when the CSV carries
/// no explicit category column
const DINING_TYPES: &[&str] = &[
    "Restaurant",
    "Coffee",
    "Bar",
    "Hawker Center",
    "Bakery",
    "Dessert",
];

/// Map free-text city input onto a canonical destination label
pub fn normalize_city(s: &str) -> String {
    let v = s.trim();
    if v.is_empty() {
        return String::new();
    }
    let low = v.to_lowercase();
    for (aliases, canonical) in CITY_ALIASES {
        if aliases.contains(&low.as_str()) {
            return (*canonical).to_string();
        }
    }
    v.to_string()
}

/// Map free-text venue type onto a canonical label; unknown types are
/// title-cased and kept so they can be filtered later
pub fn normalize_type(s: &str) -> String {
    let v = s.trim().to_lowercase();
    if v.is_empty() {
        return String::new();
    }
    for (aliases, canonical) in TYPE_ALIASES {
        if aliases.contains(&v.as_str()) {
            return (*canonical).to_string();
        }
    }
    title_case(&v)
}

/// Resolve the dining/activity classification: an explicit category
/// column wins, otherwise inferred from the normalized type
pub fn normalize_category(explicit: &str, place_type: &str) -> Category {
    if let Ok(cat) = explicit.trim().parse::<Category>() {
        return cat;
    }
    if DINING_TYPES.contains(&place_type) {
        Category::Dining
    } else {
        Category::Activity
    }
}

/// Only the literal `$`, `$$`, `$$$` survive; everything else is empty
pub fn normalize_price(s: &str) -> String {
    match s.trim() {
        v @ ("$" | "$$" | "$$$") => v.to_string(),
        _ => String::new(),
    }
}

/// Split a comma-separated tag field: trim, lowercase, drop empties,
/// cap at [`MAX_TAGS`]
pub fn parse_tags(s: &str) -> Vec<String> {
    s.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .collect()
}

/// Title-case each whitespace-separated word
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase a name and collapse internal whitespace runs to single spaces
pub fn normalized_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive the identity key for a place: `city::type::normalized name`.
/// Two calls with equal (city, type, name) up to trimming, case, and
/// whitespace runs always produce equal keys; this is the sole mechanism
/// for recognizing "the same place" across imports.
pub fn stable_key(city: &str, place_type: &str, name: &str) -> String {
    format!("{}::{}::{}", city, place_type, normalized_name(name))
}

fn field<'a>(raw: &'a RawRow, key: &str) -> &'a str {
    raw.get(key).map(String::as_str).unwrap_or("")
}

/// Clean one raw CSV row into a validated record.
/// `row_number` is the 1-based position in the original file; invalid
/// rows are returned (not dropped) so previews can report them.
pub fn normalize_row(raw: &RawRow, row_number: usize) -> ImportRow {
    let city = normalize_city(field(raw, "city"));
    let place_type = normalize_type(field(raw, "type"));
    let name = field(raw, "name").trim().to_string();
    let category = normalize_category(field(raw, "category"), &place_type);

    let valid = !city.is_empty() && !place_type.is_empty() && !name.is_empty();

    ImportRow {
        row_number,
        valid,
        city,
        place_type,
        category,
        name,
        neighborhood: field(raw, "neighborhood").trim().to_string(),
        hours: field(raw, "hours").trim().to_string(),
        price: normalize_price(field(raw, "price")),
        tags: parse_tags(field(raw, "tags")),
        google_maps_url: field(raw, "googlemapsurl").trim().to_string(),
        reservation_url: field(raw, "reservationurl").trim().to_string(),
        notes: field(raw, "notes").trim().to_string(),
        recommended_by: field(raw, "recommendedby").trim().to_string(),
    }
}

impl ImportRow {
    /// Identity key for this row's normalized fields
    pub fn stable_key(&self) -> String {
        stable_key(&self.city, &self.place_type, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn raw(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
    }

    #[test]
    fn test_normalize_city() {
        assert_eq!(normalize_city("singapore"), "Singapore");
        assert_eq!(normalize_city("  HCMC "), "Ho Chi Minh City");
        assert_eq!(normalize_city("ho chi minh"), "Ho Chi Minh City");
        assert_eq!(normalize_city("kl"), "Kuala Lumpur");
        // Unknown city passes through trimmed, not rejected
        assert_eq!(normalize_city(" Penang "), "Penang");
        assert_eq!(normalize_city("   "), "");
    }

    #[test]
    fn test_normalize_type_aliases() {
        assert_eq!(normalize_type("cafe"), "Coffee");
        assert_eq!(normalize_type("COFFEE"), "Coffee");
        assert_eq!(normalize_type("drinks"), "Bar");
        assert_eq!(normalize_type("food court"), "Hawker Center");
        // Unknown type is title-cased and kept
        assert_eq!(normalize_type("speakeasy lounge"), "Speakeasy Lounge");
        assert_eq!(normalize_type(""), "");
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("dining", "Museum"), Category::Dining);
        assert_eq!(normalize_category("ACTIVITY", "Restaurant"), Category::Activity);
        // No explicit value: inferred from type
        assert_eq!(normalize_category("", "Coffee"), Category::Dining);
        assert_eq!(normalize_category("", "Museum"), Category::Activity);
        assert_eq!(normalize_category("lunch", "Bar"), Category::Dining);
    }

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price("$$"), "$$");
        assert_eq!(normalize_price(" $ "), "$");
        assert_eq!(normalize_price("$$$$"), "");
        assert_eq!(normalize_price("cheap"), "");
    }

    #[test]
    fn test_parse_tags_caps_at_twenty() {
        let source = (0..30).map(|i| format!("Tag{}", i)).collect::<Vec<_>>().join(",");
        let tags = parse_tags(&source);
        assert_eq!(tags.len(), MAX_TAGS);
        assert_eq!(tags[0], "tag0");
        assert!(tags.iter().all(|t| t.chars().all(|c| !c.is_uppercase())));
    }

    #[test]
    fn test_parse_tags_drops_empties() {
        assert_eq!(parse_tags("kopi, , Brunch ,"), vec!["kopi", "brunch"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_stable_key_determinism() {
        assert_eq!(
            stable_key("Singapore", "Bar", "The  Loft "),
            stable_key("Singapore", "Bar", "the loft")
        );
        assert_eq!(
            stable_key("Singapore", "Bar", "The  Loft "),
            "Singapore::Bar::the loft"
        );
    }

    #[test]
    fn test_normalize_row_validity() {
        let row = normalize_row(
            &raw(&[("city", "singapore"), ("type", "coffee"), ("name", " Toast Box ")]),
            1,
        );
        assert!(row.valid);
        assert_eq!(row.city, "Singapore");
        assert_eq!(row.place_type, "Coffee");
        assert_eq!(row.name, "Toast Box");
        assert_eq!(row.category, Category::Dining);

        for missing in ["city", "type", "name"] {
            let mut fields = vec![
                ("city", "singapore"),
                ("type", "coffee"),
                ("name", "Toast Box"),
            ];
            fields.retain(|(k, _)| *k != missing);
            let row = normalize_row(&raw(&fields), 2);
            assert!(!row.valid, "row missing {} should be invalid", missing);
        }
    }

    #[test]
    fn test_normalize_row_degrades_bad_fields() {
        let row = normalize_row(
            &raw(&[
                ("city", "singapore"),
                ("type", "coffee"),
                ("name", "Toast Box"),
                ("price", "cheap"),
                ("tags", " , ,"),
            ]),
            1,
        );
        assert!(row.valid);
        assert_eq!(row.price, "");
        assert!(row.tags.is_empty());
    }

    #[test]
    fn test_normalization_idempotence() {
        let first = normalize_row(
            &raw(&[
                ("city", "hcmc"),
                ("type", "food court"),
                ("category", ""),
                ("name", "  Ben Thanh   Street Food "),
                ("price", "$$"),
                ("tags", "Cheap Eats, LOCAL"),
            ]),
            1,
        );

        // Feed the normalized output back through as a fresh raw row
        let again = normalize_row(
            &raw(&[
                ("city", &first.city),
                ("type", &first.place_type),
                ("category", first.category.as_str()),
                ("name", &first.name),
                ("price", &first.price),
                ("tags", &first.tags.join(",")),
            ]),
            1,
        );

        assert_eq!(first, again);
        assert_eq!(first.city, "Ho Chi Minh City");
        assert_eq!(first.place_type, "Hawker Center");
        assert_eq!(first.tags, vec!["cheap eats", "local"]);
    }
}
