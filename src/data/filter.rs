use std::collections::BTreeSet;

use super::model::{Apartment, ApartmentTable};

// ---------------------------------------------------------------------------
// Known categories and widget ranges
// ---------------------------------------------------------------------------

/// Cities the scraper covers, as shown to the user.
pub const POSSIBLE_CITIES: &[&str] = &[
    "Amsterdam",
    "Den Haag",
    "Haarlem",
    "Leiden",
    "Rotterdam",
    "Utrecht",
];

/// Interior categories the filter knows about.  Anything else passes through.
pub const KNOWN_INTERIOR_TYPES: &[&str] = &["furnished", "unfurnished", "part-furnished", "shell"];

pub const MAX_PRICE_CEILING: u32 = 3500;
pub const MAX_SURFACE_CEILING: u32 = 250;
pub const MAX_DAYS_ONLINE_CEILING: u32 = 60;
pub const DEFAULT_RESULT_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// The user's current filter selection, passed by value into each filter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Allowed cities; matched after [`normalize_city`].  Empty matches nothing.
    pub cities: BTreeSet<String>,
    /// Inclusive upper bound on `price`.
    pub max_price: u32,
    /// Inclusive lower bound on `surface_area_amount`.
    pub min_surface: u32,
    /// Allowed interior categories (case-insensitive).
    pub interior_types: BTreeSet<String>,
    /// Inclusive upper bound on days online.
    pub max_days_online: u32,
    /// Hard cap on returned rows.
    pub result_limit: usize,
}

impl FilterCriteria {
    /// Everything selected, the widgets' initial state.
    pub fn show_all(result_limit: usize) -> Self {
        Self {
            cities: POSSIBLE_CITIES.iter().map(|c| c.to_string()).collect(),
            max_price: MAX_PRICE_CEILING,
            min_surface: 0,
            interior_types: KNOWN_INTERIOR_TYPES.iter().map(|t| title_case(t)).collect(),
            max_days_online: MAX_DAYS_ONLINE_CEILING,
            result_limit,
        }
    }

    /// Whether a single listing satisfies every predicate.
    pub fn matches(&self, apartment: &Apartment) -> bool {
        self.matches_city(&apartment.city)
            && apartment.price <= f64::from(self.max_price)
            && apartment.surface_area_amount >= f64::from(self.min_surface)
            && self.matches_interior(&apartment.interior_type)
            && apartment.days_online() <= i64::from(self.max_days_online)
    }

    fn matches_city(&self, city: &str) -> bool {
        let city = normalize_city(city);
        self.cities.iter().any(|c| normalize_city(c) == city)
    }

    /// Unknown or blank categories are never excluded.
    fn matches_interior(&self, interior_type: &str) -> bool {
        let lowered = interior_type.to_lowercase();
        interior_type.is_empty()
            || !KNOWN_INTERIOR_TYPES.contains(&lowered.as_str())
            || self
                .interior_types
                .iter()
                .any(|t| t.to_lowercase() == lowered)
    }
}

/// Lowercase and hyphenate a city name: `"Den Haag"` → `"den-haag"`.
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase().replace(' ', "-")
}

/// `"part-furnished"` → `"Part-Furnished"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = !ch.is_alphanumeric();
    }
    out
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Return the listings that pass all predicates, in table order, capped at
/// `criteria.result_limit`.
pub fn filter_apartments<'a>(
    table: &'a ApartmentTable,
    criteria: &FilterCriteria,
) -> Vec<&'a Apartment> {
    table
        .apartments
        .iter()
        .filter(|apt| criteria.matches(apt))
        .take(criteria.result_limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::data::model::tests::apartment;

    fn criteria() -> FilterCriteria {
        FilterCriteria::show_all(DEFAULT_RESULT_LIMIT)
    }

    fn table(apartments: Vec<Apartment>) -> ApartmentTable {
        ApartmentTable::new(apartments, Vec::new())
    }

    fn titles(out: &[&Apartment]) -> Vec<String> {
        out.iter().map(|a| a.title.clone()).collect()
    }

    #[test]
    fn city_match_is_normalized() {
        let mut apt = apartment("a");
        apt.city = "Den Haag".into();
        let mut c = criteria();
        c.cities = BTreeSet::from(["den-haag".to_string()]);
        assert!(c.matches(&apt));

        apt.city = "den-haag".into();
        c.cities = BTreeSet::from(["Den Haag".to_string()]);
        assert!(c.matches(&apt));

        c.cities.clear();
        assert!(!c.matches(&apt), "empty city set matches nothing");
    }

    #[test]
    fn price_and_surface_bounds_are_inclusive() {
        let mut apt = apartment("a");
        apt.price = 1750.0;
        apt.surface_area_amount = 45.0;
        let mut c = criteria();
        c.max_price = 1750;
        c.min_surface = 45;
        assert!(c.matches(&apt));

        c.max_price = 1749;
        assert!(!c.matches(&apt));
        c.max_price = 1750;
        c.min_surface = 46;
        assert!(!c.matches(&apt));
    }

    #[test]
    fn days_online_bound_is_inclusive() {
        let apt = apartment("a"); // 9 days online
        let mut c = criteria();
        c.max_days_online = 9;
        assert!(c.matches(&apt));
        c.max_days_online = 8;
        assert!(!c.matches(&apt));
    }

    #[test]
    fn interior_pass_through_rule() {
        let mut c = criteria();
        c.interior_types = BTreeSet::from(["Unfurnished".to_string()]);

        let mut apt = apartment("a");
        apt.interior_type = "Furnished".into();
        assert!(!c.matches(&apt));

        apt.interior_type = "unfurnished".into();
        assert!(c.matches(&apt));

        // null normalized to "?" at load time
        apt.interior_type = "?".into();
        assert!(c.matches(&apt));

        apt.interior_type = "".into();
        assert!(c.matches(&apt));

        apt.interior_type = "Upholstered".into();
        assert!(c.matches(&apt));

        c.interior_types.clear();
        apt.interior_type = "?".into();
        assert!(c.matches(&apt));
    }

    #[test]
    fn output_satisfies_every_predicate() {
        let cities = ["amsterdam", "utrecht", "den-haag", "groningen"];
        let interiors = ["Furnished", "Shell", "?", "Unfurnished", "Part-furnished"];
        let mut rows = Vec::new();
        for i in 0..200u32 {
            let mut apt = apartment(&format!("apt-{i}"));
            apt.city = cities[i as usize % 4].into();
            apt.price = f64::from(800 + (i * 37) % 2400);
            apt.surface_area_amount = f64::from(20 + (i * 7) % 60);
            apt.interior_type = interiors[i as usize % 5].into();
            apt.last_seen_at = apt.first_seen_at + Duration::days(i64::from((i * 3) % 20));
            rows.push(apt);
        }
        let t = table(rows);
        let mut c = criteria();
        c.cities = BTreeSet::from(["Amsterdam".into(), "Den Haag".into()]);
        c.max_price = 2500;
        c.min_surface = 40;
        c.interior_types = BTreeSet::from(["Furnished".into()]);
        c.max_days_online = 10;

        let predicates: [(&str, Box<dyn Fn(&Apartment) -> bool>); 5] = [
            ("city", Box::new(|a: &Apartment| ["amsterdam", "den-haag"].contains(&a.city.as_str()))),
            ("price", Box::new(|a: &Apartment| a.price <= 2500.0)),
            ("surface", Box::new(|a: &Apartment| a.surface_area_amount >= 40.0)),
            (
                "interior",
                Box::new(|a: &Apartment| a.interior_type == "Furnished" || a.interior_type == "?"),
            ),
            ("days", Box::new(|a: &Apartment| a.days_online() <= 10)),
        ];

        // each predicate alone must reject at least one row
        for (k, (name, pred)) in predicates.iter().enumerate() {
            let only_this_fails = t.apartments.iter().any(|a| {
                !pred(a)
                    && predicates
                        .iter()
                        .enumerate()
                        .all(|(j, (_, other))| j == k || other(a))
            });
            assert!(only_this_fails, "no row is excluded by {name} alone");
        }

        let out = filter_apartments(&t, &c);
        assert!(!out.is_empty());
        for apt in &out {
            for (name, pred) in &predicates {
                assert!(pred(*apt), "{} violates {name}", apt.title);
            }
        }
        let expected = t
            .apartments
            .iter()
            .filter(|&a| predicates.iter().all(|(_, p)| p(a)))
            .count();
        assert_eq!(out.len(), expected);
    }

    #[test]
    fn result_limit_caps_output_in_table_order() {
        let t = table((0..10).map(|i| apartment(&format!("apt-{i}"))).collect());
        let mut c = criteria();
        c.result_limit = 3;
        assert_eq!(titles(&filter_apartments(&t, &c)), ["apt-0", "apt-1", "apt-2"]);

        c.result_limit = 0;
        assert!(filter_apartments(&t, &c).is_empty());

        c.result_limit = 100;
        assert_eq!(filter_apartments(&t, &c).len(), 10);
    }

    #[test]
    fn filtering_is_idempotent() {
        let t = table((0..6).map(|i| apartment(&format!("apt-{i}"))).collect());
        let mut c = criteria();
        c.max_price = 1500;
        let first = filter_apartments(&t, &c);
        let second = filter_apartments(&t, &c);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let t = table(vec![apartment("a")]);
        let mut c = criteria();
        c.max_price = 10;
        assert!(filter_apartments(&t, &c).is_empty());
    }

    #[test]
    fn title_case_handles_hyphens() {
        assert_eq!(title_case("part-furnished"), "Part-Furnished");
        assert_eq!(title_case("shell"), "Shell");
    }
}
