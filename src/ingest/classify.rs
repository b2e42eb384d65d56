// src/ingest/classify.rs
//! Country tagging by ordered keyword table.
//!
//! - Keywords match as case-insensitive substrings of the title.
//! - Table order decides: the first country with any matching keyword wins.
//! - No match falls back to [`WORLD`].

use serde::Deserialize;

pub const WORLD: &str = "World";

/// One row of the keyword table, as it appears in config (`[[countries]]`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CountryKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CountryClassifier {
    // (country, lowercased keywords) in table order
    table: Vec<(String, Vec<String>)>,
}

impl CountryClassifier {
    pub fn new(rows: Vec<CountryKeywords>) -> Self {
        let table = rows
            .into_iter()
            .map(|row| {
                let kws = row
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (row.name, kws)
            })
            .collect();
        Self { table }
    }

    pub fn classify(&self, title: &str) -> String {
        let hay = title.to_lowercase();
        self.table
            .iter()
            .find(|(_, kws)| kws.iter().any(|kw| hay.contains(kw.as_str())))
            .map(|(country, _)| country.clone())
            .unwrap_or_else(|| WORLD.to_string())
    }
}

impl Default for CountryClassifier {
    fn default() -> Self {
        Self::new(default_table())
    }
}

/// Built-in table. Used when config carries no `[[countries]]` section.
pub fn default_table() -> Vec<CountryKeywords> {
    let rows: [(&str, &[&str]); 15] = [
        (
            "United States",
            &[
                "F.D.A.", "U.S.", "United States", "USA", "America", "American", "Alabama",
                "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
                "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana",
                "Iowa", "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts",
                "Michigan", "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska",
                "Nevada", "New Hampshire", "New Jersey", "New Mexico", "New York",
                "North Carolina", "North Dakota", "Ohio", "Oklahoma", "Oregon", "Pennsylvania",
                "Rhode Island", "South Carolina", "South Dakota", "Tennessee", "Texas", "Utah",
                "Vermont", "Virginia", "Washington", "West Virginia", "Wisconsin", "Wyoming",
            ],
        ),
        (
            "Canada",
            &[
                "Canadian", "Ottawa", "Canada", "British Columbia", "Alberta", "Saskatchewan",
                "Manitoba", "Ontario", "Quebec", "Newfoundland", "Prince Edward Island",
                "Nova Scotia", "New Brunswick",
            ],
        ),
        (
            "United Kingdom",
            &["UK", "England", "Scotland", "Wales", "London", "Britain", "British"],
        ),
        (
            "Singapore",
            &["Singapore", "SG", "S'pore", "Singaporean", "S'porean"],
        ),
        ("China", &["China", "Beijing", "Shanghai", "Chinese"]),
        ("Taiwan", &["Taiwan", "Taipei", "Taiwanese"]),
        ("Hong Kong", &["Hong Kong"]),
        ("Malaysia", &["Kuala Lumpur", "Malaysia", "Malaysian"]),
        ("Thailand", &["Bangkok", "Thailand", "Thai"]),
        ("Indonesia", &["Indonesia", "Indonesian"]),
        ("Japan", &["Japan", "Japanese"]),
        ("South Korea", &["Korean", "Korea"]),
        ("Russia", &["Russia", "Russian"]),
        ("India", &["India", "Indian"]),
        (
            "EU",
            &[
                "Europe", "European Union", "France", "Germany", "Spain", "Belgium", "Poland",
                "Austria", "Portugal",
            ],
        ),
    ];

    rows.iter()
        .map(|(name, kws)| CountryKeywords {
            name: name.to_string(),
            keywords: kws.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_country_in_table_order_wins() {
        let c = CountryClassifier::default();
        // United Kingdom precedes China in the default table
        let t = "Beijing and London tighten travel rules";
        assert_eq!(c.classify(t), "United Kingdom");
        for _ in 0..5 {
            assert_eq!(c.classify(t), "United Kingdom");
        }
    }

    #[test]
    fn reordered_table_changes_winner() {
        let c = CountryClassifier::new(vec![
            CountryKeywords {
                name: "China".into(),
                keywords: vec!["Beijing".into()],
            },
            CountryKeywords {
                name: "United Kingdom".into(),
                keywords: vec!["London".into()],
            },
        ]);
        assert_eq!(c.classify("Beijing and London"), "China");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let c = CountryClassifier::default();
        assert_eq!(c.classify("TOKYO: JAPANESE hospitals strained"), "Japan");
        assert_eq!(c.classify("covid in kuala lumpur"), "Malaysia");
    }

    #[test]
    fn no_match_falls_back_to_world() {
        let c = CountryClassifier::default();
        assert_eq!(c.classify("WHO issues new pandemic guidance"), WORLD);
        assert_eq!(CountryClassifier::new(vec![]).classify("anything"), WORLD);
    }

    #[test]
    fn connecticut_and_delaware_are_separate_keywords() {
        let c = CountryClassifier::default();
        assert_eq!(c.classify("Delaware lifts mask mandate"), "United States");
        assert_eq!(c.classify("Connecticut schools reopen"), "United States");
    }
}
