//! Year and country scoping applied to every random draw.
use std::collections::BTreeSet;

/// Active year/country restrictions. An empty set means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterContext {
    years: BTreeSet<i32>,
    countries: BTreeSet<String>,
}

impl FilterContext {
    pub fn new<Y, C, S>(years: Y, countries: C) -> Self
    where
        Y: IntoIterator<Item = i32>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FilterContext {
            years: years.into_iter().collect(),
            countries: countries
                .into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// No restriction at all
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    pub fn is_unrestricted(&self) -> bool {
        self.years.is_empty() && self.countries.is_empty()
    }

    pub fn matches_year(&self, year: i32) -> bool {
        self.years.is_empty() || self.years.contains(&year)
    }

    pub fn matches_country(&self, country: &str) -> bool {
        self.countries.is_empty() || self.countries.contains(country)
    }

    pub fn matches(&self, year: i32, country: &str) -> bool {
        self.matches_year(year) && self.matches_country(country)
    }
}

impl std::fmt::Display for FilterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let years = if self.years.is_empty() {
            "any".to_string()
        } else {
            self.years
                .iter()
                .map(|y| y.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let countries = if self.countries.is_empty() {
            "any".to_string()
        } else {
            self.countries.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        write!(f, "years: {years} | countries: {countries}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = FilterContext::unrestricted();
        assert!(filter.is_unrestricted());
        assert!(filter.matches(1956, "Switzerland"));
        assert!(filter.matches(2023, "Sweden"));
    }

    #[test]
    fn test_year_restriction() {
        let filter = FilterContext::new([1970, 1971], Vec::<String>::new());
        assert!(filter.matches(1970, "Spain"));
        assert!(!filter.matches(1972, "Spain"));
        assert!(!filter.is_unrestricted());
    }

    #[test]
    fn test_country_restriction_ignores_blank_names() {
        let filter = FilterContext::new(Vec::new(), ["Spain", "  ", ""]);
        assert_eq!(filter.countries().len(), 1);
        assert!(filter.matches(1999, "Spain"));
        assert!(!filter.matches(1999, "Italy"));
    }

    #[test]
    fn test_display_lists_restrictions() {
        let filter = FilterContext::new([1970], ["Spain"]);
        assert_eq!(filter.to_string(), "years: 1970 | countries: Spain");
        assert_eq!(
            FilterContext::unrestricted().to_string(),
            "years: any | countries: any"
        );
    }
}
