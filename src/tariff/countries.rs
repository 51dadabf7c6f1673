use super::repository::Country;

/// Countries seeded into an empty store.
pub fn default_countries() -> Vec<Country> {
    [
        ("AU", "Australia", "Oceania"),
        ("CA", "Canada", "North America"),
        ("CN", "China", "Asia"),
        ("DE", "Germany", "Europe"),
        ("GB", "United Kingdom", "Europe"),
        ("IN", "India", "Asia"),
        ("JP", "Japan", "Asia"),
        ("KR", "South Korea", "Asia"),
        ("MX", "Mexico", "North America"),
        ("US", "United States", "North America"),
        ("FR", "France", "Europe"),
        ("IT", "Italy", "Europe"),
        ("BR", "Brazil", "South America"),
        ("VN", "Vietnam", "Asia"),
        ("TH", "Thailand", "Asia"),
    ]
    .into_iter()
    .map(|(code, name, region)| Country::new(code, name, region))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_countries_are_unique_two_letter_codes() {
        let countries = default_countries();
        assert_eq!(countries.len(), 15);

        let codes: HashSet<_> = countries.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes.len(), countries.len());
        assert!(countries
            .iter()
            .all(|c| c.code.len() == 2 && c.code.chars().all(|ch| ch.is_ascii_uppercase())));
    }
}
