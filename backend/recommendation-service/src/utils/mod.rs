// Utility functions for recommendation-service

/// Normalize a free-text token (skill name, search term) for comparison.
pub fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Case-insensitive substring check.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Python "), "python");
        assert_eq!(normalize("PostgreSQL"), "postgresql");
    }

    #[test]
    fn test_contains_ci() {
        assert!(contains_ci("New York, NY", "new york"));
        assert!(contains_ci("Berlin", "BER"));
        assert!(!contains_ci("Berlin", "Munich"));
    }
}
