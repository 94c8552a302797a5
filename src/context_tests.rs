// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `context.rs`

#[cfg(test)]
mod tests {
    use crate::context::parse_protected_prefixes;

    #[test]
    fn test_single_prefix() {
        assert_eq!(
            parse_protected_prefixes("kubernetes.io"),
            vec!["kubernetes.io".to_string()]
        );
    }

    #[test]
    fn test_multiple_prefixes_trimmed() {
        assert_eq!(
            parse_protected_prefixes("kubernetes.io, k8s.io ,internal"),
            vec![
                "kubernetes.io".to_string(),
                "k8s.io".to_string(),
                "internal".to_string()
            ]
        );
    }

    #[test]
    fn test_empty_entries_dropped() {
        assert_eq!(
            parse_protected_prefixes("kubernetes.io,,"),
            vec!["kubernetes.io".to_string()]
        );
    }

    #[test]
    fn test_empty_input_disables_protection() {
        assert!(parse_protected_prefixes("").is_empty());
        assert!(parse_protected_prefixes(" , ").is_empty());
    }
}
