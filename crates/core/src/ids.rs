//! Client-side identifier generation.
//!
//! Categories and images are keyed by random UUID v4 strings, so ids minted
//! on different devices for the same collection do not collide in practice.

/// Generate a fresh id for a category or image record.
pub fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_uuid_strings() {
        let id = new_entity_id();
        assert_eq!(id.len(), 36);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1_000).map(|_| new_entity_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }
}
