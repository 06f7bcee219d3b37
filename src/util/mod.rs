use uuid::Uuid;

pub mod persistence;
pub mod version;

/// Prefixed random identifier, e.g. `item-6f1c...`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_prefixed_and_unique() {
        let a = generate_id("deal");
        let b = generate_id("deal");
        assert!(a.starts_with("deal-"));
        assert_ne!(a, b);
    }
}
