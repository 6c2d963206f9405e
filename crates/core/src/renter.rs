//! Renter identities.

use crate::models::Renter;

const RENTER_PREFIX: &str = "CUS";

/// Every renter issued so far, in issue order.
///
/// Each rental mints a fresh identity, even when the name matches an earlier
/// renter. Ids are `CUS` followed by the 1-based issue ordinal.
#[derive(Debug, Clone, Default)]
pub struct RenterRegistry {
    renters: Vec<Renter>,
}

impl RenterRegistry {
    /// Rebuild a registry from persisted renters.
    pub fn from_renters(renters: Vec<Renter>) -> Self {
        Self { renters }
    }

    /// The renter the next call to [`RenterRegistry::register`] would accept.
    pub fn next(&self, name: impl Into<String>) -> Renter {
        Renter {
            id: self.next_id(),
            name: name.into(),
        }
    }

    /// Id the next issued renter must carry.
    pub fn next_id(&self) -> String {
        format!("{RENTER_PREFIX}{}", self.renters.len() + 1)
    }

    /// Record an issued renter.
    pub fn register(&mut self, renter: Renter) {
        self.renters.push(renter);
    }

    /// Look a renter up by id.
    pub fn get(&self, id: &str) -> Option<&Renter> {
        self.renters.iter().find(|renter| renter.id == id)
    }

    /// All renters in issue order.
    pub fn renters(&self) -> &[Renter] {
        &self.renters
    }

    /// Number of renters issued.
    pub fn len(&self) -> usize {
        self.renters.len()
    }

    /// Whether no renter has been issued yet.
    pub fn is_empty(&self) -> bool {
        self.renters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_sequential_ids_without_deduplicating_names() {
        let mut registry = RenterRegistry::default();
        let first = registry.next("Alice");
        registry.register(first.clone());
        let second = registry.next("Alice");
        registry.register(second.clone());

        assert_eq!(first.id, "CUS1");
        assert_eq!(second.id, "CUS2");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("CUS2"), Some(&second));
    }

    #[test]
    fn next_does_not_consume_an_id() {
        let registry = RenterRegistry::default();
        assert_eq!(registry.next("Bob").id, "CUS1");
        assert_eq!(registry.next("Carol").id, "CUS1");
        assert!(registry.is_empty());
    }

    #[test]
    fn resumes_after_persisted_renters() {
        let registry = RenterRegistry::from_renters(vec![
            Renter {
                id: "CUS1".to_string(),
                name: "Alice".to_string(),
            },
            Renter {
                id: "CUS2".to_string(),
                name: "Bob".to_string(),
            },
        ]);
        assert_eq!(registry.next("Dana").id, "CUS3");
    }
}
