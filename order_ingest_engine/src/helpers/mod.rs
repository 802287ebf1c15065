//! Small helpers shared across the engine.

use rand::Rng;

/// Generate an opaque entity id: a short type prefix plus 16 hex characters of randomness.
/// Collisions are guarded by the primary-key constraint, not by this function.
pub fn new_entity_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    format!("{prefix}-{:016x}", rng.gen::<u64>())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn id_shape() {
        let id = new_entity_id("ord");
        assert!(id.starts_with("ord-"));
        assert_eq!(id.len(), 4 + 16);
        assert_ne!(new_entity_id("ord"), new_entity_id("ord"));
    }
}
