use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
///
/// Vector stores that only accept UUID or integer point ids key passages
/// with this value; the same chunk id always maps to the same point.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_same_uuid() {
        assert_eq!(stable_uuid("doc.pdf:p1:c0"), stable_uuid("doc.pdf:p1:c0"));
        assert_ne!(stable_uuid("doc.pdf:p1:c0"), stable_uuid("doc.pdf:p1:c1"));
    }

    #[test]
    fn is_version_5() {
        assert_eq!(stable_uuid("x").get_version_num(), 5);
    }
}
