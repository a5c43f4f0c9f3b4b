//! The bucket namespace.

use std::collections::HashMap;

use crate::bucket::Bucket;

/// All buckets ever referenced, keyed by case-sensitive name.
#[derive(Clone, Debug, Default)]
pub struct Database {
    buckets: HashMap<String, Bucket>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// The named bucket, created empty on first reference.
    pub fn get_or_create_bucket(&mut self, name: &str) -> &mut Bucket {
        self.buckets
            .entry(name.to_string())
            .or_insert_with(|| Bucket::new(name))
    }

    /// The named bucket, if it has been referenced before.
    pub fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.buckets.get(name)
    }

    /// Names of all buckets, in no particular order.
    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_are_created_lazily() {
        let mut db = Database::new();
        assert!(db.bucket("users").is_none());
        db.get_or_create_bucket("users");
        assert!(db.bucket("users").is_some());
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn bucket_names_are_case_sensitive() {
        let mut db = Database::new();
        db.get_or_create_bucket("Users");
        db.get_or_create_bucket("users");
        let mut names = db.bucket_names();
        names.sort();
        assert_eq!(names, vec!["Users".to_string(), "users".to_string()]);
    }

    #[test]
    fn repeated_reference_returns_same_bucket() {
        let mut db = Database::new();
        db.get_or_create_bucket("b").put_value("k", serde_json::json!(1));
        assert!(db.get_or_create_bucket("b").has_key("k"));
        assert_eq!(db.len(), 1);
    }
}
