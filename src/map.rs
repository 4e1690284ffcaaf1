//! Ordered, string-keyed map type for RDN objects.
//!
//! [`Object`] wraps an [`IndexMap`] so object members keep the order in which
//! they appeared in the source text. It is a plain key/value container: no key
//! resolves to anything that was not inserted explicitly.
//!
//! Duplicate keys follow JSON semantics: the last value wins and the member
//! keeps the position of its first occurrence.
//!
//! ## Examples
//!
//! ```rust
//! use rdn::{Object, Value};
//!
//! let mut object = Object::new();
//! object.insert("name".to_string(), Value::from("Alice"));
//! object.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(object.len(), 2);
//! assert_eq!(object.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! assert!(object.get("__proto__").is_none());
//! ```

use indexmap::IndexMap;
use std::collections::HashMap;

/// An insertion-ordered map of string keys to RDN values.
///
/// # Examples
///
/// ```rust
/// use rdn::{Object, Value};
///
/// let mut object = Object::new();
/// object.insert("first".to_string(), Value::from(1));
/// object.insert("second".to_string(), Value::from(2));
///
/// // Iteration maintains insertion order
/// let keys: Vec<_> = object.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object(IndexMap<String, crate::Value>);

impl Object {
    /// Creates an empty `Object`.
    #[must_use]
    pub fn new() -> Self {
        Object(IndexMap::new())
    }

    /// Creates an empty `Object` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Object(IndexMap::with_capacity(capacity))
    }

    /// Inserts a member, returning the previous value for that key.
    ///
    /// A replaced member keeps its original position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rdn::{Object, Value};
    ///
    /// let mut object = Object::new();
    /// assert!(object.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(object.insert("key".to_string(), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: crate::Value) -> Option<crate::Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&crate::Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut crate::Value> {
        self.0.get_mut(key)
    }

    /// Removes a member, shifting later members down to keep their order.
    pub fn remove(&mut self, key: &str) -> Option<crate::Value> {
        self.0.shift_remove(key)
    }

    /// Returns `true` if the object has a member with this key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the object has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, crate::Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, crate::Value> {
        self.0.values()
    }

    /// Returns an iterator over the members, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, crate::Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, crate::Value>> for Object {
    fn from(map: HashMap<String, crate::Value>) -> Self {
        Object(map.into_iter().collect())
    }
}

impl IntoIterator for Object {
    type Item = (String, crate::Value);
    type IntoIter = indexmap::map::IntoIter<String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a crate::Value);
    type IntoIter = indexmap::map::Iter<'a, String, crate::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, crate::Value)> for Object {
    fn from_iter<T: IntoIterator<Item = (String, crate::Value)>>(iter: T) -> Self {
        Object(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let mut object = Object::new();
        object.insert("a".to_string(), Value::from(1));
        object.insert("b".to_string(), Value::from(2));
        object.insert("a".to_string(), Value::from(3));

        let members: Vec<_> = object.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(
            members,
            vec![
                ("a".to_string(), Value::from(3)),
                ("b".to_string(), Value::from(2))
            ]
        );
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut object: Object = vec![
            ("x".to_string(), Value::Null),
            ("y".to_string(), Value::Null),
            ("z".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();

        assert!(object.remove("x").is_some());
        let keys: Vec<_> = object.keys().cloned().collect();
        assert_eq!(keys, vec!["y", "z"]);
    }
}
