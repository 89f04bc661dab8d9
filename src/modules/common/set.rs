use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// An ordered collection without duplicates.
///
/// elements are kept sorted by their `Ord` implementation, so two sets built
/// from the same elements in any order are equal and serialize identically,
/// making it suitable for fields that must be stable under JSON round trips
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Set<T: Ord>(Vec<T>);

impl<T: Ord> Set<T> {
    /// Creates a set from any iterator, collapsing duplicates and
    /// sorting the surviving elements
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let elements: BTreeSet<T> = items.into_iter().collect();
        Set(elements.into_iter().collect())
    }

    pub fn contains(&self, item: &T) -> bool {
        self.0.binary_search(item).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Ord> Default for Set<T> {
    fn default() -> Self {
        Set(Vec::new())
    }
}

impl<T: Ord> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Set::new(iter)
    }
}

impl<'de, T> Deserialize<'de> for Set<T>
where
    T: Ord + Deserialize<'de>,
{
    /// deserializes from a plain JSON array, canonicalizing the result so
    /// unordered or duplicated input always yields the same set
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let elements = Vec::<T>::deserialize(deserializer)?;
        Ok(Set::new(elements))
    }
}
