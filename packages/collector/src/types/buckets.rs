//! Result buckets - categories of collected artifacts and their contents.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CollectorError;

/// Named classification of collected artifacts.
///
/// The `All*` variants are the cross-host aggregates the data board browses
/// with a wildcard host. `Value` has no aggregate counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Path,
    FullPath,
    File,
    Param,
    Value,
    AllPath,
    AllFullPath,
    AllFile,
    AllParam,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 9] = [
        Category::Param,
        Category::Value,
        Category::Path,
        Category::FullPath,
        Category::File,
        Category::AllParam,
        Category::AllPath,
        Category::AllFullPath,
        Category::AllFile,
    ];

    /// Display label, as used for table names.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Path => "Path",
            Category::FullPath => "FullPath",
            Category::File => "File",
            Category::Param => "Param",
            Category::Value => "Value",
            Category::AllPath => "All Path",
            Category::AllFullPath => "All FullPath",
            Category::AllFile => "All File",
            Category::AllParam => "All Param",
        }
    }

    /// Whether this is a cross-host aggregate category.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Category::AllPath | Category::AllFullPath | Category::AllFile | Category::AllParam
        )
    }

    /// The aggregate counterpart of a plain category, if it has one.
    pub fn aggregate(&self) -> Option<Category> {
        match self {
            Category::Path => Some(Category::AllPath),
            Category::FullPath => Some(Category::AllFullPath),
            Category::File => Some(Category::AllFile),
            Category::Param => Some(Category::AllParam),
            _ => None,
        }
    }

    /// Whether buckets of this category carry name/value pairs.
    pub fn has_values(&self) -> bool {
        matches!(self, Category::Value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace() && *c != '-' && *c != '_').collect();
        Category::ALL
            .into_iter()
            .find(|c| c.label().replace(' ', "").eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| CollectorError::Config(format!("unknown category: {s}")))
    }
}

/// Key → set of distinct values.
///
/// Duplicate `(key, value)` pairs collapse. Ordered so that results are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMultimap(BTreeMap<String, BTreeSet<String>>);

impl ValueMultimap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair. Returns false if it was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.0.entry(key.into()).or_default().insert(value.into())
    }

    /// Merge every pair of `other` into `self`.
    pub fn extend_from(&mut self, other: &ValueMultimap) {
        for (key, values) in &other.0 {
            self.0
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    /// Values recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.0.get(key).is_some_and(|v| v.contains(value))
    }

    /// Number of distinct `(key, value)` pairs.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over every `(key, value)` pair.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ValueMultimap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMultimap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Contents of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bucket {
    /// Paths, files, full paths, parameter names.
    Names(BTreeSet<String>),
    /// Parameter name → values.
    Values(ValueMultimap),
}

impl Bucket {
    pub fn len(&self) -> usize {
        match self {
            Bucket::Names(names) => names.len(),
            Bucket::Values(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into `(name, value)` rows; name-only buckets have no value.
    pub fn rows(&self) -> Vec<(&str, Option<&str>)> {
        match self {
            Bucket::Names(names) => names.iter().map(|n| (n.as_str(), None)).collect(),
            Bucket::Values(values) => values.pairs().map(|(k, v)| (k, Some(v))).collect(),
        }
    }
}

/// Category → bucket map produced for one exchange.
///
/// Created fresh for every exchange and handed back to the caller; the same
/// shape is what gets persisted per host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult(BTreeMap<Category, Bucket>);

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a bucket, skipping empty ones.
    pub fn insert(&mut self, category: Category, bucket: Bucket) {
        if !bucket.is_empty() {
            self.0.insert(category, bucket);
        }
    }

    /// Insert a name set under its category and, if it has one, the
    /// aggregate counterpart.
    pub fn insert_with_aggregate(&mut self, category: Category, names: &BTreeSet<String>) {
        if names.is_empty() {
            return;
        }
        if let Some(aggregate) = category.aggregate() {
            self.insert(aggregate, Bucket::Names(names.clone()));
        }
        self.insert(category, Bucket::Names(names.clone()));
    }

    pub fn get(&self, category: Category) -> Option<&Bucket> {
        self.0.get(&category)
    }

    /// Names recorded under a name-only category.
    pub fn names(&self, category: Category) -> Option<&BTreeSet<String>> {
        match self.0.get(&category)? {
            Bucket::Names(names) => Some(names),
            Bucket::Values(_) => None,
        }
    }

    /// The `Value` bucket, if any.
    pub fn values(&self) -> Option<&ValueMultimap> {
        match self.0.get(&Category::Value)? {
            Bucket::Values(values) => Some(values),
            Bucket::Names(_) => None,
        }
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains_key(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Category, Bucket> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a ExtractionResult {
    type Item = (&'a Category, &'a Bucket);
    type IntoIter = btree_map::Iter<'a, Category, Bucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multimap_collapses_duplicates() {
        let mut map = ValueMultimap::new();
        assert!(map.insert("id", "1"));
        assert!(!map.insert("id", "1"));
        assert!(map.insert("id", "2"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("id").map(BTreeSet::len), Some(2));
        assert!(map.contains("id", "2"));
    }

    #[test]
    fn test_multimap_extend() {
        let mut a: ValueMultimap = [("a", "1")].into_iter().collect();
        let b: ValueMultimap = [("a", "1"), ("a", "2"), ("b", "x")].into_iter().collect();
        a.extend_from(&b);

        let pairs: Vec<_> = a.pairs().collect();
        assert_eq!(pairs, vec![("a", "1"), ("a", "2"), ("b", "x")]);
    }

    #[test]
    fn test_category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.label().parse::<Category>().unwrap(), category);
        }
        assert_eq!("allparam".parse::<Category>().unwrap(), Category::AllParam);
        assert_eq!("full-path".parse::<Category>().unwrap(), Category::FullPath);
        assert!("cookies".parse::<Category>().is_err());
    }

    #[test]
    fn test_value_has_no_aggregate() {
        assert_eq!(Category::Param.aggregate(), Some(Category::AllParam));
        assert_eq!(Category::Value.aggregate(), None);
        assert!(Category::AllFile.is_aggregate());
        assert!(!Category::File.is_aggregate());
    }

    #[test]
    fn test_result_skips_empty_buckets() {
        let mut result = ExtractionResult::new();
        result.insert(Category::Path, Bucket::Names(BTreeSet::new()));
        result.insert(Category::Value, Bucket::Values(ValueMultimap::new()));
        assert!(result.is_empty());

        let names: BTreeSet<String> = ["api".to_string()].into();
        result.insert_with_aggregate(Category::Path, &names);
        assert_eq!(
            result.categories().collect::<Vec<_>>(),
            vec![Category::Path, Category::AllPath]
        );
        assert!(result.names(Category::AllPath).unwrap().contains("api"));
        assert!(result.values().is_none());
    }
}
