use std::{collections::HashMap, fmt::Display};

use crate::style::{Palette, Role};

/// Ordered key/value context attached to a log line.
///
/// Keys are insert-once: adding a key that is already present keeps the
/// first value, so a field can be extended without clobbering context set
/// earlier in the call chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    keys: Vec<String>,
    values: HashMap<String, String>,
}

impl Field {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a field from alternating keys and values.
    ///
    /// Keys use their [`Display`] form. A trailing key without a value is dropped.
    pub fn from_flat(values: &[&dyn Display]) -> Self {
        values
            .chunks_exact(2)
            .fold(Self::with_capacity(values.len() / 2), |field, pair| {
                field.add(pair[0].to_string(), pair[1])
            })
    }

    /// A single `err` entry wrapping an error value.
    pub fn err(err: impl Display) -> Self {
        Self::new().add("err", err)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self { keys: Vec::with_capacity(capacity), values: HashMap::with_capacity(capacity) }
    }

    /// Adds `key` unless it is already present.
    pub fn add(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    /// In-place [`add`][Field::add]. Returns whether the key was new.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) -> bool {
        let key = key.into();
        if self.values.contains_key(&key) {
            return false;
        }

        self.values.insert(key.clone(), value.to_string());
        self.keys.push(key);
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Renders one `key(value)` token per entry, in insertion order.
    pub fn tokens(&self, palette: &Palette) -> Vec<String> {
        self.keys
            .iter()
            .map(|key| match self.values.get(key) {
                Some(value) => format!("{}({value})", palette.paint(Role::FieldKey, key)),
                None => key.clone(),
            })
            .collect()
    }
}

/// Builds a [`Field`] from `key => value` pairs.
#[macro_export]
macro_rules! field {
    () => {
        $crate::Field::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Field::new()$(.add($key, $value))+
    };
}
