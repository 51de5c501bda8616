//! Composite-key lookups against the reference tables.
//!
//! A miss is not an error: the resolved key is left empty and the row is
//! still written.

use std::collections::HashMap;

use ordersheet_core::{Customer, OptionRecord};

/// Canonical form of a free-text option name.
///
/// Lowercases, drops every character that is not an ASCII letter, ASCII
/// digit, Hangul syllable or whitespace, then collapses runs of whitespace to
/// a single space. `"Red / Large"` and `"Red  Large"` both become
/// `"red large"`.
#[must_use]
pub fn clean_option_name(raw: &str) -> String {
    let kept: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || is_hangul_syllable(*c) || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `가` through `힣`.
#[must_use]
pub fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Map from an ordered pair of fields to a target key. The first entry
/// inserted for a pair wins.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    keys: HashMap<(String, String), String>,
}

impl KeyIndex {
    pub fn insert(&mut self, a: impl Into<String>, b: impl Into<String>, key: impl Into<String>) {
        self.keys.entry((a.into(), b.into())).or_insert_with(|| key.into());
    }

    /// Target key for `(a, b)`, or `""` when absent.
    #[must_use]
    pub fn resolve(&self, a: &str, b: &str) -> &str {
        self.keys
            .get(&(a.to_string(), b.to_string()))
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Option keys by `(product id, cleaned option name)`.
#[derive(Debug, Clone, Default)]
pub struct OptionIndex {
    by_name: KeyIndex,
    discount_by_product: HashMap<String, String>,
}

impl OptionIndex {
    #[must_use]
    pub fn from_options(options: &[OptionRecord]) -> Self {
        let mut index = Self::default();
        for option in options {
            index.by_name.insert(
                option.product_id.clone(),
                clean_option_name(&option.option_name),
                option.key.clone(),
            );
            index
                .discount_by_product
                .entry(option.product_id.clone())
                .or_insert_with(|| option.discount.clone());
        }
        index
    }

    /// Option key for an export row; the incoming name is cleaned the same
    /// way the reference names were.
    #[must_use]
    pub fn resolve(&self, product_id: &str, option_name: &str) -> &str {
        self.by_name
            .resolve(product_id, &clean_option_name(option_name))
    }

    /// Raw discount text of the first option registered for `product_id`.
    #[must_use]
    pub fn discount_for_product(&self, product_id: &str) -> Option<&str> {
        self.discount_by_product
            .get(product_id)
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Customer keys by `(phone, platform tag)`.
#[derive(Debug, Clone, Default)]
pub struct CustomerIndex(KeyIndex);

impl CustomerIndex {
    #[must_use]
    pub fn from_customers(customers: &[Customer]) -> Self {
        let mut index = KeyIndex::default();
        for c in customers {
            index.insert(c.phone.clone(), c.platform.clone(), c.key.clone());
        }
        Self(index)
    }

    #[must_use]
    pub fn resolve(&self, phone: &str, platform: &str) -> &str {
        self.0.resolve(phone, platform)
    }
}
