//! Keyword search across stores and sale products.
//!
//! Resolution is priority-ordered; the first non-empty tier wins:
//!
//! 1. stores whose name contains the keyword
//! 2. stores whose type contains the keyword
//! 3. sale products whose name contains the keyword
//!
//! Matching is a case-insensitive substring match. The resolved
//! [`SearchResults`] variant decides both which records are returned and
//! how they are shaped.

use crate::sale_product::SaleProduct;
use crate::store::Store;

/// A non-empty search keyword, kept verbatim.
///
/// Whitespace is significant: `" "` is a keyword that matches any name
/// containing a space, and `"Mart "` does not match `"Fresh Mart"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKeyword {
    raw: String,
    folded: String,
}

impl SearchKeyword {
    /// Returns `None` for an absent or empty keyword.
    pub fn parse(input: Option<&str>) -> Option<Self> {
        let raw = input?;
        if raw.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            folded: raw.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The keyword lowercased with full Unicode case mapping.
    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.folded)
    }
}

/// Outcome of a keyword search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResults {
    Stores(Vec<Store>),
    Products(Vec<SaleProduct>),
    Empty,
}

impl SearchResults {
    /// Resolve `keyword` against candidate stores and products.
    ///
    /// Candidates may be a superset of the matches (e.g. a coarser
    /// database pre-filter); only records accepted by
    /// [`SearchKeyword::matches`] are returned, in input order.
    pub fn resolve<'a, S, P>(keyword: &SearchKeyword, stores: S, products: P) -> Self
    where
        S: IntoIterator<Item = &'a Store>,
        P: IntoIterator<Item = &'a SaleProduct>,
    {
        let stores: Vec<&Store> = stores.into_iter().collect();

        let by_name: Vec<Store> = stores
            .iter()
            .filter(|s| keyword.matches(&s.name))
            .map(|s| (*s).clone())
            .collect();
        if !by_name.is_empty() {
            return Self::Stores(by_name);
        }

        let by_type: Vec<Store> = stores
            .iter()
            .filter(|s| keyword.matches(&s.store_type))
            .map(|s| (*s).clone())
            .collect();
        if !by_type.is_empty() {
            return Self::Stores(by_type);
        }

        let products: Vec<SaleProduct> = products
            .into_iter()
            .filter(|p| keyword.matches(&p.name))
            .cloned()
            .collect();
        if !products.is_empty() {
            return Self::Products(products);
        }

        Self::Empty
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Stores(s) => s.len(),
            Self::Products(p) => p.len(),
            Self::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Result kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stores(_) => "stores",
            Self::Products(_) => "products",
            Self::Empty => "empty",
        }
    }
}
