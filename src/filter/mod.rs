use serde::Serialize;

use crate::model::DeviceSummary;

/// Filter value meaning "no brand restriction".
pub const ALL_BRANDS: &str = "all";

/// View state owned by a list page: the active brand filter and search query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub active_filter: String,
    pub query: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active_filter: ALL_BRANDS.to_string(),
            query: String::new(),
        }
    }
}

impl ViewState {
    pub fn new(active_filter: &str, query: &str) -> Self {
        let mut state = Self::default();
        state.set_filter(active_filter);
        state.set_query(query);
        state
    }

    pub fn set_filter(&mut self, filter: &str) {
        let filter = filter.trim();
        self.active_filter = if filter.is_empty() {
            ALL_BRANDS.to_string()
        } else {
            filter.to_string()
        };
    }

    /// Applies a raw search box value; surrounding whitespace is ignored.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_string();
    }

    pub fn apply(&self, catalog: &[DeviceSummary]) -> Vec<DeviceSummary> {
        visible(catalog, &self.active_filter, &self.query)
    }
}

fn is_all(filter: &str) -> bool {
    filter.eq_ignore_ascii_case(ALL_BRANDS)
}

pub fn matches(device: &DeviceSummary, active_filter: &str, query: &str) -> bool {
    let brand_ok = is_all(active_filter) || device.brand.to_lowercase() == active_filter.to_lowercase();
    if !brand_ok {
        return false;
    }
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    device.name.to_lowercase().contains(&needle) || device.codename.to_lowercase().contains(&needle)
}

/// Entries passing both the brand filter and the text query, in catalog order.
pub fn visible(catalog: &[DeviceSummary], active_filter: &str, query: &str) -> Vec<DeviceSummary> {
    catalog
        .iter()
        .filter(|d| matches(d, active_filter, query))
        .cloned()
        .collect()
}

/// Distinct lowercase brands in first-seen order.
pub fn brands(catalog: &[DeviceSummary]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for d in catalog.iter() {
        let brand = d.brand.trim().to_lowercase();
        if !brand.is_empty() && !out.contains(&brand) {
            out.push(brand);
        }
    }
    out
}
