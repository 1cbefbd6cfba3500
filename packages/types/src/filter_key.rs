use alloy_rpc_types_eth::Filter;
use serde_json::Value;

/// Canonical identity of an event filter, used to collapse actions that
/// request the same subscription.
///
/// Built from the filter's JSON form with every array sorted: within one
/// topic slot (and within the address set) the permitted values are a set,
/// so their serialization order carries no meaning and must not produce
/// distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterKey(String);

impl FilterKey {
    pub fn for_filter(filter: &Filter) -> Result<Self, serde_json::Error> {
        let mut value = serde_json::to_value(filter)?;
        sort_arrays(&mut value);
        Ok(FilterKey(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FilterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn sort_arrays(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items.iter_mut() {
                sort_arrays(item);
            }
            items.sort_by_cached_key(|item| item.to_string());
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                sort_arrays(item);
            }
        }
        _ => {}
    }
}
