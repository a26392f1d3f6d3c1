//! The immutable per-request record (§4.N) that carries every fact the
//! authorization engine and handlers need: the resolved user (if any), the
//! route coordinates, and the three request-surface parameter maps.

use serde_json::Value;
use std::collections::BTreeSet;

use super::permission::Source;
use super::user::AuthUser;

/// Recursion is capped so a maliciously nested JSON/query payload can't
/// blow the stack or burn CPU computing key sets (§4.N).
const MAX_KEY_COLLECT_DEPTH: usize = 15;

#[derive(Debug, Clone)]
pub struct Context {
  pub user: Option<AuthUser>,
  pub request_id: String,
  pub request_method: String,
  pub request_path: String,
  pub request_url: String,
  pub request_path_params: Value,
  pub request_query_params: Value,
  pub request_json_params: Value,
}

impl Context {
  pub fn keys(&self, src: Source) -> BTreeSet<String> {
    let root = match src {
      Source::Query => &self.request_query_params,
      Source::Json => &self.request_json_params,
    };
    let mut out = BTreeSet::new();
    collect_keys(root, 0, &mut out);
    out
  }

  pub fn path_param(&self, name: &str) -> Option<String> {
    self
      .request_path_params
      .get(name)
      .and_then(value_to_string)
  }

  pub fn query_param(&self, name: &str) -> Option<String> {
    self
      .request_query_params
      .get(name)
      .and_then(value_to_string)
  }
}

fn value_to_string(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Collects the distinct top-level key names reachable from `value`,
/// descending into nested objects/arrays up to `MAX_KEY_COLLECT_DEPTH`.
/// Every object key encountered at any depth is added — field policies
/// match on key name regardless of nesting level, mirroring the source's
/// `_collect_keys` helper.
fn collect_keys(value: &Value, depth: usize, out: &mut BTreeSet<String>) {
  if depth > MAX_KEY_COLLECT_DEPTH {
    return;
  }
  match value {
    Value::Object(map) => {
      for (k, v) in map {
        out.insert(k.clone());
        collect_keys(v, depth + 1, out);
      }
    }
    Value::Array(items) => {
      for v in items {
        collect_keys(v, depth + 1, out);
      }
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn collects_nested_keys_up_to_depth() {
    let v = json!({"a": {"b": {"c": 1}}});
    let mut out = BTreeSet::new();
    collect_keys(&v, 0, &mut out);
    assert!(out.contains("a"));
    assert!(out.contains("b"));
    assert!(out.contains("c"));
  }

  #[test]
  fn stops_past_max_depth() {
    // build a chain deeper than MAX_KEY_COLLECT_DEPTH
    let mut v = json!({"bottom": 1});
    for i in 0..(MAX_KEY_COLLECT_DEPTH + 5) {
      v = json!({ format!("lvl{i}"): v });
    }
    let mut out = BTreeSet::new();
    collect_keys(&v, 0, &mut out);
    assert!(!out.contains("bottom"));
  }
}
