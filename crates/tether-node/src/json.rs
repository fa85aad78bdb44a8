//! Building a [`ConfigNode`] from `serde_json` values.
//!
//! This is behind the `json` feature flag (enabled by default). The tree
//! has no null, so `null` members are dropped: a key set to `null`
//! behaves exactly like a missing key, which leaves the bound field at
//! its default.

use crate::{ConfigNode, Mapping, Scalar};

impl From<serde_json::Value> for ConfigNode {
    /// A top-level `null` becomes an empty mapping.
    fn from(value: serde_json::Value) -> Self {
        convert(value).unwrap_or_else(|| ConfigNode::Mapping(Mapping::new()))
    }
}

fn convert(value: serde_json::Value) -> Option<ConfigNode> {
    use serde_json::Value as Json;

    Some(match value {
        Json::Null => return None,
        Json::Bool(b) => ConfigNode::Scalar(Scalar::Bool(b)),
        Json::Number(n) => ConfigNode::Scalar(match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Scalar::Int(i),
            (None, Some(u)) => Scalar::UInt(u),
            (None, None) => Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Json::String(s) => ConfigNode::Scalar(Scalar::Str(s)),
        Json::Array(items) => {
            ConfigNode::Sequence(items.into_iter().filter_map(convert).collect())
        }
        Json::Object(members) => ConfigNode::Mapping(
            members
                .into_iter()
                .filter_map(|(k, v)| convert(v).map(|node| (k, node)))
                .collect(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json_object_keeps_order_and_types() {
        let node = ConfigNode::from(json!({
            "z": 1,
            "a": 2.5,
            "m": { "flag": true, "name": "x" },
            "list": [1, "two"]
        }));

        let mapping = node.as_mapping().expect("object becomes mapping");
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["z", "a", "m", "list"]);
        assert_eq!(node.lookup("z"), Some(&ConfigNode::from(1)));
        assert_eq!(node.lookup("a"), Some(&ConfigNode::from(2.5)));
        assert_eq!(node.lookup("m.flag"), Some(&ConfigNode::from(true)));
        assert_eq!(
            node.lookup("list"),
            Some(&ConfigNode::Sequence(vec![
                ConfigNode::from(1),
                ConfigNode::from("two"),
            ]))
        );
    }

    #[test]
    fn test_from_json_null_members_are_dropped() {
        let node = ConfigNode::from(json!({ "a": null, "b": [null, 1] }));

        assert!(node.lookup("a").is_none());
        assert_eq!(
            node.lookup("b"),
            Some(&ConfigNode::Sequence(vec![ConfigNode::from(1)]))
        );
    }

    #[test]
    fn test_from_json_top_level_null_is_empty_mapping() {
        let node = ConfigNode::from(serde_json::Value::Null);
        assert_eq!(node, ConfigNode::Mapping(Mapping::new()));
    }

    #[test]
    fn test_from_json_huge_unsigned_stays_exact() {
        let node = ConfigNode::from(json!(u64::MAX));
        assert_eq!(node, ConfigNode::Scalar(Scalar::UInt(u64::MAX)));

        let node = ConfigNode::from(json!(1_u64 << 63));
        assert_eq!(node.to_string(), "9223372036854775808");
    }
}
