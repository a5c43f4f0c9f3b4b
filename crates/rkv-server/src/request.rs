//! Map/reduce request bodies, in Riak's `/mapred` JSON format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapRedRequest {
    /// A bucket name or an inputs object.
    pub inputs: Value,
    pub query: Vec<Phase>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Map(PhaseSpec),
    Reduce(PhaseSpec),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub arg: Value,
    /// Accepted for compatibility; only the last phase's output is returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<bool>,
}

impl MapRedRequest {
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_riak_request() {
        let body = json!({
            "inputs": {"bucket": "b", "index": "n_int", "start": 1, "end": 3},
            "query": [
                {"map": {"language": "javascript", "name": "Riak.mapValuesJson", "keep": false}},
                {"reduce": {"language": "javascript", "name": "Riak.reduceLimit", "arg": 3}}
            ]
        });
        let request = MapRedRequest::from_slice(body.to_string().as_bytes()).unwrap();
        assert_eq!(request.query.len(), 2);
        match &request.query[0] {
            Phase::Map(spec) => {
                assert_eq!(spec.name.as_deref(), Some("Riak.mapValuesJson"));
                assert_eq!(spec.arg, Value::Null);
                assert_eq!(spec.keep, Some(false));
            }
            other => panic!("expected map phase, got {other:?}"),
        }
        assert!(matches!(&request.query[1], Phase::Reduce(spec) if spec.arg == json!(3)));
    }

    #[test]
    fn rejects_unknown_phase_kind() {
        let body = json!({"inputs": "b", "query": [{"link": {"bucket": "b"}}]});
        assert!(MapRedRequest::from_slice(body.to_string().as_bytes()).is_err());
    }
}
