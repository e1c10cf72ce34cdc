use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Name of a pre-registered callback.
///
/// Functions cannot cross an isolation boundary, so a request names the
/// callback and the worker resolves it in its registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackName(String);

impl CallbackName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for CallbackName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallbackName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CallbackName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn name_is_usable_as_str_key() {
        let mut map = HashMap::new();
        map.insert(CallbackName::new("fetch_json"), 1);
        assert_eq!(map.get("fetch_json"), Some(&1));
    }

    #[test]
    fn name_serializes_as_plain_string() {
        let s = serde_json::to_string(&CallbackName::from("echo")).unwrap();
        assert_eq!(s, "\"echo\"");
    }
}
