//! Permission identifiers.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A `RESOURCE:VERB` permission string (e.g. `PATIENT:READ`) or the
/// wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Resource half of `RESOURCE:VERB`, if present.
    pub fn resource(&self) -> Option<&str> {
        self.as_str().split_once(':').map(|(r, _)| r)
    }

    /// Verb half of `RESOURCE:VERB`, if present.
    pub fn verb(&self) -> Option<&str> {
        self.as_str().split_once(':').map(|(_, v)| v)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(s: &'static str) -> Self {
        Self::from_static(s)
    }
}

impl From<String> for Permission {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}
