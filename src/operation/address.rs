// src/operation/address.rs

//! Resource addresses used for `targets`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AddressError;

const NAME: &str = r"[A-Za-z_][A-Za-z0-9_-]*";
const INDEX: &str = r#"(?:\[(?:\d+|"[^"]*")\])?"#;

fn module_segment() -> String {
    format!(r"module\.{NAME}{INDEX}")
}

/// `module.<name>[idx].` ... followed by either `[data.]<type>.<name>[idx]`
/// or a final module segment.
static ADDRESS_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    let module = module_segment();
    let resource = format!(r"(?:data\.)?{NAME}\.{NAME}{INDEX}");
    Regex::new(&format!(r"^(?:{module}\.)*(?:{resource}|{module})$"))
});

/// Module path with nothing after the last module segment.
static MODULE_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    let module = module_segment();
    Regex::new(&format!(r"^(?:{module}\.)*{module}$"))
});

/// A validated resource or module address, e.g. `aws_instance.web`,
/// `module.net.aws_subnet.private[1]` or `module.net`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceAddress(String);

impl ResourceAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        let valid = match &*ADDRESS_RE {
            Ok(re) => re.is_match(trimmed),
            Err(_) => false,
        };
        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(AddressError(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if the address names a whole module rather than a resource.
    pub fn is_module(&self) -> bool {
        match &*MODULE_RE {
            Ok(re) => re.is_match(&self.0),
            Err(_) => false,
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceAddress> for String {
    fn from(address: ResourceAddress) -> Self {
        address.0
    }
}
