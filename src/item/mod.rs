// src/item/mod.rs

//! Item kinds recorded in transaction history
//!
//! Every transaction item wraps exactly one kind object. The set of kinds
//! is closed:
//!
//! - [`RpmItem`]: a single RPM package
//! - [`CompsGroup`]: a comps group and its member packages
//! - [`CompsEnvironment`]: a comps environment and its member groups
//!
//! The [`ItemType`] tag is what gets stored in the `item_type` column and
//! drives which kind table is consulted on load.

mod comps;
mod rpm;

pub use comps::{
    CompsEnvironment, CompsEnvironmentGroup, CompsGroup, CompsGroupPackage, CompsGroupType,
    CompsPackageType,
};
pub use rpm::RpmItem;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminator persisted with every transaction item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Rpm,
    Group,
    Environment,
}

impl ItemType {
    pub fn as_str(&self) -> &str {
        match self {
            ItemType::Rpm => "rpm",
            ItemType::Group => "group",
            ItemType::Environment => "environment",
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "rpm" => Ok(ItemType::Rpm),
            "group" => Ok(ItemType::Group),
            "environment" => Ok(ItemType::Environment),
            _ => Err(format!("Invalid item type: {s}")),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind object carried by a transaction item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Rpm(RpmItem),
    Group(CompsGroup),
    Environment(CompsEnvironment),
}

impl ItemKind {
    pub fn kind_tag(&self) -> ItemType {
        match self {
            ItemKind::Rpm(_) => ItemType::Rpm,
            ItemKind::Group(_) => ItemType::Group,
            ItemKind::Environment(_) => ItemType::Environment,
        }
    }

    /// Name of the kind, as stored in the `item_type` column
    pub fn item_type_name(&self) -> &str {
        match self {
            ItemKind::Rpm(_) => ItemType::Rpm.as_str(),
            ItemKind::Group(_) => ItemType::Group.as_str(),
            ItemKind::Environment(_) => ItemType::Environment.as_str(),
        }
    }

    /// Kind-specific attributes, including membership lists
    pub fn serialize_attributes(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            ItemKind::Rpm(rpm) => serde_json::to_value(rpm),
            ItemKind::Group(group) => serde_json::to_value(group),
            ItemKind::Environment(env) => serde_json::to_value(env),
        }
    }

    pub fn as_rpm(&self) -> Option<&RpmItem> {
        match self {
            ItemKind::Rpm(rpm) => Some(rpm),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&CompsGroup> {
        match self {
            ItemKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_environment(&self) -> Option<&CompsEnvironment> {
        match self {
            ItemKind::Environment(env) => Some(env),
            _ => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            ItemKind::Rpm(rpm) => rpm.validate(),
            ItemKind::Group(group) => group.validate(),
            ItemKind::Environment(env) => env.validate(),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Rpm(rpm) => fmt::Display::fmt(rpm, f),
            ItemKind::Group(group) => fmt::Display::fmt(group, f),
            ItemKind::Environment(env) => fmt::Display::fmt(env, f),
        }
    }
}

impl From<RpmItem> for ItemKind {
    fn from(rpm: RpmItem) -> Self {
        ItemKind::Rpm(rpm)
    }
}

impl From<CompsGroup> for ItemKind {
    fn from(group: CompsGroup) -> Self {
        ItemKind::Group(group)
    }
}

impl From<CompsEnvironment> for ItemKind {
    fn from(env: CompsEnvironment) -> Self {
        ItemKind::Environment(env)
    }
}

/// Turns a user supplied package spec (name, glob, NEVRA) into packages
///
/// Implemented by the dependency solver that owns the package sack; this
/// crate only consumes the result.
pub trait PackageResolver {
    fn resolve(&self, spec: &str) -> Result<Vec<RpmItem>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        let rpm: ItemKind = RpmItem::new("bash", 0, "4.4.12", "5.fc26", "x86_64").into();
        let group: ItemKind = CompsGroup::new("core", "Core", "").into();
        let env: ItemKind = CompsEnvironment::new("minimal", "Minimal", "").into();

        assert_eq!(rpm.kind_tag(), ItemType::Rpm);
        assert_eq!(group.item_type_name(), "group");
        assert_eq!(env.kind_tag().as_str().parse::<ItemType>().unwrap(), ItemType::Environment);

        assert_eq!(rpm.to_string(), "bash-0:4.4.12-5.fc26.x86_64");
        assert_eq!(group.to_string(), "@core");
        assert_eq!(env.to_string(), "@^minimal");
    }

    #[test]
    fn test_serialize_attributes() {
        let mut group = CompsGroup::new("core", "Core", "Úplný základ");
        group
            .add_package("bash", true, CompsPackageType::Mandatory)
            .unwrap();
        let attrs = ItemKind::from(group).serialize_attributes().unwrap();

        assert_eq!(attrs["group_id"], "core");
        assert_eq!(attrs["translated_name"], "Úplný základ");
        assert_eq!(attrs["packages"][0]["name"], "bash");
        assert_eq!(attrs["packages"][0]["package_type"], "mandatory");

        let rpm = ItemKind::from(RpmItem::new("bash", 0, "4.4.12", "5.fc26", "x86_64"));
        assert_eq!(rpm.serialize_attributes().unwrap()["release"], "5.fc26");

        let env = ItemKind::from(CompsEnvironment::new("minimal", "Minimal", "mmm"));
        let attrs = env.serialize_attributes().unwrap();
        assert_eq!(attrs["environment_id"], "minimal");
        assert!(attrs["groups"].as_array().unwrap().is_empty());
    }
}
