// src/item/comps.rs

//! Comps group and environment kind objects
//!
//! Groups own a list of member packages, environments own a list of member
//! groups. Membership records have no identity of their own: they are
//! created through the owner and persisted alongside it. Member lists keep
//! insertion order, and a name can appear at most once per owner.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a package is pulled in by a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompsPackageType {
    Mandatory,
    Default,
    Optional,
    Conditional,
}

impl CompsPackageType {
    pub fn as_str(&self) -> &str {
        match self {
            CompsPackageType::Mandatory => "mandatory",
            CompsPackageType::Default => "default",
            CompsPackageType::Optional => "optional",
            CompsPackageType::Conditional => "conditional",
        }
    }
}

impl FromStr for CompsPackageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mandatory" => Ok(CompsPackageType::Mandatory),
            "default" => Ok(CompsPackageType::Default),
            "optional" => Ok(CompsPackageType::Optional),
            "conditional" => Ok(CompsPackageType::Conditional),
            _ => Err(format!("Invalid comps package type: {s}")),
        }
    }
}

/// How a group is pulled in by an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompsGroupType {
    Mandatory,
    Optional,
}

impl CompsGroupType {
    pub fn as_str(&self) -> &str {
        match self {
            CompsGroupType::Mandatory => "mandatory",
            CompsGroupType::Optional => "optional",
        }
    }
}

impl FromStr for CompsGroupType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mandatory" => Ok(CompsGroupType::Mandatory),
            "optional" => Ok(CompsGroupType::Optional),
            _ => Err(format!("Invalid comps group type: {s}")),
        }
    }
}

/// A package listed in a comps group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompsGroupPackage {
    pub name: String,
    pub is_default: bool,
    pub package_type: CompsPackageType,
}

/// A group listed in a comps environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompsEnvironmentGroup {
    pub group_id: String,
    pub is_default: bool,
    pub group_type: CompsGroupType,
}

/// A comps group (`@core`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompsGroup {
    pub group_id: String,
    pub name: String,
    pub translated_name: String,
    pub installed: bool,
    packages: Vec<CompsGroupPackage>,
}

impl CompsGroup {
    /// Create a new group with no member packages
    pub fn new(
        group_id: impl Into<String>,
        name: impl Into<String>,
        translated_name: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            name: name.into(),
            translated_name: translated_name.into(),
            installed: false,
            packages: Vec::new(),
        }
    }

    /// Mark the group as installed
    pub fn installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }

    /// Append a member package
    pub fn add_package(
        &mut self,
        name: impl Into<String>,
        is_default: bool,
        package_type: CompsPackageType,
    ) -> Result<()> {
        let name = name.into();
        if self.packages.iter().any(|p| p.name == name) {
            return Err(Error::DuplicateMember {
                owner: self.to_string(),
                member: name,
            });
        }

        self.packages.push(CompsGroupPackage {
            name,
            is_default,
            package_type,
        });
        Ok(())
    }

    /// Member packages in insertion order
    pub fn members(&self) -> &[CompsGroupPackage] {
        &self.packages
    }

    /// Find a member package by name
    pub fn find_package(&self, name: &str) -> Option<&CompsGroupPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.group_id.is_empty() {
            return Err(Error::InvalidItem("Comps group has an empty id".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for CompsGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.group_id)
    }
}

/// A comps environment (`@^minimal`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompsEnvironment {
    pub environment_id: String,
    pub name: String,
    pub translated_name: String,
    groups: Vec<CompsEnvironmentGroup>,
}

impl CompsEnvironment {
    /// Create a new environment with no member groups
    pub fn new(
        environment_id: impl Into<String>,
        name: impl Into<String>,
        translated_name: impl Into<String>,
    ) -> Self {
        Self {
            environment_id: environment_id.into(),
            name: name.into(),
            translated_name: translated_name.into(),
            groups: Vec::new(),
        }
    }

    /// Append a member group
    pub fn add_group(
        &mut self,
        group_id: impl Into<String>,
        is_default: bool,
        group_type: CompsGroupType,
    ) -> Result<()> {
        let group_id = group_id.into();
        if self.groups.iter().any(|g| g.group_id == group_id) {
            return Err(Error::DuplicateMember {
                owner: self.to_string(),
                member: group_id,
            });
        }

        self.groups.push(CompsEnvironmentGroup {
            group_id,
            is_default,
            group_type,
        });
        Ok(())
    }

    /// Member groups in insertion order
    pub fn members(&self) -> &[CompsEnvironmentGroup] {
        &self.groups
    }

    /// Find a member group by id
    pub fn find_group(&self, group_id: &str) -> Option<&CompsEnvironmentGroup> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.environment_id.is_empty() {
            return Err(Error::InvalidItem(
                "Comps environment has an empty id".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for CompsEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@^{}", self.environment_id)
    }
}
