// src/item/rpm.rs

//! RPM package kind object
//!
//! Two RPM items describe the same package iff name, epoch, version,
//! release and architecture all match, which is exactly the derived
//! equality below.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An RPM package identified by its NEVRA
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RpmItem {
    pub name: String,
    pub epoch: i32,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl RpmItem {
    /// Create a new RPM item
    pub fn new(
        name: impl Into<String>,
        epoch: i32,
        version: impl Into<String>,
        release: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            epoch,
            version: version.into(),
            release: release.into(),
            arch: arch.into(),
        }
    }

    /// Full NEVRA with the epoch always present: `bash-0:4.4.12-5.fc26.x86_64`
    pub fn nevra(&self) -> String {
        format!(
            "{}-{}:{}-{}.{}",
            self.name, self.epoch, self.version, self.release, self.arch
        )
    }

    /// NEVRA with a zero epoch omitted: `bash-4.4.12-5.fc26.x86_64`
    pub fn nevra_short(&self) -> String {
        if self.epoch == 0 {
            format!(
                "{}-{}-{}.{}",
                self.name, self.version, self.release, self.arch
            )
        } else {
            self.nevra()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidItem("RPM item has an empty name".to_string()));
        }
        if self.version.is_empty() || self.release.is_empty() || self.arch.is_empty() {
            return Err(Error::InvalidItem(format!(
                "RPM item '{}' is missing version, release or arch",
                self.name
            )));
        }
        if self.epoch < 0 {
            return Err(Error::InvalidItem(format!(
                "RPM item '{}' has negative epoch {}",
                self.name, self.epoch
            )));
        }
        Ok(())
    }
}

impl fmt::Display for RpmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nevra())
    }
}

impl FromStr for RpmItem {
    type Err = Error;

    /// Parse `name-[epoch:]version-release.arch`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidItem(format!("Cannot parse NEVRA: {s}"));

        let (rest, arch) = s.rsplit_once('.').ok_or_else(invalid)?;
        let (rest, release) = rest.rsplit_once('-').ok_or_else(invalid)?;
        let (name, evr) = rest.rsplit_once('-').ok_or_else(invalid)?;

        let (epoch, version) = match evr.split_once(':') {
            Some((epoch, version)) => (epoch.parse::<i32>().map_err(|_| invalid())?, version),
            None => (0, evr),
        };

        let item = RpmItem::new(name, epoch, version, release, arch);
        item.validate().map_err(|_| invalid())?;
        Ok(item)
    }
}
