//! Configuration for pal-sim.
//!
//! A configuration supplies the device geometry (`pal_core::Parameter`), the
//! address decomposition order (`pal_core::AddressLayout`) and which
//! `pal_latency` technology to instantiate. This is the flat, single-level
//! struct spec.md §1 allows the ambient workspace to own, deliberately
//! without the CPU/memory/host-interface/cache/FTL/FIL subtrees a full
//! configuration-object tree would carry — those remain out of scope.
//!
//! ```rust
//! # use pal_sim::config::Config;
//! # let yaml = "
//! channel: 2
//! way: 1
//! die: 2
//! plane: 1
//! block: 512
//! page: 256
//! page_size: 16384
//! super_page_size: 16384
//! axis_order: [channel, way, die, plane, block, page]
//! technology: slc
//! # ";
//! # serde_yaml::from_str::<Config>(yaml).unwrap();
//! ```

use anyhow::{anyhow, Result};
use pal_core::{AddressLayout, Parameter};
use pal_latency::Technology;
use serde::{Deserialize, Serialize};

/// One of the six address axes, as spelled in a configuration file.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Channel,
    Way,
    Die,
    Plane,
    Block,
    Page,
}

impl Axis {
    fn index(self) -> u8 {
        match self {
            Axis::Channel => pal_core::CHANNEL as u8,
            Axis::Way => pal_core::WAY as u8,
            Axis::Die => pal_core::DIE as u8,
            Axis::Plane => pal_core::PLANE as u8,
            Axis::Block => pal_core::BLOCK as u8,
            Axis::Page => pal_core::PAGE as u8,
        }
    }
}

fn default_axis_order() -> Vec<Axis> {
    vec![Axis::Channel, Axis::Way, Axis::Die, Axis::Plane, Axis::Block, Axis::Page]
}

/// Top-level configuration loaded from a YAML file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Channels on the device.
    pub channel: u32,
    /// Packages ("ways") per channel.
    pub way: u32,
    /// Dies per package.
    pub die: u32,
    /// Planes per die.
    pub plane: u32,
    /// Blocks per plane.
    pub block: u32,
    /// Pages per block.
    pub page: u32,
    /// Bytes per page.
    pub page_size: u32,
    /// Bytes per super-page (striped across multiple dies/planes).
    pub super_page_size: u32,

    /// Most-significant-to-least-significant order a PPN decomposes in.
    #[serde(default = "default_axis_order")]
    pub axis_order: Vec<Axis>,

    /// NAND cell technology the `pal-latency` table is built for.
    #[serde(default)]
    pub technology: Technology,

    /// Enables `Scheduler::with_conflict_tracking` (spec §4.6 "Conflict
    /// accounting").
    #[serde(default)]
    pub track_conflicts: bool,
}

impl Config {
    /// Builds the `pal_core::Parameter` this configuration describes.
    pub fn parameter(&self) -> Parameter {
        Parameter {
            channel: self.channel,
            way: self.way,
            die: self.die,
            plane: self.plane,
            block: self.block,
            page: self.page,
            page_size: self.page_size,
            super_page_size: self.super_page_size,
        }
    }

    /// Builds the `pal_core::AddressLayout` this configuration describes, no
    /// super-page misalignment (that descriptor is not yet exposed through
    /// the configuration file).
    pub fn address_layout(&self) -> Result<AddressLayout> {
        if self.axis_order.len() != 6 {
            return Err(anyhow!(
                "axis_order must list all six axes exactly once, got {:?}",
                self.axis_order
            ));
        }
        let mut permutation = [0u8; 6];
        for (i, axis) in self.axis_order.iter().enumerate() {
            permutation[i] = axis.index();
        }
        let layout = AddressLayout {
            sizes: self.parameter().axis_sizes(),
            permutation,
            misalign: None,
        };
        layout.validate().map_err(|e| anyhow!("{e}"))?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_configuration() {
        let yaml = r#"
channel: 2
way: 1
die: 2
plane: 1
block: 512
page: 256
page_size: 16384
super_page_size: 16384
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.channel, 2);
        assert_eq!(config.technology, Technology::Slc);
        assert_eq!(config.axis_order, default_axis_order());
        config.address_layout().unwrap();
    }

    #[test]
    fn rejects_an_incomplete_axis_order() {
        let yaml = r#"
channel: 1
way: 1
die: 1
plane: 1
block: 4
page: 4
page_size: 4096
super_page_size: 4096
axis_order: [channel, way, die]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.address_layout().is_err());
    }
}
