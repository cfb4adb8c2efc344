// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Kinds command - list supported message kinds.

use clap::Args;

use crate::common::Result;
use osi_trace::encoding::global_registry;
use osi_trace::schema::osi_version_string;

/// List supported message kinds with their schema names and abbreviations.
#[derive(Args, Clone, Debug)]
pub struct KindsCmd {}

impl KindsCmd {
    pub fn run(self) -> Result<()> {
        let registry = global_registry()?;

        println!("OSI {}", osi_version_string());
        println!("{:<24} {:<28} ABBR", "KIND", "SCHEMA");
        for kind in registry.kinds() {
            println!(
                "{:<24} {:<28} {}",
                kind.type_name(),
                kind.schema_name(),
                kind.abbreviation()
            );
        }
        Ok(())
    }
}
