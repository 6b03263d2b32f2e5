// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! `listscrape profiles`: list site profiles in match order.

use crate::config::{ConfigOverrides, ServiceConfig};
use anyhow::Result;
use listscrape::ProfileRegistry;
use std::path::PathBuf;

pub fn run(profiles: Option<PathBuf>, json: bool) -> Result<()> {
    let config = ServiceConfig::resolve(ConfigOverrides {
        profiles,
        ..Default::default()
    })?;
    let registry = config.load_registry()?;
    if json {
        let all: Vec<_> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
    } else {
        print!("{}", render_table(&registry));
    }
    Ok(())
}

fn render_table(registry: &ProfileRegistry) -> String {
    let width = registry.iter().map(|p| p.key.len()).max().unwrap_or(0);
    registry
        .iter()
        .map(|p| {
            let pagination = serde_json::to_value(p.pagination)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            format!("{:<width$}  {pagination}\n", p.key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_generic_last() {
        let table = render_table(&ProfileRegistry::builtin());
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("f6s.com"));
        assert!(lines[0].ends_with("click_button"));
        let last = lines.last().unwrap();
        assert!(last.starts_with("generic"));
        assert!(last.ends_with("auto_detect"));
    }
}
