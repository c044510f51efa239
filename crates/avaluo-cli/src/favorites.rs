// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use avaluo_app::ListingId;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Comparable favorites, kept locally as a JSON array of listing ids.
/// Independent of the server-side session store; favorites survive restarts
/// and never affect valuation.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    ids: BTreeSet<ListingId>,
}

impl FavoritesStore {
    pub fn default_path() -> Result<PathBuf> {
        let data_root = dirs::data_dir()
            .ok_or_else(|| anyhow!("cannot resolve data directory for the favorites file"))?;
        Ok(data_root.join("avaluo").join("favorites.json"))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let ids = if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read favorites file {}", path.display()))?;
            let listed: Vec<ListingId> = serde_json::from_str(&raw).with_context(|| {
                format!(
                    "parse favorites file {} -- delete it to start over",
                    path.display()
                )
            })?;
            listed.into_iter().filter(|id| !id.is_empty()).collect()
        } else {
            BTreeSet::new()
        };

        Ok(Self {
            path: path.to_owned(),
            ids,
        })
    }

    pub fn ids(&self) -> &BTreeSet<ListingId> {
        &self.ids
    }

    /// Flips one favorite and writes the file through. Returns the new
    /// state of the flag.
    pub fn toggle(&mut self, id: &ListingId) -> Result<bool> {
        let favorite = if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        };
        self.persist()?;
        Ok(favorite)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create favorites directory {}", parent.display()))?;
        }
        let listed: Vec<&ListingId> = self.ids.iter().collect();
        let raw = serde_json::to_string_pretty(&listed).context("encode favorites")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("write favorites file {}", self.path.display()))
    }
}
