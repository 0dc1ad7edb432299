//! Shared JSON fixtures for clip tests, listed in `fixtures/manifest.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    clips: HashMap<String, String>,
    #[serde(rename = "clip-sets", default)]
    clip_sets: HashMap<String, String>,
}

#[derive(Copy, Clone, Debug)]
enum Kind {
    Clip,
    ClipSet,
}

impl Kind {
    fn entries(self) -> &'static HashMap<String, String> {
        match self {
            Kind::Clip => &MANIFEST.clips,
            Kind::ClipSet => &MANIFEST.clip_sets,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kind::Clip => "clip",
            Kind::ClipSet => "clip set",
        }
    }

    fn keys(self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn path(self, name: &str) -> Result<PathBuf> {
        let rel = self
            .entries()
            .get(name)
            .ok_or_else(|| anyhow!("unknown {} fixture '{name}'", self.label()))?;
        Ok(Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(rel))
    }

    fn json(self, name: &str) -> Result<String> {
        let path = self.path(name)?;
        fs::read_to_string(&path).with_context(|| {
            format!("failed to read {} fixture at {}", self.label(), path.display())
        })
    }

    fn load<T: DeserializeOwned>(self, name: &str) -> Result<T> {
        let text = self.json(name)?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {} fixture '{name}'", self.label()))
    }
}

pub mod clips {
    use super::*;

    /// Sorted fixture names.
    pub fn keys() -> Vec<String> {
        Kind::Clip.keys()
    }

    pub fn json(name: &str) -> Result<String> {
        Kind::Clip.json(name)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        Kind::Clip.load(name)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        Kind::Clip.path(name)
    }
}

pub mod clip_sets {
    use super::*;

    pub fn keys() -> Vec<String> {
        Kind::ClipSet.keys()
    }

    pub fn json(name: &str) -> Result<String> {
        Kind::ClipSet.json(name)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        Kind::ClipSet.load(name)
    }
}
