use anyhow::Context;
use qvpcore::prelude::OverwritePolicy;
use qvpcore::registry::SiteRegistry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Quicklooks drawn after a dataset is written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuicklookConfig {
    /// Moments to draw one panel each for.
    pub single: Vec<String>,
    /// Optional stacked four-panel figure, top to bottom.
    pub four_panel: Option<[String; 4]>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub site: String,
    pub elevation_deg: f64,
    /// Restrict the run to these moments; all catalogued moments when unset.
    pub moments: Option<Vec<String>>,
    pub data_dir: Option<PathBuf>,
    pub image_dir: Option<PathBuf>,
    pub overwrite: OverwritePolicy,
    /// YAML map of extra site entries merged over the built-ins.
    pub sites_file: Option<PathBuf>,
    pub quicklooks: QuicklookConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            site: "xsaprqvpI5".into(),
            elevation_deg: 20.0,
            moments: None,
            data_dir: None,
            image_dir: None,
            overwrite: OverwritePolicy::Replace,
            sites_file: None,
            quicklooks: QuicklookConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// The config at `path`, or the defaults when no workflow file is given.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Built-in sites, overlaid with `sites_file` when one is configured.
    pub fn site_registry(&self) -> anyhow::Result<SiteRegistry> {
        let mut sites = SiteRegistry::builtin();
        if let Some(path) = &self.sites_file {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading site registry {}", path.display()))?;
            let extra: SiteRegistry = serde_yaml::from_str(&contents)
                .with_context(|| format!("parsing site registry {}", path.display()))?;
            sites.merge(extra);
        }
        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_defaults_fill_missing_keys() {
        let cfg: WorkflowConfig = serde_yaml::from_str("site: xsaprqvpI4\n").unwrap();
        assert_eq!(cfg.site, "xsaprqvpI4");
        assert_eq!(cfg.elevation_deg, 20.0);
        assert_eq!(cfg.overwrite, OverwritePolicy::Replace);
        assert!(cfg.quicklooks.single.is_empty());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"site: xsaprqvpI6\nelevation_deg: 19.5\noverwrite: refuse\n\
              moments: [velocity, corrected_reflectivity]\n\
              quicklooks:\n  four_panel: [velocity, reflectivity, spectrum_width, gate_id]\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.site, "xsaprqvpI6");
        assert_eq!(cfg.overwrite, OverwritePolicy::Refuse);
        assert_eq!(cfg.moments.as_ref().map(Vec::len), Some(2));
        assert_eq!(cfg.quicklooks.four_panel.unwrap()[3], "gate_id");
    }

    #[test]
    fn sites_file_merges_over_builtins() {
        let sites = SiteRegistry::builtin();
        let mut custom = sites.get("xsaprqvpI5").unwrap().clone();
        custom.datastream = "sgpxsaprqvpI7.c1".into();
        let mut map = std::collections::BTreeMap::new();
        map.insert("xsaprqvpI7".to_string(), custom);

        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(serde_yaml::to_string(&map).unwrap().as_bytes())
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig {
            sites_file: Some(path.to_path_buf()),
            ..Default::default()
        };

        let merged = cfg.site_registry().unwrap();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.get("xsaprqvpI7").unwrap().datastream, "sgpxsaprqvpI7.c1");
    }

    #[test]
    fn workflow_file_carries_its_site_registry() {
        let mut sites_yaml = NamedTempFile::new().unwrap();
        let mut custom = SiteRegistry::builtin().get("xsaprqvpI5").unwrap().clone();
        custom.datastream = "sgpxsaprqvpI7.c1".into();
        let mut map = std::collections::BTreeMap::new();
        map.insert("xsaprqvpI7".to_string(), custom);
        sites_yaml
            .write_all(serde_yaml::to_string(&map).unwrap().as_bytes())
            .unwrap();
        let sites_path = sites_yaml.into_temp_path();

        let mut workflow = NamedTempFile::new().unwrap();
        writeln!(workflow, "site: xsaprqvpI7\nsites_file: {}", sites_path.display()).unwrap();
        let workflow_path = workflow.into_temp_path();

        let cfg = WorkflowConfig::load_or_default(Some(&*workflow_path)).unwrap();
        assert_eq!(cfg.site, "xsaprqvpI7");
        assert!(cfg.site_registry().unwrap().get("xsaprqvpI7").is_ok());

        let defaults = WorkflowConfig::load_or_default(None).unwrap();
        assert_eq!(defaults, WorkflowConfig::default());
        assert!(defaults.site_registry().unwrap().get("xsaprqvpI7").is_err());
    }
}
