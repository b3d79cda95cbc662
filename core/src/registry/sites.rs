use crate::prelude::{QvpError, QvpResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labels used when titling quicklooks for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotLabels {
    pub facility: String,
    pub title: String,
    pub tilt: String,
}

/// Descriptive attributes attached to every dataset produced for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub convention: String,
    pub vap_name: String,
    pub sweep_angle: String,
    pub instrument_name: String,
    pub process_version: String,
    pub dod_version: String,
    pub site_id: String,
    pub platform_id: String,
    pub facility_id: String,
    pub data_level: String,
    pub location_description: String,
    /// Prefix of every file written for this site.
    pub datastream: String,
    pub doi: String,
    pub input_datastream: String,
    pub plot: PlotLabels,
}

impl SiteProfile {
    /// Global attributes in the order they are written.
    pub fn global_attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Convention", self.convention.clone()),
            ("vap_name", self.vap_name.clone()),
            ("sweep_angle", self.sweep_angle.clone()),
            ("instrument_name", self.instrument_name.clone()),
            ("process_version", self.process_version.clone()),
            ("dod_version", self.dod_version.clone()),
            ("site_id", self.site_id.clone()),
            ("platform_id", self.platform_id.clone()),
            ("facility_id", self.facility_id.clone()),
            ("data_level", self.data_level.clone()),
            ("location_description", self.location_description.clone()),
            ("datastream", self.datastream.clone()),
            ("doi", self.doi.clone()),
            ("input_datastream", self.input_datastream.clone()),
        ]
    }

    fn xsapr(facility: &str, facility_id: &str) -> Self {
        Self {
            convention: "ARM-1.2".into(),
            vap_name: "qvp".into(),
            sweep_angle: "20.0 degrees".into(),
            instrument_name: "X-SAPR Quasi Vertical Profile".into(),
            process_version: "EVAL-0.5".into(),
            dod_version: "v1.0".into(),
            site_id: "SGP".into(),
            platform_id: "xsaprqvp".into(),
            facility_id: facility_id.into(),
            data_level: "c1".into(),
            location_description: "Southern Great Plains (SGP), Garber, Oklahoma".into(),
            datastream: format!("sgpxsaprqvp{}.c1", facility),
            doi: "10.5439/1506645".into(),
            input_datastream: format!("sgpadicmac2{}.c1", facility),
            plot: PlotLabels {
                facility: facility.into(),
                title: format!("SGP X-SAPR {} QVP Profile", facility),
                tilt: "20.0 degrees".into(),
            },
        }
    }
}

/// Site identifier to [`SiteProfile`] lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteRegistry {
    sites: BTreeMap<String, SiteProfile>,
}

impl SiteRegistry {
    pub fn new(sites: BTreeMap<String, SiteProfile>) -> Self {
        Self { sites }
    }

    /// The three SGP X-SAPR facilities.
    pub fn builtin() -> Self {
        let mut sites = BTreeMap::new();
        sites.insert("xsaprqvpI4".to_string(), SiteProfile::xsapr("I4", "I4 : Billings, OK"));
        sites.insert("xsaprqvpI5".to_string(), SiteProfile::xsapr("I5", "I5 : Garber, OK"));
        sites.insert("xsaprqvpI6".to_string(), SiteProfile::xsapr("I6", "I6 : Deer Creek, OK"));
        Self { sites }
    }

    /// Unknown identifiers are an error; there is no empty fallback.
    pub fn get(&self, site: &str) -> QvpResult<&SiteProfile> {
        self.sites
            .get(site)
            .ok_or_else(|| QvpError::UnknownSite(site.to_string()))
    }

    /// Add or replace entries from `other`.
    pub fn merge(&mut self, other: SiteRegistry) {
        self.sites.extend(other.sites);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SiteProfile)> {
        self.sites.iter()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
