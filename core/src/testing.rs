//! In-memory radar toolkit used by the unit tests.

use crate::prelude::{QvpError, QvpResult};
use crate::registry::MomentCatalog;
use crate::toolkit_interface::{
    ProfileRequest, RadarToolkit, RadarVolume, RetrievedProfile, SiteLocation,
};
use chrono::{DateTime, TimeZone, Timelike, Utc};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const GATE_SPACING_M: f64 = 250.0;

#[derive(Debug, Clone)]
pub struct FakeScan {
    pub time: DateTime<Utc>,
    pub gates: usize,
    pub classification: bool,
}

impl FakeScan {
    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> Self {
        Self {
            time: Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap(),
            gates: 5,
            classification: false,
        }
    }

    pub fn with_classification(mut self) -> Self {
        self.classification = true;
        self
    }

    pub fn with_gates(mut self, gates: usize) -> Self {
        self.gates = gates;
        self
    }

    /// Value stored for `gate`; the top gate is masked.
    pub fn sample(&self, gate: usize) -> f32 {
        if gate + 1 == self.gates {
            f32::NAN
        } else {
            self.time.hour() as f32 * 10.0 + gate as f32
        }
    }
}

impl RadarVolume for FakeScan {
    fn first_ray_time(&self) -> DateTime<Utc> {
        self.time
    }

    fn location(&self) -> SiteLocation {
        SiteLocation {
            latitude: 36.491178,
            longitude: -97.593936,
            altitude: 330.0,
        }
    }

    fn declares_field(&self, field: &str) -> bool {
        field != "radar_echo_classification" || self.classification
    }
}

#[derive(Default)]
pub struct FakeToolkit {
    scans: BTreeMap<PathBuf, FakeScan>,
    unreadable: BTreeSet<PathBuf>,
    withheld: BTreeSet<String>,
    last_request: RefCell<Option<ProfileRequest>>,
}

impl FakeToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan(mut self, path: &str, scan: FakeScan) -> Self {
        self.scans.insert(PathBuf::from(path), scan);
        self
    }

    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(PathBuf::from(path));
        self
    }

    /// Never return `source`, even when it is requested.
    pub fn without_field(mut self, source: &str) -> Self {
        self.withheld.insert(source.to_string());
        self
    }

    pub fn last_request(&self) -> Option<ProfileRequest> {
        self.last_request.borrow().clone()
    }
}

impl RadarToolkit for FakeToolkit {
    type Volume = FakeScan;

    fn read(&self, path: &Path) -> QvpResult<FakeScan> {
        if self.unreadable.contains(path) {
            return Err(QvpError::UnreadableScan {
                path: path.to_path_buf(),
                reason: "not a radar volume".into(),
            });
        }
        self.scans
            .get(path)
            .cloned()
            .ok_or_else(|| QvpError::UnreadableScan {
                path: path.to_path_buf(),
                reason: "no such file".into(),
            })
    }

    fn quasi_vertical_profile(
        &self,
        volume: &FakeScan,
        request: &ProfileRequest,
    ) -> QvpResult<RetrievedProfile> {
        *self.last_request.borrow_mut() = Some(request.clone());

        let sources: Vec<String> = match &request.fields {
            Some(fields) => fields.clone(),
            None => MomentCatalog::builtin()
                .iter()
                .map(|spec| spec.source.clone())
                .collect(),
        };
        let height = (0..volume.gates)
            .map(|gate| gate as f64 * GATE_SPACING_M)
            .collect();
        let values: Vec<f32> = (0..volume.gates).map(|gate| volume.sample(gate)).collect();

        Ok(sources
            .iter()
            .filter(|source| !self.withheld.contains(*source))
            .fold(RetrievedProfile::new(height), |profile, source| {
                profile.with_field(source, values.clone())
            }))
    }
}
