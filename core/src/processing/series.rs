use crate::prelude::{QvpError, QvpResult};
use crate::toolkit_interface::SiteLocation;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Profiles recorded from one successfully read scan file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileStep {
    pub source: PathBuf,
    pub time: DateTime<Utc>,
    pub location: SiteLocation,
    pub height: Vec<f64>,
    /// Output moment name to height vector.
    pub moments: BTreeMap<String, Vec<f32>>,
}

/// Whether a moment was recorded at every time step of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Complete,
    Partial { present: usize, total: usize },
}

/// One moment's profiles, one slot per time step of the owning series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MomentColumn {
    rows: Vec<Option<Vec<f32>>>,
}

impl MomentColumn {
    pub fn rows(&self) -> &[Option<Vec<f32>>] {
        &self.rows
    }

    pub fn presence(&self) -> Presence {
        let present = self.rows.iter().filter(|row| row.is_some()).count();
        if present == self.rows.len() {
            Presence::Complete
        } else {
            Presence::Partial {
                present,
                total: self.rows.len(),
            }
        }
    }
}

/// Time-ordered profiles gathered by the accumulator.
///
/// Every column holds exactly one slot per timestamp; a step that lacks a
/// moment leaves an empty slot instead of shifting later rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileSeries {
    times: Vec<DateTime<Utc>>,
    height: Option<Vec<f64>>,
    location: Option<SiteLocation>,
    columns: BTreeMap<String, MomentColumn>,
}

impl ProfileSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step. Nothing is modified when the step is rejected.
    pub fn push(&mut self, step: ProfileStep) -> QvpResult<()> {
        if let Some(height) = &self.height {
            if *height != step.height {
                return Err(QvpError::HeightMismatch { path: step.source });
            }
        }
        for (moment, values) in &step.moments {
            if values.len() != step.height.len() {
                return Err(QvpError::ProfileLength {
                    moment: moment.clone(),
                    expected: step.height.len(),
                    found: values.len(),
                });
            }
        }

        let index = self.times.len();
        let ProfileStep {
            time,
            location,
            height,
            mut moments,
            ..
        } = step;

        for (name, column) in self.columns.iter_mut() {
            column.rows.push(moments.remove(name));
        }
        for (name, values) in moments {
            let mut rows = vec![None; index];
            rows.push(Some(values));
            self.columns.insert(name, MomentColumn { rows });
        }

        self.times.push(time);
        if self.height.is_none() {
            self.height = Some(height);
        }
        if self.location.is_none() {
            self.location = Some(location);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Shared height bins, empty before the first step.
    pub fn height(&self) -> &[f64] {
        self.height.as_deref().unwrap_or(&[])
    }

    /// Location reported by the first accumulated scan.
    pub fn location(&self) -> Option<SiteLocation> {
        self.location
    }

    pub fn moment_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, moment: &str) -> Option<&MomentColumn> {
        self.columns.get(moment)
    }

    /// Stack a moment into a `(time, height)` array in accumulation order.
    pub fn stack(&self, moment: &str) -> QvpResult<Array2<f32>> {
        let column = self
            .columns
            .get(moment)
            .ok_or_else(|| QvpError::UnknownMoment(moment.to_string()))?;
        if let Presence::Partial { present, total } = column.presence() {
            return Err(QvpError::InconsistentSeries {
                moment: moment.to_string(),
                present,
                total,
            });
        }

        let width = self.height().len();
        let mut stacked = Array2::from_elem((self.len(), width), f32::NAN);
        for (mut row, values) in stacked.outer_iter_mut().zip(column.rows.iter().flatten()) {
            for (cell, value) in row.iter_mut().zip(values.iter()) {
                *cell = *value;
            }
        }
        Ok(stacked)
    }
}
