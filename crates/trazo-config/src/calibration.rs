//! Calibration state: per-coupling-mode correction factors.
//!
//! A factor is captured by feeding the probe path a known reference signal
//! and comparing what the scope measures ([`entry_from_vpp`]). Because the
//! hardware front-end scales differently per input range, the entry also
//! records the range it was captured under; applying it on another range
//! goes through the relative compensation in
//! [`CalibrationState::effective_factor`].
//!
//! # TOML Format
//!
//! ```toml
//! [ac]
//! factor = 1.25
//! range_index = 2
//!
//! [dc]
//! factor = 1.0
//! range_index = 2
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use trazo_core::CouplingMode;
use trazo_core::ranges::range_compensation;

use crate::error::ConfigError;

/// Peak-to-peak volts the reference source feeds the probe input.
const REFERENCE_VPP: f32 = 1.0;

/// Level the hardware loopback drives the reference at.
const HARDWARE_LEVEL_VPP: f32 = 0.4;

/// The input range the probe front-end treats as unity.
const REFERENCE_RANGE_INDEX: usize = 2;

/// One captured calibration: the correction factor and the input range it
/// was measured under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    /// Multiplicative correction applied to raw sample values.
    pub factor: f32,
    /// Input range index active when the factor was captured.
    pub range_index: usize,
}

impl Default for CalibrationEntry {
    fn default() -> Self {
        Self {
            factor: 1.0,
            range_index: REFERENCE_RANGE_INDEX,
        }
    }
}

/// Calibration factors for both coupling modes, persisted across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationState {
    /// AC-coupled calibration.
    #[serde(default)]
    pub ac: CalibrationEntry,
    /// DC-coupled calibration.
    #[serde(default)]
    pub dc: CalibrationEntry,
}

impl CalibrationState {
    /// The entry for a coupling mode.
    pub fn entry(&self, mode: CouplingMode) -> CalibrationEntry {
        match mode {
            CouplingMode::Ac => self.ac,
            CouplingMode::Dc => self.dc,
        }
    }

    /// Replaces the entry for a coupling mode.
    pub fn set_entry(&mut self, mode: CouplingMode, entry: CalibrationEntry) {
        match mode {
            CouplingMode::Ac => self.ac = entry,
            CouplingMode::Dc => self.dc = entry,
        }
    }

    /// Correction factor for the given mode at the currently selected input
    /// range.
    ///
    /// The captured factor is only exact on the range it was measured
    /// under; other ranges scale it by the ratio of their hardware
    /// compensation factors.
    pub fn effective_factor(&self, mode: CouplingMode, current_range: usize) -> f32 {
        let entry = self.entry(mode);
        let relative = range_compensation(current_range) / range_compensation(entry.range_index);
        entry.factor * relative
    }

    /// Load calibration state from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Ok(Self::from_toml(&content)?)
    }

    /// Parse calibration state from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save calibration state to a TOML file, creating parent directories
    /// as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Serialize calibration state to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Derives a calibration entry from a measured reference Vpp.
///
/// The reference source drives the probe path at [`HARDWARE_LEVEL_VPP`]
/// standing in for a true [`REFERENCE_VPP`] signal; the factor is what maps
/// the scope's measured Vpp back onto the reference. Returns `None` for a
/// non-positive measurement (no signal present), leaving existing state to
/// the caller.
pub fn entry_from_vpp(measured_vpp: f32, range_index: usize) -> Option<CalibrationEntry> {
    if measured_vpp <= 0.0 {
        return None;
    }

    let drive_gain = REFERENCE_VPP / HARDWARE_LEVEL_VPP;
    let response = HARDWARE_LEVEL_VPP / measured_vpp;
    Some(CalibrationEntry {
        factor: drive_gain * response,
        range_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unity_on_reference_range() {
        let state = CalibrationState::default();
        assert_eq!(state.entry(CouplingMode::Ac).factor, 1.0);
        assert_eq!(state.entry(CouplingMode::Dc).range_index, REFERENCE_RANGE_INDEX);
        assert_eq!(state.effective_factor(CouplingMode::Dc, REFERENCE_RANGE_INDEX), 1.0);
    }

    #[test]
    fn modes_are_independent() {
        let mut state = CalibrationState::default();
        state.set_entry(
            CouplingMode::Ac,
            CalibrationEntry {
                factor: 2.5,
                range_index: 1,
            },
        );
        assert_eq!(state.entry(CouplingMode::Ac).factor, 2.5);
        assert_eq!(state.entry(CouplingMode::Dc).factor, 1.0);
    }

    #[test]
    fn effective_factor_compensates_range_change() {
        let mut state = CalibrationState::default();
        state.set_entry(
            CouplingMode::Dc,
            CalibrationEntry {
                factor: 1.2,
                range_index: 2,
            },
        );
        // Same range: factor as captured.
        assert!((state.effective_factor(CouplingMode::Dc, 2) - 1.2).abs() < 1e-6);
        // One range down: compensation 0.1 vs 1.0.
        assert!((state.effective_factor(CouplingMode::Dc, 1) - 0.12).abs() < 1e-6);
        // One range up: compensation 10.0 vs 1.0.
        assert!((state.effective_factor(CouplingMode::Dc, 3) - 12.0).abs() < 1e-5);
    }

    #[test]
    fn entry_from_vpp_inverts_measurement() {
        // Measuring exactly the hardware level means the only correction is
        // the drive gain up to the reference.
        let entry = entry_from_vpp(0.4, 2).unwrap();
        assert!((entry.factor - 2.5).abs() < 1e-6);
        assert_eq!(entry.range_index, 2);

        // Measuring the reference exactly needs unity.
        let entry = entry_from_vpp(1.0, 0).unwrap();
        assert!((entry.factor - 1.0).abs() < 1e-6);
        assert_eq!(entry.range_index, 0);
    }

    #[test]
    fn entry_from_vpp_rejects_silence() {
        assert!(entry_from_vpp(0.0, 2).is_none());
        assert!(entry_from_vpp(-1.0, 2).is_none());
    }

    #[test]
    fn toml_roundtrip_preserves_both_modes() {
        let mut state = CalibrationState::default();
        state.set_entry(
            CouplingMode::Ac,
            CalibrationEntry {
                factor: 1.3125,
                range_index: 1,
            },
        );
        state.set_entry(
            CouplingMode::Dc,
            CalibrationEntry {
                factor: 0.875,
                range_index: 3,
            },
        );

        let toml_str = state.to_toml().unwrap();
        let loaded = CalibrationState::from_toml(&toml_str).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("calibration.toml");

        let mut state = CalibrationState::default();
        state.set_entry(
            CouplingMode::Ac,
            CalibrationEntry {
                factor: 1.5,
                range_index: 0,
            },
        );
        state.save(&path).unwrap();

        let loaded = CalibrationState::load(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = CalibrationState::load("/nonexistent/calibration.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let state = CalibrationState::from_toml("[ac]\nfactor = 2.0\nrange_index = 1\n").unwrap();
        assert_eq!(state.ac.factor, 2.0);
        assert_eq!(state.dc, CalibrationEntry::default());
    }
}
