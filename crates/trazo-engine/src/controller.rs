//! Acquisition controller.
//!
//! Owns one capture buffer and one spectrum analyzer, is driven once per
//! audio block by the host, and serves every read the display makes. The
//! audio-thread surface ([`AcquisitionController::process_block`]) does O(1)
//! bounded work and never allocates; all other methods belong to the UI or
//! configuration context.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use trazo_analysis::{Harmonic, PlotPath, Rect, SpectrumAnalyzer, compute_thd};
use trazo_config::{CalibrationState, entry_from_vpp};
use trazo_core::{
    CaptureBuffer, CouplingMode, DisplayMode, SampleWindow, ScopeParams, Trigger, TriggerConfig,
    metrics,
};

/// Seconds of audio the capture buffer holds.
pub const CAPTURE_SECONDS: usize = 10;

/// Transform order for the THD measurement (2^10 = 1024-sample frames).
pub const THD_TRANSFORM_ORDER: u32 = 10;

/// Seconds of audio the spectrum intake queue holds.
const INTAKE_SECONDS: usize = 1;

/// Bounded join timeout when stopping the analysis worker.
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Orchestrator for one scope instance.
///
/// The capture buffer is lock-free; the trigger scratch and calibration
/// state sit behind short mutexes because they are only ever touched from
/// the display/UI context (the calibration lock also makes the "UI writes,
/// anyone reads" contract safe without atomics on every field).
pub struct AcquisitionController {
    capture: CaptureBuffer,
    analyzer: SpectrumAnalyzer,
    trigger: Mutex<Trigger>,
    calibration: Mutex<CalibrationState>,
    sample_rate: f32,
}

impl Default for AcquisitionController {
    fn default() -> Self {
        Self::new()
    }
}

impl AcquisitionController {
    /// Creates an unprepared controller with default analysis settings.
    pub fn new() -> Self {
        Self {
            capture: CaptureBuffer::new(),
            analyzer: SpectrumAnalyzer::with_defaults(),
            trigger: Mutex::new(Trigger::default()),
            calibration: Mutex::new(CalibrationState::default()),
            sample_rate: 0.0,
        }
    }

    /// Sizes both acquisition paths for a stream configuration and starts
    /// the analysis worker.
    ///
    /// Must be called before any block is processed, and again whenever the
    /// host renegotiates sample rate or channel count. Not safe concurrently
    /// with `process_block`; the host calls it with audio stopped, which
    /// `&mut self` encodes.
    pub fn prepare(&mut self, sample_rate: f32, num_channels: usize) {
        let capacity = sample_rate as usize * CAPTURE_SECONDS;
        self.capture.prepare(num_channels, capacity);
        self.analyzer
            .configure(sample_rate as usize * INTAKE_SECONDS, sample_rate);
        self.analyzer.start();
        self.sample_rate = sample_rate;
        debug!(sample_rate, num_channels, capacity, "acquisition prepared");
    }

    /// Stops the analysis worker with a bounded join. Safe to call more
    /// than once; also runs on drop via the analyzer.
    pub fn release(&mut self) {
        self.analyzer.stop(STOP_TIMEOUT);
    }

    /// Configured sample rate, 0.0 before the first prepare.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// True once `prepare` has sized the buffers.
    pub fn is_prepared(&self) -> bool {
        self.capture.capacity() > 0
    }

    /// Feeds one audio block into the path the current display mode reads.
    ///
    /// Real-time safe: a capture push is bounded per-frame work, a spectrum
    /// enqueue is a best-effort write that drops on a full queue. Bypass
    /// freezes acquisition while leaving both paths intact.
    pub fn process_block(&self, block: &[&[f32]], params: &ScopeParams) {
        if params.bypass {
            return;
        }

        match params.display_mode {
            DisplayMode::Frequency => self.analyzer.enqueue(block, 0, block.len()),
            DisplayMode::Time => self.capture.push_block(block),
        }
    }

    // --- time-domain display surface ---

    /// Copies the most recent `num_samples` captured samples into `out`.
    pub fn most_recent_window(&self, out: &mut SampleWindow, num_samples: usize) {
        self.capture.most_recent_window(out, num_samples);
    }

    /// Locates the trigger reference index in a captured window.
    pub fn find_trigger_point(
        &self,
        window: &SampleWindow,
        channel: usize,
        config: TriggerConfig,
    ) -> usize {
        let mut trigger = self.trigger.lock();
        trigger.set_config(config);
        trigger.find_trigger_point(window, channel)
    }

    /// Calibrated RMS of a captured window under the current parameters.
    pub fn measure_rms(&self, window: &SampleWindow, params: &ScopeParams) -> f32 {
        let factor = self.effective_calibration_factor(params.coupling, params.range);
        metrics::rms(window, factor)
    }

    /// Fundamental frequency of a captured window via zero crossings;
    /// -1.0 when unresolvable.
    pub fn measure_frequency(&self, window: &SampleWindow) -> f32 {
        metrics::zero_crossing_frequency(window, self.sample_rate)
    }

    /// THD ratio of a captured window.
    pub fn measure_thd(&self, window: &SampleWindow) -> f32 {
        compute_thd(window, THD_TRANSFORM_ORDER)
    }

    // --- frequency-domain display surface ---

    /// True once per spectrum the analysis worker produced since the last
    /// call.
    pub fn has_new_data(&self) -> bool {
        self.analyzer.has_new_data()
    }

    /// Builds the averaged-spectrum polyline; see
    /// [`SpectrumAnalyzer::build_display_path`].
    pub fn build_display_path(
        &self,
        path: &mut PlotPath,
        bounds: Rect,
        min_frequency: f32,
        db_floor: f32,
        db_ceiling: f32,
    ) {
        self.analyzer
            .build_display_path(path, bounds, min_frequency, db_floor, db_ceiling);
    }

    /// Harmonic list of the averaged spectrum; see
    /// [`SpectrumAnalyzer::extract_harmonics`].
    pub fn extract_harmonics(&self, max_harmonics: usize, db_floor: f32) -> Vec<Harmonic> {
        self.analyzer.extract_harmonics(max_harmonics, db_floor)
    }

    // --- calibration ---

    /// Snapshot of the persisted calibration state.
    pub fn calibration(&self) -> CalibrationState {
        *self.calibration.lock()
    }

    /// Replaces the calibration state (host state restore).
    pub fn set_calibration(&self, state: CalibrationState) {
        *self.calibration.lock() = state;
    }

    /// Captures a fresh calibration entry for `mode` from a measured
    /// reference Vpp on the given range. Returns false (state unchanged)
    /// when the measurement is non-positive.
    pub fn calibrate_from_vpp(&self, mode: CouplingMode, measured_vpp: f32, range_index: usize) -> bool {
        match entry_from_vpp(measured_vpp, range_index) {
            Some(entry) => {
                self.calibration.lock().set_entry(mode, entry);
                debug!(factor = entry.factor, range_index, "calibration captured");
                true
            }
            None => false,
        }
    }

    /// Effective correction factor for `mode` on the currently selected
    /// range.
    pub fn effective_calibration_factor(&self, mode: CouplingMode, current_range: usize) -> f32 {
        self.calibration.lock().effective_factor(mode, current_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;
    use trazo_analysis::generate_test_tone;

    const SAMPLE_RATE: f32 = 48000.0;

    fn prepared_controller() -> AcquisitionController {
        let mut controller = AcquisitionController::new();
        controller.prepare(SAMPLE_RATE, 1);
        controller
    }

    fn feed_tone(controller: &AcquisitionController, params: &ScopeParams, seconds: f32) {
        let tone = generate_test_tone(SAMPLE_RATE, 1000.0, seconds, 1.0);
        for block in tone.chunks(512) {
            controller.process_block(&[block], params);
        }
    }

    #[test]
    fn time_mode_end_to_end() {
        let mut controller = prepared_controller();
        let params = ScopeParams {
            range: 2,
            ..ScopeParams::default()
        };
        feed_tone(&controller, &params, 0.1);

        // 2400 samples = exactly 50 periods of the 1 kHz tone.
        let mut window = SampleWindow::new();
        controller.most_recent_window(&mut window, 2400);
        assert_eq!(window.len(), 2400);

        // A clean sine triggers, measures ~0.707 RMS at unity calibration,
        // and reads back its frequency.
        let trigger_index = controller.find_trigger_point(&window, 0, TriggerConfig::default());
        assert!(trigger_index > 0);

        let rms = controller.measure_rms(&window, &params);
        assert!((rms - core::f32::consts::FRAC_1_SQRT_2).abs() < 1e-2, "rms {rms}");

        let frequency = controller.measure_frequency(&window);
        assert!((frequency - 1000.0).abs() < 2.0, "frequency {frequency}");

        let thd = controller.measure_thd(&window);
        assert!(thd < 0.05, "thd {thd}");

        controller.release();
    }

    #[test]
    fn frequency_mode_produces_spectrum() {
        let controller = prepared_controller();
        let params = ScopeParams {
            display_mode: DisplayMode::Frequency,
            ..ScopeParams::default()
        };
        feed_tone(&controller, &params, 0.25);

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut produced = false;
        while Instant::now() < deadline {
            if controller.has_new_data() {
                produced = true;
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(produced, "analysis worker produced no spectrum");

        let harmonics = controller.extract_harmonics(5, -100.0);
        assert!(!harmonics.is_empty());
        assert!((harmonics[0].frequency_hz - 1000.0).abs() < 25.0);

        let mut path = PlotPath::new();
        controller.build_display_path(
            &mut path,
            Rect::new(0.0, 0.0, 900.0, 500.0),
            20.0,
            -100.0,
            24.0,
        );
        assert!(!path.is_empty());
    }

    #[test]
    fn frequency_mode_leaves_capture_untouched() {
        let controller = prepared_controller();
        let params = ScopeParams {
            display_mode: DisplayMode::Frequency,
            ..ScopeParams::default()
        };
        feed_tone(&controller, &params, 0.05);

        let mut window = SampleWindow::new();
        controller.most_recent_window(&mut window, 512);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn bypass_freezes_acquisition() {
        let controller = prepared_controller();
        let params = ScopeParams {
            bypass: true,
            ..ScopeParams::default()
        };
        feed_tone(&controller, &params, 0.05);

        let mut window = SampleWindow::new();
        controller.most_recent_window(&mut window, 512);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn reprepare_resets_capture() {
        let mut controller = prepared_controller();
        feed_tone(&controller, &ScopeParams::default(), 0.05);

        controller.prepare(SAMPLE_RATE, 1);
        let mut window = SampleWindow::new();
        controller.most_recent_window(&mut window, 512);
        assert_eq!(window.len(), 0);
        controller.release();
    }

    #[test]
    fn calibration_flows_into_rms() {
        let controller = prepared_controller();
        let params = ScopeParams {
            coupling: CouplingMode::Dc,
            range: 2,
            ..ScopeParams::default()
        };
        feed_tone(&controller, &params, 0.05);

        let mut window = SampleWindow::new();
        controller.most_recent_window(&mut window, 1024);
        let baseline = controller.measure_rms(&window, &params);

        // Calibrating against a measured 0.4 Vpp reference scales readings
        // by 2.5.
        assert!(controller.calibrate_from_vpp(CouplingMode::Dc, 0.4, 2));
        let calibrated = controller.measure_rms(&window, &params);
        assert!((calibrated - 2.5 * baseline).abs() < 1e-3);

        // Failed capture leaves state alone.
        assert!(!controller.calibrate_from_vpp(CouplingMode::Dc, 0.0, 2));
        assert!((controller.effective_calibration_factor(CouplingMode::Dc, 2) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn calibration_state_roundtrips_through_host_document() {
        let controller = prepared_controller();
        assert!(controller.calibrate_from_vpp(CouplingMode::Ac, 0.5, 1));

        // The host embeds the TOML form in its own state blob.
        let serialized = controller.calibration().to_toml().unwrap();

        let restored = AcquisitionController::new();
        restored.set_calibration(CalibrationState::from_toml(&serialized).unwrap());
        assert_eq!(restored.calibration(), controller.calibration());
    }

    #[test]
    fn unprepared_controller_is_inert() {
        let controller = AcquisitionController::new();
        assert!(!controller.is_prepared());

        controller.process_block(&[&[0.5f32; 64][..]], &ScopeParams::default());
        let mut window = SampleWindow::new();
        controller.most_recent_window(&mut window, 64);
        assert!(window.is_empty());
    }
}
