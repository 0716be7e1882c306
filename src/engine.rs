// src/engine.rs

//! # Dual-Profile PID Engine
//!
//! Runs once per control cycle in the main loop. It averages the cycle sums
//! handed over by the sensor side and computes, for both flight profiles at
//! once, the gyro corrections of all three axes and the accelerometer
//! corrections (auto-level on Roll and Pitch, vertical damping in the Yaw
//! slot). The mixer downstream blends the two profiles by transition
//! position, so both are always computed in full.
//!
//! ## Pipeline
//!
//! Per axis and profile, in integer arithmetic:
//!
//! - P: `(seed + rate * P) * 3`, where Yaw seeds `yaw_trim << 6`.
//! - I: `(integral * I) >> 5`, clamped to the I-term output limit.
//! - D: `derivative * D * 2`, with D shared across profiles and zero on Yaw.
//! - Gyro correction: `(P + I + D) >> 6`, saturated to `i16`.
//!
//! ## Anomalies
//!
//! The engine never fails. A cycle without samples reuses the previous
//! averages, an out-of-range configuration is clamped, and results that do
//! not fit `i16` saturate. Each of these is reported through
//! [`Diagnostics`].

use log::{debug, info, trace, warn};
use piddiy::PidController;

use crate::axis::{Axis, PerAxis, PerProfile, Profile};
use crate::config::FlightConfig;
use crate::pid::{compute_gyro, level_correction, vertical_correction, GyroTermData};
use crate::scale::{saturate, D_TERM_MULTIPLIER, PID_SCALE, P_TERM_MULTIPLIER, YAW_TRIM_SHIFT};
use crate::sensor::{CycleSnapshot, CycleSums};
use crate::status::{Anomalies, Diagnostics};

/// Per-cycle inputs from outside the sensor accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleInputs {
    /// Current attitude estimate for Roll and Pitch.
    pub angle: [i16; 2],
}

impl CycleInputs {
    /// Creates cycle inputs from the Roll and Pitch attitude.
    pub fn new(roll: i16, pitch: i16) -> Self {
        Self {
            angle: [roll, pitch],
        }
    }
}

/// Corrections of one flight profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileOutput {
    /// Gyro corrections per axis.
    pub gyro: PerAxis<i16>,
    /// Leveling corrections for Roll and Pitch; the Yaw slot holds the Z correction.
    pub acc: PerAxis<i16>,
}

/// Corrections of both flight profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PidOutputs {
    /// One output per profile.
    pub profiles: PerProfile<ProfileOutput>,
}

impl PidOutputs {
    /// Output of the given profile.
    pub fn profile(&self, profile: Profile) -> &ProfileOutput {
        &self.profiles[profile.index()]
    }
}

/// Averages of the most recent cycle that had samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleAverages {
    /// Mean filtered gyro rate per axis.
    pub gyro: PerAxis<i32>,
    /// Mean per-sample gyro difference per axis.
    pub derivative: PerAxis<i32>,
    /// Mean vertical acceleration.
    pub acc_vert: i32,
}

impl CycleAverages {
    /// Averages the sums by their sample count, or `None` if there were no samples.
    pub fn from_sums(sums: &CycleSums) -> Option<Self> {
        let count = match sums.samples {
            0 => return None,
            count => count as i32,
        };
        Some(Self {
            gyro: sums.gyro.map(|sum| sum / count),
            derivative: sums.derivative.map(|sum| sum / count),
            acc_vert: sums.acc_vert / count,
        })
    }
}

type GyroPid = PidController<i32, GyroTermData>;

/// The per-cycle PID engine for both flight profiles.
pub struct PidEngine {
    config: FlightConfig,
    gyro_pid: PerProfile<PerAxis<GyroPid>>,
    averages: CycleAverages,
    stale: bool,
    pending: Anomalies,
    diagnostics: Diagnostics,
}

impl PidEngine {
    /// Creates a new engine using the provided configuration.
    pub fn with_config(config: FlightConfig) -> Self {
        let mut engine = PidEngine {
            config,
            gyro_pid: core::array::from_fn(|_| {
                core::array::from_fn(|_| {
                    let mut pid = PidController::new();
                    pid.compute_fn(compute_gyro).set_point(0);
                    pid
                })
            }),
            averages: CycleAverages::default(),
            stale: false,
            pending: Anomalies::empty(),
            diagnostics: Diagnostics::default(),
        };
        engine.reconfigure(config);
        engine
    }

    /// Creates a new engine with the factory defaults.
    pub fn new() -> Self {
        Self::with_config(FlightConfig::default())
    }

    /// Installs a new configuration, taking effect from the next cycle.
    ///
    /// The configuration is sanitized first; the returned set says whether
    /// anything had to be clamped. The anomaly is also reported with the
    /// next cycle.
    pub fn reconfigure(&mut self, mut config: FlightConfig) -> Anomalies {
        let raised = config.sanitize();
        self.diagnostics.record_config(raised);
        self.pending |= raised;
        if !raised.is_empty() {
            warn!("flight configuration out of range, clamped before use");
        }

        for profile in Profile::ALL {
            let gains = config.gains.profile(profile);
            for axis in Axis::ALL {
                let a = axis.index();
                self.gyro_pid[profile.index()][a]
                    .kp(gains.axis(axis).p as i32 * P_TERM_MULTIPLIER)
                    .ki(1)
                    .kd(config.gains.d_gain[a] as i32 * D_TERM_MULTIPLIER);
            }
        }
        self.config = config;
        debug!(
            "PID engine configured: derivative {:?}, filter {:?}",
            config.derivative, config.gyro_lpf
        );
        raised
    }

    /// Computes the corrections of one control cycle.
    ///
    /// `snapshot` is the result of the read-and-reset of the sensor side.
    pub fn calculate(&mut self, snapshot: &CycleSnapshot, inputs: &CycleInputs) -> PidOutputs {
        let mut anomalies = core::mem::take(&mut self.pending);
        if snapshot.sums.saturated {
            anomalies |= Anomalies::NUMERIC_OVERFLOW;
        }

        match CycleAverages::from_sums(&snapshot.sums) {
            Some(averages) => {
                if self.stale {
                    info!("gyro samples resumed");
                    self.stale = false;
                }
                self.averages = averages;
            }
            None => {
                if !self.stale {
                    warn!("no gyro samples this cycle, reusing previous averages");
                    self.stale = true;
                }
                anomalies |= Anomalies::STALE_SAMPLE_DATA;
            }
        }
        let averages = self.averages;
        trace!(
            "cycle averages: gyro {:?}, derivative {:?}, acc {}",
            averages.gyro,
            averages.derivative,
            averages.acc_vert
        );

        let mut outputs = PidOutputs::default();
        for profile in Profile::ALL {
            let p = profile.index();
            let gains = self.config.gains.profile(profile);
            let output = &mut outputs.profiles[p];

            for axis in Axis::ALL {
                let a = axis.index();
                let axis_gains = gains.axis(axis);
                let data = GyroTermData {
                    rate: averages.gyro[a],
                    derivative: averages.derivative[a],
                    integral: snapshot.integral[p][a],
                    i_gain: axis_gains.i as i32,
                    i_limit: axis_gains.i_limit,
                    mode: self.config.derivative,
                };

                let (seed, acc) = if axis.is_levelled() {
                    (
                        0,
                        level_correction(inputs.angle[a], gains.level_trim[a], axis_gains.acc),
                    )
                } else {
                    (
                        (gains.yaw_trim as i32) << YAW_TRIM_SHIFT,
                        vertical_correction(averages.acc_vert, axis_gains.acc),
                    )
                };

                let sum = self.gyro_pid[p][a].compute(data) + seed * P_TERM_MULTIPLIER;
                output.gyro[a] = narrow(sum >> PID_SCALE, &mut anomalies);
                output.acc[a] = narrow(acc, &mut anomalies);
            }
        }

        self.diagnostics.record_cycle(anomalies);
        outputs
    }

    /// The configuration in use, after sanitization.
    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Averages of the latest cycle with samples, for sensor displays.
    pub fn last_averages(&self) -> &CycleAverages {
        &self.averages
    }

    /// Anomaly counters and the anomalies of the latest cycle.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl Default for PidEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn narrow(value: i32, anomalies: &mut Anomalies) -> i16 {
    saturate(value).unwrap_or_else(|saturated| {
        *anomalies |= Anomalies::NUMERIC_OVERFLOW;
        saturated
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisGains, DerivativeMode};
    use crate::scale::MAX_ZGAIN;
    use crate::sensor::{AccumulatorSettings, Sample, SharedAccumulator};
    use crate::status::Anomaly;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;

    /// A configuration with every gain zero, so tests can enable terms one by one.
    fn quiet_config() -> FlightConfig {
        let mut config = FlightConfig::default();
        for profile in config.gains.profiles.iter_mut() {
            profile.axes = [AxisGains::new(0, 0, 125, 2, 0); 3];
        }
        config
    }

    fn snapshot(gyro: PerAxis<i32>, derivative: PerAxis<i32>, samples: u16) -> CycleSnapshot {
        CycleSnapshot {
            sums: CycleSums {
                gyro,
                derivative,
                samples,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Test the reference case end to end through the shared accumulator.
    #[test]
    fn test_engine_reference_case() {
        let mut config = quiet_config();
        for profile in config.gains.profiles.iter_mut() {
            profile.axes[0] = AxisGains::new(40, 0, 10, 2, 0);
        }
        let sensors = SharedAccumulator::new();
        sensors.configure(AccumulatorSettings::from(&config));
        let mut engine = PidEngine::with_config(config);

        for _ in 0..10 {
            let sample = Sample {
                gyro: [100, 0, 0],
                elapsed_ticks: NOMINAL_TICKS,
                ..Default::default()
            };
            sensors.accumulate(&sample);
        }
        let snapshot = sensors.take_cycle();
        let outputs = engine.calculate(&snapshot, &CycleInputs::default());

        assert_eq!(10, snapshot.sums.samples);
        assert_eq!([100, 0, 0], engine.last_averages().gyro);
        for profile in Profile::ALL {
            assert_eq!([187, 0, 0], outputs.profile(profile).gyro);
            assert_eq!([0, 0, 0], outputs.profile(profile).acc);
        }
        assert_eq!(Anomalies::empty(), engine.diagnostics().last);
    }

    /// Test the reference case with a non-zero I gain and an empty integral.
    #[test]
    fn test_engine_reference_case_with_i_gain() {
        let mut config = quiet_config();
        config.gains.profiles[0].axes[0] = AxisGains::new(40, 10, 10, 2, 0);
        let mut engine = PidEngine::with_config(config);

        let cycle = snapshot([1_000, 0, 0], [0; 3], 10);
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(187, outputs.profile(Profile::P1).gyro[0]);
        assert_eq!(0, outputs.profile(Profile::P2).gyro[0]);
    }

    /// Test that the I-term is clamped after its gain and before the rescale.
    #[test]
    fn test_engine_i_term_output_clamp() {
        let mut config = quiet_config();
        config.gains.profiles[0].axes[1] = AxisGains::new(0, 127, 10, 2, 0);
        let mut engine = PidEngine::with_config(config);

        let mut cycle = snapshot([0; 3], [0; 3], 1);
        cycle.integral[0][1] = 20_000;
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(6_400 >> 6, outputs.profile(Profile::P1).gyro[1]);

        cycle.integral[0][1] = -20_000;
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(-6_400 >> 6, outputs.profile(Profile::P1).gyro[1]);
    }

    /// Test that a cycle without samples reuses the previous averages.
    #[test]
    fn test_engine_zero_samples() {
        let mut config = quiet_config();
        config.gains.profiles[1].axes[2] = AxisGains::new(40, 0, 10, 2, 0);
        let mut engine = PidEngine::with_config(config);

        let cycle = snapshot([0, 0, 1_000], [0; 3], 10);
        let first = engine.calculate(&cycle, &CycleInputs::default());
        let stale = engine.calculate(&CycleSnapshot::default(), &CycleInputs::default());

        assert_eq!(first, stale);
        assert_eq!(187, stale.profile(Profile::P2).gyro[2]);
        assert!(engine.diagnostics().raised(Anomaly::StaleSampleData));
        assert_eq!(1, engine.diagnostics().stale_cycles);

        engine.calculate(&snapshot([0; 3], [0; 3], 2), &CycleInputs::default());
        assert!(!engine.diagnostics().raised(Anomaly::StaleSampleData));
        assert_eq!(3, engine.diagnostics().cycles);
    }

    /// Test that a cold start without samples produces neutral output.
    #[test]
    fn test_engine_zero_samples_at_start() {
        let mut engine = PidEngine::with_config(quiet_config());
        let outputs = engine.calculate(&CycleSnapshot::default(), &CycleInputs::default());
        assert_eq!(PidOutputs::default(), outputs);
        assert!(engine.diagnostics().raised(Anomaly::StaleSampleData));
    }

    /// Test that the Z correction stays within its bound and lands in the Yaw slot.
    #[test]
    fn test_engine_vertical_correction() {
        let mut config = quiet_config();
        config.gains.profiles[0].axes[2].acc = 127;
        config.gains.profiles[1].axes[2].acc = 50;
        let mut engine = PidEngine::with_config(config);

        let mut cycle = snapshot([0; 3], [0; 3], 4);
        cycle.sums.acc_vert = 4 * 5_000;
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(-MAX_ZGAIN as i16, outputs.profile(Profile::P1).acc[2]);
        assert_eq!(-MAX_ZGAIN as i16, outputs.profile(Profile::P2).acc[2]);

        cycle.sums.acc_vert = 4 * -20;
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(158, outputs.profile(Profile::P1).acc[2]);
        assert_eq!(62, outputs.profile(Profile::P2).acc[2]);
    }

    /// Test the leveling corrections of both profiles.
    #[test]
    fn test_engine_level_correction() {
        let mut config = quiet_config();
        config.gains.profiles[0].axes[0].acc = 10;
        config.gains.profiles[0].axes[1].acc = 10;
        config.gains.profiles[1].axes[0].acc = 1;
        config.gains.profiles[1].level_trim = [0, -512];
        let mut engine = PidEngine::with_config(config);

        let outputs = engine.calculate(&snapshot([0; 3], [0; 3], 1), &CycleInputs::new(256, -512));
        assert_eq!([10, -20, 0], outputs.profile(Profile::P1).acc);
        assert_eq!([1, 0, 0], outputs.profile(Profile::P2).acc);
    }

    /// Test that the yaw trim seeds the yaw P-term of both profiles.
    #[test]
    fn test_engine_yaw_trim_seed() {
        let mut config = quiet_config();
        config.gains.profiles[0].yaw_trim = 10;
        config.gains.profiles[1].yaw_trim = -10;
        let mut engine = PidEngine::with_config(config);

        let outputs = engine.calculate(&snapshot([0; 3], [0; 3], 1), &CycleInputs::default());
        assert_eq!([0, 0, 30], outputs.profile(Profile::P1).gyro);
        assert_eq!([0, 0, -30], outputs.profile(Profile::P2).gyro);
    }

    /// Test the P-term scaling with the yaw seed and a live rate.
    #[test]
    fn test_engine_yaw_seed_with_rate() {
        let mut config = quiet_config();
        config.gains.profiles[0].axes[2] = AxisGains::new(2, 0, 10, 2, 0);
        config.gains.profiles[0].yaw_trim = 1;
        let mut engine = PidEngine::with_config(config);

        let outputs = engine.calculate(&snapshot([0, 0, 32], [0; 3], 1), &CycleInputs::default());
        // ((1 << 6) + 32 * 2) * 3 >> 6
        assert_eq!(6, outputs.profile(Profile::P1).gyro[2]);
    }

    /// Test the averaged raw difference derivative.
    #[test]
    fn test_engine_derivative_averaged_raw_difference() {
        let mut config = quiet_config();
        config.gains.d_gain = [4, 4, 4];
        let mut engine = PidEngine::with_config(config);
        assert_eq!(0, engine.config().gains.d_gain[2], "Yaw has no D-term.");

        let cycle = snapshot([1_000, 0, 0], [1_000, 1_000, 1_000], 10);
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!([12, 12, 0], outputs.profile(Profile::P1).gyro);
        assert_eq!([12, 12, 0], outputs.profile(Profile::P2).gyro);

        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!([12, 12, 0], outputs.profile(Profile::P1).gyro);
    }

    /// Test the difference of averages derivative, including a stale cycle.
    #[test]
    fn test_engine_derivative_difference_of_averages() {
        let mut config = quiet_config();
        config.derivative = DerivativeMode::DifferenceOfAverages;
        config.gains.d_gain = [4, 0, 0];
        let mut engine = PidEngine::with_config(config);

        let cycle = snapshot([1_000, 0, 0], [0; 3], 10);
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(12, outputs.profile(Profile::P1).gyro[0]);

        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(0, outputs.profile(Profile::P1).gyro[0]);

        let outputs = engine.calculate(&CycleSnapshot::default(), &CycleInputs::default());
        assert_eq!(0, outputs.profile(Profile::P2).gyro[0]);

        let cycle = snapshot([500, 0, 0], [0; 3], 10);
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(-7, outputs.profile(Profile::P1).gyro[0]);
    }

    /// Test that an oversized result saturates and is reported.
    #[test]
    fn test_engine_output_saturation() {
        let mut config = quiet_config();
        config.gains.profiles[0].axes[0] = AxisGains::new(127, 0, 10, 2, 0);
        let mut engine = PidEngine::with_config(config);

        let cycle = snapshot([32_767, -32_768, 0], [0; 3], 1);
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(i16::MAX, outputs.profile(Profile::P1).gyro[0]);
        assert!(engine.diagnostics().raised(Anomaly::NumericOverflow));
        assert_eq!(1, engine.diagnostics().overflows);
    }

    /// Test that saturated cycle sums are reported as an overflow.
    #[test]
    fn test_engine_saturated_sums() {
        let mut engine = PidEngine::with_config(quiet_config());
        let mut cycle = snapshot([0; 3], [0; 3], 1);
        cycle.sums.saturated = true;
        engine.calculate(&cycle, &CycleInputs::default());
        assert!(engine.diagnostics().raised(Anomaly::NumericOverflow));
    }

    /// Test that an out-of-range configuration is clamped and reported with the next cycle.
    #[test]
    fn test_engine_reconfigure_clamps() {
        let mut engine = PidEngine::new();
        let mut config = quiet_config();
        config.gains.profiles[0].axes[0].p = -40;

        assert_eq!(Anomalies::CONFIG_OUT_OF_RANGE, engine.reconfigure(config));
        assert_eq!(0, engine.config().gains.profiles[0].axes[0].p);
        assert_eq!(1, engine.diagnostics().config_clamps);

        let cycle = snapshot([1_000, 0, 0], [0; 3], 10);
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(0, outputs.profile(Profile::P1).gyro[0]);
        assert!(engine.diagnostics().raised(Anomaly::ConfigOutOfRange));

        engine.calculate(&snapshot([0; 3], [0; 3], 1), &CycleInputs::default());
        assert!(!engine.diagnostics().raised(Anomaly::ConfigOutOfRange));
    }

    /// Test that new gains take effect on the next cycle.
    #[test]
    fn test_engine_live_reconfiguration() {
        let mut engine = PidEngine::with_config(quiet_config());
        let cycle = snapshot([1_000, 0, 0], [0; 3], 10);
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(0, outputs.profiles[0].gyro[0]);

        let mut config = quiet_config();
        config.gains.profiles[0].axes[0].p = 40;
        assert_eq!(Anomalies::empty(), engine.reconfigure(config));
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        assert_eq!(187, outputs.profiles[0].gyro[0]);
    }

    /// Test that the factory defaults produce opposing corrections for both profiles.
    #[test]
    fn test_engine_defaults() {
        let mut engine = PidEngine::default();
        let cycle = snapshot([6_400, -6_400, 0], [0; 3], 64);
        let outputs = engine.calculate(&cycle, &CycleInputs::default());
        // P1 roll: 100 * 50 * 3 >> 6, P2 roll: 100 * 40 * 3 >> 6
        assert_eq!([234, -235, 0], outputs.profile(Profile::P1).gyro);
        assert_eq!([187, -188, 0], outputs.profile(Profile::P2).gyro);
    }

    /// Test that sample averaging truncates toward zero.
    #[test]
    fn test_cycle_averages_from_sums() {
        let sums = CycleSums {
            gyro: [10, -10, 7],
            derivative: [3, 0, -3],
            acc_vert: 9,
            samples: 4,
            saturated: false,
        };
        let averages = CycleAverages::from_sums(&sums).unwrap();
        assert_eq!([2, -2, 1], averages.gyro);
        assert_eq!([0, 0, 0], averages.derivative);
        assert_eq!(2, averages.acc_vert);
        assert_eq!(None, CycleAverages::from_sums(&CycleSums::default()));
    }
}
