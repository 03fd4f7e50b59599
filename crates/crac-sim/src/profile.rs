//! Scripted 24 h disturbance profile.
//!
//! A day is compressed into a fixed number of ticks. Each tick maps to an
//! elapsed time in hours, from which:
//! - external temperature follows `mean + amplitude * sin((h - phase) * pi / 12)`
//! - thermal load is a step: high inside the daytime window, low outside

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Disturbances for one scripted tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disturbance {
    pub tick: usize,
    pub hours: f64,
    pub external_temperature: f64,
    pub load: f64,
}

/// Parameters of the compressed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyProfile {
    /// Ticks making up one simulated day.
    pub ticks: usize,
    /// Simulated span covered by `ticks`, in hours.
    pub span_hours: f64,
    pub mean_temperature: f64,
    pub amplitude: f64,
    /// Hour at which the sinusoid crosses the mean on its way up.
    pub phase_hours: f64,
    /// Daytime window `[day_start_hours, day_end_hours)`.
    pub day_start_hours: f64,
    pub day_end_hours: f64,
    pub day_load: f64,
    pub night_load: f64,
}

impl Default for DailyProfile {
    fn default() -> Self {
        Self {
            ticks: 288,
            span_hours: 24.0,
            mean_temperature: 25.0,
            amplitude: 10.0,
            phase_hours: 8.0,
            day_start_hours: 8.0,
            day_end_hours: 18.0,
            day_load: 90.0,
            night_load: 30.0,
        }
    }
}

impl DailyProfile {
    pub fn validate(&self) -> SimResult<()> {
        if self.ticks == 0 {
            return Err(SimError::InvalidArg {
                what: "profile ticks must be positive",
            });
        }
        if !(self.span_hours.is_finite() && self.span_hours > 0.0) {
            return Err(SimError::InvalidArg {
                what: "profile span must be positive",
            });
        }
        if self.day_start_hours > self.day_end_hours {
            return Err(SimError::InvalidArg {
                what: "daytime window must not be inverted",
            });
        }
        Ok(())
    }

    /// Elapsed simulated hours at `tick`.
    pub fn hours(&self, tick: usize) -> f64 {
        tick as f64 * (self.span_hours / self.ticks as f64)
    }

    pub fn external_temperature(&self, hours: f64) -> f64 {
        self.mean_temperature + self.amplitude * ((hours - self.phase_hours) * PI / 12.0).sin()
    }

    pub fn load(&self, hours: f64) -> f64 {
        if hours >= self.day_start_hours && hours < self.day_end_hours {
            self.day_load
        } else {
            self.night_load
        }
    }

    pub fn disturbance(&self, tick: usize) -> Disturbance {
        let hours = self.hours(tick);
        Disturbance {
            tick,
            hours,
            external_temperature: self.external_temperature(hours),
            load: self.load(hours),
        }
    }

    /// Every tick of the day, in order.
    pub fn iter(&self) -> impl Iterator<Item = Disturbance> + '_ {
        (0..self.ticks).map(|tick| self.disturbance(tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_day_has_288_ticks_of_five_minutes() {
        let p = DailyProfile::default();
        assert_eq!(p.iter().count(), 288);
        assert!((p.hours(12) - 1.0).abs() < 1e-12);
        assert!((p.hours(287) - 23.916_666_666).abs() < 1e-6);
    }

    #[test]
    fn temperature_peaks_mid_afternoon() {
        let p = DailyProfile::default();
        assert!((p.external_temperature(8.0) - 25.0).abs() < 1e-9);
        assert!((p.external_temperature(14.0) - 35.0).abs() < 1e-9);
        assert!((p.external_temperature(2.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn load_steps_at_window_edges() {
        let p = DailyProfile::default();
        assert_eq!(p.load(7.99), 30.0);
        assert_eq!(p.load(8.0), 90.0);
        assert_eq!(p.load(17.99), 90.0);
        assert_eq!(p.load(18.0), 30.0);
    }

    #[test]
    fn temperature_stays_in_band() {
        let p = DailyProfile::default();
        for d in p.iter() {
            assert!(d.external_temperature >= 15.0 - 1e-9);
            assert!(d.external_temperature <= 35.0 + 1e-9);
        }
    }

    #[test]
    fn invalid_profiles() {
        let p = DailyProfile {
            ticks: 0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
        let p = DailyProfile {
            day_start_hours: 20.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
        assert!(DailyProfile::default().validate().is_ok());
    }
}
