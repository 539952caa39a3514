//! Analog level sensor.
//!
//! Samples a raw value each scan through an [`AnalogSource`] and publishes
//! under its COV rule. A failed or non-finite read publishes quality BAD
//! with the last published value. The first sample is always published.

use plant_common::consts::{DEFAULT_SENSOR_DEADBAND_ABS, DEFAULT_SENSOR_MIN_INTERVAL_S};
use plant_common::control::config::SensorConfig;
use plant_common::control::error::ContractError;
use plant_common::control::point::{CovRule, Limits, Point, PointValue, Quality, Scaling};
use plant_common::control::state::{DeviceFlags, DeviceStatus, Mode};
use thiserror::Error;
use tracing::debug;

use super::Sensor;
use crate::clock::ScanClock;
use crate::cov::CovPublisher;
use crate::io::IoBus;

/// Why a raw sample could not be taken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("tag '{0}' not present on the bus")]
    MissingTag(String),

    #[error("tag '{0}' is not numeric")]
    NotNumeric(String),

    #[error("non-finite sample {0}")]
    NonFinite(f64),

    #[error("read failed: {0}")]
    Failed(String),
}

type ReadFn = Box<dyn FnMut() -> Result<f64, SampleError>>;

/// Where raw samples come from.
pub enum AnalogSource {
    /// A tag on the I/O bus.
    Tag(String),
    /// An injected reader.
    Func(ReadFn),
}

impl AnalogSource {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn func(read: impl FnMut() -> Result<f64, SampleError> + 'static) -> Self {
        Self::Func(Box::new(read))
    }

    /// Read one finite raw value.
    pub fn read(&mut self, io: &dyn IoBus) -> Result<f64, SampleError> {
        let raw = match self {
            Self::Tag(tag) => io
                .read(tag)
                .ok_or_else(|| SampleError::MissingTag(tag.clone()))?
                .as_f64()
                .ok_or_else(|| SampleError::NotNumeric(tag.clone()))?,
            Self::Func(read) => read()?,
        };
        if raw.is_finite() {
            Ok(raw)
        } else {
            Err(SampleError::NonFinite(raw))
        }
    }
}

impl std::fmt::Debug for AnalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

#[derive(Debug)]
pub struct LevelSensor {
    source: AnalogSource,
    /// Metadata carried by every sample.
    template: Point,
    publisher: CovPublisher,
    mode: Mode,
    failed_reads: u64,
}

impl LevelSensor {
    /// Sensor in metres with the default COV rule.
    pub fn new(id: impl Into<String>, source: AnalogSource) -> Self {
        let cov = CovRule::absolute(DEFAULT_SENSOR_DEADBAND_ABS)
            .with_min_interval(DEFAULT_SENSOR_MIN_INTERVAL_S);
        Self {
            source,
            template: Point::analog(id, 0.0, 0.0).with_units("m").with_cov(cov),
            publisher: CovPublisher::new(),
            mode: Mode::Remote,
            failed_reads: 0,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Result<Self, ContractError> {
        let cov = config.cov();
        cov.validate()?;
        let mut sensor = Self::new(&config.id, AnalogSource::tag(&config.tag)).with_cov(cov);
        sensor.template = match &config.eu {
            Some(eu) => sensor.template.with_units(eu),
            None => sensor.template,
        };
        if let Some(scaling) = config.scaling {
            sensor = sensor.with_scaling(scaling);
        }
        if let Some(limits) = config.limits {
            sensor = sensor.with_limits(limits);
        }
        Ok(sensor)
    }

    pub fn with_cov(mut self, cov: CovRule) -> Self {
        self.template = self.template.with_cov(cov);
        self
    }

    pub fn with_units(mut self, eu: impl Into<String>) -> Self {
        self.template = self.template.with_units(eu);
        self
    }

    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.template = self.template.with_scaling(scaling);
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.template = self.template.with_limits(limits);
        self
    }

    pub fn set_source(&mut self, source: AnalogSource) {
        self.source = source;
    }

    /// Last published sample.
    pub fn point(&self) -> Option<&Point> {
        self.publisher.last()
    }

    #[inline]
    pub const fn failed_reads(&self) -> u64 {
        self.failed_reads
    }
}

impl Sensor for LevelSensor {
    fn id(&self) -> &str {
        self.template.id()
    }

    fn update(&mut self, clock: &dyn ScanClock, io: &dyn IoBus) -> bool {
        let now = clock.now();
        let (raw, quality) = match self.source.read(io) {
            Ok(raw) => (raw, Quality::Good),
            Err(e) => {
                self.failed_reads += 1;
                debug!(sensor = self.template.id(), error = %e, "sample failed");
                let held = self
                    .publisher
                    .last()
                    .and_then(|p| p.value().as_f64())
                    .unwrap_or(0.0);
                (held, Quality::Bad)
            }
        };
        let candidate = self
            .template
            .resample(PointValue::Analog(raw), now, quality);
        self.publisher.offer(candidate, now).is_some()
    }

    fn points(&self) -> Vec<&Point> {
        self.publisher.last().into_iter().collect()
    }

    fn status(&self) -> DeviceStatus {
        let last = self.publisher.last();
        DeviceStatus {
            id: self.template.id().to_string(),
            mode: self.mode,
            state: last.map_or("NO_DATA", |p| p.quality().as_str()).to_string(),
            flags: DeviceFlags::empty(),
            entered_at: last.map_or(0.0, Point::ts_mono),
        }
    }
}
