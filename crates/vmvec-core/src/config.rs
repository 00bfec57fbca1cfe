//! Container configuration that callers can serialize/deserialize.

use std::io;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How large the address-space reservation should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationSize {
    /// An explicit byte ceiling.
    Bytes(usize),
    /// An element-count estimate, multiplied by the element size.
    Elements(usize),
}

impl ReservationSize {
    /// Reservation length in bytes for elements of `elem_size` bytes.
    ///
    /// An estimate whose byte length overflows `usize` can never be reserved
    /// and is reported as an `Allocation` error.
    pub fn bytes_for(self, elem_size: usize) -> Result<usize> {
        match self {
            ReservationSize::Bytes(bytes) => Ok(bytes),
            ReservationSize::Elements(count) => {
                count
                    .checked_mul(elem_size)
                    .ok_or_else(|| Error::Allocation {
                        bytes: usize::MAX,
                        source: io::Error::other(format!(
                            "{count} elements of {elem_size} bytes overflow the address space"
                        )),
                    })
            }
        }
    }
}

/// Multiplicative growth applied to committed bytes when capacity runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthRatio {
    pub numerator: usize,
    pub denominator: usize,
}

impl GrowthRatio {
    pub const fn new(numerator: usize, denominator: usize) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Commit target after `capacity` elements of `elem_size` bytes are full:
    /// `floor(capacity * elem_size * num / den)`, saturating on overflow.
    /// A zero denominator saturates too; `validate` rejects it up front.
    pub fn next_bytes(&self, capacity: usize, elem_size: usize) -> usize {
        let bytes = capacity.saturating_mul(elem_size) as u128;
        bytes
            .saturating_mul(self.numerator as u128)
            .checked_div(self.denominator as u128)
            .and_then(|grown| usize::try_from(grown).ok())
            .unwrap_or(usize::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        if self.denominator == 0 {
            return Err(Error::Config("growth denominator must be non-zero".into()));
        }
        if self.numerator <= self.denominator {
            return Err(Error::Config(format!(
                "growth ratio {}/{} does not grow",
                self.numerator, self.denominator
            )));
        }
        Ok(())
    }
}

impl Default for GrowthRatio {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VecConfig {
    /// Upper bound of the reservation. Fixed for the container's lifetime.
    pub reservation: ReservationSize,

    /// Growth ratio applied on every commit after the first page.
    #[serde(default)]
    pub growth: GrowthRatio,
}

impl Default for VecConfig {
    fn default() -> Self {
        Self {
            reservation: ReservationSize::Bytes(1024 * 1024 * 1024), // 1 GiB default
            growth: GrowthRatio::default(),
        }
    }
}

impl VecConfig {
    pub fn with_bytes(bytes: usize) -> Self {
        Self {
            reservation: ReservationSize::Bytes(bytes),
            ..Self::default()
        }
    }

    pub fn with_elements(count: usize) -> Self {
        Self {
            reservation: ReservationSize::Elements(count),
            ..Self::default()
        }
    }

    pub fn with_growth(mut self, numerator: usize, denominator: usize) -> Self {
        self.growth = GrowthRatio::new(numerator, denominator);
        self
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `VMVEC_RESERVE_BYTES`: reservation ceiling in bytes
    /// - `VMVEC_RESERVE_ELEMENTS`: reservation as an element count (wins over bytes)
    /// - `VMVEC_GROWTH_NUM`: growth ratio numerator
    /// - `VMVEC_GROWTH_DEN`: growth ratio denominator
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("VMVEC_RESERVE_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.reservation = ReservationSize::Bytes(v);
            }
        }

        if let Ok(s) = std::env::var("VMVEC_RESERVE_ELEMENTS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.reservation = ReservationSize::Elements(v);
            }
        }

        if let Ok(s) = std::env::var("VMVEC_GROWTH_NUM") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.growth.numerator = v;
            }
        }

        if let Ok(s) = std::env::var("VMVEC_GROWTH_DEN") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.growth.denominator = v;
            }
        }

        cfg
    }

    /// Parse a JSON config document.
    pub fn from_json(doc: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(doc)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.growth.validate()?;
        match self.reservation {
            ReservationSize::Bytes(0) | ReservationSize::Elements(0) => {
                Err(Error::Config("reservation must be non-empty".into()))
            }
            _ => Ok(()),
        }
    }
}
