//! Face descriptors: fixed-length feature vectors produced by an upstream
//! extractor and submitted as comma-separated numeric text.

use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("descriptor is empty")]
    Empty,
    #[error("descriptor component {index} is not a number: {value:?}")]
    NotANumber { index: usize, value: String },
    #[error("descriptor component {index} is not finite")]
    NotFinite { index: usize },
    #[error("descriptor length mismatch: expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },
}

/// A validated, non-empty vector of finite components.
///
/// Only constructed through [`Descriptor::parse`] or [`Descriptor::new`], so
/// every value that reaches [`Descriptor::distance`] is already numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor(Vec<f64>);

impl Descriptor {
    /// Build a descriptor from raw components.
    ///
    /// # Errors
    /// Returns an error if the vector is empty or holds a NaN/infinite value.
    pub fn new(values: Vec<f64>) -> Result<Self, DescriptorError> {
        if values.is_empty() {
            return Err(DescriptorError::Empty);
        }
        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(DescriptorError::NotFinite { index });
        }
        Ok(Self(values))
    }

    /// Parse comma-separated numeric literals, e.g. `"-0.12,0.08,0.33"`.
    ///
    /// Whitespace around components is ignored. Empty components are rejected
    /// rather than read as zero.
    ///
    /// # Errors
    /// Returns an error if the text is blank or any component is not a finite number.
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DescriptorError::Empty);
        }

        let values = trimmed
            .split(',')
            .enumerate()
            .map(|(index, part)| {
                let part = part.trim();
                part.parse::<f64>()
                    .map_err(|_| DescriptorError::NotANumber {
                        index,
                        value: part.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(values)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Euclidean distance: `sqrt(sum((a_i - b_i)^2))`.
    ///
    /// # Errors
    /// Returns [`DescriptorError::LengthMismatch`] when the arities differ.
    pub fn distance(&self, other: &Self) -> Result<f64, DescriptorError> {
        if self.len() != other.len() {
            return Err(DescriptorError::LengthMismatch {
                expected: self.len(),
                found: other.len(),
            });
        }

        let sum: f64 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum();

        Ok(sum.sqrt())
    }

    /// Canonical text form, the shortest round-trip representation of each
    /// component joined by commas. Two descriptors with equal components
    /// always have the same canonical text.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// SHA-256 of the canonical text, used as the exact-match key in storage.
    #[must_use]
    pub fn fingerprint(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().as_bytes());
        hasher.finalize().to_vec()
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromStr for Descriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
