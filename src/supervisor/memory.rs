//! Heap size argument for `start`.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{AppError, Result};

const MB_PER_GB: u64 = 1024;

/// Java heap size in megabytes, parsed from `<n>GB` or `<n>MB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySize {
    megabytes: u64,
}

impl MemorySize {
    /// Build a size from megabytes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for zero.
    pub fn from_megabytes(megabytes: u64) -> Result<Self> {
        if megabytes == 0 {
            return Err(AppError::InvalidInput("memory size must be greater than zero".into()));
        }
        Ok(Self { megabytes })
    }

    /// Size in megabytes.
    #[must_use]
    pub fn megabytes(self) -> u64 {
        self.megabytes
    }

    /// JVM flag setting the maximum heap, e.g. `-Xmx4096M`.
    #[must_use]
    pub fn heap_flag(self) -> String {
        format!("-Xmx{}M", self.megabytes)
    }
}

impl FromStr for MemorySize {
    type Err = AppError;

    /// Parse `4GB`, `512mb`, ... (unit case-insensitive, GB = 1024 MB).
    fn from_str(raw: &str) -> Result<Self> {
        let invalid = || {
            AppError::InvalidInput(format!(
                "invalid memory size '{raw}'; use a format like 4GB or 4096MB"
            ))
        };

        let upper = raw.trim().to_ascii_uppercase();
        let (digits, factor) = if let Some(n) = upper.strip_suffix("GB") {
            (n, MB_PER_GB)
        } else if let Some(n) = upper.strip_suffix("MB") {
            (n, 1)
        } else {
            return Err(invalid());
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let amount: u64 = digits.parse().map_err(|_| invalid())?;
        let megabytes = amount.checked_mul(factor).ok_or_else(invalid)?;
        Self::from_megabytes(megabytes)
    }
}

impl Display for MemorySize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.megabytes % MB_PER_GB == 0 {
            write!(f, "{}GB", self.megabytes / MB_PER_GB)
        } else {
            write!(f, "{}MB", self.megabytes)
        }
    }
}
