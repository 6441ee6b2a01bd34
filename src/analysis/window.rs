//! Inclusive date window used to filter transactions

use crate::error::AnalysisError;
use crate::models::timestamp::{DateInput, NormalizedTimestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NormalizedTimestamp,
    pub end: NormalizedTimestamp,
}

impl DateWindow {
    /// Build a window, rejecting inverted ranges
    pub fn new(start: NormalizedTimestamp, end: NormalizedTimestamp) -> Result<Self, AnalysisError> {
        if start.utc > end.utc {
            return Err(AnalysisError::InvalidInput(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &DateInput, end: &DateInput) -> Result<Self, AnalysisError> {
        let start = start
            .normalize()
            .map_err(|e| AnalysisError::InvalidInput(format!("start date: {}", e)))?;
        let end = end
            .normalize()
            .map_err(|e| AnalysisError::InvalidInput(format!("end date: {}", e)))?;
        Self::new(start, end)
    }

    /// Both ends inclusive
    pub fn contains(&self, ts: &NormalizedTimestamp) -> bool {
        self.start.utc <= ts.utc && ts.utc <= self.end.utc
    }
}
