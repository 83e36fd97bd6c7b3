use std::time::Duration;

use super::context::SessionContext;
use crate::error::{ReplayError, Result};

/// Pause the run. There is no way to interrupt a wait once it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitStep {
    pub duration: Duration,
}

impl WaitStep {
    /// Parse a positive number of seconds, fractions allowed.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().parse::<f64>() {
            Ok(secs) if secs > 0.0 => Duration::try_from_secs_f64(secs)
                .map(|duration| Self { duration })
                .map_err(|_| ReplayError::InvalidWait(value.to_string())),
            _ => Err(ReplayError::InvalidWait(value.to_string())),
        }
    }

    pub async fn execute(&self, _ctx: &mut SessionContext) -> Result<()> {
        tracing::info!("Waiting {:?}", self.duration);
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_seconds() {
        assert_eq!(WaitStep::parse("2").unwrap().duration, Duration::from_secs(2));
        assert_eq!(WaitStep::parse(" 0.25 ").unwrap().duration, Duration::from_millis(250));
    }

    #[test]
    fn test_parse_rejects_non_positive_and_garbage() {
        for bad in ["0", "-1", "", "soon", "NaN", "inf", "1e30"] {
            assert!(
                matches!(WaitStep::parse(bad), Err(ReplayError::InvalidWait(_))),
                "{bad} should be rejected"
            );
        }
    }
}
