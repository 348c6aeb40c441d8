use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Desired bucket count and numeric window for one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBucketingParams")]
pub struct BucketingParams {
    target_bucket_count: u32,
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RawBucketingParams {
    target_bucket_count: u32,
    min: f64,
    max: f64,
}

impl TryFrom<RawBucketingParams> for BucketingParams {
    type Error = Error;

    fn try_from(raw: RawBucketingParams) -> Result<Self> {
        Self::new(raw.target_bucket_count, raw.min, raw.max)
    }
}

impl BucketingParams {
    pub fn new(target_bucket_count: u32, min: f64, max: f64) -> Result<Self> {
        if target_bucket_count == 0 {
            return Err(Error::invalid_argument("must request at least one bucket"));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::invalid_argument(format!(
                "bucketing bounds must be finite, got [{}, {}]",
                min, max
            )));
        }
        if min > max {
            return Err(Error::invalid_argument(format!(
                "bucketing min {} is greater than max {}",
                min, max
            )));
        }

        Ok(Self {
            target_bucket_count,
            min,
            max,
        })
    }

    pub fn target_bucket_count(&self) -> u32 {
        self.target_bucket_count
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_params() {
        let params = BucketingParams::new(9, 3.0, 12.0).unwrap();
        assert_eq!(params.target_bucket_count(), 9);
        assert_eq!(params.min(), 3.0);
        assert_eq!(params.max(), 12.0);
    }

    #[test]
    fn test_zero_buckets_rejected() {
        let err = BucketingParams::new(0, 10.0, 11.0).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("at least one bucket"));
    }

    #[test]
    fn test_inverted_or_non_finite_window_rejected() {
        assert!(BucketingParams::new(3, 5.0, 1.0).unwrap_err().is_invalid_argument());
        assert!(BucketingParams::new(3, f64::NAN, 1.0).is_err());
        assert!(BucketingParams::new(3, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_degenerate_window_allowed() {
        assert!(BucketingParams::new(1, 4.0, 4.0).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let params: BucketingParams =
            serde_json::from_str(r#"{"target_bucket_count": 3, "min": 1.5, "max": 5.5}"#).unwrap();
        assert_eq!(params.target_bucket_count(), 3);

        let err = serde_json::from_str::<BucketingParams>(
            r#"{"target_bucket_count": 0, "min": 1.5, "max": 5.5}"#,
        );
        assert!(err.is_err());
    }
}
