// ============================================================================
// Bulk NaN replacement
// ============================================================================

use rayon::prelude::*;

use crate::canvas::PixelBuffer;
use crate::error::EditError;

/// Statistic computed over the non-NaN samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Median,
    Min,
    Max,
}

impl Statistic {
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Min => "min",
            Statistic::Max => "max",
        }
    }

    /// Evaluate over `values`, ignoring NaN. `NoValidData` when nothing is left.
    pub fn evaluate(&self, values: &[f64]) -> Result<f64, EditError> {
        let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if valid.is_empty() {
            return Err(EditError::NoValidData);
        }

        let result = match self {
            Statistic::Mean => valid.iter().sum::<f64>() / valid.len() as f64,
            Statistic::Median => {
                valid.par_sort_unstable_by(f64::total_cmp);
                let mid = valid.len() / 2;
                if valid.len() % 2 == 1 {
                    valid[mid]
                } else {
                    (valid[mid - 1] + valid[mid]) / 2.0
                }
            }
            Statistic::Min => valid.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Max => valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Ok(result)
    }
}

impl std::str::FromStr for Statistic {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" | "average" | "avg" => Ok(Statistic::Mean),
            "median" => Ok(Statistic::Median),
            "min" | "minimum" => Ok(Statistic::Min),
            "max" | "maximum" => Ok(Statistic::Max),
            other => Err(EditError::InvalidInput(format!("unknown statistic '{}'", other))),
        }
    }
}

/// What to write into NaN cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NanFillPolicy {
    Constant(f64),
    Statistic(Statistic),
}

impl NanFillPolicy {
    /// Resolve the replacement value without touching the buffer.
    ///
    /// A NaN or infinite constant is rejected as `InvalidInput`; a statistic
    /// over an all-NaN buffer fails with `NoValidData`.
    pub fn replacement_value(&self, buffer: &PixelBuffer) -> Result<f64, EditError> {
        match *self {
            NanFillPolicy::Constant(v) => {
                if v.is_finite() {
                    Ok(v)
                } else {
                    Err(EditError::InvalidInput(format!("replacement value {} is not a finite number", v)))
                }
            }
            NanFillPolicy::Statistic(stat) => stat.evaluate(buffer.values()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            NanFillPolicy::Constant(v) => format!("constant {}", v),
            NanFillPolicy::Statistic(s) => s.name().to_string(),
        }
    }
}

impl std::str::FromStr for NanFillPolicy {
    type Err = EditError;

    /// `"mean"`, `"median"`, `"min"`, `"max"`, or a number for a constant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(stat) = trimmed.parse::<Statistic>() {
            return Ok(NanFillPolicy::Statistic(stat));
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(NanFillPolicy::Constant(v)),
            _ => Err(EditError::InvalidInput(format!(
                "'{}' is neither a number nor one of mean/median/min/max",
                trimmed
            ))),
        }
    }
}

/// Overwrite every NaN cell according to `policy`, returning how many cells
/// were replaced. The replacement is resolved before the first write, so a
/// failure leaves the buffer untouched.
pub fn replace_all_nan(buffer: &mut PixelBuffer, policy: NanFillPolicy) -> Result<usize, EditError> {
    let replacement = policy.replacement_value(buffer)?;
    let mut replaced = 0usize;
    for v in buffer.values_mut().iter_mut() {
        if v.is_nan() {
            *v = replacement;
            replaced += 1;
        }
    }
    Ok(replaced)
}
