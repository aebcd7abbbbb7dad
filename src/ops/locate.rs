use crate::canvas::PixelBuffer;

/// What to search the raster for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocateTarget {
    Max,
    Min,
    FirstNan,
}

impl LocateTarget {
    pub fn label(&self) -> &'static str {
        match self {
            LocateTarget::Max => "maximum",
            LocateTarget::Min => "minimum",
            LocateTarget::FirstNan => "first NaN",
        }
    }
}

impl std::str::FromStr for LocateTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "max" | "maximum" => Ok(LocateTarget::Max),
            "min" | "minimum" => Ok(LocateTarget::Min),
            "nan" | "first-nan" | "first_nan" => Ok(LocateTarget::FirstNan),
            other => Err(format!("unknown locate target '{}' (expected max, min or nan)", other)),
        }
    }
}

/// A located cell and the value found there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Located {
    pub x: u32,
    pub y: u32,
    pub value: f64,
}

/// Row-major scan for `target`. Ties resolve to the first cell in scan order.
pub fn locate(buffer: &PixelBuffer, target: LocateTarget) -> Option<Located> {
    let width = buffer.width() as usize;
    if width == 0 {
        return None;
    }
    let at = |idx: usize, value: f64| Located {
        x: (idx % width) as u32,
        y: (idx / width) as u32,
        value,
    };

    let values = buffer.values();
    match target {
        LocateTarget::FirstNan => values.iter().position(|v| v.is_nan()).map(|idx| at(idx, f64::NAN)),
        LocateTarget::Max | LocateTarget::Min => {
            let mut best: Option<(usize, f64)> = None;
            for (idx, &v) in values.iter().enumerate() {
                if v.is_nan() {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((_, b)) if target == LocateTarget::Max => v > b,
                    Some((_, b)) => v < b,
                };
                if better {
                    best = Some((idx, v));
                }
            }
            best.map(|(idx, v)| at(idx, v))
        }
    }
}
