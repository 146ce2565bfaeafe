//! Piecewise-linear keyframe curves.
//!
//! Curves map a scalar input to a scalar output by linear interpolation between
//! keyframes sorted ascending by `x`. Inputs outside the key range clamp to the
//! first or last value, and an empty curve evaluates to zero everywhere.
//!
//! Configuration files describe curves as ordered keys, either `[x, y]` pairs or
//! the `"x y [in_tangent out_tangent]"` strings used by part configs. Tangents
//! are accepted and ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single `(x, y)` keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub x: f64,
    pub y: f64,
}

/// Errors raised while building a curve from raw keys.
#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("curve key {index} is not finite ({x}, {y})")]
    NonFiniteKey { index: usize, x: f64, y: f64 },
    #[error("curve key `{text}` must contain at least two numbers")]
    MalformedKey { text: String },
    #[error("curve key `{text}` contains an invalid number: {source}")]
    InvalidNumber {
        text: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

/// Immutable piecewise-linear curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    /// Build a curve from `(x, y)` pairs. Keys are sorted by `x`; equal `x` values keep
    /// their order.
    pub fn new<I>(pairs: I) -> Result<Self, CurveError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut keys = Vec::new();
        for (index, (x, y)) in pairs.into_iter().enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(CurveError::NonFiniteKey { index, x, y });
            }
            keys.push(Keyframe { x, y });
        }
        keys.sort_by(|a, b| a.x.total_cmp(&b.x));
        Ok(Self { keys })
    }

    /// A curve with no keys; evaluates to zero everywhere.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single-key curve that evaluates to `y` everywhere.
    pub fn constant(y: f64) -> Self {
        Self {
            keys: vec![Keyframe { x: 0.0, y }],
        }
    }

    /// Parse KSP-style key strings such as `"0.5 1.2"` or `"0.5 1.2 0 0"`.
    pub fn from_key_strings<I, S>(lines: I) -> Result<Self, CurveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pairs = lines
            .into_iter()
            .map(|line| parse_key(line.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(pairs)
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Evaluate the curve at `x`.
    ///
    /// A NaN input evaluates like an input below the first key.
    pub fn evaluate(&self, x: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if x.is_nan() || x <= first.x {
            return first.y;
        }
        if x >= last.x {
            return last.y;
        }

        // first key strictly greater than x; guaranteed to be in 1..len by the clamps above
        let upper = self.keys.partition_point(|key| key.x <= x);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.x - a.x;
        if span <= 0.0 {
            return b.y;
        }
        let t = (x - a.x) / span;
        a.y + t * (b.y - a.y)
    }
}

/// Free-function form of [`Curve::evaluate`].
#[inline]
pub fn evaluate(curve: &Curve, x: f64) -> f64 {
    curve.evaluate(x)
}

fn parse_key(text: &str) -> Result<(f64, f64), CurveError> {
    let mut numbers = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty());
    let (Some(x), Some(y)) = (numbers.next(), numbers.next()) else {
        return Err(CurveError::MalformedKey {
            text: text.to_string(),
        });
    };
    let parse = |token: &str| {
        token
            .parse::<f64>()
            .map_err(|source| CurveError::InvalidNumber {
                text: text.to_string(),
                source,
            })
    };
    Ok((parse(x)?, parse(y)?))
}

/// One key as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawKey {
    Pair([f64; 2]),
    Text(String),
}

/// Serialized form of a curve: an ordered list of raw keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurveSpec(pub Vec<RawKey>);

impl CurveSpec {
    /// Convert to a curve, failing on the first malformed key.
    pub fn to_curve(&self) -> Result<Curve, CurveError> {
        let pairs = self
            .0
            .iter()
            .map(|key| match key {
                RawKey::Pair([x, y]) => Ok((*x, *y)),
                RawKey::Text(text) => parse_key(text),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Curve::new(pairs)
    }

    /// Convert to a curve, treating malformed keys as an absent (empty) curve.
    pub fn to_curve_lenient(&self, name: &str) -> Curve {
        match self.to_curve() {
            Ok(curve) => curve,
            Err(err) => {
                tracing::warn!(curve = name, error = %err, "malformed curve treated as absent");
                Curve::empty()
            }
        }
    }
}

impl From<&Curve> for CurveSpec {
    fn from(curve: &Curve) -> Self {
        CurveSpec(
            curve
                .keys()
                .iter()
                .map(|key| RawKey::Pair([key.x, key.y]))
                .collect(),
        )
    }
}
