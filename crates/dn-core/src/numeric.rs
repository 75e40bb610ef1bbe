use crate::{CoreError, CoreResult};

/// Slack allowed when two attribute numbers are compared, e.g. a basin area
/// total before and after simplification, or `"300"` against `"300.0"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Whether `a` and `b` differ by no more than the absolute slack or the
    /// relative slack of the larger magnitude.
    pub fn agree(&self, a: f64, b: f64) -> bool {
        let diff = (a - b).abs();
        diff <= self.abs || diff <= self.rel * a.abs().max(b.abs())
    }
}

pub fn ensure_finite(v: f64, what: &str) -> CoreResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite {
            what: what.to_string(),
            value: v,
        })
    }
}

/// Parse a raw attribute value. Blank text means "no value".
pub fn parse_number(node: &str, attribute: &str, raw: &str) -> CoreResult<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: f64 = trimmed.parse().map_err(|_| CoreError::NotNumeric {
        node: node.to_string(),
        attribute: attribute.to_string(),
        value: raw.to_string(),
    })?;
    ensure_finite(value, attribute).map(Some)
}

/// Render an aggregated number back into attribute text.
///
/// Integral values are written without a fractional part so that summing
/// `"2"` and `"3"` yields `"5"`, not `"5.0"`.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summed_areas_agree_within_tolerance() {
        let mut total = 0.0;
        for raw in ["0.1", "0.2", "", "0.4"] {
            if let Some(v) = parse_number("n", "area", raw).unwrap() {
                total += v;
            }
        }
        let tol = Tolerances::default();
        assert!(tol.agree(total, 0.7));
        assert!(tol.agree(parse_number("n", "area", "300").unwrap().unwrap(), 300.0));
        assert!(!tol.agree(total, 0.7001));
        assert!(Tolerances { abs: 1e-3, rel: 0.0 }.agree(total, 0.7001));
    }

    #[test]
    fn parse_number_rejects_nan_and_text() {
        assert!(parse_number("n", "area", "NaN").is_err());
        assert!(parse_number("n", "area", "ten").is_err());
        assert_eq!(parse_number("n", "area", " 2.5 ").unwrap(), Some(2.5));
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-4.0), "-4");
    }
}
