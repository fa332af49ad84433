//! Parameter sets and the run keys derived from them.
//!
//! A [`ParameterSet`] configures the simulated design and, through
//! [`ParameterSet::run_key`], namespaces its build and run directories so
//! distinct parameterizations of one module never share artifacts.

use std::fmt;

/// Separator placed between `name=value` pairs in a run key.
pub const RUN_KEY_SEPARATOR: &str = "_";

/// A scalar parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// An integer.
    Int(i64),
    /// A boolean, passed to the simulator as `1`/`0`.
    Bool(bool),
    /// A real number.
    Real(f64),
    /// A string, passed to the simulator double-quoted.
    Str(String),
}

impl ParamValue {
    /// Infers a value from command-line text: integer, boolean, real, else string.
    pub fn infer(text: &str) -> Self {
        if let Ok(i) = text.parse::<i64>() {
            return ParamValue::Int(i);
        }
        match text {
            "true" => return ParamValue::Bool(true),
            "false" => return ParamValue::Bool(false),
            _ => {}
        }
        if text.contains('.') {
            if let Ok(r) = text.parse::<f64>() {
                if r.is_finite() {
                    return ParamValue::Real(r);
                }
            }
        }
        ParamValue::Str(text.to_string())
    }

    /// Renders the value as an HDL parameter override literal.
    pub fn to_hdl_literal(&self) -> String {
        match self {
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Bool(b) => u8::from(*b).to_string(),
            ParamValue::Real(r) => r.to_string(),
            ParamValue::Str(s) => format!("\"{s}\""),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Real(r) => write!(f, "{r}"),
            ParamValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

/// Error returned when a `NAME=VALUE` assignment cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// No `=` was present.
    #[error("parameter '{0}' must have the form NAME=VALUE")]
    MissingEquals(String),
    /// The name before `=` was empty.
    #[error("parameter '{0}' has an empty name")]
    EmptyName(String),
    /// A sweep axis listed no values.
    #[error("sweep '{0}' must list at least one value")]
    EmptySweep(String),
}

/// Parses `NAME=VALUE`, inferring the value type.
pub fn parse_assignment(text: &str) -> Result<(String, ParamValue), ParamError> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| ParamError::MissingEquals(text.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ParamError::EmptyName(text.to_string()));
    }
    Ok((name.to_string(), ParamValue::infer(value.trim())))
}

/// Parses a sweep axis `NAME=v1,v2,...`.
pub fn parse_sweep_axis(text: &str) -> Result<(String, Vec<ParamValue>), ParamError> {
    let (name, values) = text
        .split_once('=')
        .ok_or_else(|| ParamError::MissingEquals(text.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ParamError::EmptyName(text.to_string()));
    }
    let values: Vec<ParamValue> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ParamValue::infer)
        .collect();
    if values.is_empty() {
        return Err(ParamError::EmptySweep(name.to_string()));
    }
    Ok((name.to_string(), values))
}

/// An insertion-ordered mapping from parameter name to value with unique names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Looks up a value by name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Joins `name=value` pairs with `_` in insertion order; empty for an empty set.
    pub fn run_key(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(RUN_KEY_SEPARATOR)
    }

    /// Expands `axes` over this set into the cartesian product.
    ///
    /// The first axis varies slowest. Each point starts from a copy of `self`,
    /// so axis values override base entries with the same name.
    pub fn sweep(&self, axes: &[(String, Vec<ParamValue>)]) -> Vec<ParameterSet> {
        let mut points = vec![self.clone()];
        for (name, values) in axes {
            points = points
                .iter()
                .flat_map(|point| {
                    values.iter().map(move |value| {
                        let mut next = point.clone();
                        next.insert(name.clone(), value.clone());
                        next
                    })
                })
                .collect();
        }
        points
    }
}

impl<N: Into<String>, V: Into<ParamValue>> FromIterator<(N, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (n, v) in iter {
            set.insert(n, v);
        }
        set
    }
}

/// Derives the run key of `params`; see [`ParameterSet::run_key`].
pub fn run_key(params: &ParameterSet) -> String {
    params.run_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_empty_key() {
        assert_eq!(run_key(&ParameterSet::new()), "");
    }

    #[test]
    fn single_entry_key() {
        let p = ParameterSet::new().with("WIDTH", 8);
        assert_eq!(p.run_key(), "WIDTH=8");
    }

    #[test]
    fn key_follows_insertion_order() {
        let p = ParameterSet::new().with("WIDTH", 8).with("DEPTH", 16);
        assert_eq!(p.run_key(), "WIDTH=8_DEPTH=16");
        let q = ParameterSet::new().with("DEPTH", 16).with("WIDTH", 8);
        assert_eq!(q.run_key(), "DEPTH=16_WIDTH=8");
    }

    #[test]
    fn identical_sets_identical_keys() {
        let a: ParameterSet = [("A", 1i64), ("B", 2)].into_iter().collect();
        let b: ParameterSet = [("A", 1i64), ("B", 2)].into_iter().collect();
        assert_eq!(a.run_key(), b.run_key());
    }

    #[test]
    fn distinct_values_distinct_keys() {
        let a = ParameterSet::new().with("WIDTH", 8);
        let b = ParameterSet::new().with("WIDTH", 16);
        let c = ParameterSet::new().with("DEPTH", 8);
        assert_ne!(a.run_key(), b.run_key());
        assert_ne!(a.run_key(), c.run_key());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut p = ParameterSet::new().with("A", 1).with("B", 2);
        p.insert("A", 3);
        assert_eq!(p.len(), 2);
        assert_eq!(p.run_key(), "A=3_B=2");
    }

    #[test]
    fn value_inference() {
        assert_eq!(ParamValue::infer("8"), ParamValue::Int(8));
        assert_eq!(ParamValue::infer("-3"), ParamValue::Int(-3));
        assert_eq!(ParamValue::infer("true"), ParamValue::Bool(true));
        assert_eq!(ParamValue::infer("0.5"), ParamValue::Real(0.5));
        assert_eq!(ParamValue::infer("abc"), ParamValue::Str("abc".into()));
        assert_eq!(ParamValue::infer("inf"), ParamValue::Str("inf".into()));
    }

    #[test]
    fn hdl_literals() {
        assert_eq!(ParamValue::Int(8).to_hdl_literal(), "8");
        assert_eq!(ParamValue::Bool(true).to_hdl_literal(), "1");
        assert_eq!(ParamValue::Bool(false).to_hdl_literal(), "0");
        assert_eq!(ParamValue::Str("mem.hex".into()).to_hdl_literal(), "\"mem.hex\"");
    }

    #[test]
    fn parse_assignments() {
        assert_eq!(
            parse_assignment("WIDTH=8").unwrap(),
            ("WIDTH".to_string(), ParamValue::Int(8))
        );
        assert_eq!(
            parse_assignment("WIDTH"),
            Err(ParamError::MissingEquals("WIDTH".into()))
        );
        assert_eq!(parse_assignment("=8"), Err(ParamError::EmptyName("=8".into())));
    }

    #[test]
    fn parse_sweep_axes() {
        let (name, values) = parse_sweep_axis("WIDTH=8, 16,32").unwrap();
        assert_eq!(name, "WIDTH");
        assert_eq!(
            values,
            vec![ParamValue::Int(8), ParamValue::Int(16), ParamValue::Int(32)]
        );
        assert_eq!(
            parse_sweep_axis("WIDTH=,"),
            Err(ParamError::EmptySweep("WIDTH".into()))
        );
    }

    #[test]
    fn sweep_is_cartesian_product() {
        let base = ParameterSet::new().with("MODE", "fast");
        let axes = vec![
            ("WIDTH".to_string(), vec![ParamValue::Int(8), ParamValue::Int(16)]),
            ("DEPTH".to_string(), vec![ParamValue::Int(2), ParamValue::Int(4)]),
        ];
        let keys: Vec<String> = base.sweep(&axes).iter().map(ParameterSet::run_key).collect();
        assert_eq!(
            keys,
            vec![
                "MODE=fast_WIDTH=8_DEPTH=2",
                "MODE=fast_WIDTH=8_DEPTH=4",
                "MODE=fast_WIDTH=16_DEPTH=2",
                "MODE=fast_WIDTH=16_DEPTH=4",
            ]
        );
    }

    #[test]
    fn sweep_without_axes_is_base() {
        let base = ParameterSet::new().with("A", 1);
        assert_eq!(base.sweep(&[]), vec![base.clone()]);
    }
}
