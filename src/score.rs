use std::borrow::Cow;
use std::fmt;
use std::ops::{Add, Mul};

/// Quality of a match as a value relative to a reference value.
///
/// Scores are immutable trees: leaves are built from a single piece of evidence and
/// are composed with `+` (independent evidence) and `*` (joint evidence).
/// The value and the reference of a composite are recomputed from its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    Simple {
        name: Cow<'static, str>,
        description: Cow<'static, str>,
        value: f64,
        reference: f64,
    },
    Added(Box<Score>, Box<Score>),
    Multiplied(Box<Score>, Box<Score>),
}

impl Score {
    /// Creates a leaf score, negative values and references are clamped to zero.
    pub fn simple(
        name: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
        value: f64,
        reference: f64,
    ) -> Self {
        Self::Simple {
            name: name.into(),
            description: description.into(),
            value: value.max(0.0),
            reference: reference.max(0.0),
        }
    }

    /// Creates a leaf score with a reference of 1.
    pub fn normalized(
        name: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
        value: f64,
    ) -> Self {
        Self::simple(name, description, value, 1.0)
    }

    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Simple { name, .. } => Cow::Borrowed(name),
            Self::Added(left, right) => Cow::Owned(format!("{}+{}", left.name(), right.name())),
            Self::Multiplied(left, right) => {
                Cow::Owned(format!("{}*{}", left.name(), right.name()))
            }
        }
    }

    pub fn description(&self) -> Cow<'_, str> {
        match self {
            Self::Simple { description, .. } => Cow::Borrowed(description),
            Self::Added(left, right) => Cow::Owned(format!(
                "({}) + ({})",
                left.description(),
                right.description()
            )),
            Self::Multiplied(left, right) => Cow::Owned(format!(
                "({}) * ({})",
                left.description(),
                right.description()
            )),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::Simple { value, .. } => *value,
            Self::Added(left, right) => left.value() + right.value(),
            Self::Multiplied(left, right) => left.value() * right.value(),
        }
    }

    pub fn reference(&self) -> f64 {
        match self {
            Self::Simple { reference, .. } => *reference,
            Self::Added(left, right) => left.reference() + right.reference(),
            Self::Multiplied(left, right) => left.reference() * right.reference(),
        }
    }

    /// Value relative to the reference, zero when the reference is zero.
    pub fn ratio(&self) -> f64 {
        let reference = self.reference();
        if reference > 0.0 {
            self.value() / reference
        } else {
            0.0
        }
    }

    /// Returns the contribution of the sub-score(s) with the given name.
    /// If both children of a composite contain a match, the matches are combined with
    /// the operator of the composite.
    pub fn try_get_by_name(&self, name: &str) -> Option<Score> {
        if self.name() == name {
            return Some(self.clone());
        }

        match self {
            Self::Simple { .. } => None,
            Self::Added(left, right) => {
                match (left.try_get_by_name(name), right.try_get_by_name(name)) {
                    (Some(left), Some(right)) => Some(left + right),
                    (left, right) => left.or(right),
                }
            }
            Self::Multiplied(left, right) => {
                match (left.try_get_by_name(name), right.try_get_by_name(name)) {
                    (Some(left), Some(right)) => Some(left * right),
                    (left, right) => left.or(right),
                }
            }
        }
    }
}

impl Add for Score {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::Added(Box::new(self), Box::new(rhs))
    }
}

impl Mul for Score {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::Multiplied(Box::new(self), Box::new(rhs))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.3}/{:.3}", self.name(), self.value(), self.reference())
    }
}
