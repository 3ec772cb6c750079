//! Column scales and the accumulator that folds observed values into them.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::data_type::{DataType, ScaleType};
use crate::value::Value;

/// The statistical scale of a column.
///
/// Nominal and ordinal scales carry the set of observed values, kept in
/// ascending natural order. Interval and ratio scales carry the running
/// minimum and maximum instead; `minimum`/`maximum` are never set on a
/// nominal or ordinal scale and ratio scales never hold discrete values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scale {
    data_type: DataType,
    scale_type: ScaleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discrete_values: Option<BTreeSet<Value>>,
}

impl Default for Scale {
    fn default() -> Self {
        Self::new(ScaleType::Nominal, DataType::String)
    }
}

impl Scale {
    /// Create an empty scale.
    pub fn new(scale_type: ScaleType, data_type: DataType) -> Self {
        Self {
            data_type,
            scale_type,
            minimum: None,
            maximum: None,
            discrete_values: scale_type.has_discrete_values().then(BTreeSet::new),
        }
    }

    /// Create an empty nominal scale.
    pub fn nominal(data_type: DataType) -> Self {
        Self::new(ScaleType::Nominal, data_type)
    }

    /// Create an empty ratio scale.
    pub fn ratio(data_type: DataType) -> Self {
        Self::new(ScaleType::Ratio, data_type)
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    #[inline]
    pub fn minimum(&self) -> Option<&Value> {
        self.minimum.as_ref()
    }

    #[inline]
    pub fn maximum(&self) -> Option<&Value> {
        self.maximum.as_ref()
    }

    /// Observed values in ascending order, or `None` for interval/ratio scales.
    pub fn values(&self) -> Option<&BTreeSet<Value>> {
        self.discrete_values.as_ref()
    }

    /// Set the lower bound. Ignored on scales without bounds.
    pub fn set_minimum(&mut self, value: Value) -> &mut Self {
        if self.scale_type.has_bounds() {
            self.minimum = Some(value);
        }
        self
    }

    /// Set the upper bound. Ignored on scales without bounds.
    pub fn set_maximum(&mut self, value: Value) -> &mut Self {
        if self.scale_type.has_bounds() {
            self.maximum = Some(value);
        }
        self
    }

    /// Fold one observed value into the scale.
    ///
    /// Nominal and ordinal scales insert the value into the discrete set;
    /// interval and ratio scales widen their bounds. The first value seen by
    /// an unbounded scale initializes both bounds.
    pub fn accumulate(&mut self, value: &Value) {
        if let Some(values) = self.discrete_values.as_mut() {
            if !values.contains(value) {
                values.insert(value.clone());
            }
            return;
        }

        if self.minimum.as_ref().is_none_or(|min| value < min) {
            self.minimum = Some(value.clone());
        }
        if self.maximum.as_ref().is_none_or(|max| value > max) {
            self.maximum = Some(value.clone());
        }
    }

    /// A copy of this scale with the same types but no observations or bounds.
    pub fn empty_like(&self) -> Scale {
        Scale::new(self.scale_type, self.data_type)
    }

    /// Change the data type and drop everything accumulated so far.
    pub(crate) fn retype(&mut self, data_type: DataType) {
        *self = Scale::new(self.scale_type, data_type);
    }
}
