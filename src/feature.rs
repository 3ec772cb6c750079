use serde::Serialize;

use crate::data_type::{DataType, ScaleType};
use crate::scale::Scale;

/// A typed, measured column of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    scale: Scale,
}

impl Feature {
    /// Create a nominal string column.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_scale(id, Scale::default())
    }

    pub fn with_scale(id: impl Into<String>, scale: Scale) -> Self {
        Self {
            id: id.into(),
            name: None,
            scale,
        }
    }

    /// Set the display name. An empty name, or one equal to the identifier, clears it.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.name = (!name.is_empty() && name != self.id).then_some(name);
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, defaulting to the identifier.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Returns true if a display name distinct from the identifier is set.
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| n != self.id)
    }

    #[inline]
    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    #[inline]
    pub fn scale_mut(&mut self) -> &mut Scale {
        &mut self.scale
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.scale.data_type()
    }

    #[inline]
    pub fn scale_type(&self) -> ScaleType {
        self.scale.scale_type()
    }
}

/// The (identifier, display name) label of one data row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RowHeader {
    id: Option<String>,
    name: Option<String>,
}

impl RowHeader {
    /// Create a row header. A missing identifier defaults to the name and
    /// vice versa; empty strings count as missing.
    pub fn new(id: Option<&str>, name: Option<&str>) -> Self {
        let id = id.filter(|s| !s.is_empty()).map(str::to_string);
        let name = name.filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            id: id.clone().or_else(|| name.clone()),
            name: name.or(id),
        }
    }

    /// Row header with identical identifier and name.
    pub fn from_id(id: &str) -> Self {
        Self::new(Some(id), None)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns true if the display name differs from the identifier.
    pub fn has_distinct_name(&self) -> bool {
        self.name != self.id
    }
}
