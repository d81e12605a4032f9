//! Field identifiers and the ordered schema of fields known to a track

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a data field carried by points
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Field {
    Latitude,
    Longitude,
    Altitude,
    Timestamp,
    WaypointName,
    NewSegment,
    Description,
    /// Any other column found in loaded data
    Custom(String),
}

impl Field {
    /// Human readable name of the field
    pub fn name(&self) -> &str {
        match self {
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::Altitude => "altitude",
            Field::Timestamp => "timestamp",
            Field::WaypointName => "waypoint name",
            Field::NewSegment => "new segment",
            Field::Description => "description",
            Field::Custom(name) => name,
        }
    }

    /// True for fields with a typed representation on [`crate::Point`]
    pub fn is_typed(&self) -> bool {
        matches!(
            self,
            Field::Latitude | Field::Longitude | Field::Altitude | Field::Timestamp
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered set of fields, in first-seen order and without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldList {
    fields: Vec<Field>,
}

impl FieldList {
    /// Create a field list, dropping repeated fields
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut list = Self::default();
        for field in fields {
            list.extend(field);
        }
        list
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    #[inline]
    pub fn contains(&self, field: &Field) -> bool {
        self.fields.contains(field)
    }

    /// Position of the field in the list
    pub fn index_of(&self, field: &Field) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Append a field unless already present
    ///
    /// Returns true if the field was added.
    pub fn extend(&mut self, field: Field) -> bool {
        if self.contains(&field) {
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Union of two lists: this list's order first, then unseen fields of `other`
    pub fn merge(&self, other: &FieldList) -> FieldList {
        let mut merged = self.clone();
        for field in other {
            merged.extend(field.clone());
        }
        merged
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }
}

impl FromIterator<Field> for FieldList {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
