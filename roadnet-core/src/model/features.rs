//! Attribute table of raw line features
//!
//! Geometries come with an ordered list of named columns. Every column holds
//! exactly one value per geometry.

use geo::{Geometry, LineString};

use crate::Error;

/// Values of a single attribute column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(values) => values.len(),
            ColumnValues::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// Raw line features with their attribute columns
#[derive(Debug, Clone, Default)]
pub struct LineFeatures {
    geometries: Vec<Geometry<f64>>,
    columns: Vec<Column>,
}

impl LineFeatures {
    pub fn new(geometries: Vec<Geometry<f64>>) -> Self {
        Self {
            geometries,
            columns: Vec::new(),
        }
    }

    /// Convenience constructor for plain line strings
    pub fn from_lines(lines: impl IntoIterator<Item = LineString<f64>>) -> Self {
        Self::new(lines.into_iter().map(Geometry::LineString).collect())
    }

    /// Adds a numeric column, replacing any column with the same name
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values differs from the number of geometries
    pub fn with_numeric(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, Error> {
        self.push_column(name.into(), ColumnValues::Numeric(values))?;
        Ok(self)
    }

    /// Adds a text column, replacing any column with the same name
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values differs from the number of geometries
    pub fn with_text(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<String>>,
    ) -> Result<Self, Error> {
        self.push_column(name.into(), ColumnValues::Text(values))?;
        Ok(self)
    }

    /// Adds a column, replacing any column with the same name
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values differs from the number of geometries
    pub fn push_column(&mut self, name: String, values: ColumnValues) -> Result<(), Error> {
        if values.len() != self.geometries.len() {
            return Err(Error::ColumnLength {
                column: name,
                found: values.len(),
                expected: self.geometries.len(),
            });
        }

        self.columns.retain(|column| column.name != name);
        self.columns.push(Column { name, values });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn geometries(&self) -> &[Geometry<f64>] {
        &self.geometries
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Numeric column by name
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or holds text
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], Error> {
        match self.column(name).map(|column| &column.values) {
            Some(ColumnValues::Numeric(values)) => Ok(values),
            Some(ColumnValues::Text(_)) => Err(Error::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
            None => Err(Error::MissingColumn(name.to_string())),
        }
    }

    /// Text column by name
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or holds numbers
    pub fn text(&self, name: &str) -> Result<&[Option<String>], Error> {
        match self.column(name).map(|column| &column.values) {
            Some(ColumnValues::Text(values)) => Ok(values),
            Some(ColumnValues::Numeric(_)) => Err(Error::ColumnType {
                column: name.to_string(),
                expected: "text",
            }),
            None => Err(Error::MissingColumn(name.to_string())),
        }
    }

    /// Names and values of all numeric columns, in column order
    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.columns.iter().filter_map(|column| match &column.values {
            ColumnValues::Numeric(values) => Some((column.name.as_str(), values.as_slice())),
            ColumnValues::Text(_) => None,
        })
    }
}
