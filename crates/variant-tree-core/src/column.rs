//! The three columns every tree row exposes.

use std::fmt;

/// A column of a tree row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// The key or index that reaches the node from its parent.
    Key,
    /// The node's value.
    Value,
    /// The name of the value's type.
    Type,
}

impl Column {
    /// All columns in display order.
    pub const ALL: [Column; 3] = [Column::Key, Column::Value, Column::Type];

    /// Number of columns.
    pub const COUNT: usize = 3;

    /// Position of the column in a row.
    pub fn index(self) -> usize {
        match self {
            Column::Key => 0,
            Column::Value => 1,
            Column::Type => 2,
        }
    }

    /// Column at a row position.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Header label shown by views.
    pub fn header(self) -> &'static str {
        match self {
            Column::Key => "Key / Index",
            Column::Value => "Value",
            Column::Type => "Data type",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Column::Key => "key",
            Column::Value => "value",
            Column::Type => "type",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_round_trip() {
        for column in Column::ALL {
            assert_eq!(Column::from_index(column.index()), Some(column));
        }
        assert_eq!(Column::from_index(3), None);
    }

    #[test]
    fn test_headers() {
        assert_eq!(Column::Key.header(), "Key / Index");
        assert_eq!(Column::Type.header(), "Data type");
    }
}
