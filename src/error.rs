//! Planning error types

use thiserror::Error;

/// Errors that stop a planning run before any route is built
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("Input file is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid value in row {row}, column {column}: {message}")]
    InvalidRow {
        row: usize,
        column: String,
        message: String,
    },

    #[error("Invalid truck '{plate}': {message}")]
    InvalidTruck { plate: String, message: String },

    #[error("Grouping radius {0} km is outside the accepted range")]
    InvalidRadius(f64),

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read workbook: {0}")]
    Excel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_lists_every_column() {
        let err = PlanningError::MissingColumns(vec!["poids".into(), "ville".into()]);
        assert_eq!(
            err.to_string(),
            "Input file is missing required columns: poids, ville"
        );
    }

    #[test]
    fn test_invalid_row_names_position() {
        let err = PlanningError::InvalidRow {
            row: 4,
            column: "volume".into(),
            message: "must be positive".into(),
        };
        assert!(err.to_string().contains("row 4"));
        assert!(err.to_string().contains("volume"));
    }
}
