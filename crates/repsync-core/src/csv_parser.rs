//! CSV parsing for equipment and exercise imports.
//!
//! Column lookup is by header name, case-insensitively, so exports from
//! other tools survive header capitalization differences. Data rows are
//! numbered from 2 (the header is line 1) and that number is carried into
//! per-row error messages.
//!
//! Equipment files: `name,description,enabled`.
//! Exercise files: `name,enabled,primary_muscle_group,
//! secondary_muscle_groups,equipment`, with `;`-separated multi-value cells.

use std::collections::HashMap;

use crate::error::AppError;
use crate::models::{RawEquipmentRecord, RawExerciseRecord};

/// UTF-8 byte-order mark, stripped before parsing.
const UTF8_BOM: &str = "\u{feff}";

/// Maps lowercased header names to column positions.
fn header_positions(headers: &csv::StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect()
}

fn field<'a>(
    record: &'a csv::StringRecord,
    positions: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    positions.get(name).and_then(|&i| record.get(i))
}

fn optional_field(
    record: &csv::StringRecord,
    positions: &HashMap<String, usize>,
    name: &str,
) -> Option<String> {
    field(record, positions, name).and_then(|s| {
        if s.trim().is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    })
}

/// Splits a `;`-separated multi-value cell, dropping blank segments.
fn split_multi(cell: Option<&str>) -> Vec<String> {
    cell.map(|s| {
        s.split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn reader_for(contents: &str) -> csv::Reader<&[u8]> {
    let contents = contents.strip_prefix(UTF8_BOM).unwrap_or(contents);
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(contents.as_bytes())
}

fn require_column(positions: &HashMap<String, usize>, name: &str) -> Result<(), AppError> {
    if positions.contains_key(name) {
        Ok(())
    } else {
        Err(AppError::Generic(format!(
            "CSV file is missing required column '{}'",
            name
        )))
    }
}

/// Parses an equipment CSV file into raw records, preserving line numbers.
///
/// Rows with blank names are kept; the import engine applies the per-kind
/// blank-name policy.
pub fn parse_equipment_csv(contents: &str) -> Result<Vec<RawEquipmentRecord>, AppError> {
    let mut reader = reader_for(contents);
    let positions = header_positions(reader.headers()?);
    require_column(&positions, "name")?;

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        records.push(RawEquipmentRecord {
            line: Some(i + 2),
            name: field(&row, &positions, "name").unwrap_or_default().to_string(),
            description: optional_field(&row, &positions, "description"),
            enabled: optional_field(&row, &positions, "enabled"),
        });
    }
    Ok(records)
}

/// Parses an exercise CSV file into raw records, preserving line numbers.
pub fn parse_exercise_csv(contents: &str) -> Result<Vec<RawExerciseRecord>, AppError> {
    let mut reader = reader_for(contents);
    let positions = header_positions(reader.headers()?);
    require_column(&positions, "name")?;

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        records.push(RawExerciseRecord {
            line: Some(i + 2),
            name: field(&row, &positions, "name").unwrap_or_default().to_string(),
            enabled: optional_field(&row, &positions, "enabled"),
            primary_muscle_group: optional_field(&row, &positions, "primary_muscle_group"),
            secondary_muscle_groups: split_multi(field(&row, &positions, "secondary_muscle_groups")),
            equipment: split_multi(field(&row, &positions, "equipment")),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_equipment_csv() {
        let csv = "name,description,enabled\nBand,Elastic band,true\nBarbell,,false\n";
        let records = parse_equipment_csv(csv).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].line, Some(2));
        assert_eq!(records[0].name, "Band");
        assert_eq!(records[0].description.as_deref(), Some("Elastic band"));
        assert_eq!(records[0].enabled.as_deref(), Some("true"));

        assert_eq!(records[1].line, Some(3));
        assert_eq!(records[1].description, None);
        assert_eq!(records[1].enabled.as_deref(), Some("false"));
    }

    #[test]
    fn test_parse_equipment_csv_header_case_and_bom() {
        let csv = "\u{feff}Name,Description,Enabled\nBand,,\n";
        let records = parse_equipment_csv(csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Band");
    }

    #[test]
    fn test_parse_equipment_csv_keeps_blank_name_rows() {
        let csv = "name,enabled\n,true\nBand,true\n";
        let records = parse_equipment_csv(csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "");
        assert_eq!(records[0].line, Some(2));
    }

    #[test]
    fn test_parse_equipment_csv_missing_name_column() {
        let csv = "description,enabled\nfoo,true\n";
        let result = parse_equipment_csv(csv);
        assert!(matches!(result, Err(AppError::Generic(_))));
    }

    #[test]
    fn test_parse_equipment_csv_quoted_fields() {
        let csv = "name,description,enabled\n\"Pull-up bar\",\"Mounted, doorway\",yes\n";
        let records = parse_equipment_csv(csv).unwrap();
        assert_eq!(records[0].name, "Pull-up bar");
        assert_eq!(records[0].description.as_deref(), Some("Mounted, doorway"));
    }

    #[test]
    fn test_parse_exercise_csv() {
        let csv = "name,enabled,primary_muscle_group,secondary_muscle_groups,equipment\n\
                   Deadlift,true,Back,Hamstrings; Glutes,Barbell\n\
                   Plank,,Core,,\n";
        let records = parse_exercise_csv(csv).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "Deadlift");
        assert_eq!(records[0].primary_muscle_group.as_deref(), Some("Back"));
        assert_eq!(
            records[0].secondary_muscle_groups,
            vec!["Hamstrings".to_string(), "Glutes".to_string()]
        );
        assert_eq!(records[0].equipment, vec!["Barbell".to_string()]);

        assert_eq!(records[1].enabled, None);
        assert!(records[1].secondary_muscle_groups.is_empty());
        assert!(records[1].equipment.is_empty());
    }

    #[test]
    fn test_split_multi_drops_blank_segments() {
        assert_eq!(
            split_multi(Some("Lats; ;Traps;")),
            vec!["Lats".to_string(), "Traps".to_string()]
        );
        assert!(split_multi(Some("")).is_empty());
        assert!(split_multi(None).is_empty());
    }

    #[test]
    fn test_parse_exercise_csv_short_rows_tolerated() {
        // flexible parsing: trailing columns may be missing entirely
        let csv = "name,enabled,primary_muscle_group,secondary_muscle_groups,equipment\nSquat,true\n";
        let records = parse_exercise_csv(csv).unwrap();
        assert_eq!(records[0].name, "Squat");
        assert_eq!(records[0].primary_muscle_group, None);
    }
}
