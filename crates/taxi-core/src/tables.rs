//! Source table readers.
//!
//! The vertex table carries `Vertex_Index | Latitude | Longitude`; the taxiway
//! table carries `Ident | Vertex_Indices` where the index cell lists a polyline
//! of vertex ids separated by `;`, `,` or whitespace. Columns are matched by
//! case-insensitive substring so exports with slightly different headers load.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;

use crate::error::TableError;
use crate::models::{TaxiwayRow, Vertex, VertexId};
use crate::predictor::MovementRecord;

pub fn load_vertex_table(path: impl AsRef<Path>) -> Result<Vec<Vertex>, TableError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = open(path, &source)?;
    read_vertex_table(file, &source)
}

pub fn load_taxiway_table(path: impl AsRef<Path>) -> Result<Vec<TaxiwayRow>, TableError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = open(path, &source)?;
    read_taxiway_table(file, &source)
}

pub fn load_movement_records(path: impl AsRef<Path>) -> Result<Vec<MovementRecord>, TableError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = open(path, &source)?;
    read_movement_records(file, &source)
}

fn open(path: &Path, source: &str) -> Result<std::fs::File, TableError> {
    std::fs::File::open(path).map_err(|err| TableError::Csv {
        path: source.to_string(),
        source: csv::Error::from(err),
    })
}

/// Read vertices. Empty coordinate cells load as NaN and are rejected by graph construction.
pub fn read_vertex_table<R: Read>(reader: R, source: &str) -> Result<Vec<Vertex>, TableError> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers().map_err(|e| csv_error(source, e))?.clone();

    let id_col = find_column(&headers, source, "vertex", |_| true)?;
    let lat_col = find_column(&headers, source, "lat", |_| true)?;
    let lon_col = find_column(&headers, source, "lon", |_| true)?;

    let mut vertices = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(source, e))?;
        let line = row + 2;
        let id = parse_vertex_id(record.get(id_col).unwrap_or_default())
            .ok_or_else(|| invalid_row(source, line, "vertex id is not a non-negative integer"))?;
        let lat = parse_coordinate(record.get(lat_col).unwrap_or_default())
            .ok_or_else(|| invalid_row(source, line, "latitude is not a number"))?;
        let lon = parse_coordinate(record.get(lon_col).unwrap_or_default())
            .ok_or_else(|| invalid_row(source, line, "longitude is not a number"))?;
        vertices.push(Vertex::new(id, lat, lon));
    }

    if vertices.is_empty() {
        return Err(TableError::Empty {
            path: source.to_string(),
        });
    }
    tracing::debug!("Read {} vertices from {}", vertices.len(), source);
    Ok(vertices)
}

/// Read taxiway polylines. Rows without any vertex ids are skipped.
pub fn read_taxiway_table<R: Read>(reader: R, source: &str) -> Result<Vec<TaxiwayRow>, TableError> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers().map_err(|e| csv_error(source, e))?.clone();

    let ident_col = find_column(&headers, source, "ident", |_| true)?;
    // Exports often carry a Vertex_Count column next to Vertex_Indices.
    let vertices_col = find_column(&headers, source, "vertex", |h| !h.contains("count"))?;

    let mut rows = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(source, e))?;
        let line = row + 2;
        let ident = record.get(ident_col).unwrap_or_default().to_string();
        let cell = record.get(vertices_col).unwrap_or_default();

        let vertices = split_vertex_list(cell)
            .map(|token| {
                parse_vertex_id(token).ok_or_else(|| {
                    invalid_row(source, line, &format!("'{token}' is not a vertex id"))
                })
            })
            .collect::<Result<Vec<VertexId>, TableError>>()?;

        if vertices.is_empty() {
            tracing::debug!("Skipping taxiway row {} ({}) with no vertices", line, ident);
            continue;
        }
        rows.push(TaxiwayRow { ident, vertices });
    }

    if rows.is_empty() {
        return Err(TableError::Empty {
            path: source.to_string(),
        });
    }
    tracing::debug!("Read {} taxiway rows from {}", rows.len(), source);
    Ok(rows)
}

/// Read historical movement records (`phase`, `Speed`, `time` columns).
pub fn read_movement_records<R: Read>(
    reader: R,
    source: &str,
) -> Result<Vec<MovementRecord>, TableError> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let records = csv_reader
        .deserialize()
        .collect::<Result<Vec<MovementRecord>, _>>()
        .map_err(|e| csv_error(source, e))?;
    if records.is_empty() {
        return Err(TableError::Empty {
            path: source.to_string(),
        });
    }
    Ok(records)
}

fn find_column(
    headers: &StringRecord,
    source: &str,
    needle: &'static str,
    accept: impl Fn(&str) -> bool,
) -> Result<usize, TableError> {
    headers
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .position(|h| h.contains(needle) && accept(&h))
        .ok_or_else(|| TableError::MissingColumn {
            path: source.to_string(),
            column: needle,
        })
}

fn split_vertex_list(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(|c: char| c == ';' || c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Accepts `12` and spreadsheet-style `12.0`.
fn parse_vertex_id(text: &str) -> Option<VertexId> {
    let text = text.trim();
    if let Ok(id) = text.parse::<VertexId>() {
        return Some(id);
    }
    let value = text.parse::<f64>().ok()?;
    (value.fract() == 0.0 && (0.0..=VertexId::MAX as f64).contains(&value))
        .then_some(value as VertexId)
}

fn parse_coordinate(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(f64::NAN);
    }
    text.parse::<f64>().ok()
}

fn csv_error(source: &str, err: csv::Error) -> TableError {
    TableError::Csv {
        path: source.to_string(),
        source: err,
    }
}

fn invalid_row(source: &str, row: usize, message: &str) -> TableError {
    TableError::InvalidRow {
        path: source.to_string(),
        row,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_vertices_with_detected_columns() {
        let data = "Vertex_Index, Latitude ,Longitude\n1,40.85,-74.06\n2.0,40.851,-74.061\n";
        let vertices = read_vertex_table(data.as_bytes(), "vertices.csv").expect("read");
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].id, 2);
        assert_eq!(vertices[1].lat, 40.851);
    }

    #[test]
    fn empty_coordinates_load_as_nan() {
        let data = "vertex,lat,lon\n1,,-74.06\n";
        let vertices = read_vertex_table(data.as_bytes(), "v.csv").expect("read");
        assert!(vertices[0].lat.is_nan());
    }

    #[test]
    fn missing_column_is_reported() {
        let data = "id,lat,lon\n1,40.0,-74.0\n";
        match read_vertex_table(data.as_bytes(), "v.csv") {
            Err(TableError::MissingColumn { column, .. }) => assert_eq!(column, "vertex"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_vertex_id_names_the_row() {
        let data = "vertex,lat,lon\n1,40.0,-74.0\nx,40.0,-74.0\n";
        match read_vertex_table(data.as_bytes(), "v.csv") {
            Err(TableError::InvalidRow { row, .. }) => assert_eq!(row, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reads_taxiway_polylines_with_any_separator() {
        let data = "Ident,Vertex_Count,Vertex_Indices\n\
                    C,3,\"1,2,3\"\n\
                    F5,2,4;5\n\
                    RW27,2,7 8\n\
                    X,0,\n";
        let rows = read_taxiway_table(data.as_bytes(), "t.csv").expect("read");
        assert_eq!(
            rows,
            vec![
                TaxiwayRow::new("C", vec![1, 2, 3]),
                TaxiwayRow::new("F5", vec![4, 5]),
                TaxiwayRow::new("RW27", vec![7, 8]),
            ]
        );
    }

    #[test]
    fn rejects_non_numeric_vertex_reference() {
        let data = "Ident,Vertex_Indices\nC,\"1,two\"\n";
        assert!(matches!(
            read_taxiway_table(data.as_bytes(), "t.csv"),
            Err(TableError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn reads_movement_records() {
        let data = "phase,Speed,time,callsign\nlanding,8.5,40,N123\ntakeoff,12,30,N456\n";
        let records = read_movement_records(data.as_bytes(), "h.csv").expect("read");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].speed, 8.5);
        assert_eq!(records[1].phase, "takeoff");
    }

    #[test]
    fn parses_spreadsheet_ids() {
        assert_eq!(parse_vertex_id("12"), Some(12));
        assert_eq!(parse_vertex_id("12.0"), Some(12));
        assert_eq!(parse_vertex_id("12.5"), None);
        assert_eq!(parse_vertex_id("-1"), None);
    }
}
