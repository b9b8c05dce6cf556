// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Relational export: `database.json` (meta, schema, data) to a SQLite file.
//
// Tables are created and filled in foreign-key order inside one transaction,
// followed by lookup indexes and summary views for whichever tables exist.
// The file is built at a temporary path and renamed into place, so a failed
// export never leaves a half-built database behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use docforge_core::error::{DocforgeError, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::writer::OutputWriter;

/// Creation and insert order. Referenced tables come before the tables that
/// point at them; tables not listed here follow in name order.
pub const TABLE_ORDER: [&str; 8] = [
    "employees",
    "clients",
    "contacts",
    "projects",
    "project_assignments",
    "time_entries",
    "invoices",
    "expenses",
];

/// `(index, table, column)`
const INDEXES: [(&str, &str, &str); 9] = [
    ("idx_contacts_client", "contacts", "client_id"),
    ("idx_projects_client", "projects", "client_id"),
    ("idx_time_entries_project", "time_entries", "project_id"),
    ("idx_time_entries_employee", "time_entries", "employee_id"),
    ("idx_invoices_client", "invoices", "client_id"),
    ("idx_invoices_project", "invoices", "project_id"),
    ("idx_expenses_project", "expenses", "project_id"),
    ("idx_clients_code", "clients", "code"),
    ("idx_invoices_number", "invoices", "invoice_number"),
];

struct ViewDef {
    name: &'static str,
    requires: &'static [(&'static str, &'static [&'static str])],
    sql: &'static str,
}

// Totals use correlated subqueries so that hours and expenses of the same
// project do not multiply each other through the join.
const VIEWS: [ViewDef; 3] = [
    ViewDef {
        name: "v_project_summary",
        requires: &[
            (
                "projects",
                &[
                    "id", "name", "client_id", "lead_employee_id", "type", "status",
                    "budget_net", "start_date", "end_date",
                ],
            ),
            ("clients", &["id", "name", "code"]),
            ("employees", &["id", "name"]),
            ("time_entries", &["project_id", "hours"]),
            ("expenses", &["project_id", "amount_net"]),
        ],
        sql: "CREATE VIEW IF NOT EXISTS v_project_summary AS
SELECT
    p.id,
    p.name AS project_name,
    c.name AS client_name,
    c.code AS client_code,
    p.type,
    p.status,
    p.budget_net,
    p.start_date,
    p.end_date,
    e.name AS lead_name,
    COALESCE((SELECT SUM(t.hours) FROM time_entries t WHERE t.project_id = p.id), 0) AS total_hours,
    COALESCE((SELECT SUM(x.amount_net) FROM expenses x WHERE x.project_id = p.id), 0) AS total_expenses
FROM projects p
LEFT JOIN clients c ON p.client_id = c.id
LEFT JOIN employees e ON p.lead_employee_id = e.id",
    },
    ViewDef {
        name: "v_client_revenue",
        requires: &[
            ("clients", &["id", "code", "name", "industry", "status"]),
            ("invoices", &["id", "client_id", "status", "amount_net", "amount_gross"]),
        ],
        sql: "CREATE VIEW IF NOT EXISTS v_client_revenue AS
SELECT
    c.id,
    c.code,
    c.name,
    c.industry,
    c.status,
    COUNT(DISTINCT i.id) AS invoice_count,
    COALESCE(SUM(i.amount_net), 0) AS total_revenue_net,
    COALESCE(SUM(i.amount_gross), 0) AS total_revenue_gross
FROM clients c
LEFT JOIN invoices i ON c.id = i.client_id AND i.status = 'paid'
GROUP BY c.id",
    },
    ViewDef {
        name: "v_employee_hours",
        requires: &[
            ("employees", &["id", "name", "role", "hourly_rate"]),
            ("time_entries", &["employee_id", "hours"]),
        ],
        sql: "CREATE VIEW IF NOT EXISTS v_employee_hours AS
SELECT
    e.id,
    e.name,
    e.role,
    e.hourly_rate,
    COALESCE(SUM(t.hours), 0) AS total_hours,
    COALESCE(SUM(t.hours * e.hourly_rate), 0) AS total_value
FROM employees e
LEFT JOIN time_entries t ON e.id = t.employee_id
GROUP BY e.id",
    },
];

// -- Input model --------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseMeta {
    pub database_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TableSchema {
    /// Column name to SQL type, in declaration order.
    columns: Map<String, Value>,
}

/// A parsed `database.json`.
#[derive(Debug, Clone)]
pub struct DatabaseSpec {
    pub meta: DatabaseMeta,
    tables: BTreeMap<String, Vec<(String, String)>>,
    data: BTreeMap<String, Vec<Map<String, Value>>>,
}

#[derive(Deserialize)]
struct RawSpec {
    meta: DatabaseMeta,
    schema: BTreeMap<String, TableSchema>,
    #[serde(default)]
    data: BTreeMap<String, Vec<Map<String, Value>>>,
}

/// Rows inserted into one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: String,
    pub rows: usize,
}

/// Result of a completed export.
#[derive(Debug, Clone)]
pub struct DatabaseExport {
    pub path: PathBuf,
    pub counts: Vec<TableCount>,
    pub views: Vec<String>,
}

impl DatabaseExport {
    pub fn total_rows(&self) -> usize {
        self.counts.iter().map(|c| c.rows).sum()
    }
}

impl DatabaseSpec {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    /// Parse and validate. Every identifier and column type is checked here,
    /// before any SQL is assembled from them.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let raw: RawSpec = serde_json::from_str(data)
            .map_err(|err| DocforgeError::Parse(format!("database definition: {err}")))?;

        check_file_name(&raw.meta.database_name)?;

        let mut tables = BTreeMap::new();
        for (table, schema) in raw.schema {
            check_identifier(&table)?;
            if schema.columns.is_empty() {
                return Err(db_err(format!("table {table} declares no columns")));
            }
            let mut columns = Vec::with_capacity(schema.columns.len());
            for (column, sql_type) in schema.columns {
                check_identifier(&column)?;
                let Value::String(sql_type) = sql_type else {
                    return Err(db_err(format!("{table}.{column}: column type must be a string")));
                };
                check_column_type(&table, &column, &sql_type)?;
                columns.push((column, sql_type));
            }
            tables.insert(table, columns);
        }

        for (table, rows) in &raw.data {
            let Some(columns) = tables.get(table) else {
                return Err(db_err(format!("data for table {table} which has no schema")));
            };
            for (n, row) in rows.iter().enumerate() {
                if let Some(unknown) = row.keys().find(|key| !columns.iter().any(|(c, _)| c == *key)) {
                    return Err(db_err(format!(
                        "{table} row {}: unknown column {unknown}",
                        n + 1
                    )));
                }
            }
        }

        Ok(Self {
            meta: raw.meta,
            tables,
            data: raw.data,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.meta.database_name
    }

    /// Known tables in foreign-key order, then any others by name.
    pub fn table_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = TABLE_ORDER
            .iter()
            .copied()
            .filter(|t| self.tables.contains_key(*t))
            .collect();
        order.extend(
            self.tables
                .keys()
                .map(String::as_str)
                .filter(|t| !TABLE_ORDER.contains(t)),
        );
        order
    }

    fn has_columns(&self, table: &str, wanted: &[&str]) -> bool {
        self.tables
            .get(table)
            .is_some_and(|cols| wanted.iter().all(|w| cols.iter().any(|(c, _)| c == w)))
    }

    // -- Building -------------------------------------------------------------

    /// Create the schema, load the rows, then add indexes and views. Returns
    /// the row counts after checking them against the database.
    #[instrument(skip_all, fields(database = %self.meta.database_name))]
    pub fn build(&self, conn: &mut Connection) -> Result<(Vec<TableCount>, Vec<String>)> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_sql_err)?;

        let tx = conn.transaction().map_err(db_sql_err)?;
        for table in self.table_order() {
            tx.execute_batch(&self.create_table_sql(table)).map_err(db_sql_err)?;
        }

        let mut counts = Vec::new();
        for table in self.table_order() {
            let rows = match self.data.get(table) {
                Some(rows) if !rows.is_empty() => rows,
                _ => continue,
            };
            let columns = self.insert_columns(table, rows);
            let sql = format!(
                "INSERT INTO \"{table}\" ({}) VALUES ({})",
                columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", "),
                vec!["?"; columns.len()].join(", "),
            );
            {
                let mut stmt = tx.prepare(&sql).map_err(db_sql_err)?;
                for (n, row) in rows.iter().enumerate() {
                    let values = columns.iter().map(|c| sql_value(row.get(*c)));
                    stmt.execute(params_from_iter(values)).map_err(|err| {
                        db_err(format!("{table} row {}: {err}", n + 1))
                    })?;
                }
            }
            debug!(table, rows = rows.len(), "rows inserted");
            counts.push(TableCount {
                table: table.to_string(),
                rows: rows.len(),
            });
        }

        for (index, table, column) in INDEXES {
            if self.has_columns(table, &[column]) {
                tx.execute_batch(&format!(
                    "CREATE INDEX IF NOT EXISTS {index} ON \"{table}\"(\"{column}\")"
                ))
                .map_err(db_sql_err)?;
            }
        }

        let mut views = Vec::new();
        for view in &VIEWS {
            if view.requires.iter().all(|(t, cols)| self.has_columns(t, cols)) {
                tx.execute_batch(view.sql).map_err(db_sql_err)?;
                views.push(view.name.to_string());
            } else {
                debug!(view = view.name, "view skipped, source tables missing");
            }
        }
        tx.commit().map_err(db_sql_err)?;

        verify_counts(conn, &counts)?;
        Ok((counts, views))
    }

    /// Columns used for a table's INSERT: schema columns that appear in at
    /// least one row. Absent values become NULL.
    fn insert_columns<'a>(&'a self, table: &str, rows: &[Map<String, Value>]) -> Vec<&'a str> {
        self.tables
            .get(table)
            .map(|cols| {
                cols.iter()
                    .map(|(c, _)| c.as_str())
                    .filter(|c| rows.iter().any(|row| row.contains_key(*c)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn create_table_sql(&self, table: &str) -> String {
        let columns = self
            .tables
            .get(table)
            .map(|cols| {
                cols.iter()
                    .map(|(name, sql_type)| format!("\"{name}\" {sql_type}"))
                    .collect::<Vec<_>>()
                    .join(",\n  ")
            })
            .unwrap_or_default();
        format!("CREATE TABLE IF NOT EXISTS \"{table}\" (\n  {columns}\n)")
    }

    /// Build the database file in the output directory.
    #[instrument(skip_all, fields(dir = %writer.dir().display()))]
    pub fn export(&self, writer: &OutputWriter) -> Result<DatabaseExport> {
        let mut outcome = None;
        let path = writer.persist_with(self.file_name(), |temp_path| {
            let mut conn = Connection::open(temp_path).map_err(db_sql_err)?;
            outcome = Some(self.build(&mut conn)?);
            conn.close().map_err(|(_, err)| db_sql_err(err))
        })?;
        let (counts, views) = outcome.unwrap_or_default();

        let export = DatabaseExport { path, counts, views };
        info!(
            path = %export.path.display(),
            tables = export.counts.len(),
            rows = export.total_rows(),
            "database exported"
        );
        Ok(export)
    }
}

fn verify_counts(conn: &Connection, expected: &[TableCount]) -> Result<()> {
    for count in expected {
        let actual: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", count.table), [], |row| {
                row.get(0)
            })
            .map_err(db_sql_err)?;
        if actual != count.rows as i64 {
            return Err(db_err(format!(
                "{} has {actual} rows, expected {}",
                count.table, count.rows
            )));
        }
    }
    Ok(())
}

fn sql_value(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

// -- Validation ---------------------------------------------------------------

fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(db_err(format!("{name:?} is not a valid SQL identifier")))
    }
}

/// Column types may carry constraints (`INTEGER PRIMARY KEY`,
/// `REFERENCES clients(id)`, `CHECK (status IN ('a','b'))`) but never a
/// statement break or a comment.
fn check_column_type(table: &str, column: &str, sql_type: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || " _(),.'-<>=".contains(c);
    let mut depth = 0i32;
    for c in sql_type.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            break;
        }
    }
    let valid = !sql_type.trim().is_empty()
        && sql_type.chars().all(allowed)
        && !sql_type.contains("--")
        && depth == 0
        && sql_type.matches('\'').count() % 2 == 0;
    if valid {
        Ok(())
    } else {
        Err(db_err(format!("{table}.{column}: unsupported column type {sql_type:?}")))
    }
}

fn check_file_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-.".contains(c));
    if valid {
        Ok(())
    } else {
        Err(db_err(format!("{name:?} is not a plain database file name")))
    }
}

fn db_err(message: String) -> DocforgeError {
    DocforgeError::Database(message)
}

fn db_sql_err(err: rusqlite::Error) -> DocforgeError {
    DocforgeError::Database(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docforge_core::error::ErrorClass;

    const SAMPLE: &str = r#"{
      "meta": { "database_name": "company.db" },
      "schema": {
        "expenses": { "columns": {
          "id": "INTEGER PRIMARY KEY", "project_id": "INTEGER REFERENCES projects(id)",
          "amount_net": "REAL", "category": "TEXT" } },
        "clients": { "columns": {
          "id": "INTEGER PRIMARY KEY", "code": "TEXT UNIQUE NOT NULL", "name": "TEXT NOT NULL",
          "industry": "TEXT", "status": "TEXT CHECK (status IN ('active', 'inactive'))" } },
        "employees": { "columns": {
          "id": "INTEGER PRIMARY KEY", "name": "TEXT NOT NULL", "role": "TEXT",
          "hourly_rate": "REAL" } },
        "contacts": { "columns": {
          "id": "INTEGER PRIMARY KEY", "client_id": "INTEGER REFERENCES clients(id)",
          "name": "TEXT", "phone": "TEXT", "is_primary": "INTEGER" } },
        "projects": { "columns": {
          "id": "INTEGER PRIMARY KEY", "name": "TEXT", "client_id": "INTEGER REFERENCES clients(id)",
          "lead_employee_id": "INTEGER REFERENCES employees(id)", "type": "TEXT",
          "status": "TEXT", "budget_net": "REAL", "start_date": "TEXT", "end_date": "TEXT" } },
        "time_entries": { "columns": {
          "id": "INTEGER PRIMARY KEY", "project_id": "INTEGER REFERENCES projects(id)",
          "employee_id": "INTEGER REFERENCES employees(id)", "hours": "REAL" } },
        "invoices": { "columns": {
          "id": "INTEGER PRIMARY KEY", "invoice_number": "TEXT", "client_id": "INTEGER REFERENCES clients(id)",
          "project_id": "INTEGER REFERENCES projects(id)", "amount_net": "REAL",
          "amount_gross": "REAL", "status": "TEXT" } }
      },
      "data": {
        "expenses": [
          { "id": 1, "project_id": 1, "amount_net": 1200.0, "category": "hosting" },
          { "id": 2, "project_id": 1, "amount_net": 300.5, "category": "travel" }
        ],
        "clients": [
          { "id": 1, "code": "MOB", "name": "Mobilex", "industry": "telecom", "status": "active" },
          { "id": 2, "code": "ZDR", "name": "Zdrowie+", "industry": "health", "status": "inactive" }
        ],
        "employees": [
          { "id": 1, "name": "Anna Kowalska", "role": "PM", "hourly_rate": 150.0 },
          { "id": 2, "name": "Piotr Nowak", "role": "Dev", "hourly_rate": 120 }
        ],
        "contacts": [
          { "id": 1, "client_id": 1, "name": "Anna Kowalska", "phone": "+48 607 777 888", "is_primary": true },
          { "id": 2, "client_id": 2, "name": "Jan Wiśniewski" }
        ],
        "projects": [
          { "id": 1, "name": "App", "client_id": 1, "lead_employee_id": 1, "type": "mobile",
            "status": "active", "budget_net": 250000.0, "start_date": "2023-02-01", "end_date": null }
        ],
        "time_entries": [
          { "id": 1, "project_id": 1, "employee_id": 1, "hours": 8 },
          { "id": 2, "project_id": 1, "employee_id": 2, "hours": 6.5 },
          { "id": 3, "project_id": 1, "employee_id": 2, "hours": 4 }
        ],
        "invoices": [
          { "id": 1, "invoice_number": "FV/12/2023", "client_id": 1, "project_id": 1,
            "amount_net": 25500.0, "amount_gross": 31365.0, "status": "paid" },
          { "id": 2, "invoice_number": "FV/13/2023", "client_id": 1, "project_id": 1,
            "amount_net": 1000.0, "amount_gross": 1230.0, "status": "sent" }
        ]
      }
    }"#;

    fn build_in_memory(spec: &DatabaseSpec) -> (Connection, Vec<TableCount>, Vec<String>) {
        let mut conn = Connection::open_in_memory().unwrap();
        let (counts, views) = spec.build(&mut conn).unwrap();
        (conn, counts, views)
    }

    #[test]
    fn tables_follow_foreign_key_order() {
        let spec = DatabaseSpec::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            spec.table_order(),
            vec!["employees", "clients", "contacts", "projects", "time_entries", "invoices", "expenses"]
        );
    }

    #[test]
    fn builds_tables_views_and_counts() {
        let spec = DatabaseSpec::from_json_str(SAMPLE).unwrap();
        let (conn, counts, views) = build_in_memory(&spec);

        let total: usize = counts.iter().map(|c| c.rows).sum();
        assert_eq!(total, 14);
        assert_eq!(
            views,
            vec!["v_project_summary", "v_client_revenue", "v_employee_hours"]
        );

        let phone: String = conn
            .query_row(
                "SELECT phone FROM contacts WHERE name = 'Anna Kowalska'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(phone, "+48 607 777 888");

        let (is_primary, missing_phone): (i64, Option<String>) = conn
            .query_row(
                "SELECT (SELECT is_primary FROM contacts WHERE id = 1), phone FROM contacts WHERE id = 2",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(is_primary, 1);
        assert_eq!(missing_phone, None);
    }

    #[test]
    fn revenue_view_counts_paid_invoices_only() {
        let spec = DatabaseSpec::from_json_str(SAMPLE).unwrap();
        let (conn, _, _) = build_in_memory(&spec);

        let (count, gross): (i64, f64) = conn
            .query_row(
                "SELECT invoice_count, total_revenue_gross FROM v_client_revenue WHERE code = 'MOB'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert!((gross - 31365.0).abs() < 1e-6);
    }

    #[test]
    fn project_summary_does_not_multiply_totals() {
        let spec = DatabaseSpec::from_json_str(SAMPLE).unwrap();
        let (conn, _, _) = build_in_memory(&spec);

        let (hours, expenses): (f64, f64) = conn
            .query_row(
                "SELECT total_hours, total_expenses FROM v_project_summary WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!((hours - 18.5).abs() < 1e-9);
        assert!((expenses - 1500.5).abs() < 1e-9);

        let value: f64 = conn
            .query_row(
                "SELECT total_value FROM v_employee_hours WHERE name = 'Piotr Nowak'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!((value - 1260.0).abs() < 1e-9);
    }

    #[test]
    fn views_need_their_tables() {
        let json = r#"{
          "meta": { "database_name": "small.db" },
          "schema": { "employees": { "columns": {
            "id": "INTEGER PRIMARY KEY", "name": "TEXT", "role": "TEXT", "hourly_rate": "REAL" } } },
          "data": { "employees": [ { "id": 1, "name": "Anna Kowalska" } ] }
        }"#;
        let spec = DatabaseSpec::from_json_str(json).unwrap();
        let (_, counts, views) = build_in_memory(&spec);
        assert_eq!(counts, vec![TableCount { table: "employees".into(), rows: 1 }]);
        assert!(views.is_empty());
    }

    #[test]
    fn hostile_identifiers_and_types_are_rejected() {
        let bad_table = r#"{ "meta": { "database_name": "x.db" },
          "schema": { "clients; DROP TABLE x": { "columns": { "id": "INTEGER" } } } }"#;
        let bad_column = r#"{ "meta": { "database_name": "x.db" },
          "schema": { "clients": { "columns": { "id\"": "INTEGER" } } } }"#;
        let bad_type = r#"{ "meta": { "database_name": "x.db" },
          "schema": { "clients": { "columns": { "id": "INTEGER); DROP TABLE clients; --" } } } }"#;
        let bad_name = r#"{ "meta": { "database_name": "../x.db" },
          "schema": { "clients": { "columns": { "id": "INTEGER" } } } }"#;

        for json in [bad_table, bad_column, bad_type, bad_name] {
            let err = DatabaseSpec::from_json_str(json).unwrap_err();
            assert_eq!(err.class(), ErrorClass::Database, "{json}");
        }
    }

    #[test]
    fn unknown_data_columns_are_rejected() {
        let json = r#"{ "meta": { "database_name": "x.db" },
          "schema": { "clients": { "columns": { "id": "INTEGER PRIMARY KEY" } } },
          "data": { "clients": [ { "id": 1, "nmae": "typo" } ] } }"#;
        let err = DatabaseSpec::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("nmae"));
    }

    #[test]
    fn broken_reference_fails_the_whole_export() {
        let json = r#"{ "meta": { "database_name": "broken.db" },
          "schema": {
            "clients": { "columns": { "id": "INTEGER PRIMARY KEY" } },
            "projects": { "columns": { "id": "INTEGER PRIMARY KEY", "client_id": "INTEGER REFERENCES clients(id)" } }
          },
          "data": { "clients": [ { "id": 1 } ], "projects": [ { "id": 1, "client_id": 99 } ] } }"#;
        let dir = tempfile::tempdir().unwrap();
        let spec = DatabaseSpec::from_json_str(json).unwrap();
        let err = spec.export(&OutputWriter::new(dir.path())).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Database);
        assert!(!dir.path().join("broken.db").exists());
    }

    #[test]
    fn bundled_dataset_exports_cleanly() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../dataset/database.json");
        let spec = DatabaseSpec::load(path).unwrap();
        let (conn, counts, views) = build_in_memory(&spec);
        assert_eq!(counts.len(), 8);
        assert_eq!(views.len(), 3);

        let revenue: f64 = conn
            .query_row(
                "SELECT total_revenue_gross FROM v_client_revenue WHERE code = 'MOB'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!((revenue - 31365.0).abs() < 1e-6);
    }

    #[test]
    fn export_writes_file_atomically_and_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let spec = DatabaseSpec::from_json_str(SAMPLE).unwrap();

        std::fs::write(dir.path().join("company.db"), b"stale").unwrap();
        let export = spec.export(&writer).unwrap();
        assert_eq!(export.path, dir.path().join("company.db"));
        assert_eq!(export.total_rows(), 14);

        let conn = Connection::open(&export.path).unwrap();
        let clients: i64 = conn
            .query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(clients, 2);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["company.db"]);
    }
}
