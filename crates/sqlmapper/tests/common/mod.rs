//! In-memory execution-boundary fake shared by the integration suites.
//!
//! [`MemoryDb`] interprets the narrow SQL dialect the mapping layer
//! generates: INSERT/UPDATE/DELETE with named placeholders, AND-chained
//! comparisons in WHERE clauses, `SELECT *` and `SELECT COUNT(*)`.
//! Statements run against a per-transaction working copy of the tables;
//! commit replays them onto the shared state, so a `REQUIRES_NEW` session
//! observes only committed data and an owner rollback discards its staged
//! statements wholesale.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

use sqlmapper::{CommandKind, Connection, DataSource, Error, ParameterMap, Result, Row, Value};

pub type Record = Vec<(String, Value)>;
type Tables = BTreeMap<String, Vec<Record>>;

/// Shared in-memory database handed to [`sqlmapper::SqlManager`] as its
/// datasource. Clones share the same tables, so tests can keep one handle
/// for assertions after moving another into the manager.
#[derive(Clone, Default)]
pub struct MemoryDb {
    shared: Rc<RefCell<Tables>>,
    fail_matching: Rc<RefCell<Option<String>>>,
    opened: Rc<Cell<usize>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every statement whose SQL contains `needle` fail.
    pub fn fail_matching(&self, needle: &str) {
        *self.fail_matching.borrow_mut() = Some(needle.to_string());
    }

    pub fn clear_failures(&self) {
        *self.fail_matching.borrow_mut() = None;
    }

    /// Committed rows of a table, cloned for assertions.
    pub fn table(&self, name: &str) -> Vec<Record> {
        self.shared.borrow().get(name).cloned().unwrap_or_default()
    }

    /// Number of committed rows in a table.
    pub fn row_count(&self, name: &str) -> usize {
        self.table(name).len()
    }

    /// How many physical sessions were opened so far.
    pub fn opened_connections(&self) -> usize {
        self.opened.get()
    }
}

impl DataSource for MemoryDb {
    type Conn = MemoryConnection;

    fn connection(&self) -> Result<MemoryConnection> {
        self.opened.set(self.opened.get() + 1);
        Ok(MemoryConnection {
            shared: Rc::clone(&self.shared),
            fail_matching: Rc::clone(&self.fail_matching),
            work: None,
            staged: Vec::new(),
        })
    }
}

/// One physical session: a working copy of the tables plus the statements
/// staged since `begin`.
pub struct MemoryConnection {
    shared: Rc<RefCell<Tables>>,
    fail_matching: Rc<RefCell<Option<String>>>,
    work: Option<Tables>,
    staged: Vec<(String, ParameterMap)>,
}

impl MemoryConnection {
    fn check_fail(&self, sql: &str, kind: CommandKind) -> Result<()> {
        if let Some(needle) = self.fail_matching.borrow().as_ref() {
            if sql.contains(needle.as_str()) {
                return Err(Error::execution(kind, format!("forced failure on `{needle}`")));
            }
        }
        Ok(())
    }
}

impl Connection for MemoryConnection {
    fn execute(&mut self, sql: &str, params: &ParameterMap, kind: CommandKind) -> Result<u64> {
        self.check_fail(sql, kind)?;
        let affected = match self.work.as_mut() {
            Some(work) => apply(work, sql, params)?,
            None => apply(&mut self.shared.borrow_mut(), sql, params)?,
        };
        if self.work.is_some() {
            self.staged.push((sql.to_string(), params.clone()));
        }
        Ok(affected)
    }

    fn query(&mut self, sql: &str, params: &ParameterMap) -> Result<Vec<Row>> {
        self.check_fail(sql, CommandKind::Select)?;
        match &self.work {
            Some(work) => run_query(work, sql, params),
            None => run_query(&self.shared.borrow(), sql, params),
        }
    }

    fn begin(&mut self) -> Result<()> {
        self.work = Some(self.shared.borrow().clone());
        self.staged.clear();
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        self.work = None;
        let mut shared = self.shared.borrow_mut();
        for (sql, params) in &staged {
            apply(&mut shared, sql, params)?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.work = None;
        self.staged.clear();
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Statement interpretation
// ----------------------------------------------------------------------

struct Cond {
    column: String,
    op: &'static str,
    param: String,
}

fn unsupported(sql: &str) -> Error {
    Error::execution(
        CommandKind::Select,
        format!("unsupported SQL in test fake: {sql}"),
    )
}

fn apply(tables: &mut Tables, sql: &str, params: &ParameterMap) -> Result<u64> {
    if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
        let (table, rest) = rest.split_once(" (").ok_or_else(|| unsupported(sql))?;
        let (columns, _) = rest.split_once(')').ok_or_else(|| unsupported(sql))?;
        let record: Record = columns
            .split(", ")
            .map(|column| {
                let value = params.get(column).cloned().unwrap_or(Value::Null);
                (column.to_string(), value)
            })
            .collect();
        tables.entry(table.to_string()).or_default().push(record);
        return Ok(1);
    }

    if let Some(rest) = sql.strip_prefix("UPDATE ") {
        let (table, rest) = rest.split_once(" SET ").ok_or_else(|| unsupported(sql))?;
        let (sets_text, where_text) = match rest.split_once(" WHERE ") {
            Some((sets, where_)) => (sets, Some(where_)),
            None => (rest, None),
        };
        let conditions = where_text.map(parse_conditions).transpose()?;

        let mut assignments = Vec::new();
        for assignment in sets_text.split(", ") {
            let (column, placeholder) = assignment
                .split_once(" = :")
                .ok_or_else(|| unsupported(sql))?;
            let value = params.get(placeholder).cloned().unwrap_or(Value::Null);
            assignments.push((column.to_string(), value));
        }

        let rows = tables.entry(table.to_string()).or_default();
        let mut affected = 0;
        for row in rows.iter_mut() {
            if matches_row(row, conditions.as_deref(), params) {
                for (column, value) in &assignments {
                    set_column(row, column, value.clone());
                }
                affected += 1;
            }
        }
        return Ok(affected);
    }

    if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
        let (table, where_text) = match rest.split_once(" WHERE ") {
            Some((table, where_)) => (table, Some(where_)),
            None => (rest, None),
        };
        let conditions = where_text.map(parse_conditions).transpose()?;
        let rows = tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| !matches_row(row, conditions.as_deref(), params));
        return Ok((before - rows.len()) as u64);
    }

    Err(unsupported(sql))
}

fn run_query(tables: &Tables, sql: &str, params: &ParameterMap) -> Result<Vec<Row>> {
    if let Some(rest) = sql.strip_prefix("SELECT COUNT(*) FROM ") {
        let (table, where_text) = match rest.split_once(" WHERE ") {
            Some((table, where_)) => (table, Some(where_)),
            None => (rest, None),
        };
        let conditions = where_text.map(parse_conditions).transpose()?;
        let count = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_row(row, conditions.as_deref(), params))
                    .count()
            })
            .unwrap_or(0);
        let row = Row::from_pairs(vec![(
            "COUNT(*)".to_string(),
            Value::BigInt(count as i64),
        )]);
        return Ok(vec![row]);
    }

    if let Some(rest) = sql.strip_prefix("SELECT * FROM ") {
        let (table, where_text) = match rest.split_once(" WHERE ") {
            Some((table, where_)) => (table, Some(where_)),
            None => (rest, None),
        };
        let conditions = where_text.map(parse_conditions).transpose()?;
        let rows = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_row(row, conditions.as_deref(), params))
                    .map(|record| Row::from_pairs(record.clone()))
                    .collect()
            })
            .unwrap_or_default();
        return Ok(rows);
    }

    Err(unsupported(sql))
}

fn parse_conditions(text: &str) -> Result<Vec<Cond>> {
    text.split(" AND ").map(parse_condition).collect()
}

fn parse_condition(text: &str) -> Result<Cond> {
    for op in ["<=", ">=", "<>", "<", ">", "="] {
        let needle = format!(" {op} :");
        if let Some((column, param)) = text.split_once(&needle) {
            return Ok(Cond {
                column: column.to_string(),
                op,
                param: param.to_string(),
            });
        }
    }
    Err(unsupported(text))
}

fn matches_row(row: &Record, conditions: Option<&[Cond]>, params: &ParameterMap) -> bool {
    let Some(conditions) = conditions else {
        return true;
    };
    conditions.iter().all(|cond| {
        let actual = row
            .iter()
            .find(|(column, _)| *column == cond.column)
            .map(|(_, value)| value);
        let ord = match (actual, params.get(&cond.param)) {
            (Some(actual), Some(expected)) => compare(actual, expected),
            _ => None,
        };
        match cond.op {
            "=" => ord == Some(Ordering::Equal),
            "<>" => ord.is_some() && ord != Some(Ordering::Equal),
            "<" => ord == Some(Ordering::Less),
            "<=" => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            ">" => ord == Some(Ordering::Greater),
            ">=" => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
            _ => false,
        }
    })
}

/// Three-way comparison; `None` for NULLs and mismatched types, so a NULL
/// never satisfies any predicate.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => None,
        },
    }
}

fn set_column(row: &mut Record, column: &str, value: Value) {
    if let Some(entry) = row.iter_mut().find(|(name, _)| name == column) {
        entry.1 = value;
    } else {
        row.push((column.to_string(), value));
    }
}
