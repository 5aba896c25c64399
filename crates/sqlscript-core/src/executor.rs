//! The execution helper seam.
//!
//! [`Executor`] (async) and [`BlockingExecutor`] (sync) are what the script
//! layer forwards resolved commands to. Implementors supply three primitives
//! (`execute`, `query`, `query_multiple`); every row-shaping helper is
//! provided on top of them, so drivers and test doubles stay small.
//!
//! Row-count rules of the helpers:
//!
//! | helper | 0 rows | 1 row | more |
//! |---|---|---|---|
//! | `query_first` | error | first | first |
//! | `query_first_or_default` | `None` | first | first |
//! | `query_single` | error | row | error |
//! | `query_single_or_default` | `None` | row | error |

use crate::command::CommandDefinition;
use crate::error::{Error, IntoOutcome, QueryError, QueryErrorKind, Result};
use crate::row::{ColumnInfo, FromRow, FromValue, Row};
use asupersync::{Cx, Outcome};
use std::collections::VecDeque;
use std::sync::Arc;

fn row_count_error(command: &CommandDefinition, message: &str) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::RowCount,
        sql: Some(command.sql.clone()),
        sqlstate: None,
        message: message.to_string(),
        source: None,
    })
}

const NO_ROWS: &str = "Sequence contains no elements";
const MANY_ROWS: &str = "Sequence contains more than one element";

fn map_rows<T: FromRow>(rows: &[Row]) -> Result<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

fn first<T: FromRow>(command: &CommandDefinition, rows: &[Row]) -> Result<T> {
    match rows.first() {
        Some(row) => T::from_row(row),
        None => Err(row_count_error(command, NO_ROWS)),
    }
}

fn first_or_default<T: FromRow>(rows: &[Row]) -> Result<Option<T>> {
    rows.first().map(T::from_row).transpose()
}

fn single<T: FromRow>(command: &CommandDefinition, rows: &[Row]) -> Result<T> {
    match rows {
        [row] => T::from_row(row),
        [] => Err(row_count_error(command, NO_ROWS)),
        _ => Err(row_count_error(command, MANY_ROWS)),
    }
}

fn single_or_default<T: FromRow>(command: &CommandDefinition, rows: &[Row]) -> Result<Option<T>> {
    match rows {
        [] => Ok(None),
        [row] => T::from_row(row).map(Some),
        _ => Err(row_count_error(command, MANY_ROWS)),
    }
}

/// First column of the first row; `None` when there is no row or the value
/// is NULL.
fn scalar<T: FromValue>(rows: &[Row]) -> Result<Option<T>> {
    match rows.first().and_then(|row| row.get(0)) {
        Some(value) if !value.is_null() => T::from_value(value).map(Some),
        _ => Ok(None),
    }
}

/// Forward-only cursor over the rows of one result set.
#[derive(Debug)]
pub struct RowReader {
    columns: Arc<ColumnInfo>,
    rows: std::vec::IntoIter<Row>,
}

impl RowReader {
    pub fn new(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(Row::column_info)
            .unwrap_or_default();
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }

    /// Column metadata of the result set (empty when it had no rows).
    pub fn columns(&self) -> &ColumnInfo {
        &self.columns
    }

    /// Rows not yet read.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Read and map the next row.
    pub fn read<T: FromRow>(&mut self) -> Option<Result<T>> {
        self.rows.next().map(|row| T::from_row(&row))
    }
}

impl Iterator for RowReader {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Sequential reader over the result sets of a multi-statement command.
///
/// Each `read*` call consumes one result set, in server order.
#[derive(Debug, Default)]
pub struct GridReader {
    sql: String,
    sets: VecDeque<Vec<Row>>,
}

impl GridReader {
    pub fn new(sql: impl Into<String>, sets: Vec<Vec<Row>>) -> Self {
        Self {
            sql: sql.into(),
            sets: sets.into(),
        }
    }

    /// True once every result set has been read.
    pub fn is_consumed(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.sets.len()
    }

    fn next_set(&mut self) -> Result<Vec<Row>> {
        self.sets.pop_front().ok_or_else(|| {
            Error::Custom("No more result sets are available to read".to_string())
        })
    }

    fn definition(&self) -> CommandDefinition {
        CommandDefinition::new(self.sql.clone())
    }

    pub fn read<T: FromRow>(&mut self) -> Result<Vec<T>> {
        let rows = self.next_set()?;
        map_rows(&rows)
    }

    pub fn read_first<T: FromRow>(&mut self) -> Result<T> {
        let rows = self.next_set()?;
        first(&self.definition(), &rows)
    }

    pub fn read_first_or_default<T: FromRow>(&mut self) -> Result<Option<T>> {
        let rows = self.next_set()?;
        first_or_default(&rows)
    }

    pub fn read_single<T: FromRow>(&mut self) -> Result<T> {
        let rows = self.next_set()?;
        single(&self.definition(), &rows)
    }

    pub fn read_single_or_default<T: FromRow>(&mut self) -> Result<Option<T>> {
        let rows = self.next_set()?;
        single_or_default(&self.definition(), &rows)
    }
}

/// Asynchronous execution helper.
///
/// All operations take a `Cx` for cancellation and return an `Outcome`.
pub trait Executor: Send + Sync {
    /// Execute a command and return the number of affected rows.
    fn execute(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Execute a command and return every row of its first result set.
    fn query(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send;

    /// Execute a command producing several result sets.
    fn query_multiple(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<GridReader, Error>> + Send;

    fn execute_reader(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<RowReader, Error>> + Send {
        async move {
            self.query(cx, command)
                .await
                .and_then(|rows| Outcome::Ok(RowReader::new(rows)))
        }
    }

    fn execute_scalar<T: FromValue + Send>(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<Option<T>, Error>> + Send {
        async move {
            self.query(cx, command)
                .await
                .and_then(|rows| scalar(&rows).into_outcome())
        }
    }

    fn query_as<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<Vec<T>, Error>> + Send {
        async move {
            self.query(cx, command)
                .await
                .and_then(|rows| map_rows(&rows).into_outcome())
        }
    }

    fn query_first<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<T, Error>> + Send {
        async move {
            self.query(cx, command)
                .await
                .and_then(|rows| first(command, &rows).into_outcome())
        }
    }

    fn query_first_or_default<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<Option<T>, Error>> + Send {
        async move {
            self.query(cx, command)
                .await
                .and_then(|rows| first_or_default(&rows).into_outcome())
        }
    }

    fn query_single<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<T, Error>> + Send {
        async move {
            self.query(cx, command)
                .await
                .and_then(|rows| single(command, &rows).into_outcome())
        }
    }

    fn query_single_or_default<T: FromRow + Send>(
        &self,
        cx: &Cx,
        command: &CommandDefinition,
    ) -> impl Future<Output = Outcome<Option<T>, Error>> + Send {
        async move {
            self.query(cx, command)
                .await
                .and_then(|rows| single_or_default(command, &rows).into_outcome())
        }
    }
}

/// Synchronous execution helper. Same contract as [`Executor`].
pub trait BlockingExecutor {
    fn execute(&self, command: &CommandDefinition) -> Result<u64>;

    fn query(&self, command: &CommandDefinition) -> Result<Vec<Row>>;

    fn query_multiple(&self, command: &CommandDefinition) -> Result<GridReader>;

    fn execute_reader(&self, command: &CommandDefinition) -> Result<RowReader> {
        self.query(command).map(RowReader::new)
    }

    fn execute_scalar<T: FromValue>(&self, command: &CommandDefinition) -> Result<Option<T>> {
        scalar(&self.query(command)?)
    }

    fn query_as<T: FromRow>(&self, command: &CommandDefinition) -> Result<Vec<T>> {
        map_rows(&self.query(command)?)
    }

    fn query_first<T: FromRow>(&self, command: &CommandDefinition) -> Result<T> {
        first(command, &self.query(command)?)
    }

    fn query_first_or_default<T: FromRow>(&self, command: &CommandDefinition) -> Result<Option<T>> {
        first_or_default(&self.query(command)?)
    }

    fn query_single<T: FromRow>(&self, command: &CommandDefinition) -> Result<T> {
        single(command, &self.query(command)?)
    }

    fn query_single_or_default<T: FromRow>(
        &self,
        command: &CommandDefinition,
    ) -> Result<Option<T>> {
        single_or_default(command, &self.query(command)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use asupersync::runtime::RuntimeBuilder;

    fn rows(n: i32) -> Vec<Row> {
        let columns = Arc::new(ColumnInfo::new(vec!["id".to_string()]));
        (1..=n)
            .map(|i| Row::with_columns(Arc::clone(&columns), vec![Value::Int(i)]))
            .collect()
    }

    /// Returns a fixed number of rows for any command.
    struct FixedRows(i32);

    impl BlockingExecutor for FixedRows {
        fn execute(&self, _command: &CommandDefinition) -> Result<u64> {
            Ok(u64::try_from(self.0).unwrap_or_default())
        }

        fn query(&self, _command: &CommandDefinition) -> Result<Vec<Row>> {
            Ok(rows(self.0))
        }

        fn query_multiple(&self, command: &CommandDefinition) -> Result<GridReader> {
            Ok(GridReader::new(command.sql.clone(), vec![rows(self.0), rows(1)]))
        }
    }

    /// Async face of [`FixedRows`].
    struct AsyncRows(i32);

    #[allow(clippy::manual_async_fn)] // Mock trait impls must match trait signatures
    impl Executor for AsyncRows {
        fn execute(
            &self,
            _cx: &Cx,
            command: &CommandDefinition,
        ) -> impl Future<Output = Outcome<u64, Error>> + Send {
            async move { FixedRows(self.0).execute(command).into_outcome() }
        }

        fn query(
            &self,
            _cx: &Cx,
            command: &CommandDefinition,
        ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
            async move { FixedRows(self.0).query(command).into_outcome() }
        }

        fn query_multiple(
            &self,
            _cx: &Cx,
            command: &CommandDefinition,
        ) -> impl Future<Output = Outcome<GridReader, Error>> + Send {
            async move { FixedRows(self.0).query_multiple(command).into_outcome() }
        }
    }

    fn is_row_count(err: &Error) -> bool {
        matches!(
            err,
            Error::Query(QueryError {
                kind: QueryErrorKind::RowCount,
                ..
            })
        )
    }

    #[test]
    fn test_first_semantics() {
        let cmd = CommandDefinition::new("select id");
        let (id,): (i32,) = FixedRows(3).query_first(&cmd).unwrap();
        assert_eq!(id, 1);
        assert!(is_row_count(
            &FixedRows(0).query_first::<(i32,)>(&cmd).unwrap_err()
        ));
        assert!(
            FixedRows(0)
                .query_first_or_default::<(i32,)>(&cmd)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_single_semantics() {
        let cmd = CommandDefinition::new("select id");
        assert_eq!(FixedRows(1).query_single::<(i32,)>(&cmd).unwrap(), (1,));
        assert!(is_row_count(
            &FixedRows(2).query_single::<(i32,)>(&cmd).unwrap_err()
        ));
        assert!(is_row_count(
            &FixedRows(0).query_single::<(i32,)>(&cmd).unwrap_err()
        ));
        assert!(
            FixedRows(0)
                .query_single_or_default::<(i32,)>(&cmd)
                .unwrap()
                .is_none()
        );
        let err = FixedRows(2)
            .query_single_or_default::<(i32,)>(&cmd)
            .unwrap_err();
        assert_eq!(err.sql(), Some("select id"));
    }

    #[test]
    fn test_scalar_and_reader() {
        let cmd = CommandDefinition::new("select count(*)");
        assert_eq!(FixedRows(2).execute_scalar::<i64>(&cmd).unwrap(), Some(1));
        assert_eq!(FixedRows(0).execute_scalar::<i64>(&cmd).unwrap(), None);

        let mut reader = FixedRows(2).execute_reader(&cmd).unwrap();
        assert_eq!(reader.columns().names(), ["id".to_string()]);
        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.read::<(i32,)>().unwrap().unwrap(), (1,));
        assert_eq!(reader.next().and_then(|r| r.get(0).cloned()), Some(Value::Int(2)));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_grid_reader_reads_sets_in_order() {
        let cmd = CommandDefinition::new("select 1; select 2");
        let mut grid = FixedRows(3).query_multiple(&cmd).unwrap();
        assert_eq!(grid.remaining(), 2);
        assert_eq!(grid.read::<(i32,)>().unwrap().len(), 3);
        assert_eq!(grid.read_single::<(i32,)>().unwrap(), (1,));
        assert!(grid.is_consumed());
        assert!(grid.read::<Row>().is_err());
    }

    #[test]
    fn test_async_helpers_share_row_rules() {
        let rt = RuntimeBuilder::current_thread()
            .build()
            .expect("create asupersync runtime");
        let cx = Cx::for_testing();
        let cmd = CommandDefinition::new("select id");

        rt.block_on(async {
            let many = AsyncRows(2);
            match many.query_as::<(i32,)>(&cx, &cmd).await {
                Outcome::Ok(values) => assert_eq!(values, vec![(1,), (2,)]),
                _ => panic!("unexpected outcome"),
            }
            match many.query_single::<(i32,)>(&cx, &cmd).await {
                Outcome::Err(err) => assert!(is_row_count(&err)),
                _ => panic!("unexpected outcome"),
            }
            match many.execute(&cx, &cmd).await {
                Outcome::Ok(n) => assert_eq!(n, 2),
                _ => panic!("unexpected outcome"),
            }
        });
    }
}
