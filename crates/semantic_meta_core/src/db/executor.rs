//! Transaction execution boundary shared by all repositories.
//!
//! # Responsibility
//! - Run plain reads directly on the connection (read-committed visibility).
//! - Run one write, or a batch of writes, inside a single immediate
//!   transaction with one commit.
//!
//! # Invariants
//! - Any error from any op rolls back the whole transaction (the
//!   `Transaction` guard rolls back on drop).
//! - Write transactions take the database write lock up front
//!   (`BEGIN IMMEDIATE`), so read-then-write inside one op is serialized
//!   against other writers.

use crate::error::StoreResult;
use log::debug;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// One write statement group inside a batch; returns affected row count.
pub type WriteOp<'a> = Box<dyn FnOnce(&Connection) -> StoreResult<usize> + 'a>;

/// Executes storage operations individually or as an all-or-nothing unit.
#[derive(Clone, Copy)]
pub struct SqliteExecutor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExecutor<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Underlying connection, for readiness checks.
    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Runs `op` outside of any transaction.
    pub fn run_read<T>(&self, op: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        op(self.conn)
    }

    /// Runs `op` inside one immediate transaction and commits on success.
    pub fn run_write<T>(&self, op: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match op(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(
                    "event=tx_rollback module=db status=error error={}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Runs every op in order inside one transaction with a single commit.
    ///
    /// Returns per-op affected row counts in input order.
    pub fn run_write_batch(&self, ops: Vec<WriteOp<'_>>) -> StoreResult<Vec<usize>> {
        self.run_write(|tx| {
            let mut counts = Vec::with_capacity(ops.len());
            for op in ops {
                counts.push(op(tx)?);
            }
            Ok(counts)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteExecutor, WriteOp};
    use crate::error::{StoreError, StoreResult};
    use rusqlite::Connection;

    fn scratch() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL);")
            .unwrap();
        conn
    }

    fn row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn batch_commits_all_ops_together() {
        let conn = scratch();
        let executor = SqliteExecutor::new(&conn);

        let ops: Vec<WriteOp<'_>> = vec![
            Box::new(|tx: &Connection| -> StoreResult<usize> {
                Ok(tx.execute("INSERT INTO t (v) VALUES (1);", [])?)
            }),
            Box::new(|tx: &Connection| -> StoreResult<usize> {
                Ok(tx.execute("INSERT INTO t (v) VALUES (2);", [])?)
            }),
        ];
        let counts = executor.run_write_batch(ops).unwrap();

        assert_eq!(counts, vec![1, 1]);
        assert_eq!(row_count(&conn), 2);
    }

    #[test]
    fn failing_op_rolls_back_earlier_writes() {
        let conn = scratch();
        let executor = SqliteExecutor::new(&conn);

        let ops: Vec<WriteOp<'_>> = vec![
            Box::new(|tx: &Connection| -> StoreResult<usize> {
                Ok(tx.execute("INSERT INTO t (v) VALUES (1);", [])?)
            }),
            Box::new(|_: &Connection| -> StoreResult<usize> {
                Err(StoreError::Invalid("boom".to_string()))
            }),
        ];
        let err = executor.run_write_batch(ops).unwrap_err();

        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(row_count(&conn), 0);
        assert!(conn.is_autocommit());
    }
}
