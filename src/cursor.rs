//! Forward-only row sequences.
//!
//! A stream wraps a driver cursor and maps each raw row into a [`Row`] as it
//! is pulled. Streams can't be restarted; the underlying cursor is released
//! when the stream is dropped or exhausted.

use crate::cancel::CancellationToken;
use crate::driver::{AsyncRowCursor, RowCursor};
use crate::error::{ShadowError, ShadowResult};
use crate::row::Row;

/// Lazy, one-way sequence over a blocking cursor.
///
/// Yields `Err` at most once; after an error or the last row it is fused.
pub struct RowStream<'d> {
    cursor: Option<Box<dyn RowCursor + 'd>>,
    fetched: usize,
}

impl<'d> RowStream<'d> {
    pub(crate) fn new(cursor: Box<dyn RowCursor + 'd>) -> Self {
        Self {
            cursor: Some(cursor),
            fetched: 0,
        }
    }

    /// Rows handed out so far.
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Restarting a forward-only stream always fails.
    pub fn reset(&mut self) -> ShadowResult<()> {
        Err(ShadowError::NotSupported(
            "row streams are forward-only and can't be reset".to_string(),
        ))
    }
}

impl Iterator for RowStream<'_> {
    type Item = ShadowResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        match cursor.next_row() {
            Ok(Some(raw)) => {
                self.fetched += 1;
                Some(Ok(Row::from_columns(raw)))
            }
            Ok(None) => {
                self.cursor = None;
                None
            }
            Err(err) => {
                self.cursor = None;
                Some(Err(err.into()))
            }
        }
    }
}

impl std::iter::FusedIterator for RowStream<'_> {}

/// Lazy, one-way sequence over an asynchronous cursor.
///
/// The token is checked before every fetch; a cancelled token ends the
/// stream with [`ShadowError::Cancelled`] and releases the cursor.
pub struct AsyncRowStream<'d> {
    cursor: Option<Box<dyn AsyncRowCursor + 'd>>,
    cancel: CancellationToken,
}

impl<'d> AsyncRowStream<'d> {
    pub(crate) fn new(cursor: Box<dyn AsyncRowCursor + 'd>, cancel: CancellationToken) -> Self {
        Self {
            cursor: Some(cursor),
            cancel,
        }
    }

    pub async fn next_row(&mut self) -> ShadowResult<Option<Row>> {
        if self.cursor.is_none() {
            return Ok(None);
        }
        if let Err(err) = self.cancel.check() {
            self.cursor = None;
            return Err(err);
        }
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        let next = cursor.next_row().await;
        match next {
            Ok(Some(raw)) => Ok(Some(Row::from_columns(raw))),
            Ok(None) => {
                self.cursor = None;
                Ok(None)
            }
            Err(err) => {
                self.cursor = None;
                Err(err.into())
            }
        }
    }

    /// Drain the remaining rows in order.
    pub async fn collect(mut self) -> ShadowResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn reset(&mut self) -> ShadowResult<()> {
        Err(ShadowError::NotSupported(
            "row streams are forward-only and can't be reset".to_string(),
        ))
    }
}
