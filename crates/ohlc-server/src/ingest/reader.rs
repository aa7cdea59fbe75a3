//! Streaming CSV reader
//!
//! Wraps any `AsyncRead` (a multipart field, a file, a byte slice) and turns
//! it into a forward-only sequence of [`OhlcRecord`]s. One `StringRecord`
//! buffer is reused for every row, so the reader never holds more than the
//! current row in memory.

use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use ohlc_common::OhlcRecord;
use tokio::io::AsyncRead;

use super::error::{IngestError, IngestResult};
use super::parser::{is_valid_header, parse_record};

pub struct RecordReader<R> {
    inner: AsyncReader<R>,
    row: StringRecord,
    line: u64,
    finished: bool,
}

impl<R> RecordReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Read and validate the header row.
    ///
    /// Empty input, an unreadable first row, or any deviation from the
    /// expected column names fails with [`IngestError::InvalidHeader`].
    pub async fn open(reader: R) -> IngestResult<Self> {
        // Row width is checked by the parser, not by the csv reader, so a
        // short row surfaces as a column-count error with its line number.
        let mut inner = AsyncReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .create_reader(reader);

        let mut row = StringRecord::new();
        match inner.read_record(&mut row).await {
            Ok(true) if is_valid_header(&row) => Ok(Self {
                inner,
                row,
                line: 1,
                finished: false,
            }),
            Ok(_) => Err(IngestError::InvalidHeader),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read header row");
                Err(IngestError::InvalidHeader)
            },
        }
    }

    /// Next parsed record, `Ok(None)` at end of input.
    ///
    /// The first error ends the sequence: every later call returns `Ok(None)`.
    pub async fn next_record(&mut self) -> IngestResult<Option<OhlcRecord>> {
        if self.finished {
            return Ok(None);
        }

        let result = match self.inner.read_record(&mut self.row).await {
            Ok(false) => Ok(None),
            Ok(true) => {
                self.line = self
                    .row
                    .position()
                    .map(|pos| pos.line())
                    .unwrap_or(self.line + 1);
                parse_record(&self.row, self.line)
                    .map(Some)
                    .map_err(IngestError::from)
            },
            Err(e) => Err(IngestError::Read(e.to_string())),
        };

        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    /// Line number of the last row read (the header is line 1).
    pub fn line(&self) -> u64 {
        self.line
    }
}
