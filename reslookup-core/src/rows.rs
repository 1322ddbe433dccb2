//! Incremental CSV row parser
//!
//! Bytes are pushed in whatever chunks the feed delivers; complete rows come
//! out as soon as their terminator has been seen.

use csv_core::{ReadRecordResult, Reader};

/// One parsed row and the line it ended on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Row {
    pub line: u64,
    pub fields: Vec<String>,
}

/// A row whose bytes are not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BadEncoding {
    pub line: u64,
    pub error: std::str::Utf8Error,
}

pub(crate) struct RowParser {
    reader: Reader,
    output: Vec<u8>,
    ends: Vec<usize>,
    output_len: usize,
    ends_len: usize,
}

impl RowParser {
    pub fn new() -> Self {
        Self {
            reader: Reader::new(),
            output: vec![0; 1024],
            ends: vec![0; 16],
            output_len: 0,
            ends_len: 0,
        }
    }

    /// Parse from `input` until one row completes or the input runs out.
    ///
    /// Returns the bytes consumed and the completed row, if any. An empty
    /// `input` means the feed has ended: keep calling with an empty slice
    /// until no row comes back.
    pub fn push(&mut self, input: &[u8]) -> (usize, Option<Result<Row, BadEncoding>>) {
        let mut consumed = 0;
        loop {
            let (result, nin, nout, nend) = self.reader.read_record(
                &input[consumed..],
                &mut self.output[self.output_len..],
                &mut self.ends[self.ends_len..],
            );
            consumed += nin;
            self.output_len += nout;
            self.ends_len += nend;

            match result {
                ReadRecordResult::InputEmpty | ReadRecordResult::End => return (consumed, None),
                ReadRecordResult::OutputFull => {
                    let len = self.output.len() * 2;
                    self.output.resize(len, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = self.ends.len() * 2;
                    self.ends.resize(len, 0);
                }
                ReadRecordResult::Record => {
                    // A row ended by '\n' has already bumped the line count.
                    let ended_on_newline = consumed > 0 && input[consumed - 1] == b'\n';
                    let line = self.reader.line() - u64::from(ended_on_newline);
                    return (consumed, Some(self.take_row(line)));
                }
            }
        }
    }

    fn take_row(&mut self, line: u64) -> Result<Row, BadEncoding> {
        let data = &self.output[..self.output_len];
        let mut fields = Vec::with_capacity(self.ends_len);
        let mut start = 0;
        let mut outcome = Ok(());
        for &end in &self.ends[..self.ends_len] {
            match std::str::from_utf8(&data[start..end]) {
                Ok(field) => fields.push(field.to_owned()),
                Err(error) => {
                    outcome = Err(BadEncoding { line, error });
                    break;
                }
            }
            start = end;
        }

        self.output_len = 0;
        self.ends_len = 0;
        outcome.map(|()| Row { line, fields })
    }
}
