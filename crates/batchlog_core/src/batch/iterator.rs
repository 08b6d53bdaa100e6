//! Batch decoding and handler dispatch.
//!
//! Two ways to walk a batch:
//!
//! - [`BatchIter`] pulls one [`Record`] at a time.
//! - [`BatchView::iterate`] pushes every record into a [`Handler`].
//!
//! Both validate structure as they go and finish with a check that the
//! number of mutations matches the header count.

use super::record::{Record, RecordTag, HEADER_SIZE};
use crate::error::{CoreError, CoreResult};
use crate::types::{ColumnFamilyId, SequenceNumber};
use batchlog_codec::{decode_fixed32, decode_fixed64, SliceReader};

/// Receiver of decoded batch records.
///
/// The three mutation callbacks have no default: a handler that does not
/// support one of them must return [`CoreError::NotImplemented`] rather
/// than silently accept the record.
pub trait Handler {
    /// Handles a put.
    fn put_cf(&mut self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()>;

    /// Handles a merge operand.
    fn merge_cf(&mut self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()>;

    /// Handles a delete.
    fn delete_cf(&mut self, cf: ColumnFamilyId, key: &[u8]) -> CoreResult<()>;

    /// Handles a log data blob. Ignored by default.
    fn log_data(&mut self, _blob: &[u8]) {}

    /// Checked before each record; returning false stops iteration
    /// without error.
    fn should_continue(&self) -> bool {
        true
    }
}

/// Pull-style decoder over a batch.
///
/// Yields `Err` once and then fuses on malformed input. After the last
/// record it compares the number of mutations seen against the header
/// count and yields a corruption error on mismatch.
#[derive(Debug, Clone)]
pub struct BatchIter<'a> {
    reader: SliceReader<'a>,
    expected: u32,
    found: u32,
    done: bool,
}

impl<'a> BatchIter<'a> {
    /// Creates an iterator over raw batch bytes, header included.
    ///
    /// # Errors
    ///
    /// Returns a corruption error if `data` is shorter than the header.
    pub fn new(data: &'a [u8]) -> CoreResult<Self> {
        let view = BatchView::new(data)?;
        Ok(view.iter())
    }

    fn from_valid(data: &'a [u8], expected: u32) -> Self {
        Self {
            reader: SliceReader::new(&data[HEADER_SIZE..]),
            expected,
            found: 0,
            done: false,
        }
    }

    /// Number of mutations decoded so far.
    #[must_use]
    pub fn found(&self) -> u32 {
        self.found
    }

    fn decode_next(&mut self) -> CoreResult<Record<'a>> {
        let byte = self
            .reader
            .read_u8()
            .map_err(|_| CoreError::corruption("bad write batch tag"))?;
        let tag = RecordTag::from_byte(byte).ok_or_else(|| {
            CoreError::corruption(format!("unknown tag 0x{byte:02x} in write batch"))
        })?;

        let op = match tag {
            RecordTag::Value | RecordTag::ColumnFamilyValue => "Put",
            RecordTag::Merge | RecordTag::ColumnFamilyMerge => "Merge",
            RecordTag::Deletion | RecordTag::ColumnFamilyDeletion => "Delete",
            RecordTag::LogData => "Blob",
        };
        let bad = |_| CoreError::corruption(format!("bad write batch {op}"));

        let cf = if tag.has_column_family() {
            ColumnFamilyId::new(self.reader.read_varint32().map_err(bad)?)
        } else {
            ColumnFamilyId::DEFAULT
        };

        let record = match tag {
            RecordTag::Value | RecordTag::ColumnFamilyValue => {
                let key = self.reader.read_length_prefixed_slice().map_err(bad)?;
                let value = self.reader.read_length_prefixed_slice().map_err(bad)?;
                Record::Put { cf, key, value }
            }
            RecordTag::Merge | RecordTag::ColumnFamilyMerge => {
                let key = self.reader.read_length_prefixed_slice().map_err(bad)?;
                let value = self.reader.read_length_prefixed_slice().map_err(bad)?;
                Record::Merge { cf, key, value }
            }
            RecordTag::Deletion | RecordTag::ColumnFamilyDeletion => {
                let key = self.reader.read_length_prefixed_slice().map_err(bad)?;
                Record::Delete { cf, key }
            }
            RecordTag::LogData => {
                let blob = self.reader.read_length_prefixed_slice().map_err(bad)?;
                Record::LogData { blob }
            }
        };

        if record.is_counted() {
            self.found += 1;
        }
        Ok(record)
    }
}

impl<'a> Iterator for BatchIter<'a> {
    type Item = CoreResult<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.reader.is_empty() {
            self.done = true;
            if self.found != self.expected {
                return Some(Err(CoreError::corruption(format!(
                    "write batch has wrong count: header says {}, found {}",
                    self.expected, self.found
                ))));
            }
            return None;
        }

        let result = self.decode_next();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for BatchIter<'_> {}

/// A validated, read-only view over raw batch bytes.
#[derive(Debug, Clone, Copy)]
pub struct BatchView<'a> {
    data: &'a [u8],
}

impl<'a> BatchView<'a> {
    /// Wraps `data` after checking it holds at least a header.
    ///
    /// # Errors
    ///
    /// Returns a corruption error if `data` is shorter than 12 bytes.
    pub fn new(data: &'a [u8]) -> CoreResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(CoreError::corruption("malformed write batch (too small)"));
        }
        Ok(Self { data })
    }

    /// Wraps bytes owned by a [`WriteBatch`](super::WriteBatch), which
    /// always holds a header.
    pub(crate) fn from_batch(data: &'a [u8]) -> Self {
        debug_assert!(data.len() >= HEADER_SIZE);
        Self { data }
    }

    /// Sequence number from the header.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        // Length checked in `new`.
        SequenceNumber::new(decode_fixed64(self.data).unwrap_or_default())
    }

    /// Record count from the header.
    #[must_use]
    pub fn count(&self) -> u32 {
        decode_fixed32(&self.data[8..]).unwrap_or_default()
    }

    /// The underlying bytes.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Body bytes after the header.
    #[must_use]
    pub fn body(&self) -> &'a [u8] {
        &self.data[HEADER_SIZE..]
    }

    /// Pull iterator over the records.
    #[must_use]
    pub fn iter(&self) -> BatchIter<'a> {
        BatchIter::from_valid(self.data, self.count())
    }

    /// Pushes every record into `handler`.
    ///
    /// Stops early without error when `handler.should_continue()` returns
    /// false; the final count check is skipped in that case.
    ///
    /// # Errors
    ///
    /// Returns the first decode error or handler error.
    pub fn iterate<H: Handler + ?Sized>(&self, handler: &mut H) -> CoreResult<()> {
        let mut iter = self.iter();
        while handler.should_continue() {
            let Some(record) = iter.next() else {
                return Ok(());
            };
            match record? {
                Record::Put { cf, key, value } => handler.put_cf(cf, key, value)?,
                Record::Merge { cf, key, value } => handler.merge_cf(cf, key, value)?,
                Record::Delete { cf, key } => handler.delete_cf(cf, key)?,
                Record::LogData { blob } => handler.log_data(blob),
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for BatchView<'a> {
    type Item = CoreResult<Record<'a>>;
    type IntoIter = BatchIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Handler that copies every record it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordCollector {
    records: Vec<super::OwnedRecord>,
    limit: Option<usize>,
}

impl RecordCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collector that stops after `limit` records.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Records collected so far.
    #[must_use]
    pub fn records(&self) -> &[super::OwnedRecord] {
        &self.records
    }

    /// Consumes the collector.
    #[must_use]
    pub fn into_records(self) -> Vec<super::OwnedRecord> {
        self.records
    }

    fn push(&mut self, record: Record<'_>) {
        self.records.push(record.to_owned_record());
    }
}

impl Handler for RecordCollector {
    fn put_cf(&mut self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.push(Record::Put { cf, key, value });
        Ok(())
    }

    fn merge_cf(&mut self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.push(Record::Merge { cf, key, value });
        Ok(())
    }

    fn delete_cf(&mut self, cf: ColumnFamilyId, key: &[u8]) -> CoreResult<()> {
        self.push(Record::Delete { cf, key });
        Ok(())
    }

    fn log_data(&mut self, blob: &[u8]) {
        self.push(Record::LogData { blob });
    }

    fn should_continue(&self) -> bool {
        self.limit.map_or(true, |limit| self.records.len() < limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{OwnedRecord, WriteBatch};

    fn header(seq: u64, count: u32) -> Vec<u8> {
        let mut data = seq.to_le_bytes().to_vec();
        data.extend_from_slice(&count.to_le_bytes());
        data
    }

    fn corruption_message(err: CoreError) -> String {
        match err {
            CoreError::Corruption { message } => message,
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    /// Handler that supports puts only.
    struct PutOnly(Vec<Vec<u8>>);

    impl Handler for PutOnly {
        fn put_cf(&mut self, _cf: ColumnFamilyId, key: &[u8], _value: &[u8]) -> CoreResult<()> {
            self.0.push(key.to_vec());
            Ok(())
        }

        fn merge_cf(&mut self, _: ColumnFamilyId, _: &[u8], _: &[u8]) -> CoreResult<()> {
            Err(CoreError::not_implemented("merge_cf"))
        }

        fn delete_cf(&mut self, _: ColumnFamilyId, _: &[u8]) -> CoreResult<()> {
            Err(CoreError::not_implemented("delete_cf"))
        }
    }

    #[test]
    fn too_small() {
        for len in 0..HEADER_SIZE {
            let data = vec![0u8; len];
            let err = BatchView::new(&data).unwrap_err();
            assert!(corruption_message(err).contains("too small"));
            assert!(BatchIter::new(&data).is_err());
        }
    }

    #[test]
    fn empty_batch_iterates_nothing() {
        let data = header(9, 0);
        let view = BatchView::new(&data).unwrap();
        assert_eq!(view.sequence(), SequenceNumber::new(9));
        assert_eq!(view.count(), 0);
        assert!(view.body().is_empty());
        assert_eq!(view.iter().count(), 0);
    }

    #[test]
    fn unknown_tag() {
        let mut data = header(0, 1);
        data.push(0x2a);
        let err = BatchView::new(&data)
            .unwrap()
            .iterate(&mut RecordCollector::new())
            .unwrap_err();
        let message = corruption_message(err);
        assert!(message.contains("unknown tag"), "{message}");
        assert!(message.contains("0x2a"));
    }

    #[test]
    fn truncated_fields_name_the_operation() {
        let cases: [(&[u8], &str); 5] = [
            (&[0x01, 0x03, b'a'], "Put"),
            (&[0x02, 0x01, b'k', 0x05], "Merge"),
            (&[0x00, 0x02], "Delete"),
            (&[0x03, 0x09, b'x'], "Blob"),
            (&[0x05], "Put"),
        ];
        for (body, op) in cases {
            let mut data = header(0, 1);
            data.extend_from_slice(body);
            let err = BatchIter::new(&data).unwrap().find_map(Result::err).unwrap();
            assert_eq!(corruption_message(err), format!("bad write batch {op}"));
        }
    }

    #[test]
    fn wrong_count() {
        let mut batch = WriteBatch::new();
        batch.put(b"a", b"1").unwrap();
        let mut data = batch.into_data();
        data[8] = 2;

        let err = BatchView::new(&data)
            .unwrap()
            .iterate(&mut RecordCollector::new())
            .unwrap_err();
        let message = corruption_message(err);
        assert!(message.contains("wrong count"), "{message}");
        assert!(message.contains("header says 2, found 1"));
    }

    #[test]
    fn log_data_is_not_counted() {
        let mut batch = WriteBatch::new();
        batch.put_log_data(b"blob").unwrap();
        batch.delete(b"k").unwrap();
        assert_eq!(batch.count(), 1);

        let mut iter = batch.iter();
        assert_eq!(iter.next().unwrap().unwrap(), Record::LogData { blob: b"blob" });
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().is_none());
        assert_eq!(iter.found(), 1);
        assert!(iter.next().is_none());
    }

    #[test]
    fn iterator_fuses_after_error() {
        let mut data = header(0, 2);
        data.push(0x07);
        let mut iter = BatchIter::new(&data).unwrap();
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }

    #[test]
    fn handler_stop_skips_count_check() {
        let mut batch = WriteBatch::new();
        batch.put(b"a", b"1").unwrap();
        batch.put(b"b", b"2").unwrap();
        batch.put(b"c", b"3").unwrap();
        let mut data = batch.into_data();
        // Header now disagrees with the body.
        data[8] = 9;

        let mut collector = RecordCollector::with_limit(2);
        BatchView::new(&data).unwrap().iterate(&mut collector).unwrap();
        assert_eq!(collector.records().len(), 2);
    }

    #[test]
    fn unimplemented_capability_fails() {
        let mut batch = WriteBatch::new();
        batch.put(b"a", b"1").unwrap();
        batch.merge(b"a", b"2").unwrap();
        batch.put(b"b", b"3").unwrap();

        let mut handler = PutOnly(Vec::new());
        let err = batch.iterate(&mut handler).unwrap_err();
        assert!(matches!(err, CoreError::NotImplemented { ref capability } if capability == "merge_cf"));
        // Records after the failure are not dispatched.
        assert_eq!(handler.0, vec![b"a".to_vec()]);
    }

    #[test]
    fn collector_sees_column_families() {
        let mut batch = WriteBatch::new();
        batch.put_cf(ColumnFamilyId::new(4), b"k", b"v").unwrap();
        batch.delete_cf(ColumnFamilyId::new(300), b"gone").unwrap();

        let mut collector = RecordCollector::new();
        batch.iterate(&mut collector).unwrap();
        assert_eq!(
            collector.into_records(),
            vec![
                OwnedRecord::Put {
                    cf: ColumnFamilyId::new(4),
                    key: b"k".to_vec(),
                    value: b"v".to_vec(),
                },
                OwnedRecord::Delete {
                    cf: ColumnFamilyId::new(300),
                    key: b"gone".to_vec(),
                },
            ]
        );
    }
}
