//! Append-only write batch buffer.

use super::iterator::{BatchIter, BatchView, Handler};
use super::record::{RecordTag, HEADER_SIZE};
use crate::error::{CoreError, CoreResult};
use crate::types::{ColumnFamilyId, SequenceNumber, ValueType};
use batchlog_codec::{
    checked_slice_len, decode_fixed32, decode_fixed64, encode_fixed32, encode_fixed64,
    put_length_prefixed_slice, put_length_prefixed_slice_parts, put_varint32,
};

/// A batch of mutations in wire format.
///
/// # Layout
///
/// ```text
/// +-----------------+-------------+---------------------------+
/// | sequence (u64)  | count (u32) | record ...                |
/// +-----------------+-------------+---------------------------+
///
/// record := tag:u8 [cf_id:varint32] key:lpslice [value:lpslice]
///         | 0x03 blob:lpslice
/// ```
///
/// Both header fields are little-endian. The column family id is present
/// only for the column family tag variants. `count` covers puts, merges
/// and deletes; log data is not counted.
///
/// A failed append leaves the batch unchanged.
#[derive(Clone, PartialEq, Eq)]
pub struct WriteBatch {
    rep: Vec<u8>,
}

impl WriteBatch {
    /// Creates an empty batch with sequence 0.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty batch with room for `reserved` bytes.
    #[must_use]
    pub fn with_capacity(reserved: usize) -> Self {
        let mut rep = Vec::with_capacity(reserved.max(HEADER_SIZE));
        rep.resize(HEADER_SIZE, 0);
        Self { rep }
    }

    /// Adopts raw batch bytes.
    ///
    /// Only the header length is checked here; the records are validated
    /// when the batch is iterated.
    ///
    /// # Errors
    ///
    /// Returns a corruption error if `data` is shorter than the header.
    pub fn from_data(data: Vec<u8>) -> CoreResult<Self> {
        BatchView::new(&data)?;
        Ok(Self { rep: data })
    }

    /// Removes every record and resets the header.
    pub fn clear(&mut self) {
        self.rep.clear();
        self.rep.resize(HEADER_SIZE, 0);
    }

    /// Number of counted records, read from the header.
    #[must_use]
    pub fn count(&self) -> u32 {
        decode_fixed32(&self.rep[8..]).unwrap_or_default()
    }

    fn set_count(&mut self, count: u32) {
        encode_fixed32(&mut self.rep[8..], count);
    }

    /// Sequence number stamped on the first record.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        SequenceNumber::new(decode_fixed64(&self.rep).unwrap_or_default())
    }

    /// Sets the sequence number of the first record.
    pub fn set_sequence(&mut self, seq: SequenceNumber) {
        encode_fixed64(&mut self.rep, seq.as_u64());
    }

    /// Appends a put to the default column family.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` or `value` is longer than `u32::MAX`.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.put_cf(ColumnFamilyId::DEFAULT, key, value)
    }

    /// Appends a put to `cf`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` or `value` is longer than `u32::MAX`.
    pub fn put_cf(&mut self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.append_mutation(ValueType::Value, cf, &[key], Some(&[value][..]))
    }

    /// Appends a put whose key and value are each the concatenation of
    /// several parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined key or value is longer than
    /// `u32::MAX`.
    pub fn put_parts(
        &mut self,
        cf: ColumnFamilyId,
        key_parts: &[&[u8]],
        value_parts: &[&[u8]],
    ) -> CoreResult<()> {
        self.append_mutation(ValueType::Value, cf, key_parts, Some(value_parts))
    }

    /// Appends a merge operand to the default column family.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` or `value` is longer than `u32::MAX`.
    pub fn merge(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.merge_cf(ColumnFamilyId::DEFAULT, key, value)
    }

    /// Appends a merge operand to `cf`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` or `value` is longer than `u32::MAX`.
    pub fn merge_cf(&mut self, cf: ColumnFamilyId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.append_mutation(ValueType::Merge, cf, &[key], Some(&[value][..]))
    }

    /// Appends a delete to the default column family.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is longer than `u32::MAX`.
    pub fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        self.delete_cf(ColumnFamilyId::DEFAULT, key)
    }

    /// Appends a delete to `cf`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is longer than `u32::MAX`.
    pub fn delete_cf(&mut self, cf: ColumnFamilyId, key: &[u8]) -> CoreResult<()> {
        self.append_mutation(ValueType::Deletion, cf, &[key], None)
    }

    /// Appends an opaque blob. The blob is not counted and is only seen by
    /// a handler's `log_data` hook.
    ///
    /// # Errors
    ///
    /// Returns an error if `blob` is longer than `u32::MAX`.
    pub fn put_log_data(&mut self, blob: &[u8]) -> CoreResult<()> {
        checked_slice_len(blob.len())?;
        self.rep.push(RecordTag::LogData.as_byte());
        put_length_prefixed_slice(&mut self.rep, blob)?;
        Ok(())
    }

    fn append_mutation(
        &mut self,
        kind: ValueType,
        cf: ColumnFamilyId,
        key_parts: &[&[u8]],
        value_parts: Option<&[&[u8]]>,
    ) -> CoreResult<()> {
        // Validate every length before the first byte is written.
        checked_slice_len(key_parts.iter().map(|p| p.len()).sum())?;
        if let Some(parts) = value_parts {
            checked_slice_len(parts.iter().map(|p| p.len()).sum())?;
        }

        let count = self
            .count()
            .checked_add(1)
            .ok_or_else(|| CoreError::invalid_argument("write batch record count overflow"))?;

        let tag = RecordTag::for_mutation(kind, cf);
        self.rep.push(tag.as_byte());
        if tag.has_column_family() {
            put_varint32(&mut self.rep, cf.as_u32());
        }
        put_length_prefixed_slice_parts(&mut self.rep, key_parts)?;
        if let Some(parts) = value_parts {
            put_length_prefixed_slice_parts(&mut self.rep, parts)?;
        }
        self.set_count(count);
        Ok(())
    }

    /// Appends every record of `src` to this batch and adds its count.
    ///
    /// `src` is not modified and its sequence number is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined count overflows `u32`.
    pub fn append(&mut self, src: &WriteBatch) -> CoreResult<()> {
        let count = self
            .count()
            .checked_add(src.count())
            .ok_or_else(|| CoreError::invalid_argument("write batch record count overflow"))?;
        self.rep.extend_from_slice(&src.rep[HEADER_SIZE..]);
        self.set_count(count);
        Ok(())
    }

    /// The raw batch bytes, header included.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.rep
    }

    /// Consumes the batch and returns its bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.rep
    }

    /// Size of the raw batch in bytes.
    #[must_use]
    pub fn data_size(&self) -> usize {
        self.rep.len()
    }

    /// Returns true if the batch holds no records, counted or not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rep.len() == HEADER_SIZE
    }

    /// Borrowed view over the batch.
    #[must_use]
    pub fn view(&self) -> BatchView<'_> {
        BatchView::from_batch(&self.rep)
    }

    /// Pull iterator over the records.
    #[must_use]
    pub fn iter(&self) -> BatchIter<'_> {
        self.view().iter()
    }

    /// Pushes every record into `handler`.
    ///
    /// # Errors
    ///
    /// See [`BatchView::iterate`].
    pub fn iterate<H: Handler + ?Sized>(&self, handler: &mut H) -> CoreResult<()> {
        self.view().iterate(handler)
    }
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WriteBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBatch")
            .field("sequence", &self.sequence().as_u64())
            .field("count", &self.count())
            .field("data_size", &self.data_size())
            .finish()
    }
}

impl<'a> IntoIterator for &'a WriteBatch {
    type Item = CoreResult<super::Record<'a>>;
    type IntoIter = BatchIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{OwnedRecord, Record, RecordCollector};

    #[test]
    fn empty_batch() {
        let batch = WriteBatch::new();
        assert_eq!(batch.data(), &[0u8; HEADER_SIZE]);
        assert_eq!(batch.count(), 0);
        assert_eq!(batch.sequence(), SequenceNumber::new(0));
        assert!(batch.is_empty());
        assert_eq!(batch.iter().count(), 0);
    }

    #[test]
    fn wire_bytes_are_exact() {
        let mut batch = WriteBatch::new();
        batch.set_sequence(SequenceNumber::new(0x0102));
        batch.put(b"a", b"1").unwrap();
        batch.merge_cf(ColumnFamilyId::new(2), b"b", b"").unwrap();
        batch.delete(b"c").unwrap();
        batch.put_log_data(b"L").unwrap();

        let expected: Vec<u8> = [
            &[0x02, 0x01, 0, 0, 0, 0, 0, 0][..],
            &[3, 0, 0, 0],
            &[0x01, 1, b'a', 1, b'1'],
            &[0x06, 2, 1, b'b', 0],
            &[0x00, 1, b'c'],
            &[0x03, 1, b'L'],
        ]
        .concat();
        assert_eq!(batch.data(), expected.as_slice());
    }

    #[test]
    fn count_tracks_mutations() {
        let mut batch = WriteBatch::new();
        batch.put(b"k1", b"v1").unwrap();
        batch.merge(b"k2", b"v2").unwrap();
        batch.put_log_data(b"blob").unwrap();
        batch.delete(b"k3").unwrap();
        assert_eq!(batch.count(), 3);
        assert!(!batch.is_empty());
    }

    #[test]
    fn clear_resets_header() {
        let mut batch = WriteBatch::new();
        batch.set_sequence(SequenceNumber::new(77));
        batch.put(b"k", b"v").unwrap();
        batch.clear();
        assert_eq!(batch, WriteBatch::new());
    }

    #[test]
    fn put_parts_matches_joined_put() {
        let mut parts = WriteBatch::new();
        parts
            .put_parts(
                ColumnFamilyId::new(1),
                &[&b"ke"[..], &b"y"[..]],
                &[&b"va"[..], &b""[..], &b"lue"[..]],
            )
            .unwrap();

        let mut joined = WriteBatch::new();
        joined.put_cf(ColumnFamilyId::new(1), b"key", b"value").unwrap();

        assert_eq!(parts.data(), joined.data());
    }

    #[test]
    fn append_skips_source_header() {
        let mut dst = WriteBatch::new();
        dst.set_sequence(SequenceNumber::new(200));
        dst.put(b"a", b"va").unwrap();

        let mut src = WriteBatch::new();
        src.set_sequence(SequenceNumber::new(300));
        src.put(b"b", b"vb").unwrap();
        src.put_log_data(b"foo").unwrap();
        src.delete(b"c").unwrap();
        let src_before = src.clone();

        dst.append(&src).unwrap();

        assert_eq!(src, src_before);
        assert_eq!(dst.count(), 3);
        assert_eq!(dst.sequence(), SequenceNumber::new(200));

        let mut collector = RecordCollector::new();
        dst.iterate(&mut collector).unwrap();
        let keys: Vec<_> = collector
            .records()
            .iter()
            .map(|r| match r {
                OwnedRecord::LogData { blob } => blob.clone(),
                other => other.as_record().key().unwrap_or_default().to_vec(),
            })
            .collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"foo".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn append_empty_is_noop() {
        let mut dst = WriteBatch::new();
        dst.put(b"a", b"1").unwrap();
        let before = dst.clone();
        dst.append(&WriteBatch::new()).unwrap();
        assert_eq!(dst, before);
    }

    #[test]
    fn from_data_roundtrip() {
        let mut batch = WriteBatch::new();
        batch.put(b"x", b"y").unwrap();
        let copy = WriteBatch::from_data(batch.data().to_vec()).unwrap();
        assert_eq!(copy, batch);

        let err = WriteBatch::from_data(vec![0; 11]).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn iterate_yields_records_in_order() {
        let mut batch = WriteBatch::new();
        batch.put(b"a", b"1").unwrap();
        batch.merge(b"a", b"+1").unwrap();
        batch.delete(b"b").unwrap();

        let records: Vec<Record<'_>> = batch.iter().collect::<CoreResult<_>>().unwrap();
        assert_eq!(
            records,
            vec![
                Record::Put {
                    cf: ColumnFamilyId::DEFAULT,
                    key: b"a",
                    value: b"1",
                },
                Record::Merge {
                    cf: ColumnFamilyId::DEFAULT,
                    key: b"a",
                    value: b"+1",
                },
                Record::Delete {
                    cf: ColumnFamilyId::DEFAULT,
                    key: b"b",
                },
            ]
        );
        assert_eq!(batch.count(), 3);
    }

    #[test]
    fn large_column_family_ids() {
        let mut batch = WriteBatch::new();
        batch.put_cf(ColumnFamilyId::new(u32::MAX), b"k", b"v").unwrap();
        let record = batch.iter().next().unwrap().unwrap();
        assert_eq!(record.column_family(), Some(ColumnFamilyId::new(u32::MAX)));
    }
}
