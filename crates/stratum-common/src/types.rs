//! Attribute types, scan operators, and record identifiers.

use crate::page::{PageNo, INVALID_PAGE_NO};
use serde::{Deserialize, Serialize};

/// Type of the attribute an index is built over.
///
/// The tag is stored as an int32 in the index meta page. Only `Integer` is
/// implemented; the other tags exist for meta-page compatibility and are
/// rejected at index creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AttrType {
    Integer = 0,
    Double = 1,
    String = 2,
}

impl AttrType {
    /// Decodes a meta-page type tag. Returns None for unknown tags.
    pub fn from_i32(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(AttrType::Integer),
            1 => Some(AttrType::Double),
            2 => Some(AttrType::String),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttrType::Integer => "INTEGER",
            AttrType::Double => "DOUBLE",
            AttrType::String => "STRING",
        };
        write!(f, "{}", name)
    }
}

/// Comparison operator for scan bounds.
///
/// `start_scan` accepts `Gt`/`Gte` as the low operator and `Lt`/`Lte` as
/// the high operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Lt,
    Lte,
    Gte,
    Gt,
}

impl Operator {
    /// Evaluates `x op y`.
    #[inline]
    pub fn compare(self, x: i32, y: i32) -> bool {
        match self {
            Operator::Lt => x < y,
            Operator::Lte => x <= y,
            Operator::Gte => x >= y,
            Operator::Gt => x > y,
        }
    }

    /// Returns true if this operator is valid as a scan low bound.
    #[inline]
    pub fn is_lower_bound(self) -> bool {
        matches!(self, Operator::Gt | Operator::Gte)
    }

    /// Returns true if this operator is valid as a scan high bound.
    #[inline]
    pub fn is_upper_bound(self) -> bool {
        matches!(self, Operator::Lt | Operator::Lte)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operator::Lt => "LT",
            Operator::Lte => "LTE",
            Operator::Gte => "GTE",
            Operator::Gt => "GT",
        };
        write!(f, "{}", name)
    }
}

/// Identifier of a record in a heap file: the data page holding the record
/// and its slot within that page.
///
/// A RecordId is INVALID iff its page number is 0. On disk it occupies
/// 8 bytes: page number (u32), slot number (u16), and a padding word kept
/// for layout compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// Heap page containing the record.
    pub page_no: PageNo,
    /// Slot number within the page.
    pub slot_no: u16,
}

impl RecordId {
    /// Serialized size in bytes.
    pub const SIZE: usize = 8;

    /// Invalid record ID, marking unused leaf slots.
    pub const INVALID: RecordId = RecordId {
        page_no: INVALID_PAGE_NO,
        slot_no: 0,
    };

    /// Creates a new record ID.
    pub fn new(page_no: PageNo, slot_no: u16) -> Self {
        Self { page_no, slot_no }
    }

    /// Returns true if this record ID names a real record.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.page_no != INVALID_PAGE_NO
    }

    /// Serializes to the 8-byte on-disk form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.page_no.to_le_bytes());
        buf[4..6].copy_from_slice(&self.slot_no.to_le_bytes());
        // bytes 6-7 are padding (already zeroed)
        buf
    }

    /// Deserializes from the 8-byte on-disk form.
    pub fn from_bytes(buf: &[u8]) -> Self {
        Self {
            page_no: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            slot_no: u16::from_le_bytes([buf[4], buf[5]]),
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.page_no, self.slot_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_type_repr() {
        assert_eq!(AttrType::Integer as i32, 0);
        assert_eq!(AttrType::Double as i32, 1);
        assert_eq!(AttrType::String as i32, 2);
    }

    #[test]
    fn test_attr_type_from_i32() {
        assert_eq!(AttrType::from_i32(0), Some(AttrType::Integer));
        assert_eq!(AttrType::from_i32(1), Some(AttrType::Double));
        assert_eq!(AttrType::from_i32(2), Some(AttrType::String));
        assert_eq!(AttrType::from_i32(3), None);
        assert_eq!(AttrType::from_i32(-1), None);
    }

    #[test]
    fn test_attr_type_display() {
        assert_eq!(AttrType::Integer.to_string(), "INTEGER");
        assert_eq!(AttrType::Double.to_string(), "DOUBLE");
        assert_eq!(AttrType::String.to_string(), "STRING");
    }

    #[test]
    fn test_operator_compare_truth_table() {
        assert!(Operator::Lt.compare(1, 2));
        assert!(!Operator::Lt.compare(2, 2));
        assert!(!Operator::Lt.compare(3, 2));

        assert!(Operator::Lte.compare(1, 2));
        assert!(Operator::Lte.compare(2, 2));
        assert!(!Operator::Lte.compare(3, 2));

        assert!(!Operator::Gte.compare(1, 2));
        assert!(Operator::Gte.compare(2, 2));
        assert!(Operator::Gte.compare(3, 2));

        assert!(!Operator::Gt.compare(1, 2));
        assert!(!Operator::Gt.compare(2, 2));
        assert!(Operator::Gt.compare(3, 2));
    }

    #[test]
    fn test_operator_compare_negative_values() {
        assert!(Operator::Gt.compare(-99, -100));
        assert!(Operator::Lt.compare(-100, -99));
        assert!(Operator::Gte.compare(i32::MIN, i32::MIN));
        assert!(Operator::Lte.compare(i32::MAX, i32::MAX));
    }

    #[test]
    fn test_operator_bound_validity() {
        assert!(Operator::Gt.is_lower_bound());
        assert!(Operator::Gte.is_lower_bound());
        assert!(!Operator::Lt.is_lower_bound());
        assert!(!Operator::Lte.is_lower_bound());

        assert!(Operator::Lt.is_upper_bound());
        assert!(Operator::Lte.is_upper_bound());
        assert!(!Operator::Gt.is_upper_bound());
        assert!(!Operator::Gte.is_upper_bound());
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(Operator::Lt.to_string(), "LT");
        assert_eq!(Operator::Lte.to_string(), "LTE");
        assert_eq!(Operator::Gte.to_string(), "GTE");
        assert_eq!(Operator::Gt.to_string(), "GT");
    }

    #[test]
    fn test_record_id_validity() {
        let rid = RecordId::new(5, 3);
        assert!(rid.is_valid());

        assert!(!RecordId::INVALID.is_valid());
        assert_eq!(RecordId::INVALID.page_no, 0);

        // Slot number alone does not make a record ID valid
        let rid = RecordId::new(0, 7);
        assert!(!rid.is_valid());
    }

    #[test]
    fn test_record_id_bytes_roundtrip() {
        for rid in [
            RecordId::new(1, 0),
            RecordId::new(2, 9),
            RecordId::new(u32::MAX, u16::MAX),
            RecordId::INVALID,
        ] {
            let bytes = rid.to_bytes();
            assert_eq!(RecordId::from_bytes(&bytes), rid);
        }
    }

    #[test]
    fn test_record_id_bytes_layout() {
        let rid = RecordId::new(0x0102_0304, 0x0506);
        let bytes = rid.to_bytes();
        // Little-endian page number, then slot, then zero padding
        assert_eq!(bytes, [0x04, 0x03, 0x02, 0x01, 0x06, 0x05, 0x00, 0x00]);
    }

    #[test]
    fn test_record_id_size() {
        assert_eq!(RecordId::SIZE, 8);
        assert_eq!(RecordId::new(1, 1).to_bytes().len(), RecordId::SIZE);
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::new(7, 2).to_string(), "7:2");
    }

    #[test]
    fn test_record_id_serde_roundtrip() {
        let original = RecordId::new(12, 34);
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: RecordId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
