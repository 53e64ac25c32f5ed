//! Fixed-size bit fields, field groups, and named frames.

use std::fmt;

use crate::bits::Bits;
use crate::error::{Error, Result};

/// A fixed-size bit field with chunked and whole-value access.
///
/// A field has a declared size, a fill level (bits written so far), and a
/// read cursor for chunked access. Chunked reads walk the filled region
/// without consuming it; [`rewind`](Field::rewind) restarts them. The
/// whole-value accessors ([`bits`](Field::bits), [`bytes`](Field::bytes),
/// [`uint`](Field::uint) and their setters) require exact sizes — a
/// mismatch is a contract violation reported as an error, never padded or
/// truncated.
#[derive(Clone, Default)]
pub struct Field {
    content: Bits,
    size: usize,
    cursor: usize,
}

impl Field {
    /// Creates an empty field of `size` bits.
    pub fn new(size: usize) -> Self {
        Self {
            content: Bits::new(),
            size,
            cursor: 0,
        }
    }

    /// Creates a field of `size` bits holding an integer value.
    pub fn with_uint(size: usize, value: u64) -> Result<Self> {
        let mut field = Self::new(size);
        field.set_uint(value)?;
        Ok(field)
    }

    /// Creates a field holding the given bytes; the size is taken from
    /// the byte count.
    pub fn with_bytes(bytes: &[u8]) -> Self {
        let mut field = Self::new(bytes.len() * 8);
        field
            .set_bits(&Bits::from_bytes(bytes))
            .expect("byte-sized field always fits its bytes");
        field
    }

    /// The declared size in bits.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Grows or shrinks the declared size.
    ///
    /// Shrinking below the current fill level is rejected.
    pub fn set_size(&mut self, size: usize) -> Result<()> {
        if self.content.len() > size {
            return Err(Error::SizeTooSmall {
                size,
                filled: self.content.len(),
            });
        }
        self.size = size;
        Ok(())
    }

    /// Bits written so far.
    pub fn filled(&self) -> usize {
        self.content.len()
    }

    /// True once every declared bit has been written.
    pub fn is_full(&self) -> bool {
        self.content.len() == self.size
    }

    /// Reads up to `count` bits at the cursor and advances it.
    ///
    /// At the end of the field this returns an empty sequence. Reading a
    /// region that has not been written yet is an error: either the
    /// cursor itself is past the fill level, or the read would span the
    /// field's tail before the field is full.
    pub fn read(&mut self, count: usize) -> Result<Bits> {
        if self.cursor == self.size {
            return Ok(Bits::new());
        }
        let end = (self.cursor + count).min(self.size);
        if self.cursor >= self.content.len() {
            return Err(Error::FieldUnderfilled);
        }
        if end == self.size && !self.is_full() {
            return Err(Error::FieldUnderfilled);
        }
        let chunk = self.content.slice(self.cursor, end);
        self.cursor = end;
        Ok(chunk)
    }

    /// Appends from `bits` up to the remaining capacity; returns the
    /// leftover bits that did not fit.
    pub fn write(&mut self, bits: &Bits) -> Bits {
        let missing = self.size - self.content.len();
        self.content.append(&bits.slice(0, missing));
        bits.slice(missing, bits.len())
    }

    /// Restarts chunked reading at the field's beginning.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Discards the content, keeping the declared size.
    pub fn clear(&mut self) {
        self.content = Bits::new();
        self.cursor = 0;
    }

    /// The whole value; requires a full field.
    pub fn bits(&self) -> Result<Bits> {
        if !self.is_full() {
            return Err(Error::FieldNotFull);
        }
        Ok(self.content.clone())
    }

    /// Replaces the whole value; the length must equal the size.
    pub fn set_bits(&mut self, bits: &Bits) -> Result<()> {
        if bits.len() != self.size {
            return Err(Error::SizeMismatch {
                expected: self.size,
                actual: bits.len(),
            });
        }
        self.clear();
        self.write(bits);
        Ok(())
    }

    /// The whole value as bytes; requires a full, byte-aligned field.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        self.bits()?.to_bytes()
    }

    /// Replaces the whole value from bytes.
    pub fn set_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.set_bits(&Bits::from_bytes(bytes))
    }

    /// The whole value as an unsigned integer; requires a full field of
    /// at most 64 bits.
    pub fn uint(&self) -> Result<u64> {
        self.bits()?.to_uint()
    }

    /// Replaces the whole value from an unsigned integer.
    pub fn set_uint(&mut self, value: u64) -> Result<()> {
        self.set_bits(&Bits::from_uint(value, self.size)?)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}-bit, {}", self.size, self.content)?;
        for _ in self.content.len()..self.size {
            write!(f, "x")?;
        }
        if self.size > 0 && self.is_full() {
            if let Ok(value) = self.content.to_uint() {
                write!(f, ", {value:#x}")?;
            }
        }
        write!(f, ")")
    }
}

/// An ordered sequence of fields treated as one bit region.
///
/// Chunked reads and writes run across field boundaries in declaration
/// order, which is how a frame is serialized bit by bit onto a wire.
#[derive(Clone, Default, Debug)]
pub struct FieldGroup {
    fields: Vec<Field>,
}

impl FieldGroup {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Total declared size across all fields.
    pub fn size(&self) -> usize {
        self.fields.iter().map(Field::size).sum()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the group has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The field at `index`.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Mutable access to the field at `index`.
    pub fn field_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.fields.get_mut(index)
    }

    /// Reads up to `count` bits across fields at their cursors.
    pub fn read(&mut self, count: usize) -> Result<Bits> {
        let mut chunk = Bits::new();
        for field in &mut self.fields {
            chunk.append(&field.read(count - chunk.len())?);
            if chunk.len() == count {
                break;
            }
        }
        Ok(chunk)
    }

    /// Writes across fields in order; returns the leftover bits.
    pub fn write(&mut self, bits: &Bits) -> Bits {
        let mut remaining = bits.clone();
        for field in &mut self.fields {
            remaining = field.write(&remaining);
            if remaining.is_empty() {
                break;
            }
        }
        remaining
    }

    /// Rewinds every field's cursor.
    pub fn rewind(&mut self) {
        for field in &mut self.fields {
            field.rewind();
        }
    }

    /// Clears every field's content.
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
    }

    /// The concatenated whole value; requires every field full.
    pub fn bits(&mut self) -> Result<Bits> {
        self.rewind();
        let bits = self.read(self.size())?;
        self.rewind();
        Ok(bits)
    }

    /// Replaces the whole region; the length must match the total size.
    pub fn set_bits(&mut self, bits: &Bits) -> Result<()> {
        if bits.len() != self.size() {
            return Err(Error::SizeMismatch {
                expected: self.size(),
                actual: bits.len(),
            });
        }
        self.clear();
        self.write(bits);
        Ok(())
    }
}

/// A [`FieldGroup`] whose fields are addressable by name.
#[derive(Clone, Default, Debug)]
pub struct Frame {
    names: Vec<String>,
    group: FieldGroup,
}

impl Frame {
    /// Creates an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named field.
    pub fn push(&mut self, name: impl Into<String>, field: Field) {
        self.names.push(name.into());
        self.group.push(field);
    }

    /// The field called `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        let index = self.names.iter().position(|n| n == name)?;
        self.group.field(index)
    }

    /// Mutable access to the field called `name`.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        let index = self.names.iter().position(|n| n == name)?;
        self.group.field_mut(index)
    }

    /// The underlying ordered group, for chunked serialization.
    pub fn group(&mut self) -> &mut FieldGroup {
        &mut self.group
    }

    /// Total declared size across all fields.
    pub fn size(&self) -> usize {
        self.group.size()
    }

    /// The concatenated whole value; requires every field full.
    pub fn bits(&mut self) -> Result<Bits> {
        self.group.bits()
    }

    /// Replaces the whole frame; the length must match the total size.
    pub fn set_bits(&mut self, bits: &Bits) -> Result<()> {
        self.group.set_bits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_read_walks_filled_region() {
        let mut field = Field::with_uint(8, 0b1100_0001).unwrap();
        assert_eq!(field.read(4).unwrap().to_uint().unwrap(), 0b1100);
        assert_eq!(field.read(4).unwrap().to_uint().unwrap(), 0b0001);
        // Past the end: empty, not an error.
        assert!(field.read(4).unwrap().is_empty());
        field.rewind();
        assert_eq!(field.read(8).unwrap().to_uint().unwrap(), 0b1100_0001);
    }

    #[test]
    fn test_reading_unwritten_region_is_an_error() {
        let mut field = Field::new(8);
        field.write(&Bits::from_uint(0b101, 3).unwrap());
        // The tail is requested before the field is full.
        assert_eq!(field.read(8), Err(Error::FieldUnderfilled));
    }

    #[test]
    fn test_write_returns_leftover() {
        let mut field = Field::new(4);
        let leftover = field.write(&Bits::from_uint(0b110101, 6).unwrap());
        assert!(field.is_full());
        assert_eq!(field.uint().unwrap(), 0b1101);
        assert_eq!(leftover.to_uint().unwrap(), 0b01);
    }

    #[test]
    fn test_whole_value_requires_full_field() {
        let mut field = Field::new(8);
        assert_eq!(field.uint(), Err(Error::FieldNotFull));
        field.set_uint(0xAB).unwrap();
        assert_eq!(field.uint().unwrap(), 0xAB);
        assert_eq!(field.bytes().unwrap(), vec![0xAB]);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let mut field = Field::new(8);
        assert_eq!(
            field.set_bits(&Bits::from_uint(0b101, 3).unwrap()),
            Err(Error::SizeMismatch {
                expected: 8,
                actual: 3
            })
        );
        assert_eq!(
            field.set_size(0),
            Ok(())
        );
        field.set_size(8).unwrap();
        field.set_uint(1).unwrap();
        assert_eq!(
            field.set_size(4),
            Err(Error::SizeTooSmall { size: 4, filled: 8 })
        );
    }

    #[test]
    fn test_group_serializes_across_fields() {
        let mut group = FieldGroup::new();
        group.push(Field::with_uint(4, 0xC).unwrap());
        group.push(Field::with_uint(8, 0x1F).unwrap());
        assert_eq!(group.size(), 12);
        assert_eq!(group.read(6).unwrap().to_uint().unwrap(), 0b1100_00);
        assert_eq!(group.read(6).unwrap().to_uint().unwrap(), 0b011111);
    }

    #[test]
    fn test_group_write_distributes() {
        let mut group = FieldGroup::new();
        group.push(Field::new(4));
        group.push(Field::new(4));
        let leftover = group.write(&Bits::from_uint(0b1010_0101_1, 9).unwrap());
        assert_eq!(leftover.len(), 1);
        assert_eq!(group.field(0).unwrap().uint().unwrap(), 0b1010);
        assert_eq!(group.field(1).unwrap().uint().unwrap(), 0b0101);
    }

    #[test]
    fn test_frame_fields_by_name() {
        let mut frame = Frame::new();
        frame.push("preamble", Field::with_uint(16, 0x0000).unwrap());
        frame.push("sync", Field::with_uint(16, 0xC1FA).unwrap());
        frame.push("payload", Field::with_bytes(b"hi"));
        assert_eq!(frame.size(), 48);
        assert_eq!(frame.field("sync").unwrap().uint().unwrap(), 0xC1FA);
        assert_eq!(frame.field("payload").unwrap().bytes().unwrap(), b"hi");
        assert!(frame.field("missing").is_none());

        let wire = frame.bits().unwrap();
        let mut copy = Frame::new();
        copy.push("preamble", Field::new(16));
        copy.push("sync", Field::new(16));
        copy.push("payload", Field::new(16));
        copy.set_bits(&wire).unwrap();
        assert_eq!(copy.field("sync").unwrap().uint().unwrap(), 0xC1FA);
    }
}
