//! Object Shape - Per-object structural data
//!
//! A shape is the tagged variant the size formulas and record fields are
//! computed from. Hosts build it by reading the object's fields in place;
//! nothing is copied out of the runtime.

/// Structural view of one object, borrowed from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectShape<'a> {
    /// Growable sequence: logical length and allocated slot count
    Sequence { len: usize, allocated: usize },
    /// Fixed-size sequence
    Tuple { len: usize },
    /// Hashed set with its active table
    HashedSet { len: usize, table: SetTable },
    /// Hashed mapping
    Mapping(MappingShape),
    /// Text buffer
    Text(TextShape<'a>),
    /// Raw byte buffer
    Bytes(&'a [u8]),
    /// Arbitrary-precision integer
    BigInt(BigIntShape<'a>),
    /// Boolean singleton
    Bool(bool),
    /// The none singleton
    NoneValue,
    /// Module with its name, if resolvable
    Module { name: Option<&'a str> },
    /// Function with its name
    Function { name: &'a str },
    /// Type definition
    ///
    /// `heap_type` is false for built-in (statically defined) types.
    TypeDef { name: &'a str, heap_type: bool },
    /// Execution frame with its enclosing routine name, if resolvable
    Frame { routine: Option<&'a str> },
    /// No structural knowledge
    Generic,
}

impl ObjectShape<'_> {
    /// Element or entry count for container-like shapes
    pub fn container_len(&self) -> Option<usize> {
        match *self {
            ObjectShape::Sequence { len, .. }
            | ObjectShape::Tuple { len }
            | ObjectShape::HashedSet { len, .. } => Some(len),
            ObjectShape::Mapping(mapping) => Some(mapping.len),
            _ => None,
        }
    }

    /// Built-in type definition (never traversed)
    #[inline]
    pub fn is_static_type(&self) -> bool {
        matches!(self, ObjectShape::TypeDef { heap_type: false, .. })
    }
}

/// Active table of a hashed set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetTable {
    /// Small table embedded in the set object itself
    Inline,
    /// Separately allocated table with `slots` entries
    External { slots: usize },
}

/// Shared key table of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTable {
    /// Number of mappings sharing this table
    pub owners: usize,
    /// Total bytes of the key table allocation
    pub bytes: usize,
}

impl KeyTable {
    /// Table is owned by exactly one mapping
    #[inline]
    pub const fn is_unique(&self) -> bool {
        self.owners == 1
    }
}

/// Structural data of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingShape {
    /// Entry count
    pub len: usize,
    /// Key table slot count, when values live in a separate split array
    pub split_slots: Option<usize>,
    /// Key/hash table storage
    pub keys: KeyTable,
}

/// Character storage width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharWidth {
    One = 1,
    Two = 2,
    Four = 4,
}

impl CharWidth {
    /// Width in bytes
    #[inline]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Narrowest width able to hold `code_point`
    pub const fn for_code_point(code_point: u32) -> Self {
        if code_point <= 0xFF {
            CharWidth::One
        } else if code_point <= 0xFFFF {
            CharWidth::Two
        } else {
            CharWidth::Four
        }
    }
}

/// Internal text encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Single allocation, ASCII only, one byte per character
    CompactAscii,
    /// Single allocation with the given character width
    Compact(CharWidth),
    /// Header and character data in two separate blocks
    Legacy(CharWidth),
}

/// An auxiliary cached representation of a text object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxBuffer {
    /// Length in units of the cache's own encoding (excluding terminator)
    pub len: usize,
    /// Cache points at the primary character buffer
    pub aliased: bool,
}

/// Character data of a text object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextData<'a> {
    Latin1(&'a [u8]),
    Ucs2(&'a [u16]),
    Ucs4(&'a [u32]),
}

impl TextData<'_> {
    /// Number of code points
    pub fn len(&self) -> usize {
        match self {
            TextData::Latin1(data) => data.len(),
            TextData::Ucs2(data) => data.len(),
            TextData::Ucs4(data) => data.len(),
        }
    }

    /// Check if there are no code points
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Code point at `index`
    #[inline]
    pub fn code_point(&self, index: usize) -> Option<u32> {
        match self {
            TextData::Latin1(data) => data.get(index).map(|&c| c as u32),
            TextData::Ucs2(data) => data.get(index).map(|&c| c as u32),
            TextData::Ucs4(data) => data.get(index).copied(),
        }
    }

    /// Iterate code points in order
    pub fn code_points(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).filter_map(move |i| self.code_point(i))
    }
}

/// Structural data of a text object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextShape<'a> {
    /// Internal encoding
    pub encoding: TextEncoding,
    /// Logical length in code points
    pub len: usize,
    /// Character data, absent for legacy text without a data block
    pub data: Option<TextData<'a>>,
    /// Legacy wide-character cache
    pub wide_cache: Option<AuxBuffer>,
    /// UTF-8 cache
    pub utf8_cache: Option<AuxBuffer>,
}

impl<'a> TextShape<'a> {
    /// Compact text over `data`, choosing the encoding from the data width
    pub fn compact(data: TextData<'a>, ascii: bool) -> Self {
        let encoding = match data {
            TextData::Latin1(_) if ascii => TextEncoding::CompactAscii,
            TextData::Latin1(_) => TextEncoding::Compact(CharWidth::One),
            TextData::Ucs2(_) => TextEncoding::Compact(CharWidth::Two),
            TextData::Ucs4(_) => TextEncoding::Compact(CharWidth::Four),
        };
        Self {
            encoding,
            len: data.len(),
            data: Some(data),
            wide_cache: None,
            utf8_cache: None,
        }
    }
}

/// Structural data of an arbitrary-precision integer
///
/// Digits are little-endian, each holding `RuntimeLayout::digit_bits` bits
/// of the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigIntShape<'a> {
    pub digits: &'a [u32],
    pub negative: bool,
}

impl BigIntShape<'_> {
    /// Value as `i64`, or `None` if it does not fit
    pub fn to_i64(&self, digit_bits: u32) -> Option<i64> {
        let mut magnitude: u64 = 0;
        for &digit in self.digits.iter().rev() {
            magnitude = magnitude
                .checked_mul(1u64.checked_shl(digit_bits)?)?
                .checked_add(u64::from(digit))?;
        }

        if self.negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        }
    }
}
