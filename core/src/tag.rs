//! The wire tag alphabet (wire-format version 13).
//!
//! Every encoded value begins with one of these bytes. Composite kinds that
//! wrap a variable-length body (`Record`, `SparseArray`, `DenseArray`, `Map`,
//! `Set`) are framed by a distinct begin/end pair rather than a single tag,
//! mirroring the historical stack-based encoder this format was designed
//! for.

/// Header tag: `varint(version)` follows. Emitted once, before any value.
pub const VERSION: u8 = 0xFF;
/// Skipped on read; exists only to align a following value.
pub const PADDING: u8 = 0x00;
/// Legacy tag; the following varint is consumed and ignored.
pub const VERIFY_OBJECT_COUNT: u8 = b'?';
/// Dense-array gap.
pub const THE_HOLE: u8 = b'-';
pub const UNDEFINED: u8 = b'_';
pub const NULL: u8 = b'0';
pub const TRUE: u8 = b'T';
pub const FALSE: u8 = b'F';
/// ZigZag varint payload.
pub const INT32: u8 = b'I';
/// Plain varint payload. Never emitted by this encoder; accepted on read.
pub const UINT32: u8 = b'U';
/// 8 bytes, host byte order.
pub const DOUBLE: u8 = b'N';
pub const UTF8_STRING: u8 = b'S';
pub const ONE_BYTE_STRING: u8 = b'"';
pub const TWO_BYTE_STRING: u8 = b'c';
pub const OBJECT_REFERENCE: u8 = b'^';

/// Begin/end pair for a plain record (JS object literal).
pub const RECORD_BEGIN: u8 = b'o';
pub const RECORD_END: u8 = b'{';

/// Begin/end pair for a sparse (key/value) array.
pub const SPARSE_ARRAY_BEGIN: u8 = b'a';
pub const SPARSE_ARRAY_END: u8 = b'@';

/// Begin/end pair for a dense (positional) array.
pub const DENSE_ARRAY_BEGIN: u8 = b'A';
pub const DENSE_ARRAY_END: u8 = b'$';

pub const DATE: u8 = b'D';
pub const BOOLEAN_OBJECT_TRUE: u8 = b'y';
pub const BOOLEAN_OBJECT_FALSE: u8 = b'x';
pub const NUMBER_OBJECT: u8 = b'n';
pub const STRING_OBJECT: u8 = b's';
pub const REGEXP: u8 = b'R';

/// Begin/end pair for a `Map`.
pub const MAP_BEGIN: u8 = b';';
pub const MAP_END: u8 = b':';

/// Begin/end pair for a `Set`.
pub const SET_BEGIN: u8 = b'\'';
pub const SET_END: u8 = b',';

pub const BYTE_BUFFER: u8 = b'B';
pub const BYTE_BUFFER_TRANSFER: u8 = b't';
pub const TYPED_VIEW: u8 = b'V';
pub const SHARED_BYTE_BUFFER: u8 = b'u';
pub const WASM_MODULE: u8 = b'W';
pub const WASM_TRANSFER: u8 = b'w';
pub const HOST_OBJECT: u8 = b'\\';

/// Subtags following a [`TYPED_VIEW`] tag, identifying the element kind of
/// the view.
pub mod view_subtag {
    pub const INT8: u8 = b'b';
    pub const UINT8: u8 = b'B';
    pub const UINT8_CLAMPED: u8 = b'C';
    pub const INT16: u8 = b'w';
    pub const UINT16: u8 = b'W';
    pub const INT32: u8 = b'd';
    pub const UINT32: u8 = b'D';
    pub const FLOAT32: u8 = b'f';
    pub const FLOAT64: u8 = b'F';
    pub const DATA_VIEW: u8 = b'?';
}

/// The one wire-format version this codec writes, and the highest one it
/// will read.
pub const WIRE_FORMAT_VERSION: u32 = 13;

/// The kind of elements held by a [`crate::value::TypedView`].
///
/// Ordered the way [`crate::value::TypedView`] and the default host-object
/// codec in the `sclone-views` crate expect: this order is also the
/// constructor index table of §4.3. `sclone-views` appends one further
/// out-of-band "raw wrapper" index (not a wire subtag, and not a variant of
/// this enum, since it names no view kind) after
/// [`ViewKind::ALL`]'s entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ViewKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    DataView,
}

impl ViewKind {
    /// All typed-view kinds, in wire/constructor-table order.
    pub const ALL: [ViewKind; 10] = [
        ViewKind::Int8,
        ViewKind::Uint8,
        ViewKind::Uint8Clamped,
        ViewKind::Int16,
        ViewKind::Uint16,
        ViewKind::Int32,
        ViewKind::Uint32,
        ViewKind::Float32,
        ViewKind::Float64,
        ViewKind::DataView,
    ];

    /// The element size in bytes, or 1 for a `DataView` (which has no fixed
    /// element width of its own).
    pub fn element_size(self) -> usize {
        match self {
            ViewKind::Int8 | ViewKind::Uint8 | ViewKind::Uint8Clamped => 1,
            ViewKind::Int16 | ViewKind::Uint16 => 2,
            ViewKind::Int32 | ViewKind::Uint32 | ViewKind::Float32 => 4,
            ViewKind::Float64 => 8,
            ViewKind::DataView => 1,
        }
    }

    /// Maps a wire [`TYPED_VIEW`] subtag byte to a `ViewKind`.
    pub fn from_subtag(subtag: u8) -> Option<ViewKind> {
        use view_subtag::*;
        Some(match subtag {
            INT8 => ViewKind::Int8,
            UINT8 => ViewKind::Uint8,
            UINT8_CLAMPED => ViewKind::Uint8Clamped,
            INT16 => ViewKind::Int16,
            UINT16 => ViewKind::Uint16,
            INT32 => ViewKind::Int32,
            UINT32 => ViewKind::Uint32,
            FLOAT32 => ViewKind::Float32,
            FLOAT64 => ViewKind::Float64,
            DATA_VIEW => ViewKind::DataView,
            _ => return None,
        })
    }

    /// The wire [`TYPED_VIEW`] subtag byte for this kind.
    pub fn to_subtag(self) -> u8 {
        use view_subtag::*;
        match self {
            ViewKind::Int8 => INT8,
            ViewKind::Uint8 => UINT8,
            ViewKind::Uint8Clamped => UINT8_CLAMPED,
            ViewKind::Int16 => INT16,
            ViewKind::Uint16 => UINT16,
            ViewKind::Int32 => INT32,
            ViewKind::Uint32 => UINT32,
            ViewKind::Float32 => FLOAT32,
            ViewKind::Float64 => FLOAT64,
            ViewKind::DataView => DATA_VIEW,
        }
    }

    /// The constructor-table index used by the default host-object codec
    /// (§4.3). The raw-byte-wrapper entry is index [`ViewKind::ALL.len()`].
    pub fn constructor_index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).expect("exhaustive")
    }

    /// Looks a `ViewKind` up by its constructor-table index.
    pub fn from_constructor_index(index: usize) -> Option<ViewKind> {
        Self::ALL.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtag_round_trip() {
        for kind in ViewKind::ALL {
            assert_eq!(ViewKind::from_subtag(kind.to_subtag()), Some(kind));
        }
    }

    #[test]
    fn constructor_index_round_trip() {
        for (i, kind) in ViewKind::ALL.iter().enumerate() {
            assert_eq!(kind.constructor_index(), i);
            assert_eq!(ViewKind::from_constructor_index(i), Some(*kind));
        }
    }
}
