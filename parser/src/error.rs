//! The two observable error kinds (§7): a clone error from the encoder,
//! and a deserialization error from the decoder.

use snafu::Snafu;

/// Errors raised while writing a value graph (§7 "Clone error").
///
/// Bubbles out of [`crate::stateful::encode::Encoder::write_value`].
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum EncodeError {
    /// A value could not be represented on the wire at all: an opaque
    /// host object rejected by the delegate, or (via the delegate's
    /// reported message) a value the embedder considers non-cloneable
    /// such as a callable.
    #[snafu(display("{description} could not be cloned"))]
    ValueNotCloneable { description: String },

    /// A `HostObject`-eligible value was encountered with no delegate
    /// configured to write it.
    #[snafu(display("Unknown host object type: {description}"))]
    UnknownHostObjectType { description: String },

    /// `transfer_byte_buffer` was called twice for the same buffer handle.
    #[snafu(display("byte buffer is already registered for transfer"))]
    DuplicateTransfer,
}

pub type EncodeResult<T> = std::result::Result<T, EncodeError>;

/// Errors raised while reading a value graph (§7 "Deserialization error").
///
/// Bubbles out of [`crate::stateful::decode::Decoder::read_value`] or
/// [`crate::stateful::decode::Decoder::read_header`]. Per §4.2's
/// Validation rules, a count mismatch on a composite body and a position
/// overrun are the *same* observable error; both are represented here as
/// [`DecodeError::Malformed`].
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DecodeError {
    /// The stream ended, a composite's trailing count did not match what
    /// was read, or the cursor otherwise overran the input (§4.2
    /// Validation). Once returned, the decoder must not be reused — its
    /// cursor is left at an unspecified position (§7).
    #[snafu(display("unable to deserialize structured clone data at position {position}"))]
    Malformed { position: u64 },

    /// The header declared a wire-format version greater than
    /// [`sclone_core::WIRE_FORMAT_VERSION`].
    #[snafu(display("unsupported wire format version {version}"))]
    UnsupportedVersion { version: u32 },

    /// An unrecognized tag byte was read at a wire-format version that
    /// does not permit the legacy host-object fallback (§4.2 "Legacy
    /// tolerance").
    #[snafu(display("unknown tag {tag:#04x} at position {position}"))]
    UnknownTag { tag: u8, position: u64 },

    /// A `HostObject` tag (or, at version < 13, an unrecognized tag) was
    /// encountered with no delegate configured to read it.
    #[snafu(display("no host object delegate configured to read tag at position {position}"))]
    NoHostObjectDelegate { position: u64 },

    /// The delegate rejected (or failed to parse) a host-object payload.
    #[snafu(display("host object could not be read: {message}"))]
    HostObjectRejected { message: String },

    /// A `ByteBufferTransfer`/`SharedByteBuffer` id had no matching
    /// registration.
    #[snafu(display("no transfer registered for id {id}"))]
    MissingTransfer { id: u32 },

    /// A malformed varint (§4.4).
    #[snafu(display("invalid varint at position {position}: {source}"))]
    Varint {
        position: u64,
        source: sclone_encoding::varint::Error,
    },
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
