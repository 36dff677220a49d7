#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]

//! The default host-object codec for typed views (§4.3).
//!
//! This is the one concrete [`sclone_parser::HostObjectEncode`] /
//! [`sclone_parser::HostObjectDecode`] pair this workspace ships; it is
//! what [`sclone_parser::stateful::encode::Encoder::set_treat_typed_views_as_host_objects`]
//! expects on the other end of the `HostObject` tag when a caller opts out
//! of the native `TypedView` wire path. Third-party delegates for other
//! opaque host-object types implement the same two traits independently;
//! this crate only covers typed views and the raw-byte wrapper of §4.3.

pub mod codec;

pub use codec::{RawBytesHostObject, TypedViewCodec};
