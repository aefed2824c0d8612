//! Domain primitives and validation.
//!
//! Purpose: define the strongly typed user record shared by the HTTP and
//! persistence layers, the validation that guards every write, and the API
//! error envelope. Types here are transport-agnostic; adapters live under
//! `inbound` and `outbound`.

pub mod error;
pub mod ports;
pub mod user;

pub use self::error::{Error, ErrorCode};
pub use self::user::{
    Email, Gender, NewUser, Password, SignupFields, User, UserId, UserPatch, UserValidationError,
};

/// Convenient result alias for handlers returning the API error envelope.
pub type ApiResult<T> = Result<T, Error>;
