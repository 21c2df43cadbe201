//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Author of a message in a completion request.
///
/// # Examples
///
/// ```
/// use tollgate_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "system");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System messages provide context and instructions
    #[display("system")]
    System,
    /// User messages are from the caller
    #[display("user")]
    User,
    /// Assistant messages are prior model output
    #[display("assistant")]
    Assistant,
}
