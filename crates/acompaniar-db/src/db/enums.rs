//! Database enum types with Diesel serialization.
//!
//! Each enum implements `ToSql` and `FromSql` against the text code stored in
//! its lookup table.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

/// Lifecycle state of an alert audit record.
///
/// Maps to `alert_state.code`. Only `Pending` and `Sent` are set by the alert
/// flow; the rest are reserved for manual follow-up.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Pending,
    Sent,
    InProcess,
    Resolved,
    Rejected,
    Error,
    Cancelled,
}

impl ToSql<Text, Pg> for AlertState {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for AlertState {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"pending" => Ok(Self::Pending),
            b"sent" => Ok(Self::Sent),
            b"in_process" => Ok(Self::InProcess),
            b"resolved" => Ok(Self::Resolved),
            b"rejected" => Ok(Self::Rejected),
            b"error" => Ok(Self::Error),
            b"cancelled" => Ok(Self::Cancelled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl AlertState {
    /// Returns the database code for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::InProcess => "in_process",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_seeded_rows() {
        assert_eq!(AlertState::Pending.as_str(), "pending");
        assert_eq!(AlertState::InProcess.to_string(), "in_process");
        assert_eq!(
            serde_json::to_string(&AlertState::Cancelled).ok().as_deref(),
            Some("\"cancelled\"")
        );
    }
}
