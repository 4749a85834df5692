//! Claimant registry
//!
//! Binds an authorization token to a claimant name. Only the SHA-256 of the
//! token is stored; resolving an authorization hashes it the same way.

#![allow(clippy::result_large_err)]

use crate::errors::{already_exists, corrupt_row, from_rusqlite, invalid_input, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use sha2::{Digest as _, Sha256};
use veristamp_core::{Authorization, Claimant};

/// A registry row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredClaimant {
    pub claimant: Claimant,
    pub registered_at: DateTime<Utc>,
}

/// Hex SHA-256 of an authorization token
pub fn token_digest(authorization: &Authorization) -> String {
    hex::encode(Sha256::digest(authorization.expose()))
}

/// Register `claimant` under `authorization`.
///
/// Names and tokens are both unique: one token can't speak for two
/// claimants, and a claimant can't be re-registered under a new token.
pub fn register(
    conn: &mut Connection,
    claimant: &Claimant,
    authorization: &Authorization,
) -> Result<RegisteredClaimant> {
    if claimant.as_str().trim().is_empty() {
        return Err(invalid_input(
            "claimant_register",
            "claimant name must not be empty",
        ));
    }
    if authorization.expose().is_empty() {
        return Err(invalid_input(
            "claimant_register",
            "authorization token must not be empty",
        ));
    }

    let token = token_digest(authorization);
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    let name_taken = tx
        .query_row(
            "SELECT 1 FROM claimants WHERE claimant = ?1",
            [claimant.as_str()],
            |_| Ok(()),
        )
        .optional()
        .map_err(from_rusqlite)?
        .is_some();
    if name_taken {
        return Err(already_exists(
            "claimant_register",
            format!("claimant '{}' is already registered", claimant),
        ));
    }

    let token_taken = tx
        .query_row(
            "SELECT 1 FROM claimants WHERE token_digest = ?1",
            [&token],
            |_| Ok(()),
        )
        .optional()
        .map_err(from_rusqlite)?
        .is_some();
    if token_taken {
        return Err(already_exists(
            "claimant_register",
            "token is already bound to another claimant",
        ));
    }

    let registered_at = Utc::now();
    tx.execute(
        "INSERT INTO claimants (claimant, token_digest, registered_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![claimant.as_str(), token, registered_at.timestamp_millis()],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;

    Ok(RegisteredClaimant {
        claimant: claimant.clone(),
        registered_at: millis_to_utc(registered_at.timestamp_millis())?,
    })
}

/// Claimant bound to `authorization`, if any
pub fn resolve(conn: &Connection, authorization: &Authorization) -> Result<Option<Claimant>> {
    let name: Option<String> = conn
        .query_row(
            "SELECT claimant FROM claimants WHERE token_digest = ?1",
            [token_digest(authorization)],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;
    Ok(name.map(Claimant::new))
}

/// All registered claimants, oldest first
pub fn list(conn: &Connection) -> Result<Vec<RegisteredClaimant>> {
    let mut stmt = conn
        .prepare("SELECT claimant, registered_at FROM claimants ORDER BY registered_at, claimant")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(|(name, at)| {
            Ok(RegisteredClaimant {
                claimant: Claimant::new(name),
                registered_at: millis_to_utc(at)?,
            })
        })
        .collect()
}

/// Decode a stored millisecond timestamp
pub(crate) fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| corrupt_row("timestamp", ms))
}
