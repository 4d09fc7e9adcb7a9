//! Token loop that collects a request's raw fields

use super::ast::*;
use super::field::ParseField;
use cardinal_core::{
    ConfigError, ConfigResult, ReadError, ResolverConfig, Token, TokenKind, TokenStream,
    MAX_PARAMS_DEPTH_LIMIT,
};
use serde_json::Number;
use std::collections::HashSet;
use tracing::{trace, warn};

const PRECISION_THRESHOLD: ParseField = ParseField::new(keys::PRECISION_THRESHOLD);

/// Consume tokens up to the request's closing `ObjectEnd`.
///
/// The stream must be positioned just inside the request object. Keys are
/// checked against the kind of the value that follows them, so a known key
/// carrying the wrong kind of value is reported as an unknown key for that
/// value kind.
pub fn parse_request<T>(
    name: &str,
    tokens: &mut T,
    config: &ResolverConfig,
) -> ConfigResult<RawRequest>
where
    T: TokenStream + ?Sized,
{
    let mut request = RawRequest::default();
    let mut current_key: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();

    loop {
        let token = tokens.next_token().map_err(|e| read_error(name, e))?;

        match token {
            Token::ObjectEnd => break,
            Token::FieldName(key) => {
                trace!(request = %name, key = %key, "request key");
                if !seen.insert(key.clone()) {
                    if config.reject_duplicate_keys {
                        return Err(ConfigError::DuplicateKey {
                            request: name.to_string(),
                            key,
                        });
                    }
                    warn!(request = %name, key = %key, "duplicate key overwrites earlier value");
                }
                current_key = Some(key);
            }
            Token::String(value) => match current_key.as_deref() {
                Some(keys::FIELD) => request.field = Some(value),
                Some(keys::SCRIPT) => request.script = Some(value),
                Some(keys::LANG) => request.lang = Some(value),
                _ => return Err(unknown_key(name, &current_key, TokenKind::String)),
            },
            Token::ObjectStart => match current_key.as_deref() {
                Some(keys::PARAMS) => {
                    let params = tokens
                        .read_map(config.max_params_depth.min(MAX_PARAMS_DEPTH_LIMIT))
                        .map_err(|e| read_error(name, e))?;
                    request.params = Some(params);
                }
                _ => return Err(unknown_key(name, &current_key, TokenKind::ObjectStart)),
            },
            Token::Boolean(value) => match current_key.as_deref() {
                Some(keys::REHASH) => request.rehash = Some(value),
                _ => return Err(unknown_key(name, &current_key, TokenKind::Boolean)),
            },
            Token::Number(value) => {
                if PRECISION_THRESHOLD.matches(current_key.as_deref(), config.accept_camel_case) {
                    request.precision_threshold = number_to_i64(&value).ok_or_else(|| {
                        read_error(
                            name,
                            tokens.error(format!("Numeric value ({value}) out of range of long")),
                        )
                    })?;
                } else {
                    return Err(unknown_key(name, &current_key, TokenKind::Number));
                }
            }
            other => {
                return Err(ConfigError::UnexpectedToken {
                    request: name.to_string(),
                    token: other.kind(),
                });
            }
        }
    }

    Ok(request)
}

/// Read a number as a 64-bit integer, truncating fractions toward zero.
///
/// Returns `None` when the value does not fit in an `i64`.
pub fn number_to_i64(number: &Number) -> Option<i64> {
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    if number.as_u64().is_some() {
        return None;
    }
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    let f = number.as_f64()?;
    (f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f as i64)
}

fn unknown_key(name: &str, key: &Option<String>, token: TokenKind) -> ConfigError {
    ConfigError::UnknownKey {
        request: name.to_string(),
        key: key.clone(),
        token,
    }
}

fn read_error(name: &str, source: ReadError) -> ConfigError {
    ConfigError::Read {
        request: name.to_string(),
        source,
    }
}
