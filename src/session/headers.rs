//! Session data to request headers

use crate::{
    Error, Result,
    types::{AuthType, DEFAULT_TOKEN_TYPE, SessionData},
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;

/// Header name to value
pub type AuthHeaders = HashMap<String, String>;

/// Headers that authenticate a request for the given session data
///
/// Data that does not belong to `auth_type` yields an empty map.
pub fn to_headers(auth_type: AuthType, data: &SessionData) -> AuthHeaders {
    let mut headers = AuthHeaders::new();

    match (auth_type, data) {
        (AuthType::Basic, SessionData::Basic { token }) => {
            headers.insert("Authorization".to_string(), format!("Basic {}", token));
        }
        (
            AuthType::Bearer,
            SessionData::Bearer {
                access_token,
                token_type,
                ..
            },
        ) => {
            let scheme = if token_type.is_empty() {
                DEFAULT_TOKEN_TYPE
            } else {
                token_type.as_str()
            };
            headers.insert(
                "Authorization".to_string(),
                format!("{} {}", scheme, access_token),
            );
        }
        (AuthType::OAuth, SessionData::OAuth { access_token, .. }) => {
            headers.insert(
                "Authorization".to_string(),
                format!("{} {}", DEFAULT_TOKEN_TYPE, access_token),
            );
        }
        (
            AuthType::ApiKey,
            SessionData::ApiKey {
                api_key,
                header_name,
            },
        ) => {
            headers.insert(header_name.clone(), api_key.clone());
        }
        (AuthType::Cookie, SessionData::Cookie { cookie }) => {
            headers.insert("Cookie".to_string(), cookie.clone());
        }
        _ => {}
    }

    headers
}

/// Convert auth headers into a reqwest header map
pub fn to_header_map(headers: &AuthHeaders) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::internal(format!("Invalid header name '{}'", name)))?;
        let mut header_value = HeaderValue::from_str(value)
            .map_err(|_| Error::internal(format!("Invalid value for header '{}'", name)))?;
        header_value.set_sensitive(true);
        map.insert(header_name, header_value);
    }
    Ok(map)
}
