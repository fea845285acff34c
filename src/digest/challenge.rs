//! `WWW-Authenticate` challenge parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DigestError;

static QOP: Lazy<Regex> = Lazy::new(|| param_regex("qop"));
static REALM: Lazy<Regex> = Lazy::new(|| param_regex("realm"));
static NONCE: Lazy<Regex> = Lazy::new(|| param_regex("nonce"));

// `\b` keeps `nonce` from matching inside `cnonce`.
fn param_regex(name: &str) -> Regex {
    Regex::new(&format!(r#"\b{}="([^"]*)""#, name)).expect("static digest parameter regex")
}

/// Parameters of a single digest challenge.
///
/// Only valid for the exchange it was read from; devices issue a new nonce
/// for every unauthenticated probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    /// Protection space.
    pub realm: String,
    /// Server nonce.
    pub nonce: String,
    /// Selected quality of protection (always `auth`).
    pub qop: String,
}

impl Challenge {
    /// Parse the value of a `WWW-Authenticate` header.
    pub fn parse(header: &str) -> Result<Self, DigestError> {
        let find = |re: &Regex, field: &'static str| {
            re.captures(header)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| DigestError::IncompleteChallenge {
                    field,
                    challenge: header.to_string(),
                })
        };

        let offered = find(&QOP, "qop")?;
        let realm = find(&REALM, "realm")?;
        let nonce = find(&NONCE, "nonce")?;

        let qop = select_qop(&offered).ok_or_else(|| DigestError::UnsupportedQop {
            qop: offered.clone(),
            challenge: header.to_string(),
        })?;

        Ok(Self { realm, nonce, qop })
    }
}

fn select_qop(offered: &str) -> Option<String> {
    offered
        .split(',')
        .map(str::trim)
        .find(|q| q.eq_ignore_ascii_case("auth"))
        .map(str::to_string)
}
