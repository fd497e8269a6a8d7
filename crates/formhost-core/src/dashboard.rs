//! Dashboard query-string extraction.
//!
//! Navigation from the external dashboard carries an encrypted token (`s`)
//! plus five companion fields. Extraction is pure; verification lives in the
//! gateway.

use url::form_urlencoded;

use crate::model::DashboardQueryParams;

/// Query field holding the encrypted token.
pub const TOKEN_FIELD: &str = "s";

/// Read the six dashboard fields from a raw query string (without `?`).
///
/// Returns `None` whenever `s` is missing or empty. Empty companion fields
/// count as absent. The first occurrence of a repeated field wins.
pub fn extract_params(query: &str) -> Option<DashboardQueryParams> {
    let mut out = DashboardQueryParams::default();
    let mut has_token = false;

    for (k, v) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        if v.is_empty() {
            continue;
        }
        let slot = match k.as_ref() {
            TOKEN_FIELD => {
                if !has_token {
                    out.s = v.into_owned();
                    has_token = true;
                }
                continue;
            }
            "InstanceId" => &mut out.instance_id,
            "UserName" => &mut out.user_name,
            "EventName" => &mut out.event_name,
            "ActivityName" => &mut out.activity_name,
            "Token" => &mut out.token,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(v.into_owned());
        }
    }

    has_token.then_some(out)
}
