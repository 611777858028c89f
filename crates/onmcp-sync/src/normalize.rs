//! Mapping of raw CRM location payloads onto stored columns.

use onmcp_db::NewLocation;

/// Map one raw payload. Returns `None` when the payload has no usable `id`.
///
/// Every mapped field is read fresh from the payload; anything missing,
/// `null` or blank becomes `None`, which the store writes as `NULL`.
#[must_use]
pub fn normalize_location(payload: &serde_json::Value) -> Option<NewLocation> {
    let external_id = string_field(payload, "id")?;

    Some(NewLocation {
        external_id,
        name: string_field(payload, "name"),
        address: string_field(payload, "address"),
        city: string_field(payload, "city"),
        state: string_field(payload, "state"),
        country: string_field(payload, "country"),
        postal_code: string_field(payload, "postalCode"),
        phone: string_field(payload, "phone"),
        email: string_field(payload, "email"),
        website: string_field(payload, "website"),
        timezone: string_field(payload, "timezone"),
        logo_url: string_field(payload, "logoUrl"),
        metadata: payload.clone(),
    })
}

/// Trimmed string value of `key`. Numbers are rendered, since postal codes
/// and ids sometimes arrive unquoted.
fn string_field(payload: &serde_json::Value, key: &str) -> Option<String> {
    let value = match payload.get(key)? {
        serde_json::Value::String(s) => s.trim().to_owned(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_all_known_fields() {
        let payload = json!({
            "id": "loc-1",
            "name": "Downtown Studio",
            "address": "100 Congress Ave",
            "city": "Austin",
            "state": "TX",
            "country": "US",
            "postalCode": "78701",
            "phone": "+15125550100",
            "email": "front@example.com",
            "website": "https://example.com",
            "timezone": "America/Chicago",
            "logoUrl": "https://cdn.example.com/logo.png",
            "settings": {"allowDuplicateContact": false}
        });

        let location = normalize_location(&payload).expect("location");
        assert_eq!(location.external_id, "loc-1");
        assert_eq!(location.name.as_deref(), Some("Downtown Studio"));
        assert_eq!(location.postal_code.as_deref(), Some("78701"));
        assert_eq!(location.timezone.as_deref(), Some("America/Chicago"));
        assert_eq!(
            location.logo_url.as_deref(),
            Some("https://cdn.example.com/logo.png")
        );
        assert_eq!(location.metadata, payload, "raw payload kept verbatim");
    }

    #[test]
    fn missing_id_is_skipped() {
        assert!(normalize_location(&json!({"name": "No Id"})).is_none());
        assert!(normalize_location(&json!({"id": "   "})).is_none());
        assert!(normalize_location(&json!({"id": null})).is_none());
    }

    #[test]
    fn absent_and_blank_fields_become_none() {
        let location = normalize_location(&json!({
            "id": "loc-2",
            "city": "",
            "phone": null
        }))
        .expect("location");
        assert!(location.name.is_none());
        assert!(location.city.is_none());
        assert!(location.phone.is_none());
    }

    #[test]
    fn numeric_values_are_rendered() {
        let location =
            normalize_location(&json!({"id": 42, "postalCode": 10001})).expect("location");
        assert_eq!(location.external_id, "42");
        assert_eq!(location.postal_code.as_deref(), Some("10001"));
    }
}
