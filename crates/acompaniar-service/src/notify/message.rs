//! SMS body builders.

use chrono::DateTime;
use chrono_tz::Tz;

use acompaniar_core::constants::SMS_BODY_MAX_CHARS;
use acompaniar_core::types::GeoPoint;

const ELLIPSIS: &str = "...";

/// Inputs of an emergency message.
#[derive(Debug, Clone, Copy)]
pub struct EmergencyMessage<'a> {
    pub sender_name: &'a str,
    pub location: Option<&'a GeoPoint>,
    pub custom_text: Option<&'a str>,
    pub local_time: DateTime<Tz>,
    pub signature: &'a str,
}

/// ## Summary
/// Renders the emergency body and cuts it to the two-segment budget.
#[must_use]
pub fn emergency_body(message: &EmergencyMessage<'_>) -> String {
    let mut lines = vec![
        "🚨 ALERTA DE EMERGENCIA 🚨".to_string(),
        format!("{} necesita ayuda URGENTE.", message.sender_name),
    ];

    if let Some(text) = message.custom_text.map(str::trim).filter(|t| !t.is_empty()) {
        lines.push(String::new());
        lines.push(text.to_string());
    }

    if let Some(location) = message.location {
        lines.push(String::new());
        lines.push("📍 UBICACIÓN:".to_string());
        lines.push(location.address.clone());
        lines.push(format!("Ver en mapa: {}", location.maps_url()));
    }

    lines.push(String::new());
    lines.push(format!("⏰ {}hs", message.local_time.format("%d/%m %H:%M")));
    lines.push(String::new());
    lines.push(message.signature.to_string());

    truncate_body(lines.join("\n"))
}

/// ## Summary
/// Renders the fixed diagnostic message.
#[must_use]
pub fn test_body(local_time: DateTime<Tz>, signature: &str) -> String {
    truncate_body(format!(
        "📱 SMS de Prueba - {signature}\nEste mensaje confirma que los SMS de emergencia funcionan correctamente.\nHora: {}hs",
        local_time.format("%H:%M")
    ))
}

/// ## Summary
/// Cuts a body longer than the SMS budget to fit, ending it with `...`.
/// Length is measured in characters, not bytes.
#[must_use]
pub fn truncate_body(body: String) -> String {
    if body.chars().count() <= SMS_BODY_MAX_CHARS {
        return body;
    }

    let keep = SMS_BODY_MAX_CHARS - ELLIPSIS.len();
    let mut cut: String = body.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local_time() -> DateTime<Tz> {
        chrono_tz::America::Argentina::Tucuman
            .with_ymd_and_hms(2025, 3, 7, 21, 5, 0)
            .single()
            .expect("valid local time")
    }

    #[test]
    fn body_contains_every_section() {
        let location = GeoPoint::new("San Martín 500", -26.83, -65.2).expect("valid point");
        let body = emergency_body(&EmergencyMessage {
            sender_name: "Ana",
            location: Some(&location),
            custom_text: Some("Estoy en la parada"),
            local_time: local_time(),
            signature: "App Acompañar - Tucumán",
        });

        assert!(body.starts_with("🚨 ALERTA DE EMERGENCIA 🚨\nAna necesita ayuda URGENTE.\n"));
        assert!(body.contains("\nEstoy en la parada\n"));
        assert!(body.contains("📍 UBICACIÓN:\nSan Martín 500\n"));
        assert!(body.contains("https://maps.google.com/?q=-26.83,-65.2"));
        assert!(body.contains("⏰ 07/03 21:05hs"));
        assert!(body.ends_with("App Acompañar - Tucumán"));
    }

    #[test]
    fn body_without_optional_parts() {
        let body = emergency_body(&EmergencyMessage {
            sender_name: "Un usuario",
            location: None,
            custom_text: Some("   "),
            local_time: local_time(),
            signature: "firma",
        });

        assert!(!body.contains("UBICACIÓN"));
        assert_eq!(
            body,
            "🚨 ALERTA DE EMERGENCIA 🚨\nUn usuario necesita ayuda URGENTE.\n\n⏰ 07/03 21:05hs\n\nfirma"
        );
    }

    #[test]
    fn long_bodies_are_cut_by_characters() {
        let body = "ñ".repeat(400);
        let cut = truncate_body(body);

        assert_eq!(cut.chars().count(), SMS_BODY_MAX_CHARS);
        assert!(cut.ends_with("..."));
        assert!(cut.starts_with("ñññ"));
    }

    #[test]
    fn short_bodies_are_untouched() {
        assert_eq!(truncate_body("hola".to_string()), "hola");
    }

    #[test]
    fn test_body_mentions_time() {
        let body = test_body(local_time(), "App Acompañar");
        assert!(body.contains("Hora: 21:05hs"));
    }
}
