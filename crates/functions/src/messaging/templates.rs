//! WhatsApp message texts (Spanish, the venue's language).

use skybox_core::api::{EventConfirmation, NewsletterConfirmation};

/// Greeting line, personalized when a name is known.
fn greeting(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("¡Hola {name}! 👋"),
        None => "¡Hola! 👋".to_string(),
    }
}

/// Registration confirmation for an event.
#[must_use]
pub fn event_confirmation(confirmation: &EventConfirmation) -> String {
    let mut lines = vec![
        greeting(Some(&confirmation.name)),
        String::new(),
        format!(
            "Gracias por registrarte al evento: *{}*.",
            confirmation.event_name
        ),
        format!("📅 Fecha: {}", confirmation.event_date),
    ];
    if let Some(time) = &confirmation.event_time {
        lines.push(format!("⏰ Hora: {time}"));
    }
    if let Some(location) = &confirmation.event_location {
        lines.push(format!("📍 Lugar: {location}"));
    }
    lines.extend([
        String::new(),
        "Te enviaremos recordatorios y novedades por WhatsApp.".to_string(),
        "¡Nos vemos en Skybox! 🍻".to_string(),
    ]);
    lines.join("\n")
}

/// Broadcast text wrapped in a greeting.
#[must_use]
pub fn broadcast(name: Option<&str>, message: &str) -> String {
    format!("{}\n\n{message}", greeting(name))
}

/// Post-event rating request.
#[must_use]
pub fn feedback_request(name: Option<&str>, event_title: &str, feedback_link: Option<&str>) -> String {
    let mut lines = vec![
        greeting(name),
        String::new(),
        format!("Esperamos que hayas disfrutado el evento: *{event_title}* 🎉"),
        String::new(),
        "¿Nos podrías calificar tu experiencia?".to_string(),
        "⭐ 1 - Muy mala".to_string(),
        "⭐⭐ 2 - Mala".to_string(),
        "⭐⭐⭐ 3 - Regular".to_string(),
        "⭐⭐⭐⭐ 4 - Buena".to_string(),
        "⭐⭐⭐⭐⭐ 5 - Excelente".to_string(),
    ];
    if let Some(link) = feedback_link {
        lines.push(String::new());
        lines.push(format!("O completa nuestra encuesta: {link}"));
    }
    lines.push(String::new());
    lines.push("¡Gracias por ser parte de Skybox! 🍻".to_string());
    lines.join("\n")
}

/// Newsletter welcome.
#[must_use]
pub fn newsletter_welcome(signup: &NewsletterConfirmation) -> String {
    format!(
        "{}\n\n\
         Gracias por suscribirte al newsletter de Skybox Medellín.\n\n\
         Recibirás actualizaciones sobre:\n\
         ✅ Próximos eventos deportivos\n\
         🎉 Ofertas exclusivas\n\
         📺 Horarios de partidos\n\n\
         ¡Nos vemos en Skybox! 🍻",
        greeting(Some(&signup.name))
    )
}
