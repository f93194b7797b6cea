//! Canned and formatted assistant replies.

use chef_core::Intent;
use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};

use crate::collaborator::{GeoLocation, WeatherReport};

pub const OFFLINE: &str =
    "Parece que você está offline. Verifique sua conexão e tente novamente.";

pub const GENERATIVE_ERROR: &str =
    "Desculpe, ocorreu um erro ao processar sua mensagem. Tente novamente mais tarde.";

pub const EMPTY_MESSAGE: &str = "Digite uma mensagem para começarmos a conversa.";

const ASK_CITY_WEATHER: &str =
    "Para te informar sobre o clima, preciso saber em qual cidade você mora. Pode me dizer?";

const ASK_CITY_DATE_TIME: &str =
    "Para te informar a hora correta, preciso saber em qual cidade você mora. Pode me dizer?";

const COLD_SUGGESTION: &str = "Com esse clima mais frio, que tal preparar um caldo quentinho? Posso te sugerir uma sopa reconfortante ou um feijão tropeiro bem temperado.";
const MILD_SUGGESTION: &str =
    "O clima está agradável! Que tal um risoto cremoso ou uma massa com molho ao sugo?";
const HOT_SUGGESTION: &str = "Com esse calor, que tal uma salada refrescante ou um ceviche? Posso te ajudar a preparar algo leve e saboroso.";

const RAIN_SUFFIX: &str = " E já que está chovendo, podemos fazer algo que aqueça o coração.";
const SUN_SUFFIX: &str = " Com esse sol, podemos preparar algo que combine com um dia bonito.";

const CLOSING: &str = "Me diga se você tem alguma restrição alimentar ou ingredientes específicos em casa, e eu posso te dar sugestões mais personalizadas!";

const WEEKDAYS: [&str; 7] = [
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
    "domingo",
];

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Prompt asking which city the user is in.
pub fn ask_for_city(intent: Intent) -> &'static str {
    match intent {
        Intent::DateTime => ASK_CITY_DATE_TIME,
        _ => ASK_CITY_WEATHER,
    }
}

/// Reply when geocoding or the weather call failed for `city`.
pub fn city_lookup_failed(city: &str, intent: Intent) -> String {
    match intent {
        Intent::DateTime => format!(
            "Não foi possível obter a data e hora para {}. Verifique se o nome da cidade está correto.",
            city
        ),
        _ => format!(
            "Não foi possível obter informações do clima para {}. Verifique se o nome da cidade está correto.",
            city
        ),
    }
}

pub fn message_too_long(max_chars: usize) -> String {
    format!(
        "Sua mensagem é muito longa. Tente resumir em até {} caracteres.",
        max_chars
    )
}

/// Recipe suggestion for a rounded temperature: below 15, below 25, or hotter.
pub fn recipe_suggestion(temperature: i64, description: &str) -> String {
    let mut suggestion = if temperature < 15 {
        COLD_SUGGESTION
    } else if temperature < 25 {
        MILD_SUGGESTION
    } else {
        HOT_SUGGESTION
    }
    .to_string();

    let description = description.to_lowercase();
    if description.contains("chuva") || description.contains("nublado") {
        suggestion.push_str(RAIN_SUFFIX);
    } else if description.contains("ensolarado") || description.contains("céu limpo") {
        suggestion.push_str(SUN_SUFFIX);
    }
    suggestion
}

/// Current weather with a matching recipe idea.
pub fn weather_reply(location: &GeoLocation, report: &WeatherReport) -> String {
    let temperature = report.temperature_c.round() as i64;
    format!(
        "Em {}, {}, a temperatura atual é de {}°C, {}. Umidade do ar: {}%.\n\n{}\n\n{}",
        location.name,
        location.country,
        temperature,
        report.description,
        report.humidity,
        recipe_suggestion(temperature, &report.description),
        CLOSING
    )
}

/// Local date and time at `location`, given its UTC offset.
pub fn date_time_reply(location: &GeoLocation, offset_secs: i32, now: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(offset_secs).unwrap_or(Utc.fix());
    let local = now.with_timezone(&offset);

    let weekday = WEEKDAYS[local.weekday().num_days_from_monday() as usize];
    let month = MONTHS[local.month0() as usize];
    let clock = format!(
        "{:02}:{:02}:{:02}",
        local.hour(),
        local.minute(),
        local.second()
    );

    format!(
        "Em {}, {}:\n\n📅 Data: {}, {} de {} de {}\n⏰ Horário: {}\n🌍 Fuso Horário: {}\n\nAgora são {:02}/{:02}/{} {} no fuso horário local.",
        location.name,
        location.country,
        weekday,
        local.day(),
        month,
        local.year(),
        clock,
        format_utc_offset(offset.local_minus_utc()),
        local.day(),
        local.month(),
        local.year(),
        clock
    )
}

/// `UTC+H:MM` / `UTC-H:MM`.
pub fn format_utc_offset(offset_secs: i32) -> String {
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let total_minutes = offset_secs.unsigned_abs() / 60;
    format!("UTC{}{}:{:02}", sign, total_minutes / 60, total_minutes % 60)
}
