//! Human-friendly terminal output for a weather record.

use chrono::{DateTime, Local};
use scrapecast_core::WeatherRecord;
use std::time::Duration;

pub fn condition_icon(condition: &str) -> &'static str {
    let condition = condition.to_lowercase();
    if condition.contains("sun") {
        "☀️"
    } else if condition.contains("cloud") {
        "☁️"
    } else if condition.contains("rain") {
        "🌧️"
    } else if condition.contains("snow") {
        "❄️"
    } else {
        "🌤️"
    }
}

pub fn format_report(record: &WeatherRecord, elapsed: Duration, fetched_at: DateTime<Local>) -> String {
    let usage = record.usage.clone().unwrap_or_default();

    format!(
        "{icon} Weather in {location}\n\
         \x20 Temperature:  {temperature}\n\
         \x20 Humidity:     {humidity}\n\
         \x20 Air Quality:  {air_quality}\n\
         \x20 Condition:    {condition}\n\
         \n\
         📊 Usage & Performance ({at})\n\
         \x20 Response Time:      {elapsed:.2}s\n\
         \x20 Prompt Tokens:      {prompt}\n\
         \x20 Completion Tokens:  {completion}\n\
         \x20 Total Tokens:       {total}\n",
        icon = condition_icon(&record.condition),
        location = record.location,
        temperature = record.temperature,
        humidity = record.humidity,
        air_quality = record.air_quality,
        condition = record.condition,
        at = fetched_at.format("%Y-%m-%d %H:%M:%S"),
        elapsed = elapsed.as_secs_f64(),
        prompt = usage.prompt_tokens,
        completion = usage.completion_tokens,
        total = usage.total_tokens,
    )
}
