pub const SYSTEM_PROMPT: &str = "You are a weather data extractor.";

/// Upper bound on page text embedded in a prompt, in characters.
pub const MAX_CONTEXT_CHARS: usize = 4000;

/// Renders the extraction instruction for `location` around `context`.
pub fn build_prompt(location: &str, context: &str) -> String {
    let context = truncate_chars(context, MAX_CONTEXT_CHARS);

    format!(
        "Given the text from a web search for weather in {location}, extract this info:\n\
         \n\
         - location\n\
         - temperature (include unit)\n\
         - humidity (%)\n\
         - air_quality (e.g., Good, Moderate, Poor)\n\
         - condition (e.g., Sunny, Rainy, Cloudy)\n\
         \n\
         Only respond with a valid JSON object with exactly these keys: \
         location, temperature, humidity, air_quality, condition.\n\
         \n\
         Search result text:\n\
         \n\
         ```\n\
         {context}\n\
         ```\n"
    )
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
