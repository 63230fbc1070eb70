/*!
 * Language utilities for the codes passed to translation backends.
 *
 * Codes are ISO 639-1 (2-letter) or ISO 639-2/T (3-letter) primary subtags,
 * optionally followed by a region or script subtag (`zh-TW`, `fr-CA`).
 * The source language may also be `auto` to let the backend detect it.
 */

use anyhow::{anyhow, Result};
use isolang::Language;

/// Marker for automatic source language detection
pub const AUTO_DETECT: &str = "auto";

/// Primary language subtag of a code (`pt` for `pt-BR`)
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Look up the language of a code's primary subtag
pub fn parse_language(code: &str) -> Result<Language> {
    let primary = primary_subtag(code);

    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    };
    let language = language.ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    // Region/script subtags are 2-4 alphanumeric characters
    for subtag in code.trim().split(['-', '_']).skip(1) {
        if !(2..=4).contains(&subtag.len()) || !subtag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!("Invalid language code: {}", code));
        }
    }

    Ok(language)
}

/// Validate a source language code (`auto` allowed)
pub fn validate_source_language(code: &str) -> Result<()> {
    if code.trim().eq_ignore_ascii_case(AUTO_DETECT) {
        return Ok(());
    }
    parse_language(code).map(|_| ())
}

/// Validate a target language code
pub fn validate_target_language(code: &str) -> Result<()> {
    if code.trim().eq_ignore_ascii_case(AUTO_DETECT) {
        return Err(anyhow!("Target language cannot be '{}'", AUTO_DETECT));
    }
    parse_language(code).map(|_| ())
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    if code.trim().eq_ignore_ascii_case(AUTO_DETECT) {
        return Ok("Auto-detected".to_string());
    }
    Ok(parse_language(code)?.to_name().to_string())
}
