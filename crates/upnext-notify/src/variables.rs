//! Episode display variables for template rendering.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use minijinja::value::Value;
use num2words::Num2Words;

use upnext_sonarr::Episode;

/// Build the flat variable mapping templates render against.
///
/// Pure: a fixed episode and timezone always produce the same mapping.
/// Cross-reference URLs are omitted entirely when the source identifier is
/// absent (Sonarr reports 0, or an empty string for IMDB, when it has no
/// mapping), so templates can probe them with `{% if tvdb_url %}`.
pub fn build_variables(episode: &Episode, timezone: Tz) -> BTreeMap<String, Value> {
    let mut vars = BTreeMap::new();

    vars.insert("title".to_string(), Value::from(episode.title.as_str()));
    vars.insert(
        "show_name".to_string(),
        Value::from(episode.series.title.as_str()),
    );
    vars.insert("runtime".to_string(), Value::from(episode.runtime));
    if let Some(network) = &episode.series.network {
        vars.insert("network".to_string(), Value::from(network.as_str()));
    }

    insert_number_forms(&mut vars, "episode", episode.episode_number);
    insert_number_forms(&mut vars, "season", episode.season_number);

    if let Some(id) = episode.series.tvdb_id.filter(|id| *id != 0) {
        vars.insert(
            "tvdb_url".to_string(),
            Value::from(format!("https://thetvdb.com/?tab=series&id={id}")),
        );
    }
    if let Some(id) = episode.series.tmdb_id.filter(|id| *id != 0) {
        vars.insert(
            "tmdb_url".to_string(),
            Value::from(format!("https://themoviedb.org/tv/{id}")),
        );
    }
    if let Some(id) = episode.series.imdb_id.as_deref().filter(|id| !id.is_empty()) {
        vars.insert(
            "imdb_url".to_string(),
            Value::from(format!("https://imdb.com/title/{id}")),
        );
    }

    if let Some(air_date_utc) = episode.air_date_utc {
        let air_date = air_date_utc.with_timezone(&timezone);
        vars.insert("air_date".to_string(), Value::from(air_date.to_rfc3339()));
        vars.insert(
            "air_date_utc".to_string(),
            Value::from(air_date_utc.to_rfc3339()),
        );
        vars.insert(
            "air_date_timestamp".to_string(),
            Value::from(air_date_utc.timestamp()),
        );
    }

    vars
}

/// Insert `<prefix>_num`, `_num_00`, `_num_word`, `_ordinal`, and
/// `_ordinal_word` for a season or episode number.
fn insert_number_forms(vars: &mut BTreeMap<String, Value>, prefix: &str, n: i32) {
    vars.insert(format!("{prefix}_num"), Value::from(n));
    vars.insert(format!("{prefix}_num_00"), Value::from(format!("{n:02}")));
    vars.insert(format!("{prefix}_num_word"), Value::from(cardinal_words(n)));
    vars.insert(format!("{prefix}_ordinal"), Value::from(ordinal_suffixed(n)));
    vars.insert(
        format!("{prefix}_ordinal_word"),
        Value::from(ordinal_words(n)),
    );
}

/// "1" -> "one". Falls back to digits when the conversion fails.
fn cardinal_words(n: i32) -> String {
    Num2Words::new(i64::from(n))
        .to_words()
        .unwrap_or_else(|_| n.to_string())
}

/// "1" -> "first".
fn ordinal_words(n: i32) -> String {
    Num2Words::new(i64::from(n))
        .ordinal()
        .to_words()
        .unwrap_or_else(|_| n.to_string())
}

/// "1" -> "1st".
fn ordinal_suffixed(n: i32) -> String {
    Num2Words::new(i64::from(n))
        .ordinal_num()
        .to_words()
        .unwrap_or_else(|_| n.to_string())
}
