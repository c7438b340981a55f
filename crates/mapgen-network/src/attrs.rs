//! Way attribute parsing with warn-and-recover semantics.
//!
//! Survey tags are free-text and frequently malformed.  Every parser here
//! recovers locally: a value that does not parse logs a warning and comes
//! back as `None` ("unknown"), never an error.

/// Split a `ref` tag (`"I 80;US 101"`) into separate refs.
pub fn parse_refs(value: Option<&str>) -> Option<Vec<String>> {
    value.map(|v| v.split(';').map(|s| s.trim().to_string()).collect())
}

/// Parse a lane count from `lanes`, falling back to
/// `lanes:forward` + `lanes:backward`.
///
/// Semicolon-separated counts are summed (`"2;2"` → 4).
pub fn parse_lanes(
    lanes: Option<&str>,
    forward: Option<&str>,
    backward: Option<&str>,
) -> Option<u32> {
    let combined;
    let value: &str = match lanes {
        Some(v) => v,
        None => match (forward, backward) {
            // slightly hacky, but the summing path below does the trick
            (Some(f), Some(b)) => {
                combined = format!("{f};{b}");
                combined.as_str()
            }
            _ => return None,
        },
    };

    let mut total: u32 = 0;
    for part in value.split(';') {
        match part.trim().parse::<u32>() {
            Ok(n) => total += n,
            Err(_) => {
                log::warn!("failed to parse lanes: '{value}'");
                return None;
            }
        }
    }
    if total > 0 {
        Some(total)
    } else {
        log::warn!("failed to parse lanes: '{value}'");
        None
    }
}

/// Parse a speed value into whole meters per second.
///
/// A bare number is km/h per convention; `mph` and `km/h`/`kmh` suffixes
/// are understood.  Returns `None` (with a warning) on anything else.
pub fn parse_speed(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let (number, to_mps) = if let Some(v) = trimmed.strip_suffix("mph") {
        (v, 0.44704)
    } else if let Some(v) = trimmed.strip_suffix("km/h") {
        (v, 1.0 / 3.6)
    } else if let Some(v) = trimmed.strip_suffix("kmh") {
        (v, 1.0 / 3.6)
    } else {
        (trimmed, 1.0 / 3.6)
    };

    match number.trim().parse::<f64>() {
        Ok(n) if n > 0.0 => Some((n * to_mps).round() as u32),
        _ => {
            log::warn!("failed to parse speed: '{value}'");
            None
        }
    }
}

/// Parse a `maxspeed` tag into m/s, recovering to `None` when absent or
/// malformed.
pub fn parse_speed_limit(maxspeed: Option<&str>) -> Option<u32> {
    maxspeed.and_then(parse_speed)
}

/// Whether a way should be treated as one-way.
///
/// Motorways are implicitly one-way unless tagged otherwise (or carrying
/// explicit per-direction lane counts); everything else defaults to
/// bidirectional.
pub fn is_oneway(highway: &str, oneway: Option<&str>, has_lane_directions: bool) -> bool {
    if highway == "motorway" {
        let denied = matches!(
            oneway.map(str::to_lowercase).as_deref(),
            Some("no") | Some("false") | Some("0")
        );
        !denied && !has_lane_directions
    } else {
        matches!(
            oneway.map(str::to_lowercase).as_deref(),
            Some("yes") | Some("true") | Some("1")
        )
    }
}
