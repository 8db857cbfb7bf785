use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MEM_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

/// Left-aligns `s` in a field of `width` display cells, truncating if needed.
pub fn pad_unicode(s: &str, width: usize) -> String {
    let text = if s.width() > width {
        truncate_unicode(s, width)
    } else {
        s.to_string()
    };
    let pad = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(pad))
}

/// Scales `value` (expressed in `unit`) up through `B KB MB GB TB` while it
/// exceeds 10000. Unknown units are returned unchanged.
pub fn format_memory(value: f64, unit: &str) -> String {
    let upper = unit.to_uppercase();
    let Some(mut index) = MEM_UNITS.iter().position(|u| *u == upper) else {
        return format!("{value} {unit}");
    };
    let mut value = value;
    while value > 10000.0 && index < MEM_UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", MEM_UNITS[index])
}

pub fn format_bytes(bytes: u64) -> String {
    format_memory(bytes as f64, "B")
}

/// Formats a `"<number> <unit>"` pair such as a meminfo value (`"16314188 kB"`).
/// Anything else is passed through.
pub fn format_memory_str(raw: &str) -> String {
    let mut parts = raw.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(number), Some(unit), None) => match number.parse::<f64>() {
            Ok(value) if MEM_UNITS.contains(&unit.to_uppercase().as_str()) => {
                format_memory(value, unit)
            }
            _ => raw.to_string(),
        },
        _ => raw.to_string(),
    }
}

/// `HH:MM[:SS]` with hours wrapped to a single day.
pub fn format_clock(seconds: f64, include_seconds: bool) -> String {
    let total = seconds.max(0.0) as u64;
    let secs = total % 60;
    let minutes = (total / 60) % 60;
    let hours = (total / 3600) % 24;
    if include_seconds {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{hours:02}:{minutes:02}")
    }
}

pub fn format_uptime(seconds: f64) -> String {
    let days = (seconds.max(0.0) as u64) / 86_400;
    let clock = format_clock(seconds, true);
    if days > 0 {
        format!("{days}d {clock}")
    } else {
        clock
    }
}

pub fn partition<T: Clone>(items: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    if chunk_size == 0 {
        return Vec::new();
    }
    items.chunks(chunk_size).map(|c| c.to_vec()).collect()
}
