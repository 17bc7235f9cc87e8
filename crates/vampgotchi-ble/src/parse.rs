// ── Tool output parsing ──
//
// BLEeding prints one human-oriented line per discovered device, and the
// exact wording drifts between versions. The parser is deliberately
// tolerant: anything that carries a MAC-shaped token is a device, anything
// else is skipped and counted.

/// Length of a `XX:XX:XX:XX:XX:XX` token.
const MAC_LEN: usize = 17;

/// Characters that end a `name: ...` capture.
const NAME_TERMINATORS: &[char] = &[',', ';', '|', '(', '[', '\t'];

/// One device line as printed by the tool, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDevice {
    /// MAC exactly as it appeared (case and separator untouched).
    pub address: String,
    pub name: Option<String>,
    pub rssi: Option<i32>,
}

/// Result of parsing a complete scan transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedScan {
    /// Devices in the order their lines appeared (duplicates preserved).
    pub devices: Vec<RawDevice>,
    /// Non-empty lines that did not contain a device.
    pub skipped: usize,
}

/// Parse the full stdout of a scan run.
pub fn parse_scan_output(stdout: &str) -> ParsedScan {
    let mut parsed = ParsedScan::default();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_line(line) {
            Some(device) => parsed.devices.push(device),
            None => parsed.skipped += 1,
        }
    }
    parsed
}

/// Parse a single line. Returns `None` when the line has no MAC address.
pub fn parse_line(line: &str) -> Option<RawDevice> {
    let (mac_start, address) = find_mac(line)?;
    let lower = line.to_ascii_lowercase();

    let rssi = number_after(&lower, "rssi")
        .or_else(|| number_before(&lower, "dbm"))
        .or_else(|| number_after(&lower, "signal"));

    let name = labelled_text(line, &lower, "name")
        .or_else(|| text_before_mac(line, mac_start))
        .or_else(|| labelled_text(line, &lower, "device"));

    Some(RawDevice {
        address: address.to_owned(),
        name,
        rssi,
    })
}

fn find_mac(line: &str) -> Option<(usize, &str)> {
    let start = line.as_bytes().windows(MAC_LEN).position(is_mac)?;
    // The window is pure ASCII, so these are char boundaries.
    line.get(start..start + MAC_LEN).map(|mac| (start, mac))
}

fn is_mac(window: &[u8]) -> bool {
    window.iter().enumerate().all(|(i, b)| {
        if i % 3 == 2 {
            *b == b':' || *b == b'-'
        } else {
            b.is_ascii_hexdigit()
        }
    })
}

/// `keyword` followed by separators (`:`, `=`, whitespace) then a signed integer.
fn number_after(lower: &str, keyword: &str) -> Option<i32> {
    let mut search_from = 0;
    while let Some(found) = lower.get(search_from..)?.find(keyword) {
        let after = search_from + found + keyword.len();
        let rest = lower.get(after..)?;
        let rest = rest.trim_start_matches([':', '=', ' ', '\t']);
        if let Some(value) = leading_int(rest) {
            return Some(value);
        }
        search_from = after;
    }
    None
}

/// A signed integer immediately preceding `unit` (whitespace allowed between).
fn number_before(lower: &str, unit: &str) -> Option<i32> {
    let idx = lower.find(unit)?;
    let head = lower.get(..idx)?.trim_end();
    let digits_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    let start = if head.get(..digits_start)?.ends_with('-') {
        digits_start - 1
    } else {
        digits_start
    };
    head.get(start..)?.parse().ok()
}

fn leading_int(s: &str) -> Option<i32> {
    let sign_len = usize::from(s.starts_with('-'));
    let digits = s
        .get(sign_len..)?
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s.get(..sign_len + digits)?.parse().ok()
}

/// `label[:\s]+value` up to the next terminator; case-insensitive label.
fn labelled_text(line: &str, lower: &str, label: &str) -> Option<String> {
    let idx = lower.find(label)?;
    let rest = line.get(idx + label.len()..)?;
    // The label must be followed by a separator, otherwise "named" or
    // "devices" would match.
    if !rest.starts_with([':', ' ', '=']) {
        return None;
    }
    let rest = rest.trim_start_matches([':', '=', ' ']);
    let value = rest.split(NAME_TERMINATORS).next()?.trim();
    let value = match find_mac(value) {
        Some((mac_at, _)) => value.get(..mac_at)?.trim(),
        None => value,
    };
    non_empty(value)
}

/// Trailing run of name-like characters right before the MAC.
fn text_before_mac(line: &str, mac_start: usize) -> Option<String> {
    let head = line.get(..mac_start)?.trim_end();
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .last()
        .map(|(i, _)| i)?;
    let candidate = head.get(start..)?.trim();
    if candidate.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return None;
    }
    non_empty(candidate)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_owned())
}
