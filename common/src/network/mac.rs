use pnet::util::MacAddr;

use crate::error::MacParseError;

const MAC_HEX_DIGITS: usize = 12;

/// Parses a hardware address written in one of the common notations.
///
/// Accepted forms (case-insensitive):
/// * `aa:bb:cc:dd:ee:ff` or `aa-bb-cc-dd-ee-ff`
/// * `aabb.ccdd.eeff`
/// * `aabbccddeeff`
pub fn parse_mac(input: &str) -> Result<MacAddr, MacParseError> {
    let trimmed: &str = input.trim();
    let digits: String = match separator_of(trimmed) {
        Some(sep) => split_groups(trimmed, sep)?,
        None => trimmed.to_string(),
    };

    if digits.len() != MAC_HEX_DIGITS || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MacParseError(input.to_string()));
    }

    let mut octets = [0u8; 6];
    for (idx, octet) in octets.iter_mut().enumerate() {
        let pair: &str = &digits[idx * 2..idx * 2 + 2];
        *octet = u8::from_str_radix(pair, 16).map_err(|_| MacParseError(input.to_string()))?;
    }
    let [a, b, c, d, e, f] = octets;
    Ok(MacAddr::new(a, b, c, d, e, f))
}

fn separator_of(s: &str) -> Option<char> {
    [':', '-', '.'].into_iter().find(|sep| s.contains(*sep))
}

/// Joins the groups of a separated address after checking that the
/// group layout matches the separator.
fn split_groups(s: &str, sep: char) -> Result<String, MacParseError> {
    let groups: Vec<&str> = s.split(sep).collect();
    let (count, width) = match sep {
        '.' => (3, 4),
        _ => (6, 2),
    };
    if groups.len() != count || groups.iter().any(|g| g.len() != width) {
        return Err(MacParseError(s.to_string()));
    }
    Ok(groups.concat())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
