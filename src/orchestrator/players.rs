// Parser for the console `list` command output.

const MARKER: &str = "players online:";

/// Extracts player names from `list` output.
///
/// Anything that does not carry the marker yields an empty list. Names are
/// comma separated after the marker; blanks are dropped.
pub fn parse_player_list(output: &str) -> Vec<String> {
    let Some(pos) = output.find(MARKER) else {
        return Vec::new();
    };

    let tail = output[pos + MARKER.len()..].trim();
    if tail.is_empty() {
        return Vec::new();
    }

    tail.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
