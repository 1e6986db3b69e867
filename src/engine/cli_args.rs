use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Arguments the task sets itself; user-provided ones with these prefixes are dropped.
const RESERVED_ARG_PREFIXES: [&str; 6] = [
    "--help",
    "--version",
    "--view",
    "--output=",
    "--output-path=",
    "--chrome-flags=",
];

const DEFAULT_CHROME_FLAGS: [&str; 1] = ["--headless"];

const CHROME_FLAG_PATTERN: &str = r"(?i)^--[a-z0-9]+(-[a-z0-9]+)*(=\S*)?$";

/// Splits free-form Lighthouse arguments into tokens, one or more per line,
/// dropping arguments that would conflict with the task's own output settings.
pub fn sanitize_args(raw: &str) -> Vec<String> {
    tokens(raw)
        .filter(|token| {
            !RESERVED_ARG_PREFIXES
                .iter()
                .any(|prefix| token.starts_with(prefix))
        })
        .map(ToOwned::to_owned)
        .collect()
}

/// Returns the Chrome flags to pass to Lighthouse: the defaults first, then
/// well-formed user flags in input order, without duplicates.
pub fn sanitize_chrome_flags(raw: &str) -> Vec<String> {
    let mut flags: Vec<String> = DEFAULT_CHROME_FLAGS.iter().map(|flag| flag.to_string()).collect();
    for token in tokens(raw) {
        if !chrome_flag_regex().is_match(token) {
            continue;
        }
        if flags.iter().any(|existing| existing == token) {
            continue;
        }
        flags.push(token.to_string());
    }
    flags
}

/// Builds the full Lighthouse argument vector for `url`.
///
/// `output_base` is the report path without the `.report.<ext>` suffix that
/// Lighthouse appends per output format.
pub fn lighthouse_args(
    url: &str,
    user_args: &[String],
    chrome_flags: &[String],
    output_base: &Path,
) -> Vec<String> {
    let mut args = Vec::with_capacity(user_args.len() + 5);
    args.push(url.to_string());
    args.extend(user_args.iter().cloned());
    args.push("--output=html".to_string());
    args.push("--output=json".to_string());
    args.push(format!("--output-path={}", output_base.display()));
    args.push(format!("--chrome-flags={}", chrome_flags.join(" ")));
    args
}

fn tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().flat_map(str::split_whitespace)
}

fn chrome_flag_regex() -> &'static Regex {
    static CHROME_FLAG_RE: OnceLock<Regex> = OnceLock::new();
    CHROME_FLAG_RE.get_or_init(|| {
        Regex::new(CHROME_FLAG_PATTERN)
            .unwrap_or_else(|err| panic!("invalid chrome flag regex: {err}"))
    })
}
