//! Go module version rules
//!
//! Go module versions are semantic versions with a mandatory `v` prefix.
//! `v1` and `v1.2` are accepted shorthands for `v1.0.0` and `v1.2.0`.
//! The only build suffix that survives canonicalisation is `+incompatible`.

use semver::{BuildMetadata, Prerelease};

const INCOMPATIBLE: &str = "incompatible";

/// A module version split into its parts. Numeric components stay as digit
/// strings, so majors wider than 64 bits are still valid.
struct ParsedVersion<'a> {
    major: &'a str,
    minor: &'a str,
    patch: &'a str,
    pre: Prerelease,
    build: BuildMetadata,
}

impl<'a> ParsedVersion<'a> {
    fn release(major: &'a str, minor: &'a str, patch: &'a str) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
        }
    }
}

/// Parses a module version. Shorthand forms cannot carry pre-release or
/// build metadata.
fn parse(v: &str) -> Option<ParsedVersion<'_>> {
    let rest = v.strip_prefix('v')?;
    let (major, rest) = take_number(rest)?;
    if rest.is_empty() {
        return Some(ParsedVersion::release(major, "0", "0"));
    }
    let (minor, rest) = take_number(rest.strip_prefix('.')?)?;
    if rest.is_empty() {
        return Some(ParsedVersion::release(major, minor, "0"));
    }
    let (patch, rest) = take_number(rest.strip_prefix('.')?)?;

    let (rest, build) = match rest.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (rest, None),
    };
    let pre = match rest.strip_prefix('-') {
        Some("") => return None,
        Some(pre) => Prerelease::new(pre).ok()?,
        None if rest.is_empty() => Prerelease::EMPTY,
        None => return None,
    };
    let build = match build {
        Some("") => return None,
        Some(build) => BuildMetadata::new(build).ok()?,
        None => BuildMetadata::EMPTY,
    };

    Some(ParsedVersion {
        major,
        minor,
        patch,
        pre,
        build,
    })
}

/// Splits a leading decimal number without redundant leading zeros off `s`.
fn take_number(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, rest) = s.split_at(end);
    let well_formed = !digits.is_empty() && (digits == "0" || !digits.starts_with('0'));
    well_formed.then_some((digits, rest))
}

/// Reports whether `v` is a syntactically valid module version.
pub fn is_valid(v: &str) -> bool {
    parse(v).is_some()
}

/// Returns the canonical form of a module version, or `None` if it is invalid.
///
/// Missing minor and patch components are filled with zero and build
/// metadata is dropped, except for `+incompatible`.
///
/// ```
/// use depver::modfile::version::canonical_version;
///
/// assert_eq!(canonical_version("v1.2").as_deref(), Some("v1.2.0"));
/// assert_eq!(canonical_version("v1.2.3-rc.1+meta").as_deref(), Some("v1.2.3-rc.1"));
/// assert_eq!(canonical_version("v2.0.0+incompatible").as_deref(), Some("v2.0.0+incompatible"));
/// assert_eq!(canonical_version("1.2.3"), None);
/// ```
pub fn canonical_version(v: &str) -> Option<String> {
    let parsed = parse(v)?;
    let mut canonical = format!("v{}.{}.{}", parsed.major, parsed.minor, parsed.patch);
    if !parsed.pre.is_empty() {
        canonical.push('-');
        canonical.push_str(parsed.pre.as_str());
    }
    if parsed.build.as_str() == INCOMPATIBLE {
        canonical.push('+');
        canonical.push_str(INCOMPATIBLE);
    }
    Some(canonical)
}

/// Major version prefix such as `v2`, or `None` for invalid versions.
pub fn major(v: &str) -> Option<String> {
    parse(v).map(|parsed| format!("v{}", parsed.major))
}

fn is_incompatible(v: &str) -> bool {
    parse(v).is_some_and(|parsed| parsed.build.as_str() == INCOMPATIBLE)
}

/// Splits a module path into its prefix and major-version suffix.
///
/// `example.com/m/v2` yields `("example.com/m", "/v2")`, `gopkg.in/yaml.v3`
/// yields `("gopkg.in/yaml", ".v3")`, and a path without a suffix yields an
/// empty suffix. Returns `None` for malformed suffixes like `/v1` or `/v0`.
pub fn split_path_version(path: &str) -> Option<(&str, &str)> {
    if path.starts_with("gopkg.in/") {
        return split_gopkg_in(path);
    }

    let bytes = path.as_bytes();
    let mut i = bytes.len();
    let mut dot = false;
    while i > 0 && (bytes[i - 1].is_ascii_digit() || bytes[i - 1] == b'.') {
        if bytes[i - 1] == b'.' {
            dot = true;
        }
        i -= 1;
    }
    if i <= 1 || i == bytes.len() || bytes[i - 1] != b'v' || bytes[i - 2] != b'/' {
        return Some((path, ""));
    }

    let (prefix, path_major) = path.split_at(i - 2);
    if dot || path_major.len() <= 2 || path_major.as_bytes()[2] == b'0' || path_major == "/v1" {
        return None;
    }
    Some((prefix, path_major))
}

fn split_gopkg_in(path: &str) -> Option<(&str, &str)> {
    let bytes = path.as_bytes();
    let mut i = bytes.len();
    if path.ends_with("-unstable") {
        i -= "-unstable".len();
    }
    while i > 0 && bytes[i - 1].is_ascii_digit() {
        i -= 1;
    }
    if i <= 1 || bytes[i - 1] != b'v' || bytes[i - 2] != b'.' {
        return None;
    }

    let (prefix, path_major) = path.split_at(i - 2);
    if path_major.len() <= 2 || (path_major.as_bytes()[2] == b'0' && path_major != ".v0") {
        return None;
    }
    Some((prefix, path_major))
}

/// Checks that version `v` is allowed for a path with major suffix
/// `path_major`, returning a description of the mismatch otherwise.
pub fn check_path_major(v: &str, path_major: &str) -> Result<(), String> {
    if path_major.starts_with(".v") && path_major.ends_with("-unstable") {
        return Ok(());
    }
    if v.starts_with("v0.0.0-") && path_major == ".v1" {
        // Early pseudo-versions for gopkg.in .v1 paths used v0.0.0
        return Ok(());
    }
    if match_path_major(v, path_major) {
        return Ok(());
    }

    let expected = match path_major {
        "" => "v0 or v1",
        p => p.get(1..).unwrap_or(p),
    };
    let found = major(v).unwrap_or_default();
    Err(format!("should be {expected}, not {found}"))
}

fn match_path_major(v: &str, path_major: &str) -> bool {
    let Some(found) = major(v) else {
        return false;
    };
    if path_major.is_empty() {
        return found == "v0" || found == "v1" || is_incompatible(v);
    }
    (path_major.starts_with('/') || path_major.starts_with('.')) && found == path_major[1..]
}

/// Reports whether a replacement target is a filesystem path rather than
/// a module path.
pub fn is_directory_path(ns: &str) -> bool {
    let bytes = ns.as_bytes();
    ns == "."
        || ns.starts_with("./")
        || ns.starts_with(".\\")
        || ns == ".."
        || ns.starts_with("../")
        || ns.starts_with("..\\")
        || ns.starts_with('/')
        || ns.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}
