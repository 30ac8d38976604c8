//! Format validators.
//!
//! Formats apply to strings only; non-string instances always pass, per the
//! specification. Whether `format` asserts or merely annotates is decided
//! at compile time from the dialect and the compiler toggles.

use serde_json::Value;
use url::Url;

use crate::error::BoxError;

/// A named format validator.
#[derive(Clone)]
pub struct Format {
    pub name: String,
    pub func: fn(&Value) -> Result<(), BoxError>,
}

impl std::fmt::Debug for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Format").field("name", &self.name).finish()
    }
}

pub(crate) fn builtin_formats() -> Vec<Format> {
    let fmt = |name: &str, func| Format {
        name: name.to_string(),
        func,
    };
    vec![
        fmt("regex", validate_regex),
        fmt("ipv4", validate_ipv4),
        fmt("ipv6", validate_ipv6),
        fmt("hostname", validate_hostname_value),
        fmt("email", validate_email_value),
        fmt("date", validate_date_value),
        fmt("time", validate_time_value),
        fmt("date-time", validate_datetime_value),
        fmt("duration", validate_duration_value),
        fmt("period", validate_period_value),
        fmt("json-pointer", validate_json_pointer_value),
        fmt("relative-json-pointer", validate_relative_json_pointer),
        fmt("uuid", validate_uuid),
        fmt("uri", validate_uri_value),
        fmt("uri-reference", validate_uri_reference_value),
        fmt("uri-template", validate_uri_template),
        fmt("iri", validate_iri),
        fmt("iri-reference", validate_iri_reference),
    ]
}

macro_rules! bail {
    ($($arg:tt)*) => {
        return Err(format!($($arg)*).into())
    };
}

fn str_of(v: &Value) -> Option<&str> {
    v.as_str()
}

fn validate_regex(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    regex::Regex::new(s)?;
    Ok(())
}

fn validate_ipv4(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    s.parse::<std::net::Ipv4Addr>()?;
    Ok(())
}

fn validate_ipv6(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    s.parse::<std::net::Ipv6Addr>()?;
    Ok(())
}

fn validate_hostname_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_hostname(s)
}

fn validate_hostname(s: &str) -> Result<(), BoxError> {
    if s.is_empty() || s.len() > 253 {
        bail!("hostname length must be 1..=253");
    }
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            bail!("label length must be 1..=63");
        }
        if label.starts_with('-') || label.ends_with('-') {
            bail!("label must not begin or end with hyphen");
        }
        if let Some(c) = label.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            bail!("invalid character {c:?} in label");
        }
    }
    Ok(())
}

fn validate_email_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    let Some(at) = s.rfind('@') else {
        bail!("missing @");
    };
    let (local, domain) = (&s[..at], &s[at + 1..]);

    if local.starts_with('"') && local.ends_with('"') && local.len() >= 2 {
        // quoted-string local part: printable ascii, backslash escapes
        let inner = &local[1..local.len() - 1];
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if chars.next().is_none() {
                    bail!("trailing backslash in quoted local part");
                }
            } else if c == '"' || !(' '..='~').contains(&c) {
                bail!("invalid character in quoted local part");
            }
        }
    } else {
        if local.is_empty() || local.starts_with('.') || local.ends_with('.') || local.contains("..")
        {
            bail!("invalid dots in local part");
        }
        const ATEXT: &str = "!#$%&'*+-/=?^_`{|}~";
        if let Some(c) = local
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !ATEXT.contains(*c) && *c != '.')
        {
            bail!("invalid character {c:?} in local part");
        }
    }

    if domain.starts_with('[') && domain.ends_with(']') {
        let literal = &domain[1..domain.len() - 1];
        if let Some(v6) = literal.strip_prefix("IPv6:") {
            v6.parse::<std::net::Ipv6Addr>()?;
        } else {
            literal.parse::<std::net::Ipv4Addr>()?;
        }
        Ok(())
    } else {
        validate_hostname(domain)
    }
}

fn digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn validate_date_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_date(s)
}

fn validate_date(s: &str) -> Result<(), BoxError> {
    let b = s.as_bytes();
    if !s.is_ascii() || b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        bail!("date must be yyyy-mm-dd");
    }
    let (y, m, d) = (&s[..4], &s[5..7], &s[8..10]);
    if !digits(y) || !digits(m) || !digits(d) {
        bail!("date must be yyyy-mm-dd");
    }
    chrono::NaiveDate::from_ymd_opt(
        y.parse()?,
        m.parse()?,
        d.parse()?,
    )
    .ok_or("no such calendar date")?;
    Ok(())
}

fn validate_time_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_time(s)
}

fn validate_time(s: &str) -> Result<(), BoxError> {
    // partial-time
    let b = s.as_bytes();
    if !s.is_ascii() || b.len() < 9 || b[2] != b':' || b[5] != b':' {
        bail!("time must be hh:mm:ss with an offset");
    }
    let (hh, mm, ss) = (&s[..2], &s[3..5], &s[6..8]);
    if !digits(hh) || !digits(mm) || !digits(ss) {
        bail!("time must be hh:mm:ss with an offset");
    }
    let (h, m, sec): (u32, u32, u32) = (hh.parse()?, mm.parse()?, ss.parse()?);
    if h > 23 || m > 59 || sec > 60 {
        bail!("time components out of range");
    }

    let mut rest = &s[8..];
    if let Some(frac) = rest.strip_prefix('.') {
        let n = frac.bytes().take_while(|b| b.is_ascii_digit()).count();
        if n == 0 {
            bail!("empty fraction in time");
        }
        rest = &frac[n..];
    }

    // offset: Z or +hh:mm or -hh:mm
    let (off_minutes, negative) = match rest {
        "Z" | "z" => (0i32, false),
        _ => {
            let (sign, off) = match rest.as_bytes().first() {
                Some(b'+') => (false, &rest[1..]),
                Some(b'-') => (true, &rest[1..]),
                _ => bail!("missing time offset"),
            };
            let ob = off.as_bytes();
            if ob.len() != 5 || ob[2] != b':' || !digits(&off[..2]) || !digits(&off[3..]) {
                bail!("offset must be hh:mm");
            }
            let (oh, om): (i32, i32) = (off[..2].parse()?, off[3..].parse()?);
            if oh > 23 || om > 59 {
                bail!("offset components out of range");
            }
            (oh * 60 + om, sign)
        }
    };

    if sec == 60 {
        // leap seconds exist only at 23:59:60 UTC
        let mut utc = (h * 60 + m) as i32;
        if negative {
            utc += off_minutes;
        } else {
            utc -= off_minutes;
        }
        let utc = utc.rem_euclid(24 * 60);
        if utc != 23 * 60 + 59 {
            bail!("second 60 allowed only at 23:59Z");
        }
    }
    Ok(())
}

fn validate_datetime_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    let Some((date, time)) = s.split_once(['T', 't']) else {
        bail!("date-time must separate date and time with T");
    };
    validate_date(date)?;
    validate_time(time)
}

fn validate_duration_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_duration(s)
}

fn validate_duration(s: &str) -> Result<(), BoxError> {
    if !s.is_ascii() {
        bail!("duration must be ascii");
    }
    let Some(body) = s.strip_prefix('P') else {
        bail!("duration must start with P");
    };
    if body.is_empty() {
        bail!("empty duration");
    }
    if let Some(weeks) = body.strip_suffix('W') {
        if digits(weeks) {
            return Ok(());
        }
        bail!("invalid week duration");
    }
    let (date_part, time_part) = match body.find('T') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let count_units = |part: &str, units: &[char]| -> Result<usize, BoxError> {
        let mut rest = part;
        let mut allowed = units;
        let mut seen = 0;
        while !rest.is_empty() {
            let n = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
            if n == 0 {
                return Err("expected digits in duration".into());
            }
            let unit = rest[n..].chars().next().ok_or("missing duration unit")?;
            let pos = allowed
                .iter()
                .position(|u| *u == unit)
                .ok_or("misordered duration unit")?;
            allowed = &allowed[pos + 1..];
            rest = &rest[n + 1..];
            seen += 1;
        }
        Ok(seen)
    };
    let date_units = count_units(date_part, &['Y', 'M', 'D'])?;
    let time_units = match time_part {
        Some(tp) => {
            let n = count_units(tp, &['H', 'M', 'S'])?;
            if n == 0 {
                bail!("empty time part in duration");
            }
            n
        }
        None => 0,
    };
    if date_units + time_units == 0 {
        bail!("duration needs at least one component");
    }
    Ok(())
}

fn validate_period_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    let Some((start, end)) = s.split_once('/') else {
        bail!("period must contain /");
    };
    let is_duration = |p: &str| p.starts_with('P');
    match (is_duration(start), is_duration(end)) {
        (true, true) => bail!("period cannot be two durations"),
        (true, false) => {
            validate_duration(start)?;
            validate_datetime_value(&Value::String(end.to_string()))
        }
        (false, true) => {
            validate_datetime_value(&Value::String(start.to_string()))?;
            validate_duration(end)
        }
        (false, false) => {
            validate_datetime_value(&Value::String(start.to_string()))?;
            validate_datetime_value(&Value::String(end.to_string()))
        }
    }
}

fn validate_json_pointer_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_json_pointer(s)
}

fn validate_json_pointer(s: &str) -> Result<(), BoxError> {
    if s.is_empty() {
        return Ok(());
    }
    if !s.starts_with('/') {
        bail!("json pointer must start with /");
    }
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            bail!("~ must be followed by 0 or 1");
        }
    }
    Ok(())
}

fn validate_relative_json_pointer(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    let n = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    if n == 0 {
        bail!("relative json pointer must start with digits");
    }
    if n > 1 && s.starts_with('0') {
        bail!("leading zeros are not allowed");
    }
    match &s[n..] {
        "#" => Ok(()),
        rest => validate_json_pointer(rest),
    }
}

fn validate_uuid(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    // only the canonical hyphenated form
    let b = s.as_bytes();
    if b.len() != 36 || b[8] != b'-' || b[13] != b'-' || b[18] != b'-' || b[23] != b'-' {
        bail!("uuid must be in 8-4-4-4-12 form");
    }
    uuid::Uuid::parse_str(s)?;
    Ok(())
}

fn validate_uri_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_uri(s, false)
}

fn validate_uri_reference_value(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_uri_reference(s, false)
}

fn validate_iri(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_uri(s, true)
}

fn validate_iri_reference(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    validate_uri_reference(s, true)
}

fn validate_uri(s: &str, intl: bool) -> Result<(), BoxError> {
    let colon = s.find(':').ok_or("uri must have a scheme")?;
    let scheme = &s[..colon];
    if s[..colon].contains(['/', '?', '#']) || !valid_scheme(scheme) {
        bail!("invalid scheme");
    }
    if !intl {
        // the url crate normalizes instead of rejecting, so only use it to
        // cross-check schemes it understands strictly
        Url::parse(s).map_err(|e| format!("invalid uri: {e}"))?;
    }
    validate_uri_reference(s, intl)
}

fn valid_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn validate_uri_reference(s: &str, intl: bool) -> Result<(), BoxError> {
    // split off fragment and query
    let (rest, frag) = match s.find('#') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let (rest, query) = match rest.find('?') {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    if let Some(frag) = frag {
        check_chars(frag, "/?:@", intl)?;
    }
    if let Some(query) = query {
        check_chars(query, "/?:@", intl)?;
    }

    // scheme, if present, ends at the first colon before any slash
    let hier = match rest.find(':') {
        Some(i) if valid_scheme(&rest[..i]) && !rest[..i].contains('/') => &rest[i + 1..],
        _ => rest,
    };

    if let Some(auth_path) = hier.strip_prefix("//") {
        let (authority, path) = match auth_path.find('/') {
            Some(i) => (&auth_path[..i], &auth_path[i..]),
            None => (auth_path, ""),
        };
        validate_authority(authority, intl)?;
        check_chars(path, "/:@", intl)?;
    } else {
        check_chars(hier, "/:@", intl)?;
    }
    Ok(())
}

fn validate_authority(authority: &str, intl: bool) -> Result<(), BoxError> {
    let host_port = match authority.rfind('@') {
        Some(i) => {
            check_chars(&authority[..i], ":", intl)?;
            &authority[i + 1..]
        }
        None => authority,
    };
    if let Some(v6) = host_port.strip_prefix('[') {
        let Some(end) = v6.find(']') else {
            bail!("unterminated ip literal");
        };
        let literal = &v6[..end];
        if let Some(future) = literal.strip_prefix('v') {
            if !future.contains('.') {
                bail!("invalid ipvfuture literal");
            }
        } else {
            literal.parse::<std::net::Ipv6Addr>()?;
        }
        let port = &v6[end + 1..];
        if !port.is_empty() && (!port.starts_with(':') || !port[1..].bytes().all(|b| b.is_ascii_digit())) {
            bail!("invalid port");
        }
        return Ok(());
    }
    let host = match host_port.rfind(':') {
        Some(i) if host_port[i + 1..].bytes().all(|b| b.is_ascii_digit()) => &host_port[..i],
        _ => host_port,
    };
    check_chars(host, "", intl)
}

/// Check unreserved, sub-delims, percent escapes, plus `extra` characters.
fn check_chars(s: &str, extra: &str, intl: bool) -> Result<(), BoxError> {
    const SUB_DELIMS: &str = "!$&'()*+,;=";
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() != 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                bail!("invalid percent escape");
            }
            continue;
        }
        let ok = c.is_ascii_alphanumeric()
            || matches!(c, '-' | '.' | '_' | '~')
            || SUB_DELIMS.contains(c)
            || extra.contains(c)
            || (intl && !c.is_ascii());
        if !ok {
            bail!("invalid character {c:?}");
        }
    }
    Ok(())
}

fn validate_uri_template(v: &Value) -> Result<(), BoxError> {
    let Some(s) = str_of(v) else { return Ok(()) };
    let mut rest = s;
    loop {
        match rest.find(['{', '}']) {
            None => return check_chars(rest, "/?:@#", false),
            Some(i) => {
                if !rest[..i].is_empty() {
                    check_chars(&rest[..i], "/?:@#", false)?;
                }
                if rest.as_bytes()[i] == b'}' {
                    bail!("unbalanced braces");
                }
                let Some(end) = rest[i..].find('}') else {
                    bail!("unbalanced braces");
                };
                validate_template_expr(&rest[i + 1..i + end])?;
                rest = &rest[i + end + 1..];
            }
        }
    }
}

fn validate_template_expr(expr: &str) -> Result<(), BoxError> {
    let expr = expr.strip_prefix(['+', '#', '.', '/', ';', '?', '&', '=', ',', '!', '@', '|'])
        .unwrap_or(expr);
    if expr.is_empty() {
        bail!("empty template expression");
    }
    for var in expr.split(',') {
        let var = var.strip_suffix('*').unwrap_or(var);
        let var = match var.split_once(':') {
            Some((name, len)) => {
                if !digits(len) {
                    bail!("invalid prefix length");
                }
                name
            }
            None => var,
        };
        if var.is_empty() {
            bail!("empty variable name");
        }
        let mut chars = var.chars();
        while let Some(c) = chars.next() {
            let ok = c.is_ascii_alphanumeric() || c == '_' || c == '.';
            if c == '%' {
                let hex: String = chars.by_ref().take(2).collect();
                if hex.len() != 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    bail!("invalid percent escape in variable");
                }
            } else if !ok {
                bail!("invalid character {c:?} in variable");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(f: fn(&Value) -> Result<(), BoxError>, s: &str) -> bool {
        f(&json!(s)).is_ok()
    }

    #[test]
    fn non_strings_always_pass() {
        for f in builtin_formats() {
            assert!((f.func)(&json!(42)).is_ok(), "{} failed on non-string", f.name);
            assert!((f.func)(&json!(null)).is_ok(), "{} failed on null", f.name);
        }
    }

    #[test]
    fn ipv4() {
        assert!(ok(validate_ipv4, "192.168.0.1"));
        assert!(!ok(validate_ipv4, "256.0.0.1"));
        assert!(!ok(validate_ipv4, "087.10.0.1")); // leading zeros
        assert!(!ok(validate_ipv4, "1.2.3"));
    }

    #[test]
    fn ipv6() {
        assert!(ok(validate_ipv6, "::1"));
        assert!(ok(validate_ipv6, "2001:db8::8a2e:370:7334"));
        assert!(!ok(validate_ipv6, "12345::"));
        assert!(!ok(validate_ipv6, "fe80::1%eth0")); // zone ids are not part of the format
    }

    #[test]
    fn hostname() {
        assert!(ok(validate_hostname_value, "www.example.com"));
        assert!(ok(validate_hostname_value, "xn--nxasmq6b"));
        assert!(!ok(validate_hostname_value, "-starts-with-hyphen"));
        assert!(!ok(validate_hostname_value, "ends.with.dot."));
        assert!(!ok(validate_hostname_value, &"a".repeat(64)));
    }

    #[test]
    fn email() {
        assert!(ok(validate_email_value, "joe.bloggs@example.com"));
        assert!(ok(validate_email_value, "\"quoted\"@example.com"));
        assert!(ok(validate_email_value, "me@[127.0.0.1]"));
        assert!(ok(validate_email_value, "me@[IPv6:::1]"));
        assert!(!ok(validate_email_value, "no-at-sign"));
        assert!(!ok(validate_email_value, ".leading.dot@example.com"));
        assert!(!ok(validate_email_value, "two..dots@example.com"));
    }

    #[test]
    fn date() {
        assert!(ok(validate_date_value, "1963-06-19"));
        assert!(ok(validate_date_value, "2020-02-29")); // leap year
        assert!(!ok(validate_date_value, "2021-02-29"));
        assert!(!ok(validate_date_value, "2020-13-01"));
        assert!(!ok(validate_date_value, "2020-1-01"));
        assert!(!ok(validate_date_value, "06/19/1963"));
    }

    #[test]
    fn time() {
        assert!(ok(validate_time_value, "08:30:06Z"));
        assert!(ok(validate_time_value, "08:30:06.283185Z"));
        assert!(ok(validate_time_value, "08:30:06+05:30"));
        assert!(ok(validate_time_value, "23:59:60Z")); // leap second
        assert!(ok(validate_time_value, "15:59:60-08:00"));
        assert!(!ok(validate_time_value, "22:59:60Z"));
        assert!(!ok(validate_time_value, "08:30:06")); // offset required
        assert!(!ok(validate_time_value, "24:00:00Z"));
        assert!(!ok(validate_time_value, "08:30:06.Z"));
    }

    #[test]
    fn datetime() {
        assert!(ok(validate_datetime_value, "1963-06-19T08:30:06Z"));
        assert!(ok(validate_datetime_value, "1963-06-19t08:30:06z"));
        assert!(!ok(validate_datetime_value, "1963-06-19 08:30:06Z"));
        assert!(!ok(validate_datetime_value, "1963-06-19"));
    }

    #[test]
    fn duration() {
        assert!(ok(validate_duration_value, "P4DT12H30M5S"));
        assert!(ok(validate_duration_value, "PT0S"));
        assert!(ok(validate_duration_value, "P4W"));
        assert!(ok(validate_duration_value, "P1Y2M3D"));
        assert!(!ok(validate_duration_value, "P"));
        assert!(!ok(validate_duration_value, "PT")); // T with no time units
        assert!(!ok(validate_duration_value, "P1D2Y")); // misordered
        assert!(!ok(validate_duration_value, "4DT12H"));
    }

    #[test]
    fn json_pointer() {
        assert!(ok(validate_json_pointer_value, ""));
        assert!(ok(validate_json_pointer_value, "/foo/0/~0~1"));
        assert!(!ok(validate_json_pointer_value, "foo"));
        assert!(!ok(validate_json_pointer_value, "/foo/~2"));
    }

    #[test]
    fn relative_json_pointer() {
        assert!(ok(validate_relative_json_pointer, "0"));
        assert!(ok(validate_relative_json_pointer, "1/foo"));
        assert!(ok(validate_relative_json_pointer, "2#"));
        assert!(!ok(validate_relative_json_pointer, "/foo"));
        assert!(!ok(validate_relative_json_pointer, "01"));
        assert!(!ok(validate_relative_json_pointer, "1#foo"));
    }

    #[test]
    fn uuid() {
        assert!(ok(validate_uuid, "2eb8aa08-aa98-11ea-b4aa-73b441d16380"));
        assert!(!ok(validate_uuid, "2eb8aa08aa9811eab4aa73b441d16380")); // hyphens required
        assert!(!ok(validate_uuid, "2eb8aa08-aa98-11ea-b4aa-73b441d1638g"));
    }

    #[test]
    fn uri() {
        assert!(ok(validate_uri_value, "http://example.com/path?q=1#frag"));
        assert!(ok(validate_uri_value, "urn:uuid:6e8bc430-9c3a-11d9-9669-0800200c9a66"));
        assert!(!ok(validate_uri_value, "/relative/path"));
        assert!(!ok(validate_uri_value, "http://example.com/ space"));
        assert!(!ok(validate_uri_value, "\\\\WINDOWS\\fileshare"));
    }

    #[test]
    fn uri_reference() {
        assert!(ok(validate_uri_reference_value, "/abc"));
        assert!(ok(validate_uri_reference_value, "#frag"));
        assert!(ok(validate_uri_reference_value, "../dir/file.json"));
        assert!(!ok(validate_uri_reference_value, "\\\\WINDOWS\\fileshare"));
        assert!(!ok(validate_uri_reference_value, "abc def"));
    }

    #[test]
    fn iri() {
        assert!(ok(validate_iri, "http://ƒøø.ßår/?∂éœ=πîx#πîüx"));
        assert!(!ok(validate_iri, "/relative"));
    }

    #[test]
    fn uri_template() {
        assert!(ok(validate_uri_template, "http://example.com/dictionary/{term:1}/{term}"));
        assert!(ok(validate_uri_template, "http://example.com/{+path}{?query,number}"));
        assert!(!ok(validate_uri_template, "http://example.com/dictionary/{term:1}/{term"));
    }

    #[test]
    fn period() {
        assert!(ok(validate_period_value, "1963-06-19T08:30:06Z/1963-06-19T09:30:06Z"));
        assert!(ok(validate_period_value, "1963-06-19T08:30:06Z/P1D"));
        assert!(ok(validate_period_value, "P1D/1963-06-19T08:30:06Z"));
        assert!(!ok(validate_period_value, "P1D/P2D"));
        assert!(!ok(validate_period_value, "1963-06-19T08:30:06Z"));
    }
}
