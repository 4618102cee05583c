// Argument Quoter
// POSIX shell quoting and sanitising of untrusted text

/// Quote `text` for safe inclusion in a POSIX shell command line
///
/// Tokens made only of `[A-Za-z0-9_@%+=:,./-]` are returned unchanged.
/// Everything else is single-quoted, with embedded quotes written as `'"'"'`.
///
/// # Example
/// ```
/// use privexec_core::application::quote::quote;
///
/// assert_eq!(quote(""), "''");
/// assert_eq!(quote("simple"), "simple");
/// assert_eq!(quote("a'b"), r#"'a'"'"'b'"#);
/// ```
pub fn quote(text: &str) -> String {
    if text.is_empty() {
        return "''".to_string();
    }

    if text.bytes().all(is_safe_byte) {
        return text.to_string();
    }

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            quoted.push_str(r#"'"'"'"#);
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'_' | b'@' | b'%' | b'+' | b'=' | b':' | b',' | b'.' | b'/' | b'-'
        )
}

/// Drop invalid UTF-8 sequences, then every non-printable character
///
/// A character is kept when it is the ASCII space, or when it is none of:
/// - a control character (Cc: NUL, tab, CR, LF, DEL, C1 controls)
/// - Unicode whitespace
/// - a format character (Cf, complete as of Unicode 15.1)
/// - a private-use code point (Co)
///
/// Assignment status is not consulted: unassigned code points (e.g. U+0378) are
/// kept. The result is a fixed point: stripping it again changes nothing.
pub fn strip_unsafe(input: impl AsRef<[u8]>) -> String {
    let bytes = input.as_ref();
    let mut out = String::with_capacity(bytes.len());

    for chunk in bytes.utf8_chunks() {
        out.extend(chunk.valid().chars().filter(|c| is_printable(*c)));
    }

    out
}

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !is_invisible(c)
}

// Format (Cf, Unicode 15.1) and private-use (Co) code points
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{E000}'..='\u{F8FF}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
            | '\u{F0000}'..='\u{FFFFD}'
            | '\u{100000}'..='\u{10FFFD}'
    )
}
