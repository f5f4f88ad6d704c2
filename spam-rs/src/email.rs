//! Email record
//!
//! Input is raw text. When it starts with an RFC 822 style header block the
//! headers are split off so the sender can be checked against the address
//! lists; anything else is treated as a bare body.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const HEADER_LINE: &str = r"^[A-Za-z][A-Za-z0-9-]*:";

/// Parsed email
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Email {
    /// Lowercased header name -> value
    pub headers: HashMap<String, String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub body: String,
}

fn header_line() -> Option<&'static Regex> {
    static HEADER: OnceLock<Option<Regex>> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(HEADER_LINE).ok()).as_ref()
}

impl Email {
    /// Build an email from its parts
    pub fn new(from: Option<&str>, subject: Option<&str>, body: &str) -> Self {
        Self {
            headers: HashMap::new(),
            from: from.and_then(extract_address),
            subject: subject.map(str::to_string),
            body: body.to_string(),
        }
    }

    /// Parse raw message text
    pub fn parse(raw: &str) -> Self {
        let Some((header_block, body)) = split_headers_body(raw) else {
            return Self::new(None, None, raw);
        };

        let headers = parse_headers(header_block);
        if !headers.contains_key("from") && !headers.contains_key("subject") {
            return Self::new(None, None, raw);
        }

        Self {
            from: headers.get("from").and_then(|v| extract_address(v)),
            subject: headers.get("subject").cloned(),
            headers,
            body: body.to_string(),
        }
    }

    /// Text handed to the classifiers: subject and body
    pub fn content(&self) -> String {
        match &self.subject {
            Some(subject) if !subject.is_empty() => format!("{}\n{}", subject, self.body),
            _ => self.body.clone(),
        }
    }

    /// Domain part of the sender address
    pub fn sender_domain(&self) -> Option<&str> {
        self.from.as_deref().and_then(|addr| addr.rsplit_once('@')).map(|(_, domain)| domain)
    }
}

/// Split at the first blank line, but only if every line before it is a header
fn split_headers_body(message: &str) -> Option<(&str, &str)> {
    let re = header_line()?;
    if !re.is_match(message) {
        return None;
    }

    // Headers end at the first double CRLF or double LF
    let crlf = message.find("\r\n\r\n").map(|pos| (pos, 4));
    let lf = message.find("\n\n").map(|pos| (pos, 2));
    let (pos, len) = match (crlf, lf) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    let (headers, body) = (&message[..pos], &message[pos + len..]);

    let all_headers = headers
        .lines()
        .all(|line| line.starts_with(' ') || line.starts_with('\t') || re.is_match(line));

    all_headers.then_some((headers, body))
}

fn parse_headers(block: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    let mut current: Option<(String, String)> = None;

    for line in block.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            // Folded header
            if let Some((_, ref mut value)) = current {
                value.push(' ');
                value.push_str(line.trim());
            }
        } else if let Some((name, value)) = line.split_once(':') {
            if let Some((name, value)) = current.take() {
                headers.insert(name, value);
            }
            current = Some((name.trim().to_lowercase(), value.trim().to_string()));
        }
    }

    if let Some((name, value)) = current {
        headers.insert(name, value);
    }

    headers
}

/// `"Name <user@example.com>"` -> `user@example.com`, lowercased
fn extract_address(value: &str) -> Option<String> {
    let value = value.trim();
    let address = match (value.rfind('<'), value.rfind('>')) {
        (Some(start), Some(end)) if start < end => &value[start + 1..end],
        _ => value,
    };

    let address = address.trim().trim_matches('"');
    if address.is_empty() {
        None
    } else {
        Some(address.to_lowercase())
    }
}
