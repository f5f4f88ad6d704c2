use std::collections::BTreeSet;

/// Whitelist or blacklist of sender addresses and domains
///
/// Entries match case-insensitively:
/// - `user@example.com` matches that address only
/// - `@example.com` matches any address at exactly that domain
/// - `example.com` matches that domain and its subdomains
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressList {
    entries: Vec<String>,
}

impl AddressList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if any entry matches the address
    pub fn contains(&self, address: &str) -> bool {
        self.matching_entry(address).is_some()
    }

    /// First entry that matches the address
    pub fn matching_entry(&self, address: &str) -> Option<&str> {
        let address = address.trim().to_lowercase();
        if address.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|entry| entry_matches(entry, &address))
            .map(String::as_str)
    }
}

impl From<&BTreeSet<String>> for AddressList {
    fn from(set: &BTreeSet<String>) -> Self {
        Self::new(set)
    }
}

fn entry_matches(entry: &str, address: &str) -> bool {
    if entry == address {
        return true;
    }

    let Some((_, domain)) = address.rsplit_once('@') else {
        return false;
    };

    // "@example.com" matches "user@example.com"
    if let Some(entry_domain) = entry.strip_prefix('@') {
        return entry_domain == domain;
    }

    // Bare domain, subdomains included
    if !entry.contains('@') {
        return domain == entry
            || domain
                .strip_suffix(entry)
                .is_some_and(|prefix| prefix.ends_with('.'));
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_exact_address() {
        let list = AddressList::new(["user@example.com"]);
        assert!(list.contains("user@example.com"));
        assert!(list.contains("USER@Example.com"));
        assert!(!list.contains("other@example.com"));
    }

    #[test]
    fn test_matches_at_domain() {
        let list = AddressList::new(["@example.com"]);
        assert!(list.contains("anyone@example.com"));
        assert!(!list.contains("user@mail.example.com"));
        assert!(!list.contains("user@other.com"));
    }

    #[test]
    fn test_matches_bare_domain_and_subdomains() {
        let list = AddressList::new(["spam.biz"]);
        assert!(list.contains("promo@spam.biz"));
        assert!(list.contains("promo@mail.spam.biz"));
        assert!(!list.contains("promo@notspam.biz"));
    }

    #[test]
    fn test_matching_entry_reports_pattern() {
        let list = AddressList::new(["boss@work.com", " @Partner.org "]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.matching_entry("ceo@partner.org"), Some("@partner.org"));
        assert_eq!(list.matching_entry(""), None);
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let list = AddressList::new(["", "  "]);
        assert!(list.is_empty());
        assert!(!list.contains("user@example.com"));
    }
}
