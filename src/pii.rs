//! Regex-based redaction of personally identifiable information.
//!
//! Each masker returns the rewritten text together with the number of
//! replacements it made.

use crate::dto::Document;
use lazy_static::lazy_static;
use regex::Regex;
use std::ops::AddAssign;

pub const EMAIL_TOKEN: &str = "|||EMAIL_ADDRESS|||";
pub const PHONE_TOKEN: &str = "|||PHONE_NUMBER|||";
pub const IP_TOKEN: &str = "|||IP_ADDRESS|||";

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
    // North American numbers with optional country code and separators.
    static ref PHONE: Regex =
        Regex::new(r"(?:\+?1[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b").unwrap();
    static ref IPV4: Regex = Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b"
    )
    .unwrap();
}

/// Replacement counts produced by [`mask_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RedactionCounts {
    pub emails: usize,
    pub phone_numbers: usize,
    pub ip_addresses: usize,
}

impl RedactionCounts {
    pub fn total(&self) -> usize {
        self.emails + self.phone_numbers + self.ip_addresses
    }
}

impl AddAssign for RedactionCounts {
    fn add_assign(&mut self, other: Self) {
        self.emails += other.emails;
        self.phone_numbers += other.phone_numbers;
        self.ip_addresses += other.ip_addresses;
    }
}

fn mask(pattern: &Regex, text: &str, token: &str) -> (String, usize) {
    let count = pattern.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (pattern.replace_all(text, token).into_owned(), count)
}

pub fn mask_emails(text: &str) -> (String, usize) {
    mask(&EMAIL, text, EMAIL_TOKEN)
}

pub fn mask_phone_numbers(text: &str) -> (String, usize) {
    mask(&PHONE, text, PHONE_TOKEN)
}

pub fn mask_ipv4(text: &str) -> (String, usize) {
    mask(&IPV4, text, IP_TOKEN)
}

/// Applies every masker in turn: emails, then phone numbers, then addresses.
pub fn mask_all(text: &str) -> (String, RedactionCounts) {
    let (text, emails) = mask_emails(text);
    let (text, phone_numbers) = mask_phone_numbers(&text);
    let (text, ip_addresses) = mask_ipv4(&text);
    (
        text,
        RedactionCounts {
            emails,
            phone_numbers,
            ip_addresses,
        },
    )
}

/// Masks every document in place and returns the summed counts.
pub fn redact_documents(documents: &mut [Document]) -> RedactionCounts {
    let mut totals = RedactionCounts::default();
    for doc in documents.iter_mut() {
        let (text, counts) = mask_all(&doc.text);
        if counts.total() > 0 {
            doc.text = text;
        }
        totals += counts;
    }
    totals
}
