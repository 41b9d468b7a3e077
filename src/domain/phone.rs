use serde::Serialize;

/// An M-PESA subscriber number normalized to international format.
///
/// Normalization is total: any input produces a value. A malformed result
/// (see [`PhoneNumber::is_valid`]) is left for the gateway to reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes raw user input to the `254XXXXXXXXX` form.
    ///
    /// A leading `+` is stripped, a leading `0` is replaced with the `254`
    /// country prefix, and bare subscriber digits get the prefix prepended.
    /// Input already carrying the prefix passes through unchanged.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let normalized = if let Some(rest) = digits.strip_prefix('0') {
            format!("254{rest}")
        } else if digits.starts_with("254") {
            digits.to_string()
        } else {
            format!("254{digits}")
        };

        Self(normalized)
    }

    /// Whether the normalized number matches `254` followed by exactly 9 digits.
    pub fn is_valid(&self) -> bool {
        self.0.len() == 12
            && self.0.starts_with("254")
            && self.0.chars().all(|c| c.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
