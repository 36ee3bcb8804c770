use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lookup of negotiated format parameters by name.
///
/// This is the seam to whatever SDP handling the host uses. Names are compared
/// case-insensitively, as RFC 4566 fmtp parameter names are.
pub trait AttributeLookup {
    /// The value for `key`, or `None` if the parameter is not present.
    fn attribute(&self, key: &str) -> Option<&str>;
}

/// Format parameters as found in an SDP `a=fmtp` line.
///
/// Keeps the parameters in the order they were given.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatParams {
    params: Vec<(String, String)>,
}

impl FormatParams {
    /// Creates an empty set of parameters.
    pub fn new() -> Self {
        FormatParams::default()
    }

    /// Parse an fmtp line to create a FormatParams.
    ///
    /// Example `packetization-mode=1;profile-level-id=42e01f;sprop-parameter-sets=Z0IAH5WoFAFuQA==,aM48gA==`.
    ///
    /// A leading `a=fmtp:<pt> ` is ignored. Only the first `=` separates key
    /// from value since base64 values end with `=` padding.
    pub fn parse_line(line: &str) -> Self {
        let line = line.trim();
        let line = match line.strip_prefix("a=fmtp:") {
            Some(rest) => rest.split_once(' ').map(|(_, v)| v).unwrap_or(""),
            None => line,
        };

        let params = line
            .split(';')
            .filter_map(|pair| match pair.split_once('=') {
                Some((k, v)) => Some((k.trim().to_string(), v.trim().to_string())),
                None => {
                    if !pair.trim().is_empty() {
                        trace!("Ignore fmtp without value: {}", pair.trim());
                    }
                    None
                }
            })
            .collect();

        FormatParams { params }
    }

    /// Set a parameter, replacing any previous value for the key.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self
            .params
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some((_, v)) => *v = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Iterate over the parameters in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Tests if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl AttributeLookup for FormatParams {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

impl AttributeLookup for HashMap<String, String> {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str).or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
        })
    }
}

impl<'a> AttributeLookup for [(&'a str, &'a str)] {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| *v)
    }
}

impl fmt::Display for FormatParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";");
        write!(f, "{s}")
    }
}
