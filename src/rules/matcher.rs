use serde::{Deserialize, Serialize};
use std::fmt;

/// Matcher functions of the routing rule language
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatcherType {
    Host,
    HostRegexp,
    Path,
    PathPrefix,
    PathRegexp,
    Header,
    HeaderRegexp,
    Query,
    QueryRegexp,
    Method,
    #[serde(rename = "ClientIP")]
    ClientIp,
    #[serde(rename = "HostSNI")]
    HostSni,
    #[serde(rename = "HostSNIRegexp")]
    HostSniRegexp,
    #[serde(rename = "ALPN")]
    Alpn,
}

impl MatcherType {
    /// Function name as written in rule expressions
    pub fn name(&self) -> &'static str {
        match self {
            MatcherType::Host => "Host",
            MatcherType::HostRegexp => "HostRegexp",
            MatcherType::Path => "Path",
            MatcherType::PathPrefix => "PathPrefix",
            MatcherType::PathRegexp => "PathRegexp",
            MatcherType::Header => "Header",
            MatcherType::HeaderRegexp => "HeaderRegexp",
            MatcherType::Query => "Query",
            MatcherType::QueryRegexp => "QueryRegexp",
            MatcherType::Method => "Method",
            MatcherType::ClientIp => "ClientIP",
            MatcherType::HostSni => "HostSNI",
            MatcherType::HostSniRegexp => "HostSNIRegexp",
            MatcherType::Alpn => "ALPN",
        }
    }

    /// Header and query matchers take a (key, value) pair
    pub fn takes_key(&self) -> bool {
        matches!(
            self,
            MatcherType::Header | MatcherType::HeaderRegexp | MatcherType::Query | MatcherType::QueryRegexp
        )
    }

    /// Comma-separated values rendered as several arguments
    pub fn is_multi_value(&self) -> bool {
        matches!(self, MatcherType::Method)
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            MatcherType::Host => "example.com or *.example.com",
            MatcherType::HostRegexp | MatcherType::HostSniRegexp => r"^.+\.example\.com$",
            MatcherType::Path => "/api/users",
            MatcherType::PathPrefix => "/api",
            MatcherType::PathRegexp => "^/api/.*",
            MatcherType::Header => "Header value (e.g., application/json)",
            MatcherType::HeaderRegexp => "Header value pattern",
            MatcherType::Query => "Parameter value (e.g., 10)",
            MatcherType::QueryRegexp => "Parameter value pattern",
            MatcherType::Method => "GET, POST, PUT, DELETE",
            MatcherType::ClientIp => "192.168.1.0/24 or 10.0.0.1",
            MatcherType::HostSni => "example.com or * for all",
            MatcherType::Alpn => "h2, http/1.1, etc.",
        }
    }

    pub fn key_placeholder(&self) -> Option<&'static str> {
        match self {
            MatcherType::Header | MatcherType::HeaderRegexp => Some("Header name (e.g., Content-Type)"),
            MatcherType::Query | MatcherType::QueryRegexp => Some("Parameter name (e.g., page)"),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MatcherType::Host => "Match exact hostname (case-insensitive)",
            MatcherType::HostRegexp => "Match hostname using Go regular expression",
            MatcherType::Path => "Match exact request path",
            MatcherType::PathPrefix => "Match request path prefix",
            MatcherType::PathRegexp => "Match path using Go regular expression",
            MatcherType::Header => "Match exact header key-value pair",
            MatcherType::HeaderRegexp => "Match header using regular expression",
            MatcherType::Query => "Match exact query parameter key-value pair",
            MatcherType::QueryRegexp => "Match query parameter using regular expression",
            MatcherType::Method => "Match HTTP request methods (comma-separated)",
            MatcherType::ClientIp => "Match client IP address or CIDR range",
            MatcherType::HostSni => "Match exact Server Name Indication (TLS hostname)",
            MatcherType::HostSniRegexp => "Match SNI using Go regular expression",
            MatcherType::Alpn => "Match Application-Layer Protocol Negotiation",
        }
    }
}

impl fmt::Display for MatcherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Matcher catalogue a builder offers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDialect {
    Http,
    Tcp,
}

const HTTP_MATCHERS: [MatcherType; 11] = [
    MatcherType::Host,
    MatcherType::HostRegexp,
    MatcherType::Path,
    MatcherType::PathPrefix,
    MatcherType::PathRegexp,
    MatcherType::Header,
    MatcherType::HeaderRegexp,
    MatcherType::Query,
    MatcherType::QueryRegexp,
    MatcherType::Method,
    MatcherType::ClientIp,
];

const TCP_MATCHERS: [MatcherType; 4] = [
    MatcherType::HostSni,
    MatcherType::HostSniRegexp,
    MatcherType::ClientIp,
    MatcherType::Alpn,
];

impl RuleDialect {
    pub fn matchers(&self) -> &'static [MatcherType] {
        match self {
            RuleDialect::Http => &HTTP_MATCHERS,
            RuleDialect::Tcp => &TCP_MATCHERS,
        }
    }

    /// Matcher of a freshly added condition
    pub fn default_matcher(&self) -> MatcherType {
        match self {
            RuleDialect::Http => MatcherType::Host,
            RuleDialect::Tcp => MatcherType::HostSni,
        }
    }

    pub fn supports(&self, matcher: MatcherType) -> bool {
        self.matchers().contains(&matcher)
    }
}

impl fmt::Display for RuleDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleDialect::Http => f.write_str("http"),
            RuleDialect::Tcp => f.write_str("tcp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogues() {
        assert_eq!(RuleDialect::Http.matchers().len(), 11);
        assert_eq!(RuleDialect::Tcp.matchers().len(), 4);
        assert!(RuleDialect::Http.supports(MatcherType::ClientIp));
        assert!(RuleDialect::Tcp.supports(MatcherType::ClientIp));
        assert!(!RuleDialect::Tcp.supports(MatcherType::Host));
        assert!(!RuleDialect::Http.supports(MatcherType::Alpn));
    }

    #[test]
    fn test_key_value_matchers() {
        let keyed: Vec<_> = RuleDialect::Http.matchers().iter().filter(|m| m.takes_key()).collect();
        assert_eq!(keyed.len(), 4);
        assert!(MatcherType::Header.key_placeholder().is_some());
        assert!(MatcherType::Host.key_placeholder().is_none());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&MatcherType::ClientIp).unwrap(), "\"ClientIP\"");
        assert_eq!(serde_json::to_string(&MatcherType::HostSni).unwrap(), "\"HostSNI\"");
        let alpn: MatcherType = serde_json::from_str("\"ALPN\"").unwrap();
        assert_eq!(alpn, MatcherType::Alpn);
        assert_eq!(MatcherType::HostSniRegexp.to_string(), "HostSNIRegexp");
    }
}
