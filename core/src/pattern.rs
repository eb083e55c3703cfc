//! # Endpoint Matching
//!
//! Locates embedded endpoints in arbitrary text and rewrites them to point at
//! a new address. Text outside the matched spans is passed through untouched.

use std::borrow::Cow;
use std::sync::LazyLock;

use ipsync_common::config::MatchPolicy;
use ipsync_common::network::{Address, Endpoint};
use regex::{Captures, Regex};

static BARE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("bare address pattern")
});

// The port group is greedy so that `:50001` is never mistaken for `:5000`.
static SCOPED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http://(?:\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}|\[[0-9A-Fa-f:.]+\]):(\d+)")
        .expect("scoped url pattern")
});

/// Result of running a pattern over a piece of text.
#[derive(Debug)]
pub struct Rewrite<'t> {
    pub text: Cow<'t, str>,
    /// Spans whose content actually changed.
    pub replacements: usize,
}

impl Rewrite<'_> {
    pub fn is_unchanged(&self) -> bool {
        self.replacements == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointPattern {
    policy: MatchPolicy,
    port: u16,
}

impl EndpointPattern {
    pub fn new(policy: MatchPolicy, port: u16) -> Self {
        Self { policy, port }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Rewrites every embedded endpoint in `text` to point at `address`.
    ///
    /// Referentially transparent: the same text and address always give the
    /// same output, and a second pass with the same address changes nothing.
    pub fn apply<'t>(&self, text: &'t str, address: Address) -> Rewrite<'t> {
        let mut replacements = 0usize;

        let text = match self.policy {
            MatchPolicy::BareAddress => {
                let new = address.to_string();
                BARE_ADDRESS.replace_all(text, |caps: &Captures| {
                    if caps[0] != new {
                        replacements += 1;
                    }
                    new.clone()
                })
            }
            MatchPolicy::ScopedUrl => {
                let new = Endpoint::new(address, self.port).to_string();
                let port = self.port.to_string();
                SCOPED_URL.replace_all(text, |caps: &Captures| {
                    if caps[1] != port {
                        return caps[0].to_string();
                    }
                    if caps[0] != new {
                        replacements += 1;
                    }
                    new.clone()
                })
            }
        };

        Rewrite { text, replacements }
    }
}
