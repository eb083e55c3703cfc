use crate::terminal::colors;
use colored::*;
use ipsync_common::network::{Address, Endpoint};
use ipsync_core::PatchResult;

pub fn address_value(address: &Address) -> ColoredString {
    let color = if address.is_ipv4() {
        colors::IPV4_ADDR
    } else {
        colors::IPV6_ADDR
    };
    address.to_string().color(color)
}

pub fn endpoint_value(endpoint: &Endpoint) -> ColoredString {
    endpoint.to_string().color(colors::ACCENT).bold()
}

/// In a dry run `Updated` means the file would have been rewritten.
pub fn result_value(result: &PatchResult, dry_run: bool) -> ColoredString {
    match result {
        PatchResult::Updated { replacements } if dry_run => {
            format!("Would update ({})", plural(*replacements, "endpoint")).color(colors::ACCENT)
        }
        PatchResult::Updated { .. } => result.to_string().color(colors::SUCCESS).bold(),
        PatchResult::Unchanged => result.to_string().color(colors::TEXT_DEFAULT),
        PatchResult::NotFound | PatchResult::ReadError(_) | PatchResult::WriteError(_) => {
            result.to_string().color(colors::FAILURE).bold()
        }
    }
}

pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
