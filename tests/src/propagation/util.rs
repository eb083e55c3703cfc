#![cfg(test)]
use std::fs;
use std::path::{Path, PathBuf};

use ipsync_common::config::{Config, MatchPolicy, TargetConfig};
use ipsync_common::network::Address;

pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn target(path: &Path, policy: Option<MatchPolicy>) -> TargetConfig {
    TargetConfig::new(path, policy)
}

pub fn config(targets: Vec<TargetConfig>) -> Config {
    Config {
        targets,
        ..Config::default()
    }
}

pub fn addr(s: &str) -> Address {
    s.parse().unwrap()
}
