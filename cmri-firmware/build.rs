//! Build script for cmri-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates node.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml at compile time
///
/// The firmware falls back to defaults on a bad file; failing the build
/// here keeps that from happening silently.
fn validate_config() {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => panic!("\nERROR: failed to read node.toml: {}\n", e),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => panic!("\nERROR: invalid TOML syntax in node.toml:\n{}\n", e),
    };

    let mut errors = Vec::new();
    validate_node(&config, &mut errors);
    validate_uart(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\nERROR: node.toml has {} problem(s):\n{}\n",
            errors.len(),
            errors
                .iter()
                .map(|e| format!("  • {}", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=node.toml validated successfully");
}

fn validate_node(config: &toml::Value, errors: &mut Vec<String>) {
    let node = match config.get("node") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => return errors.push("[node] must be a table".into()),
        None => return,
    };

    if let Some(value) = node.get("address") {
        match value.as_integer() {
            Some(a) if (0..=127).contains(&a) => {}
            _ => errors.push("[node] address must be an integer 0-127".into()),
        }
    }

    for key in ["receive_bytes", "transmit_bytes"] {
        if let Some(value) = node.get(key) {
            match value.as_integer() {
                Some(n) if (0..=256).contains(&n) => {}
                _ => errors.push(format!("[node] {} must be an integer 0-256", key)),
            }
        }
    }

    if let Some(value) = node.get("debug") {
        if value.as_bool().is_none() {
            errors.push("[node] debug must be true or false".into());
        }
    }
}

fn validate_uart(config: &toml::Value, errors: &mut Vec<String>) {
    let uart = match config.get("uart") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => return errors.push("[uart] must be a table".into()),
        None => return,
    };

    if let Some(value) = uart.get("baudrate") {
        match value.as_integer() {
            Some(b) if b > 0 => {}
            _ => errors.push("[uart] baudrate must be a positive integer".into()),
        }
    }

    for key in ["tx_pin", "rx_pin", "tx_enable_pin"] {
        if let Some(value) = uart.get(key) {
            let valid = value
                .as_str()
                .and_then(|s| s.strip_prefix("gpio"))
                .and_then(|n| n.parse::<u8>().ok())
                .is_some_and(|n| n < 30);
            if !valid {
                errors.push(format!("[uart] {} must be \"gpio0\"-\"gpio29\"", key));
            }
        }
    }
}
