//! Minimal TOML loader for node configuration
//!
//! Handles only the subset the node file uses. It does NOT support the
//! full TOML grammar.
//!
//! Supported:
//! - `[node]` and `[uart]` section headers
//! - Key = value pairs (integer, boolean, string)
//! - Pin strings: `"gpio12"`
//! - Comments (# ...)
//!
//! ```toml
//! [node]
//! address = 1
//! receive_bytes = 6
//! transmit_bytes = 3
//! debug = false
//!
//! [uart]
//! channel = 0
//! baudrate = 115200
//! tx_pin = "gpio12"
//! rx_pin = "gpio13"
//! tx_enable_pin = "gpio3"
//! ```

use cmri_protocol::NodeAddress;

use super::{ConfigError, NodeConfig};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Pin string is not `gpioN`
    InvalidPin,
    /// Key not recognised in its section
    UnknownKey,
    /// Parsed values failed validation
    Config(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        ParseError::Config(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Node,
    Uart,
}

/// Parse TOML text into a validated [`NodeConfig`]
///
/// Keys that are absent keep their [`NodeConfig::default`] values.
pub fn parse_config(input: &str) -> Result<NodeConfig, ParseError> {
    let mut config = NodeConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        apply_value(section, key, value, &mut config)?;
    }

    config.validate()?;
    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "node" => Ok(Section::Node),
        "uart" => Ok(Section::Uart),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut NodeConfig,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Node, "address") => {
            let raw: u8 = parse_int(value)?;
            config.address = NodeAddress::new(raw).ok_or(ConfigError::InvalidAddress)?;
        }
        (Section::Node, "receive_bytes") => config.receive_bytes = parse_int(value)?,
        (Section::Node, "transmit_bytes") => config.transmit_bytes = parse_int(value)?,
        (Section::Node, "debug") => config.debug = parse_bool(value)?,
        (Section::Uart, "channel") => config.uart = parse_int(value)?,
        (Section::Uart, "baudrate") => config.baudrate = parse_int(value)?,
        (Section::Uart, "tx_pin") => config.tx_pin = parse_pin(value)?,
        (Section::Uart, "rx_pin") => config.rx_pin = parse_pin(value)?,
        (Section::Uart, "tx_enable_pin") => config.tx_enable_pin = parse_pin(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Split `key = value`, dropping a trailing comment
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    let value = match value.find('#') {
        // A '#' inside quotes is part of the string
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a pin string like "gpio12"
fn parse_pin(value: &str) -> Result<u8, ParseError> {
    parse_string(value)
        .strip_prefix("gpio")
        .and_then(|n| n.parse().ok())
        .ok_or(ParseError::InvalidPin)
}
