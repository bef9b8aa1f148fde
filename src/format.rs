// MIT License - Copyright (c) 2026 Peter Wright

//! Rendering of response codes into human-readable messages.
//!
//! Numeric partition/zone/usercode identifiers are resolved to their
//! configured display names. Resolution failures never abort a line: the
//! formatter falls back to substituting the raw parameters, and the
//! generic event handler's configuration filter decides what actually
//! gets published.

use tracing::debug;

use crate::config::SessionConfig;
use crate::registry::{arm_mode_name, EventKind, ResponseDescriptor};

/// Substitute positional `{0}` / `{1}` placeholders in a template.
pub fn render_template(template: &str, args: &[&str]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", i), arg);
    }
    out
}

/// Render a response code's parameters into a display message.
pub fn format_message(
    descriptor: &ResponseDescriptor,
    parameters: &str,
    config: &SessionConfig,
) -> String {
    match descriptor.kind {
        Some(EventKind::Partition) => format_partition(descriptor, parameters, config),
        Some(EventKind::Zone) => format_zone(descriptor, parameters, config),
        None => render_template(descriptor.template, &[parameters]),
    }
}

fn format_partition(
    descriptor: &ResponseDescriptor,
    parameters: &str,
    config: &SessionConfig,
) -> String {
    // The first character is always the partition number; anything after
    // it is either a 4-digit zero-padded usercode or a 1-digit arm mode.
    let partition = parameters
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8);

    let name = match partition.and_then(|p| config.partition_name(p)) {
        Some(name) => name,
        None => {
            debug!(
                "Partition in {:?} not present in configuration, rendering raw",
                parameters
            );
            return render_template(descriptor.template, &[parameters]);
        }
    };

    let rest = &parameters[1..];
    if rest.len() == 4 {
        // Usercode, always 4 digits padded with zeros
        let usercode: u16 = rest.parse().unwrap_or(0);
        let user = match config.user_name(usercode) {
            Some(user) => user.to_string(),
            // No username configured, show the numeric code instead
            None => usercode.to_string(),
        };
        render_template(descriptor.template, &[name, user.as_str()])
    } else if rest.len() == 1 {
        let mode = rest.parse::<u8>().ok().and_then(arm_mode_name);
        render_template(descriptor.template, &[name, mode.unwrap_or(rest)])
    } else {
        render_template(descriptor.template, &[name])
    }
}

fn format_zone(
    descriptor: &ResponseDescriptor,
    parameters: &str,
    config: &SessionConfig,
) -> String {
    if let Ok(zone) = parameters.parse::<u16>() {
        // An explicitly suppressed zone resolves no name, same as an
        // absent one.
        if let Some(name) = config.zone_name(zone) {
            return render_template(descriptor.template, &[name]);
        }
    }
    render_template(descriptor.template, &[parameters])
}
