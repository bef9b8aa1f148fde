// MIT License - Copyright (c) 2026 Peter Wright

//! Static registry of TPI response codes.
//!
//! Every inbound line carries a 3-digit response code; this table maps each
//! known code to its semantic kind, its human-readable message template and
//! the specialized handler (if any) that post-processes it. The table is
//! fixed by the protocol specification and never mutated at runtime.

use serde::Serialize;

use crate::error::{EnvisalinkError, Result};

/// Semantic category of a response code's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Partition,
    Zone,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partition => "partition",
            Self::Zone => "zone",
        }
    }

    /// Baseline status template attached to every published event of this
    /// kind, for subscribers that track device state.
    pub fn default_status(&self) -> DefaultStatus {
        match self {
            Self::Zone => DefaultStatus::Zone(ZoneStatus::default()),
            Self::Partition => DefaultStatus::Partition(PartitionStatus::default()),
        }
    }
}

/// Specialized pre-processing applied to a code's parameters before the
/// generic event handler runs.
///
/// Resolved statically here rather than by constructing a handler name at
/// runtime, so a missing handler is impossible by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerTag {
    /// Login challenge; parameters select the login sub-behavior.
    Login,
    /// Parameters are partition digit + zone number; the target is the
    /// zone (everything past the 1-character partition prefix).
    Zone,
    /// Parameters are partition digit + trailing data (usercode or arm
    /// mode); the target is the first character only.
    Partition,
}

/// Static record describing one response code.
#[derive(Debug, Clone, Copy)]
pub struct ResponseDescriptor {
    pub code: u16,
    /// `None` for informational/protocol-only codes that never publish.
    pub kind: Option<EventKind>,
    pub handler: Option<HandlerTag>,
    /// Message template with positional `{0}` / `{1}` placeholders.
    pub template: &'static str,
    pub description: &'static str,
}

const fn desc(
    code: u16,
    kind: Option<EventKind>,
    handler: Option<HandlerTag>,
    template: &'static str,
    description: &'static str,
) -> ResponseDescriptor {
    ResponseDescriptor {
        code,
        kind,
        handler,
        template,
        description,
    }
}

use EventKind::{Partition as P, Zone as Z};
use HandlerTag as H;

/// All known response codes, sorted ascending for binary search.
static RESPONSE_TABLE: &[ResponseDescriptor] = &[
    desc(500, None, None, "Command Acknowledge: {0}", "A command was received successfully"),
    desc(501, None, None, "Command Error (bad checksum)", "A command was received with a bad checksum"),
    desc(502, None, None, "System Error: {0}", "An error has been detected"),
    desc(505, None, Some(H::Login), "Login Interaction: {0}", "Password request, login result or login timeout"),
    desc(510, None, None, "Keypad LED State: {0}", "Bitfield of keypad LED states"),
    desc(511, None, None, "Keypad LED Flash State: {0}", "Bitfield of flashing keypad LEDs"),
    desc(550, None, None, "Time/Date Broadcast: {0}", "Panel date and time broadcast"),
    desc(560, None, None, "Ring Detected", "Ring detected on the telephone line"),
    desc(561, None, None, "Indoor Temperature: {0}", "Indoor temperature broadcast"),
    desc(562, None, None, "Outdoor Temperature: {0}", "Outdoor temperature broadcast"),
    desc(601, Some(Z), Some(H::Zone), "Zone {0} Alarm", "A zone has gone into alarm"),
    desc(602, Some(Z), Some(H::Zone), "Zone {0} Alarm Restored", "A zone alarm has been restored"),
    desc(603, Some(Z), Some(H::Zone), "Zone {0} Tamper", "A zone has a tamper condition"),
    desc(604, Some(Z), Some(H::Zone), "Zone {0} Tamper Restored", "A zone tamper condition has been restored"),
    desc(605, Some(Z), None, "Zone {0} Fault", "A zone has a fault condition"),
    desc(606, Some(Z), None, "Zone {0} Fault Restored", "A zone fault condition has been restored"),
    desc(609, Some(Z), None, "Zone {0} Open", "A zone has opened"),
    desc(610, Some(Z), None, "Zone {0} Restored", "A zone has been restored"),
    desc(620, None, None, "Duress Alarm: {0}", "A duress code was entered"),
    desc(621, None, None, "Fire Key Alarm", "A fire key alarm has been activated"),
    desc(622, None, None, "Fire Key Alarm Restored", "A fire key alarm has been restored"),
    desc(623, None, None, "Auxiliary Key Alarm", "An auxiliary key alarm has been activated"),
    desc(624, None, None, "Auxiliary Key Alarm Restored", "An auxiliary key alarm has been restored"),
    desc(625, None, None, "Panic Key Alarm", "A panic key alarm has been activated"),
    desc(626, None, None, "Panic Key Alarm Restored", "A panic key alarm has been restored"),
    desc(631, None, None, "Auxiliary Input Alarm", "A 2-wire smoke/aux input alarm has been activated"),
    desc(632, None, None, "Auxiliary Input Alarm Restored", "A 2-wire smoke/aux input alarm has been restored"),
    desc(650, Some(P), None, "Partition {0} Ready", "Partition is ready to arm"),
    desc(651, Some(P), None, "Partition {0} Not Ready", "Partition is not ready to arm"),
    desc(652, Some(P), Some(H::Partition), "Partition {0} Armed in {1} Mode", "Partition has been armed"),
    desc(653, Some(P), None, "Partition {0} Ready - Force Arming Enabled", "Partition is ready, force arming enabled"),
    desc(654, Some(P), None, "Partition {0} in Alarm", "Partition is in alarm"),
    desc(655, Some(P), None, "Partition {0} Disarmed", "Partition has been disarmed"),
    desc(656, Some(P), None, "Partition {0} Exit Delay in Progress", "Partition exit delay started"),
    desc(657, Some(P), None, "Partition {0} Entry Delay in Progress", "Partition entry delay started"),
    desc(658, Some(P), None, "Partition {0} Keypad Lock-out", "Keypad lock-out due to invalid codes"),
    desc(659, Some(P), None, "Partition {0} Failed to Arm", "An attempt to arm the partition failed"),
    desc(660, Some(P), None, "Partition {0} PGM Output in Progress", "A PGM output is in progress"),
    desc(663, Some(P), None, "Partition {0} Chime Enabled", "Door chime enabled"),
    desc(664, Some(P), None, "Partition {0} Chime Disabled", "Door chime disabled"),
    desc(670, Some(P), None, "Partition {0} Invalid Access Code", "An invalid access code was entered"),
    desc(671, Some(P), None, "Partition {0} Function Not Available", "The requested function is not available"),
    desc(672, Some(P), None, "Partition {0} Failure to Arm", "Partition could not be armed"),
    desc(673, Some(P), None, "Partition {0} Busy", "Partition is busy"),
    desc(674, Some(P), None, "Partition {0} System Arming in Progress", "Auto-arm sequence started"),
    desc(700, Some(P), Some(H::Partition), "Partition {0} Armed by User {1}", "A user armed the partition"),
    desc(701, Some(P), Some(H::Partition), "Partition {0} Armed by Special Method", "Armed by keyswitch, quick-arm or similar"),
    desc(702, Some(P), Some(H::Partition), "Partition {0} Armed with Zones Bypassed", "Armed with one or more zones bypassed"),
    desc(750, Some(P), Some(H::Partition), "Partition {0} Disarmed by User {1}", "A user disarmed the partition"),
    desc(751, Some(P), Some(H::Partition), "Partition {0} Disarmed by Special Method", "Disarmed by keyswitch or similar"),
    desc(800, None, None, "Panel Battery Trouble", "Panel battery is low"),
    desc(801, None, None, "Panel Battery Trouble Restored", "Panel battery has been restored"),
    desc(802, None, None, "Panel AC Trouble", "AC power to the panel has been removed"),
    desc(803, None, None, "Panel AC Restored", "AC power to the panel has been restored"),
    desc(806, None, None, "System Bell Trouble", "An open circuit was detected on the bell circuit"),
    desc(807, None, None, "System Bell Trouble Restored", "The bell circuit has been restored"),
    desc(829, None, None, "System Tamper", "A general system tamper was detected"),
    desc(830, None, None, "System Tamper Restored", "The general system tamper has been restored"),
    desc(840, Some(P), None, "Partition {0} Trouble LED On", "Partition trouble LED is on"),
    desc(841, Some(P), None, "Partition {0} Trouble LED Off", "Partition trouble LED is off"),
    desc(842, None, None, "Fire Trouble Alarm", "A fire trouble condition was detected"),
    desc(843, None, None, "Fire Trouble Alarm Restored", "The fire trouble condition has been restored"),
    desc(849, None, None, "Verbose Trouble Status: {0}", "Bitfield of active trouble conditions"),
    desc(900, None, None, "Code Required: {0}", "The panel is requesting an access code"),
    desc(912, None, None, "Command Output Pressed: {0}", "A command output was activated from a keypad"),
    desc(921, None, None, "Master Code Required", "The panel is requesting a master code"),
    desc(922, None, None, "Installer Code Required", "The panel is requesting an installer code"),
];

/// Look up the descriptor for a response code.
///
/// Unknown codes fail with [`EnvisalinkError::UnknownCode`]; the caller
/// logs and skips the offending line.
pub fn describe(code: u16) -> Result<&'static ResponseDescriptor> {
    RESPONSE_TABLE
        .binary_search_by_key(&code, |d| d.code)
        .map(|idx| &RESPONSE_TABLE[idx])
        .map_err(|_| EnvisalinkError::UnknownCode { code })
}

/// Arm-mode names keyed by the single-digit mode code in event 652.
pub fn arm_mode_name(mode: u8) -> Option<&'static str> {
    match mode {
        0 => Some("Away"),
        1 => Some("Stay"),
        2 => Some("Zero Entry Away"),
        3 => Some("Zero Entry Stay"),
        _ => None,
    }
}

/// Default zone status attached to published zone events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ZoneStatus {
    pub open: bool,
    pub fault: bool,
    pub alarm: bool,
    pub tamper: bool,
}

/// Default partition status attached to published partition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PartitionStatus {
    pub ready: bool,
    pub trouble: bool,
    pub armed: bool,
    pub armed_stay: bool,
    pub exit_delay: bool,
    pub entry_delay: bool,
    pub alarm: bool,
}

/// Status template for one event, by target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefaultStatus {
    Zone(ZoneStatus),
    Partition(PartitionStatus),
}
