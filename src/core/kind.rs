// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Top-level OSI message kinds.
//!
//! The set of kinds is closed: every trace carries one of the ten
//! top-level OSI interface messages. [`MessageKind::Unknown`] is the
//! sentinel for "not yet determined" and is rejected by every lookup.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use super::error::TraceError;

/// Protobuf package of all OSI messages.
pub const OSI_PACKAGE: &str = "osi3";

/// Top-level OSI message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MessageKind {
    /// Kind not determined
    Unknown,
    /// `osi3.GroundTruth`
    GroundTruth,
    /// `osi3.SensorData`
    SensorData,
    /// `osi3.SensorView`
    SensorView,
    /// `osi3.SensorViewConfiguration`
    SensorViewConfiguration,
    /// `osi3.HostVehicleData`
    HostVehicleData,
    /// `osi3.TrafficCommand`
    TrafficCommand,
    /// `osi3.TrafficCommandUpdate`
    TrafficCommandUpdate,
    /// `osi3.TrafficUpdate`
    TrafficUpdate,
    /// `osi3.MotionRequest`
    MotionRequest,
    /// `osi3.StreamingUpdate`
    StreamingUpdate,
}

/// File-name markers used to infer the kind of single-kind traces.
///
/// Checked in order against the lowercased file name; the first match wins.
const FILE_NAME_MARKERS: [(&str, MessageKind); 10] = [
    ("_gt_", MessageKind::GroundTruth),
    ("_sd_", MessageKind::SensorData),
    ("_sv_", MessageKind::SensorView),
    ("_svc_", MessageKind::SensorViewConfiguration),
    ("_hvd_", MessageKind::HostVehicleData),
    ("_tc_", MessageKind::TrafficCommand),
    ("_tcu_", MessageKind::TrafficCommandUpdate),
    ("_tu_", MessageKind::TrafficUpdate),
    ("_mr_", MessageKind::MotionRequest),
    ("_su_", MessageKind::StreamingUpdate),
];

impl MessageKind {
    /// All known kinds, excluding [`MessageKind::Unknown`].
    pub const ALL: [MessageKind; 10] = [
        MessageKind::GroundTruth,
        MessageKind::SensorData,
        MessageKind::SensorView,
        MessageKind::SensorViewConfiguration,
        MessageKind::HostVehicleData,
        MessageKind::TrafficCommand,
        MessageKind::TrafficCommandUpdate,
        MessageKind::TrafficUpdate,
        MessageKind::MotionRequest,
        MessageKind::StreamingUpdate,
    ];

    /// Unqualified message type name, e.g. `GroundTruth`.
    pub fn type_name(&self) -> &'static str {
        match self {
            MessageKind::Unknown => "Unknown",
            MessageKind::GroundTruth => "GroundTruth",
            MessageKind::SensorData => "SensorData",
            MessageKind::SensorView => "SensorView",
            MessageKind::SensorViewConfiguration => "SensorViewConfiguration",
            MessageKind::HostVehicleData => "HostVehicleData",
            MessageKind::TrafficCommand => "TrafficCommand",
            MessageKind::TrafficCommandUpdate => "TrafficCommandUpdate",
            MessageKind::TrafficUpdate => "TrafficUpdate",
            MessageKind::MotionRequest => "MotionRequest",
            MessageKind::StreamingUpdate => "StreamingUpdate",
        }
    }

    /// Fully qualified schema name, e.g. `osi3.GroundTruth`.
    pub fn schema_name(&self) -> String {
        format!("{OSI_PACKAGE}.{}", self.type_name())
    }

    /// Short form used in trace file names, e.g. `gt`.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            MessageKind::Unknown => "",
            MessageKind::GroundTruth => "gt",
            MessageKind::SensorData => "sd",
            MessageKind::SensorView => "sv",
            MessageKind::SensorViewConfiguration => "svc",
            MessageKind::HostVehicleData => "hvd",
            MessageKind::TrafficCommand => "tc",
            MessageKind::TrafficCommandUpdate => "tcu",
            MessageKind::TrafficUpdate => "tu",
            MessageKind::MotionRequest => "mr",
            MessageKind::StreamingUpdate => "su",
        }
    }

    /// Check if this is a real kind rather than the sentinel.
    pub fn is_known(&self) -> bool {
        !matches!(self, MessageKind::Unknown)
    }

    /// Resolve a fully qualified schema name (`osi3.SensorView`).
    pub fn from_schema_name(name: &str) -> Option<MessageKind> {
        let type_name = name.strip_prefix(OSI_PACKAGE)?.strip_prefix('.')?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == type_name)
    }

    /// Resolve a short file-name form (`sv`).
    pub fn from_abbreviation(abbreviation: &str) -> Option<MessageKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.abbreviation() == abbreviation)
    }

    /// Infer the kind from a trace file name using the naming markers.
    ///
    /// Only the final path component is inspected.
    pub fn infer_from_path(path: &Path) -> Option<MessageKind> {
        let file_name = path.file_name()?.to_str()?.to_lowercase();
        FILE_NAME_MARKERS
            .iter()
            .find(|(marker, _)| file_name.contains(marker))
            .map(|(_, kind)| *kind)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for MessageKind {
    type Err = TraceError;

    /// Accepts `GroundTruth`, `osi3.GroundTruth` or `gt`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = Self::from_schema_name(s) {
            return Ok(kind);
        }
        if let Some(kind) = Self::ALL.into_iter().find(|k| k.type_name() == s) {
            return Ok(kind);
        }
        Self::from_abbreviation(&s.to_lowercase()).ok_or_else(|| TraceError::unknown_kind(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        assert_eq!(MessageKind::GroundTruth.schema_name(), "osi3.GroundTruth");
        assert_eq!(
            MessageKind::SensorViewConfiguration.schema_name(),
            "osi3.SensorViewConfiguration"
        );
    }

    #[test]
    fn test_from_schema_name() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_schema_name(&kind.schema_name()), Some(kind));
        }
        assert_eq!(MessageKind::from_schema_name("osi3.Unknown"), None);
        assert_eq!(MessageKind::from_schema_name("GroundTruth"), None);
        assert_eq!(MessageKind::from_schema_name("osi3GroundTruth"), None);
    }

    #[test]
    fn test_from_str_accepts_all_spellings() {
        assert_eq!("SensorView".parse::<MessageKind>(), Ok(MessageKind::SensorView));
        assert_eq!("osi3.SensorView".parse::<MessageKind>(), Ok(MessageKind::SensorView));
        assert_eq!("sv".parse::<MessageKind>(), Ok(MessageKind::SensorView));
        assert_eq!("TU".parse::<MessageKind>(), Ok(MessageKind::TrafficUpdate));
        assert!(matches!(
            "Bogus".parse::<MessageKind>(),
            Err(TraceError::UnknownKind { .. })
        ));
    }

    #[test]
    fn test_infer_from_path() {
        let cases = [
            ("test_gt_.osi", MessageKind::GroundTruth),
            ("test_sv_.osi", MessageKind::SensorView),
            ("empty_sv_99.osi", MessageKind::SensorView),
            ("20210818T150542Z_svc_370_3200_1_cfg.osi", MessageKind::SensorViewConfiguration),
            ("x_tcu_.txth", MessageKind::TrafficCommandUpdate),
            ("x_tc_.txth", MessageKind::TrafficCommand),
            ("RUN_HVD_1.osi", MessageKind::HostVehicleData),
            ("a_su_b.osi", MessageKind::StreamingUpdate),
        ];
        for (name, expected) in cases {
            assert_eq!(
                MessageKind::infer_from_path(Path::new(name)),
                Some(expected),
                "{name}"
            );
        }
    }

    #[test]
    fn test_infer_uses_first_marker() {
        assert_eq!(
            MessageKind::infer_from_path(Path::new("a_gt_sv_.osi")),
            Some(MessageKind::GroundTruth)
        );
    }

    #[test]
    fn test_infer_ignores_directories() {
        assert_eq!(
            MessageKind::infer_from_path(Path::new("/data/run_gt_/invalid_filename.osi")),
            None
        );
    }

    #[test]
    fn test_unknown_is_not_known() {
        assert!(!MessageKind::Unknown.is_known());
        assert!(MessageKind::ALL.iter().all(|k| k.is_known()));
    }
}
