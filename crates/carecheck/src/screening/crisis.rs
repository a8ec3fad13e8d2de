use serde::Serialize;

/// One emergency contact shown by the crisis protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmergencyContact {
    pub label: &'static str,
    pub destination: &'static str,
}

/// Fixed descriptor rendered whenever a run reaches the crisis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrisisProtocol {
    pub headline: &'static str,
    pub contacts: &'static [EmergencyContact],
    pub confidentiality_notice: &'static str,
}

static CONTACTS: [EmergencyContact; 3] = [
    EmergencyContact {
        label: "Psychiatry Department",
        destination: "Ext 123",
    },
    EmergencyContact {
        label: "TeleMANAS (24x7, free)",
        destination: "14416",
    },
    EmergencyContact {
        label: "Ambulance",
        destination: "108",
    },
];

pub fn crisis_protocol() -> CrisisProtocol {
    CrisisProtocol {
        headline: "HOSPITAL CRISIS PROTOCOL ACTIVATED",
        contacts: &CONTACTS,
        confidentiality_notice: "100% CONFIDENTIAL",
    }
}
