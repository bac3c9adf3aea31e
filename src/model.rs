use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A student with a unique NIS used as QR scan payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub nis: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
}

/// A teacher with a unique NIP used as QR scan payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub nip: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Identity reference of an attendance record. A record belongs to exactly
/// one student or exactly one teacher; the variant makes that structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum PersonRef {
    Student(String),
    Teacher(String),
}

impl PersonRef {
    pub fn id(&self) -> &str {
        match self {
            PersonRef::Student(id) => id,
            PersonRef::Teacher(id) => id,
        }
    }
}

impl fmt::Display for PersonRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonRef::Student(id) => write!(f, "student {}", id),
            PersonRef::Teacher(id) => write!(f, "teacher {}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceMethod {
    Qr,
    Face,
}

impl AttendanceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceMethod::Qr => "QR",
            AttendanceMethod::Face => "FACE",
        }
    }
}

impl fmt::Display for AttendanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
        }
    }
}

/// A new attendance entry, before the store assigns an id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttendance {
    pub person: PersonRef,
    pub method: AttendanceMethod,
    /// Raw coordinate string as reported by the device, kept verbatim
    pub location: String,
    pub status: AttendanceStatus,
    pub recorded_at: DateTime<Utc>,
}

/// A persisted attendance record. Append-only: never mutated or deleted
/// by the check-in flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub person: PersonRef,
    pub method: AttendanceMethod,
    pub location: String,
    pub status: AttendanceStatus,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_ref_display() {
        assert_eq!(PersonRef::Student("s1".into()).to_string(), "student s1");
        assert_eq!(PersonRef::Teacher("t9".into()).to_string(), "teacher t9");
    }

    #[test]
    fn test_method_and_status_wire_names() {
        assert_eq!(AttendanceMethod::Qr.as_str(), "QR");
        assert_eq!(AttendanceMethod::Face.as_str(), "FACE");
        assert_eq!(AttendanceStatus::Present.as_str(), "PRESENT");
    }

    #[test]
    fn test_person_ref_serde_tagging() {
        let json = serde_json::to_string(&PersonRef::Student("s1".into())).unwrap();
        assert_eq!(json, r#"{"kind":"Student","id":"s1"}"#);
        let back: PersonRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), "s1");
    }
}
