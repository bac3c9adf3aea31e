use crate::error::StoreError;
use crate::model::{AttendanceRecord, NewAttendance, PersonRef, Student, Teacher};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Persistence collaborator for the check-in flow. Person records are
/// looked up, never mutated; attendance records are append-only.
/// Implementation-agnostic: a relational or document store behind this
/// trait behaves identically from the kiosk's point of view.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_student_by_nis(&self, nis: &str) -> Result<Option<Student>, StoreError>;

    async fn find_teacher_by_nip(&self, nip: &str) -> Result<Option<Teacher>, StoreError>;

    /// Append one record and return its new id
    async fn create_attendance(&self, record: NewAttendance) -> Result<String, StoreError>;

    /// Most recent record for a person, used by the duplicate-scan window
    async fn last_attendance_for(
        &self,
        person: &PersonRef,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn attendance_count(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    students: Vec<Student>,
    teachers: Vec<Teacher>,
    attendance: Vec<AttendanceRecord>,
}

/// In-memory store used by the binary's demo mode and the test suite
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Deserialize)]
struct SeedData {
    #[serde(default)]
    students: Vec<Student>,
    #[serde(default)]
    teachers: Vec<Teacher>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(students: Vec<Student>, teachers: Vec<Teacher>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            tables.students = students;
            tables.teachers = teachers;
        }
        store
    }

    /// Load person records from a JSON seed file
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let seed: SeedData = serde_json::from_str(&raw).map_err(|e| StoreError::Backend {
            details: format!("invalid seed file: {}", e),
        })?;
        info!(
            students = seed.students.len(),
            teachers = seed.teachers.len(),
            "loaded seed data from {}",
            path.as_ref().display()
        );
        Ok(Self::seeded(seed.students, seed.teachers))
    }

    /// Small built-in roster so the binary demonstrates the flow end to end
    pub fn default_roster() -> Self {
        Self::seeded(
            vec![
                Student {
                    id: "stu-1".to_string(),
                    name: "Ahmad Rizki".to_string(),
                    nis: "2024001".to_string(),
                    class_name: Some("X IPA 1".to_string()),
                    guardian_phone: Some("+62811000001".to_string()),
                },
                Student {
                    id: "stu-2".to_string(),
                    name: "Dewi Lestari".to_string(),
                    nis: "2024002".to_string(),
                    class_name: Some("X IPS 1".to_string()),
                    guardian_phone: Some("+62811000002".to_string()),
                },
            ],
            vec![Teacher {
                id: "tch-1".to_string(),
                name: "Siti Aminah".to_string(),
                nip: "19800101".to_string(),
                phone: Some("+62811000010".to_string()),
            }],
        )
    }

    /// Snapshot of all attendance records, for inspection
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.tables.read().attendance.clone()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_student_by_nis(&self, nis: &str) -> Result<Option<Student>, StoreError> {
        Ok(self
            .tables
            .read()
            .students
            .iter()
            .find(|s| s.nis == nis)
            .cloned())
    }

    async fn find_teacher_by_nip(&self, nip: &str) -> Result<Option<Teacher>, StoreError> {
        Ok(self
            .tables
            .read()
            .teachers
            .iter()
            .find(|t| t.nip == nip)
            .cloned())
    }

    async fn create_attendance(&self, record: NewAttendance) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let stored = AttendanceRecord {
            id: id.clone(),
            person: record.person,
            method: record.method,
            location: record.location,
            status: record.status,
            recorded_at: record.recorded_at,
        };
        self.tables.write().attendance.push(stored);
        debug!(record_id = %id, "attendance record appended");
        Ok(id)
    }

    async fn last_attendance_for(
        &self,
        person: &PersonRef,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .attendance
            .iter()
            .filter(|r| &r.person == person)
            .max_by_key(|r| r.recorded_at)
            .cloned())
    }

    async fn attendance_count(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().attendance.len())
    }
}
