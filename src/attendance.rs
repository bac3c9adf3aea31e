use crate::config::AttendanceConfig;
use crate::error::SubmitError;
use crate::model::{AttendanceMethod, AttendanceStatus, NewAttendance, PersonRef};
use crate::notify::GuardianNotifier;
use crate::store::AttendanceStore;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful submission, surfaced to the UI
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub record_id: String,
    pub person: PersonRef,
    pub person_name: String,
    pub recorded_at: chrono::DateTime<Utc>,
}

/// Resolves a scanned code to a person and appends one attendance record.
/// Idempotent only per invoking call; repeated scans in a session are the
/// caller's concern, repeated scans across sessions are governed by the
/// optional duplicate window.
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    notifier: Arc<dyn GuardianNotifier>,
    duplicate_window: Option<Duration>,
    notify_present: bool,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        notifier: Arc<dyn GuardianNotifier>,
        config: &AttendanceConfig,
    ) -> Self {
        let duplicate_window = if config.duplicate_window_minutes > 0 {
            Some(Duration::minutes(config.duplicate_window_minutes as i64))
        } else {
            None
        };
        Self {
            store,
            notifier,
            duplicate_window,
            notify_present: config.notify_present,
        }
    }

    /// Submit a scanned code. Students are resolved first by NIS, then
    /// teachers by NIP; an unmatched code writes nothing.
    pub async fn submit_scan(
        &self,
        code: &str,
        method: AttendanceMethod,
        location: &str,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let (person, name, contact) = self.resolve(code).await?;

        if let Some(window) = self.duplicate_window {
            if let Some(last) = self.store.last_attendance_for(&person).await? {
                if Utc::now() - last.recorded_at < window {
                    info!(%person, last_seen = %last.recorded_at, "duplicate scan within window");
                    return Err(SubmitError::DuplicateScan {
                        person,
                        last_seen: last.recorded_at,
                    });
                }
            }
        }

        let recorded_at = Utc::now();
        let record_id = self
            .store
            .create_attendance(NewAttendance {
                person: person.clone(),
                method,
                location: location.to_string(),
                status: AttendanceStatus::Present,
                recorded_at,
            })
            .await?;

        info!(%person, %record_id, %method, "attendance recorded");

        if self.notify_present {
            self.dispatch_notification(&name, contact, recorded_at);
        }

        Ok(SubmissionReceipt {
            record_id,
            person,
            person_name: name,
            recorded_at,
        })
    }

    async fn resolve(
        &self,
        code: &str,
    ) -> Result<(PersonRef, String, Option<String>), SubmitError> {
        if let Some(student) = self.store.find_student_by_nis(code).await? {
            return Ok((
                PersonRef::Student(student.id),
                student.name,
                student.guardian_phone,
            ));
        }
        if let Some(teacher) = self.store.find_teacher_by_nip(code).await? {
            return Ok((PersonRef::Teacher(teacher.id), teacher.name, teacher.phone));
        }
        info!(code, "scan code not recognized");
        Err(SubmitError::NotRecognized {
            code: code.to_string(),
        })
    }

    /// Best effort, off the submission path. A transport failure is logged
    /// and swallowed; the attendance write has already happened.
    fn dispatch_notification(
        &self,
        name: &str,
        contact: Option<String>,
        recorded_at: chrono::DateTime<Utc>,
    ) {
        let Some(recipient) = contact else {
            return;
        };
        let notifier = Arc::clone(&self.notifier);
        let message = format!(
            "{} telah hadir di sekolah pada {}",
            name,
            recorded_at.format("%H:%M")
        );
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&recipient, &message).await {
                warn!("guardian notification failed: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingNotifier {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl GuardianNotifier for CountingNotifier {
        async fn notify(&self, _recipient: &str, _message: &str) -> Result<(), NotifyError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl GuardianNotifier for FailingNotifier {
        async fn notify(&self, _recipient: &str, _message: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Transport {
                details: "gateway down".to_string(),
            })
        }
    }

    fn config(duplicate_window_minutes: u32) -> AttendanceConfig {
        AttendanceConfig {
            duplicate_window_minutes,
            notify_present: true,
        }
    }

    fn service_with(
        store: Arc<MemoryStore>,
        notifier: Arc<dyn GuardianNotifier>,
        window: u32,
    ) -> AttendanceService {
        AttendanceService::new(store, notifier, &config(window))
    }

    #[tokio::test]
    async fn test_student_nis_binds_student_not_teacher() {
        let store = Arc::new(MemoryStore::default_roster());
        let service = service_with(store.clone(), Arc::new(CountingNotifier::default()), 0);

        let receipt = service
            .submit_scan("2024001", AttendanceMethod::Qr, "-6.2,106.816666")
            .await
            .unwrap();

        assert_eq!(receipt.person, PersonRef::Student("stu-1".to_string()));
        assert_eq!(receipt.person_name, "Ahmad Rizki");

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, AttendanceMethod::Qr);
        assert_eq!(records[0].status.as_str(), "PRESENT");
        assert_eq!(records[0].location, "-6.2,106.816666");
    }

    #[tokio::test]
    async fn test_teacher_nip_binds_teacher() {
        let store = Arc::new(MemoryStore::default_roster());
        let service = service_with(store.clone(), Arc::new(CountingNotifier::default()), 0);

        let receipt = service
            .submit_scan("19800101", AttendanceMethod::Qr, "-6.2,106.816666")
            .await
            .unwrap();

        assert_eq!(receipt.person, PersonRef::Teacher("tch-1".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_code_writes_nothing() {
        let store = Arc::new(MemoryStore::default_roster());
        let service = service_with(store.clone(), Arc::new(CountingNotifier::default()), 0);

        let err = service
            .submit_scan("9999999", AttendanceMethod::Qr, "-6.2,106.816666")
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::NotRecognized { code } if code == "9999999"));
        assert_eq!(store.attendance_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_submission() {
        let store = Arc::new(MemoryStore::default_roster());
        let service = service_with(store.clone(), Arc::new(FailingNotifier), 0);

        let receipt = service
            .submit_scan("2024001", AttendanceMethod::Qr, "-6.2,106.816666")
            .await;

        assert!(receipt.is_ok());
        assert_eq!(store.attendance_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_guardian_notification_is_sent() {
        let store = Arc::new(MemoryStore::default_roster());
        let notifier = Arc::new(CountingNotifier::default());
        let service = service_with(store, notifier.clone(), 0);

        service
            .submit_scan("2024001", AttendanceMethod::Qr, "-6.2,106.816666")
            .await
            .unwrap();

        // The notification task is spawned; let it run
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_window_rejects_repeat_scan() {
        let store = Arc::new(MemoryStore::default_roster());
        let service = service_with(store.clone(), Arc::new(CountingNotifier::default()), 10);

        service
            .submit_scan("2024001", AttendanceMethod::Qr, "-6.2,106.816666")
            .await
            .unwrap();

        let err = service
            .submit_scan("2024001", AttendanceMethod::Qr, "-6.2,106.816666")
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::DuplicateScan { .. }));
        assert_eq!(store.attendance_count().await.unwrap(), 1);

        // A different person is unaffected by the window
        service
            .submit_scan("2024002", AttendanceMethod::Qr, "-6.2,106.816666")
            .await
            .unwrap();
        assert_eq!(store.attendance_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_disabled_window_admits_repeat_scans() {
        let store = Arc::new(MemoryStore::default_roster());
        let service = service_with(store.clone(), Arc::new(CountingNotifier::default()), 0);

        service
            .submit_scan("2024001", AttendanceMethod::Qr, "loc")
            .await
            .unwrap();
        service
            .submit_scan("2024001", AttendanceMethod::Qr, "loc")
            .await
            .unwrap();

        assert_eq!(store.attendance_count().await.unwrap(), 2);
    }
}
