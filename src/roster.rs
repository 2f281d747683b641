//! School Roster Store
//! Mission: Hold the non-financial school records (departments, staff, students)
//!
//! Plain relational bookkeeping, no domain logic. Grading, timetables, and
//! salary processing live outside this service.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::ledger::LedgerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub department_id: Option<i64>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStaffMember {
    pub name: String,
    pub role: Option<String>,
    pub department_id: Option<i64>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<String>,
    pub school_year: i32,
    pub class_label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub birth_date: Option<String>,
    pub school_year: i32,
    pub class_label: Option<String>,
}

#[derive(Clone)]
pub struct RosterStore {
    conn: Arc<Mutex<Connection>>,
}

impl RosterStore {
    pub fn new(db_path: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS departments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS staff (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                role TEXT,
                department_id INTEGER REFERENCES departments(id)
                    ON DELETE SET NULL ON UPDATE CASCADE,
                phone TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS students (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                birth_date TEXT,
                school_year INTEGER NOT NULL,
                class_label TEXT
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn insert_department(&self, name: &str) -> Result<i64, LedgerError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO departments (name) VALUES (?1)",
            params![name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>, LedgerError> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("SELECT id, name FROM departments ORDER BY name ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Department {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn insert_staff(&self, member: &NewStaffMember) -> Result<i64, LedgerError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO staff (name, role, department_id, phone) VALUES (?1, ?2, ?3, ?4)",
            params![
                member.name,
                member.role.as_deref(),
                member.department_id,
                member.phone.as_deref(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub async fn list_staff(&self) -> Result<Vec<StaffMember>, LedgerError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, role, department_id, phone FROM staff ORDER BY name ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StaffMember {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    role: row.get(2)?,
                    department_id: row.get(3)?,
                    phone: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn insert_student(&self, student: &NewStudent) -> Result<i64, LedgerError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO students (name, birth_date, school_year, class_label)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                student.name,
                student.birth_date.as_deref(),
                student.school_year,
                student.class_label.as_deref(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, LedgerError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, birth_date, school_year, class_label
             FROM students ORDER BY name ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Student {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    birth_date: row.get(2)?,
                    school_year: row.get(3)?,
                    class_label: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Demo roster rows. Idempotent, keyed off the departments table.
pub async fn seed_demo_roster(store: &RosterStore) -> Result<(), LedgerError> {
    if !store.list_departments().await?.is_empty() {
        info!("Roster already populated, skipping demo seed");
        return Ok(());
    }

    let mut department_ids = Vec::new();
    for name in ["Matemática", "Física", "Química", "Informática"] {
        department_ids.push(store.insert_department(name).await?);
    }

    let staff = [
        ("Maria Costa", "Secretária", 0usize, "913445566"),
        ("Pedro Gomes", "Tesoureiro", 1, "912334455"),
    ];
    for (name, role, dep_idx, phone) in staff {
        store
            .insert_staff(&NewStaffMember {
                name: name.to_string(),
                role: Some(role.to_string()),
                department_id: Some(department_ids[dep_idx]),
                phone: Some(phone.to_string()),
            })
            .await?;
    }

    let students = [
        ("Ana Santos", "2010-03-15", 5, "A"),
        ("Bruno Almeida", "2011-06-22", 5, "A"),
        ("Clara Sousa", "2010-09-30", 5, "B"),
    ];
    for (name, birth, year, class_label) in students {
        store
            .insert_student(&NewStudent {
                name: name.to_string(),
                birth_date: Some(birth.to_string()),
                school_year: year,
                class_label: Some(class_label.to_string()),
            })
            .await?;
    }

    info!("Seeded demo roster data (4 departments, 2 staff, 3 students)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (RosterStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RosterStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (store, temp_file)
    }

    #[tokio::test]
    async fn test_insert_and_list_students() {
        let (store, _temp) = create_test_store();

        store
            .insert_student(&NewStudent {
                name: "Ana Santos".to_string(),
                birth_date: Some("2010-03-15".to_string()),
                school_year: 5,
                class_label: Some("A".to_string()),
            })
            .await
            .unwrap();

        let students = store.list_students().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Ana Santos");
        assert_eq!(students[0].school_year, 5);
    }

    #[tokio::test]
    async fn test_staff_survive_department_deletion_semantics() {
        let (store, _temp) = create_test_store();

        let dep = store.insert_department("Informática").await.unwrap();
        store
            .insert_staff(&NewStaffMember {
                name: "Maria Costa".to_string(),
                role: Some("Secretária".to_string()),
                department_id: Some(dep),
                phone: None,
            })
            .await
            .unwrap();

        let staff = store.list_staff().await.unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].department_id, Some(dep));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (store, _temp) = create_test_store();

        seed_demo_roster(&store).await.unwrap();
        seed_demo_roster(&store).await.unwrap();

        assert_eq!(store.list_departments().await.unwrap().len(), 4);
        assert_eq!(store.list_staff().await.unwrap().len(), 2);
        assert_eq!(store.list_students().await.unwrap().len(), 3);
    }
}
