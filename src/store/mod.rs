use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Map a unique-constraint violation to `Conflict` so callers can tell a
/// collision apart from an ordinary database failure. The share-code
/// registry treats a `Conflict` on the code column as a retry signal.
fn map_constraint(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(e.to_string())
        }
        _ => StoreError::Database(e),
    }
}

/// Thread-safe SQLite store
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                phone TEXT UNIQUE,
                password_hash TEXT NOT NULL,
                display_name TEXT DEFAULT '',
                profession TEXT NOT NULL DEFAULT 'other',
                profession_info TEXT DEFAULT '{}',
                share_code TEXT UNIQUE,
                shared_with TEXT DEFAULT '[]',
                access_via TEXT DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS contacts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                linked_user_id TEXT,
                referred_by TEXT,
                referrals TEXT DEFAULT '[]',
                task_list_id TEXT,
                meeting_list_id TEXT,
                transaction_list_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS lists (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                list_type TEXT NOT NULL DEFAULT 'custom',
                is_default INTEGER DEFAULT 0,
                contact_owner TEXT,
                color TEXT DEFAULT '',
                icon TEXT DEFAULT '',
                members TEXT DEFAULT '[]',
                shared_with TEXT DEFAULT '[]',
                alarm_lead_minutes INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (contact_owner) REFERENCES contacts(id)
            );

            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                list_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending',
                priority TEXT NOT NULL DEFAULT 'medium',
                due_at TEXT,
                start_at TEXT,
                end_at TEXT,
                completed_at TEXT,
                payload TEXT DEFAULT 'null',
                alarms TEXT DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (list_id) REFERENCES lists(id)
            );

            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                name TEXT NOT NULL,
                UNIQUE(category, name)
            );

            CREATE INDEX IF NOT EXISTS idx_contacts_user_id ON contacts(user_id);
            CREATE INDEX IF NOT EXISTS idx_lists_user_id ON lists(user_id);
            CREATE INDEX IF NOT EXISTS idx_items_list_id ON items(list_id);
            CREATE INDEX IF NOT EXISTS idx_tags_name ON tags(name);
            -- one default list per (contact, category)
            CREATE UNIQUE INDEX IF NOT EXISTS idx_lists_default_per_contact
                ON lists(contact_owner, list_type) WHERE is_default = 1;
            "#,
        )?;
        Ok(())
    }

    // ==================== User Operations ====================

    pub fn create_user(&self, user: &mut User) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        user.id = Uuid::new_v4().to_string();
        let now = Utc::now();
        user.created_at = now;
        user.updated_at = now;

        let profession_info_json = serde_json::to_string(&user.profession_info)?;
        let shared_with_json = serde_json::to_string(&user.shared_with)?;
        let access_via_json = serde_json::to_string(&user.access_via)?;

        conn.execute(
            r#"INSERT INTO users (id, email, phone, password_hash, display_name, profession,
                profession_info, share_code, shared_with, access_via, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
            params![
                &user.id,
                &user.email,
                &user.phone,
                &user.password_hash,
                &user.display_name,
                user.profession.as_str(),
                &profession_info_json,
                &user.share_code,
                &shared_with_json,
                &access_via_json,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )
        .map_err(map_constraint)?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], |row| {
            row_to_user(row)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("User {}", id)),
            _ => StoreError::Database(e),
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM users WHERE email = ?1",
            params![email],
            |row| row_to_user(row),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::NotFound(format!("User {}", email))
            }
            _ => StoreError::Database(e),
        })
    }

    pub fn get_user_by_share_code(&self, code: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM users WHERE share_code = ?1",
            params![code],
            |row| row_to_user(row),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::NotFound(format!("Share code {}", code))
            }
            _ => StoreError::Database(e),
        })
    }

    /// Compare-and-set the user's share code. The UNIQUE index on the
    /// column is the serialization point: assigning a code another
    /// account already holds fails with `Conflict`. Returns false when
    /// this account already has a code (the guard column was not NULL),
    /// in which case nothing was written.
    pub fn assign_share_code(&self, user_id: &str, code: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn
            .execute(
                "UPDATE users SET share_code = ?1, updated_at = ?2 WHERE id = ?3 AND share_code IS NULL",
                params![code, Utc::now().to_rfc3339(), user_id],
            )
            .map_err(map_constraint)?;
        Ok(rows == 1)
    }

    /// Append a grant to the user's outbound sharing list unless one
    /// already exists for that grantee. Returns whether a new record was
    /// written. Read-modify-write happens under a single lock.
    pub fn append_share_grant(
        &self,
        owner_id: &str,
        grantee_id: &str,
        level: AccessLevel,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let shared_with_json: String = conn
            .query_row(
                "SELECT shared_with FROM users WHERE id = ?1",
                params![owner_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("User {}", owner_id))
                }
                _ => StoreError::Database(e),
            })?;

        let mut shared_with: Vec<ShareGrant> = serde_json::from_str(&shared_with_json)?;
        if shared_with.iter().any(|g| g.user_id == grantee_id) {
            return Ok(false);
        }
        shared_with.push(ShareGrant {
            user_id: grantee_id.to_string(),
            level,
            granted_at: Utc::now(),
        });

        conn.execute(
            "UPDATE users SET shared_with = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&shared_with)?,
                Utc::now().to_rfc3339(),
                owner_id
            ],
        )?;
        Ok(true)
    }

    /// Append a redemption record to the user's inbound access list
    /// unless one already exists for that exact code. Returns whether a
    /// new record was written.
    pub fn append_access_record(
        &self,
        user_id: &str,
        code: &str,
        owner_id: &str,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let access_via_json: String = conn
            .query_row(
                "SELECT access_via FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("User {}", user_id))
                }
                _ => StoreError::Database(e),
            })?;

        let mut access_via: Vec<AccessRecord> = serde_json::from_str(&access_via_json)?;
        if access_via.iter().any(|r| r.code == code) {
            return Ok(false);
        }
        access_via.push(AccessRecord {
            code: code.to_string(),
            owner_id: owner_id.to_string(),
            redeemed_at: Utc::now(),
        });

        conn.execute(
            "UPDATE users SET access_via = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&access_via)?,
                Utc::now().to_rfc3339(),
                user_id
            ],
        )?;
        Ok(true)
    }

    // ==================== Contact Operations ====================

    pub fn create_contact(&self, contact: &mut Contact) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        contact.id = Uuid::new_v4().to_string();
        let now = Utc::now();
        contact.created_at = now;
        contact.updated_at = now;

        let referrals_json = serde_json::to_string(&contact.referrals)?;

        conn.execute(
            r#"INSERT INTO contacts (id, user_id, name, linked_user_id, referred_by, referrals,
                task_list_id, meeting_list_id, transaction_list_id, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                &contact.id,
                &contact.user_id,
                &contact.name,
                &contact.linked_user_id,
                &contact.referred_by,
                &referrals_json,
                &contact.task_list_id,
                &contact.meeting_list_id,
                &contact.transaction_list_id,
                contact.created_at.to_rfc3339(),
                contact.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_contact(&self, id: &str) -> StoreResult<Contact> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM contacts WHERE id = ?1",
            params![id],
            |row| row_to_contact(row),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::NotFound(format!("Contact {}", id))
            }
            _ => StoreError::Database(e),
        })
    }

    pub fn list_contacts(&self, user_id: &str, limit: i64, offset: i64) -> StoreResult<Vec<Contact>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"SELECT * FROM contacts WHERE user_id = ?1
               ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"#,
        )?;
        let rows = stmt.query_map(params![user_id, limit, offset], |row| row_to_contact(row))?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?);
        }
        Ok(contacts)
    }

    pub fn update_contact(&self, contact: &mut Contact) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        contact.updated_at = Utc::now();

        let rows = conn.execute(
            r#"UPDATE contacts SET name = ?1, linked_user_id = ?2, updated_at = ?3
               WHERE id = ?4"#,
            params![
                &contact.name,
                &contact.linked_user_id,
                contact.updated_at.to_rfc3339(),
                &contact.id,
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("Contact {}", contact.id)));
        }
        Ok(())
    }

    /// Delete a contact together with its default lists and their items.
    pub fn delete_contact(&self, id: &str) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            r#"DELETE FROM items WHERE list_id IN
               (SELECT id FROM lists WHERE contact_owner = ?1 AND is_default = 1)"#,
            params![id],
        )?;
        tx.execute(
            "DELETE FROM lists WHERE contact_owner = ?1 AND is_default = 1",
            params![id],
        )?;
        let rows = tx.execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("Contact {}", id)));
        }
        tx.commit()?;
        Ok(())
    }

    /// Record a forward referral edge on the referring contact.
    pub fn append_referral(&self, referrer_id: &str, referred_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let referrals_json: String = conn
            .query_row(
                "SELECT referrals FROM contacts WHERE id = ?1",
                params![referrer_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("Contact {}", referrer_id))
                }
                _ => StoreError::Database(e),
            })?;

        let mut referrals: Vec<String> = serde_json::from_str(&referrals_json)?;
        if referrals.iter().any(|r| r == referred_id) {
            return Ok(());
        }
        referrals.push(referred_id.to_string());

        conn.execute(
            "UPDATE contacts SET referrals = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&referrals)?,
                Utc::now().to_rfc3339(),
                referrer_id
            ],
        )?;
        Ok(())
    }

    /// Point the contact's default-list back-reference for a category at
    /// the given list. Only the three default categories have a slot.
    pub fn set_default_list_ref(
        &self,
        contact_id: &str,
        category: ListCategory,
        list_id: &str,
    ) -> StoreResult<()> {
        let column = match category {
            ListCategory::Task => "task_list_id",
            ListCategory::Meeting => "meeting_list_id",
            ListCategory::Transaction => "transaction_list_id",
            other => {
                return Err(StoreError::Conflict(format!(
                    "{} lists have no default slot",
                    other.as_str()
                )))
            }
        };

        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            &format!(
                "UPDATE contacts SET {} = ?1, updated_at = ?2 WHERE id = ?3",
                column
            ),
            params![list_id, Utc::now().to_rfc3339(), contact_id],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("Contact {}", contact_id)));
        }
        Ok(())
    }

    // ==================== List Operations ====================

    pub fn create_list(&self, list: &mut List) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        list.id = Uuid::new_v4().to_string();
        let now = Utc::now();
        list.created_at = now;
        list.updated_at = now;

        let members_json = serde_json::to_string(&list.members)?;
        let shared_with_json = serde_json::to_string(&list.shared_with)?;

        conn.execute(
            r#"INSERT INTO lists (id, user_id, name, list_type, is_default, contact_owner,
                color, icon, members, shared_with, alarm_lead_minutes, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
            params![
                &list.id,
                &list.user_id,
                &list.name,
                list.list_type.as_str(),
                list.is_default,
                &list.contact_owner,
                &list.color,
                &list.icon,
                &members_json,
                &shared_with_json,
                list.alarm_lead_minutes,
                list.created_at.to_rfc3339(),
                list.updated_at.to_rfc3339(),
            ],
        )
        .map_err(map_constraint)?;
        Ok(())
    }

    pub fn get_list(&self, id: &str) -> StoreResult<List> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM lists WHERE id = ?1", params![id], |row| {
            row_to_list(row)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("List {}", id)),
            _ => StoreError::Database(e),
        })
    }

    pub fn list_lists(&self, user_id: &str) -> StoreResult<Vec<List>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM lists WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row_to_list(row))?;

        let mut lists = Vec::new();
        for row in rows {
            lists.push(row?);
        }
        Ok(lists)
    }

    /// The default list for (contact, category), if one exists. Used by
    /// the lifecycle manager to resume a partial provisioning attempt.
    pub fn find_default_list(
        &self,
        contact_id: &str,
        category: ListCategory,
    ) -> StoreResult<Option<List>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            r#"SELECT * FROM lists WHERE contact_owner = ?1 AND list_type = ?2
               AND is_default = 1"#,
            params![contact_id, category.as_str()],
            |row| row_to_list(row),
        ) {
            Ok(list) => Ok(Some(list)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub fn update_list(&self, list: &mut List) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        list.updated_at = Utc::now();

        let members_json = serde_json::to_string(&list.members)?;

        let rows = conn.execute(
            r#"UPDATE lists SET name = ?1, color = ?2, icon = ?3, members = ?4,
               alarm_lead_minutes = ?5, updated_at = ?6 WHERE id = ?7"#,
            params![
                &list.name,
                &list.color,
                &list.icon,
                &members_json,
                list.alarm_lead_minutes,
                list.updated_at.to_rfc3339(),
                &list.id,
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("List {}", list.id)));
        }
        Ok(())
    }

    /// Append a list-level grant unless one already exists for that user.
    pub fn append_list_grant(
        &self,
        list_id: &str,
        user_id: &str,
        level: AccessLevel,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let shared_with_json: String = conn
            .query_row(
                "SELECT shared_with FROM lists WHERE id = ?1",
                params![list_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("List {}", list_id))
                }
                _ => StoreError::Database(e),
            })?;

        let mut shared_with: Vec<ListGrant> = serde_json::from_str(&shared_with_json)?;
        if shared_with.iter().any(|g| g.user_id == user_id) {
            return Ok(false);
        }
        shared_with.push(ListGrant {
            user_id: user_id.to_string(),
            level,
        });

        conn.execute(
            "UPDATE lists SET shared_with = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&shared_with)?,
                Utc::now().to_rfc3339(),
                list_id
            ],
        )?;
        Ok(true)
    }

    // ==================== Item Operations ====================

    pub fn create_item(&self, item: &mut Item) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        item.id = Uuid::new_v4().to_string();
        let now = Utc::now();
        item.created_at = now;
        item.updated_at = now;
        for alarm in item.alarms.iter_mut() {
            if alarm.id.is_empty() {
                alarm.id = Uuid::new_v4().to_string();
            }
        }

        let payload_json = serde_json::to_string(&item.payload)?;
        let alarms_json = serde_json::to_string(&item.alarms)?;

        conn.execute(
            r#"INSERT INTO items (id, list_id, title, description, status, priority,
                due_at, start_at, end_at, completed_at, payload, alarms, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"#,
            params![
                &item.id,
                &item.list_id,
                &item.title,
                &item.description,
                item.status.as_str(),
                item.priority.as_str(),
                item.due_at.map(|t| t.to_rfc3339()),
                item.start_at.map(|t| t.to_rfc3339()),
                item.end_at.map(|t| t.to_rfc3339()),
                item.completed_at.map(|t| t.to_rfc3339()),
                &payload_json,
                &alarms_json,
                item.created_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_item(&self, id: &str) -> StoreResult<Item> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM items WHERE id = ?1", params![id], |row| {
            row_to_item(row)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("Item {}", id)),
            _ => StoreError::Database(e),
        })
    }

    pub fn list_items(&self, list_id: &str) -> StoreResult<Vec<Item>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM items WHERE list_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![list_id], |row| row_to_item(row))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Persist item changes. The completion timestamp is stamped on the
    /// first transition into `completed` and never overwritten after.
    pub fn update_item(&self, item: &mut Item) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        item.updated_at = now;
        if item.status == ItemStatus::Completed && item.completed_at.is_none() {
            item.completed_at = Some(now);
        }

        let payload_json = serde_json::to_string(&item.payload)?;
        let alarms_json = serde_json::to_string(&item.alarms)?;

        let rows = conn.execute(
            r#"UPDATE items SET title = ?1, description = ?2, status = ?3, priority = ?4,
               due_at = ?5, start_at = ?6, end_at = ?7,
               completed_at = COALESCE(completed_at, ?8),
               payload = ?9, alarms = ?10, updated_at = ?11 WHERE id = ?12"#,
            params![
                &item.title,
                &item.description,
                item.status.as_str(),
                item.priority.as_str(),
                item.due_at.map(|t| t.to_rfc3339()),
                item.start_at.map(|t| t.to_rfc3339()),
                item.end_at.map(|t| t.to_rfc3339()),
                item.completed_at.map(|t| t.to_rfc3339()),
                &payload_json,
                &alarms_json,
                item.updated_at.to_rfc3339(),
                &item.id,
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(format!("Item {}", item.id)));
        }
        Ok(())
    }

    /// Flip an alarm's triggered flag. Monotonic: a second call is a
    /// no-op and the original triggered_at stands.
    pub fn mark_alarm_triggered(&self, item_id: &str, alarm_id: &str) -> StoreResult<Alarm> {
        let conn = self.conn.lock().unwrap();
        let alarms_json: String = conn
            .query_row(
                "SELECT alarms FROM items WHERE id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StoreError::NotFound(format!("Item {}", item_id))
                }
                _ => StoreError::Database(e),
            })?;

        let mut alarms: Vec<Alarm> = serde_json::from_str(&alarms_json)?;
        let alarm = alarms
            .iter_mut()
            .find(|a| a.id == alarm_id)
            .ok_or_else(|| StoreError::NotFound(format!("Alarm {}", alarm_id)))?;

        if !alarm.triggered {
            alarm.triggered = true;
            alarm.triggered_at = Some(Utc::now());
        }
        let updated = alarm.clone();

        conn.execute(
            "UPDATE items SET alarms = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&alarms)?,
                Utc::now().to_rfc3339(),
                item_id
            ],
        )?;
        Ok(updated)
    }

    // ==================== Tag Operations ====================

    /// Insert a taxonomy entry, returning the existing one if the
    /// (category, name) pair is already present.
    pub fn upsert_tag(&self, category: &str, name: &str) -> StoreResult<Tag> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO tags (id, category, name) VALUES (?1, ?2, ?3)",
            params![Uuid::new_v4().to_string(), category, name],
        )?;
        conn.query_row(
            "SELECT * FROM tags WHERE category = ?1 AND name = ?2",
            params![category, name],
            |row| {
                Ok(Tag {
                    id: row.get("id")?,
                    category: row.get("category")?,
                    name: row.get("name")?,
                })
            },
        )
        .map_err(StoreError::Database)
    }

    pub fn count_tags(&self) -> StoreResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Prefix search over the taxonomy, optionally scoped to a category.
    pub fn search_tags(
        &self,
        query: &str,
        category: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<Tag>> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("{}%", query);
        let mut tags = Vec::new();

        if let Some(cat) = category {
            let mut stmt = conn.prepare(
                r#"SELECT * FROM tags WHERE category = ?1 AND name LIKE ?2
                   ORDER BY name ASC LIMIT ?3"#,
            )?;
            let rows = stmt.query_map(params![cat, pattern, limit], |row| {
                Ok(Tag {
                    id: row.get("id")?,
                    category: row.get("category")?,
                    name: row.get("name")?,
                })
            })?;
            for row in rows {
                tags.push(row?);
            }
        } else {
            let mut stmt = conn.prepare(
                "SELECT * FROM tags WHERE name LIKE ?1 ORDER BY name ASC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![pattern, limit], |row| {
                Ok(Tag {
                    id: row.get("id")?,
                    category: row.get("category")?,
                    name: row.get("name")?,
                })
            })?;
            for row in rows {
                tags.push(row?);
            }
        }
        Ok(tags)
    }
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let profession: String = row.get("profession")?;
    let profession_info_str: String = row.get("profession_info")?;
    let shared_with_str: String = row.get("shared_with")?;
    let access_via_str: String = row.get("access_via")?;

    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        password_hash: row.get("password_hash")?,
        display_name: row.get("display_name")?,
        profession: Profession::parse(&profession),
        profession_info: serde_json::from_str(&profession_info_str).unwrap_or_default(),
        share_code: row.get("share_code")?,
        shared_with: serde_json::from_str(&shared_with_str).unwrap_or_default(),
        access_via: serde_json::from_str(&access_via_str).unwrap_or_default(),
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
        updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
    })
}

fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
    let referrals_str: String = row.get("referrals")?;

    Ok(Contact {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        linked_user_id: row.get("linked_user_id")?,
        referred_by: row.get("referred_by")?,
        referrals: serde_json::from_str(&referrals_str).unwrap_or_default(),
        task_list_id: row.get("task_list_id")?,
        meeting_list_id: row.get("meeting_list_id")?,
        transaction_list_id: row.get("transaction_list_id")?,
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
        updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
    })
}

fn row_to_list(row: &rusqlite::Row) -> rusqlite::Result<List> {
    let list_type: String = row.get("list_type")?;
    let members_str: String = row.get("members")?;
    let shared_with_str: String = row.get("shared_with")?;

    Ok(List {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        list_type: ListCategory::parse(&list_type),
        is_default: row.get("is_default")?,
        contact_owner: row.get("contact_owner")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        members: serde_json::from_str(&members_str).unwrap_or_default(),
        shared_with: serde_json::from_str(&shared_with_str).unwrap_or_default(),
        alarm_lead_minutes: row.get("alarm_lead_minutes")?,
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
        updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
    })
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    let status: String = row.get("status")?;
    let priority: String = row.get("priority")?;
    let payload_str: String = row.get("payload")?;
    let alarms_str: String = row.get("alarms")?;

    let due_at: Option<String> = row.get("due_at")?;
    let start_at: Option<String> = row.get("start_at")?;
    let end_at: Option<String> = row.get("end_at")?;
    let completed_at: Option<String> = row.get("completed_at")?;

    Ok(Item {
        id: row.get("id")?,
        list_id: row.get("list_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: ItemStatus::parse(&status),
        priority: Priority::parse(&priority),
        due_at: due_at.map(parse_datetime),
        start_at: start_at.map(parse_datetime),
        end_at: end_at.map(parse_datetime),
        completed_at: completed_at.map(parse_datetime),
        payload: serde_json::from_str(&payload_str).unwrap_or_default(),
        alarms: serde_json::from_str(&alarms_str).unwrap_or_default(),
        created_at: parse_datetime(row.get::<_, String>("created_at")?),
        updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
    })
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
