//! Default-list lifecycle management.
//!
//! Every contact owns exactly one default list per category in
//! {task, meeting, transaction}, provisioned when the contact is
//! created. Provisioning is an explicit call in the creation path (not a
//! persistence hook), idempotent, and resumable: a partial prior attempt
//! is completed by creating only the missing lists.

use chrono::{Duration, Utc};
use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    Alarm, AlarmChannel, Contact, CreateItemRequest, Item, ItemStatus, List, ListCategory,
};
use crate::store::{Store, StoreError};

/// Categories every contact gets a default list for.
pub const DEFAULT_CATEGORIES: [ListCategory; 3] = [
    ListCategory::Task,
    ListCategory::Meeting,
    ListCategory::Transaction,
];

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("contact {contact_id} has no default {category} list")]
    DefaultListMissing {
        contact_id: String,
        category: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

pub struct DefaultListManager {
    store: Arc<Store>,
}

impl DefaultListManager {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Provision the contact's default lists, creating only what is
    /// missing, and wire the back-references. Safe to re-invoke: a
    /// contact with all three references populated is left untouched,
    /// and a contact that crashed mid-provisioning is completed.
    pub fn ensure_default_lists(&self, contact_id: &str) -> LifecycleResult<Contact> {
        let mut contact = self.store.get_contact(contact_id)?;

        for category in DEFAULT_CATEGORIES {
            if contact.default_list_id(category).is_some() {
                continue;
            }

            // A list may exist from a prior attempt that died before the
            // back-reference was written.
            let list = match self.store.find_default_list(&contact.id, category)? {
                Some(existing) => existing,
                None => self.create_default_list(&contact, category)?,
            };

            self.store
                .set_default_list_ref(&contact.id, category, &list.id)?;
            contact.set_default_list_id(category, list.id);
        }

        Ok(contact)
    }

    fn create_default_list(&self, contact: &Contact, category: ListCategory) -> LifecycleResult<List> {
        let mut list = List {
            id: String::new(),
            user_id: contact.user_id.clone(),
            name: default_list_name(&contact.name, category),
            list_type: category,
            is_default: true,
            contact_owner: Some(contact.id.clone()),
            color: category_color(category).to_string(),
            icon: category_icon(category).to_string(),
            members: vec![contact.id.clone()],
            shared_with: Vec::new(),
            alarm_lead_minutes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        match self.store.create_list(&mut list) {
            Ok(()) => {
                info!(
                    "created default {} list for contact {}",
                    category.as_str(),
                    contact.id
                );
                Ok(list)
            }
            // another caller created it between the check and the insert
            Err(StoreError::Conflict(_)) => {
                match self.store.find_default_list(&contact.id, category)? {
                    Some(existing) => Ok(existing),
                    None => Err(StoreError::Conflict(format!(
                        "default {} list for contact {}",
                        category.as_str(),
                        contact.id
                    ))
                    .into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn add_task(&self, contact_id: &str, data: CreateItemRequest) -> LifecycleResult<Item> {
        self.add_to_default(contact_id, ListCategory::Task, data)
    }

    pub fn add_meeting(&self, contact_id: &str, data: CreateItemRequest) -> LifecycleResult<Item> {
        self.add_to_default(contact_id, ListCategory::Meeting, data)
    }

    pub fn add_transaction(
        &self,
        contact_id: &str,
        data: CreateItemRequest,
    ) -> LifecycleResult<Item> {
        self.add_to_default(contact_id, ListCategory::Transaction, data)
    }

    fn add_to_default(
        &self,
        contact_id: &str,
        category: ListCategory,
        data: CreateItemRequest,
    ) -> LifecycleResult<Item> {
        let contact = self.store.get_contact(contact_id)?;
        let list_id = contact.default_list_id(category).ok_or_else(|| {
            LifecycleError::DefaultListMissing {
                contact_id: contact.id.clone(),
                category: category.as_str(),
            }
        })?;
        let list = self.store.get_list(list_id)?;
        self.add_item(&list, data)
    }

    /// Append an item to a list. When the list carries a default alarm
    /// lead time and the item has a due date, one reminder alarm at
    /// `due - lead` is derived in addition to any alarms the caller
    /// supplied; otherwise the item keeps exactly the supplied alarms.
    pub fn add_item(&self, list: &List, data: CreateItemRequest) -> LifecycleResult<Item> {
        let alarms: Vec<Alarm> = data
            .alarms
            .into_iter()
            .map(|a| Alarm {
                id: String::new(),
                trigger_at: a.trigger_at,
                channel: a.channel,
                message: a.message,
                triggered: false,
                triggered_at: None,
            })
            .collect();

        let mut item = Item {
            id: String::new(),
            list_id: list.id.clone(),
            title: data.title,
            description: data.description,
            status: ItemStatus::Pending,
            priority: data.priority,
            due_at: data.due_at,
            start_at: data.start_at,
            end_at: data.end_at,
            completed_at: None,
            payload: data.payload,
            alarms,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        if let (Some(lead), Some(due)) = (list.alarm_lead_minutes, item.due_at) {
            item.alarms.push(Alarm {
                id: String::new(),
                trigger_at: due - Duration::minutes(lead),
                channel: AlarmChannel::Notification,
                message: format!("Reminder: {}", item.title),
                triggered: false,
                triggered_at: None,
            });
        }

        self.store.create_item(&mut item)?;
        Ok(item)
    }
}

fn default_list_name(contact_name: &str, category: ListCategory) -> String {
    let suffix = match category {
        ListCategory::Task => "Tasks",
        ListCategory::Meeting => "Meetings",
        ListCategory::Transaction => "Transactions",
        ListCategory::Booking => "Bookings",
        ListCategory::Custom => "List",
    };
    format!("{} - {}", contact_name, suffix)
}

fn category_color(category: ListCategory) -> &'static str {
    match category {
        ListCategory::Task => "#4caf50",
        ListCategory::Meeting => "#2196f3",
        ListCategory::Transaction => "#ff9800",
        ListCategory::Booking => "#9c27b0",
        ListCategory::Custom => "#9e9e9e",
    }
}

fn category_icon(category: ListCategory) -> &'static str {
    match category {
        ListCategory::Task => "check-circle",
        ListCategory::Meeting => "calendar",
        ListCategory::Transaction => "credit-card",
        ListCategory::Booking => "bookmark",
        ListCategory::Custom => "list",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewAlarm, Priority, Profession, User};
    use chrono::Utc;

    fn setup() -> (Arc<Store>, DefaultListManager, Contact) {
        let store = Arc::new(Store::in_memory().unwrap());
        let mut user = User {
            id: String::new(),
            email: "a@example.com".to_string(),
            phone: None,
            password_hash: "hash".to_string(),
            display_name: "A".to_string(),
            profession: Profession::RealEstate,
            profession_info: Default::default(),
            share_code: None,
            shared_with: Vec::new(),
            access_via: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create_user(&mut user).unwrap();

        let mut contact = Contact {
            id: String::new(),
            user_id: user.id.clone(),
            name: "Alice".to_string(),
            linked_user_id: None,
            referred_by: None,
            referrals: Vec::new(),
            task_list_id: None,
            meeting_list_id: None,
            transaction_list_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create_contact(&mut contact).unwrap();

        let manager = DefaultListManager::new(store.clone());
        (store, manager, contact)
    }

    fn item_request(title: &str) -> CreateItemRequest {
        CreateItemRequest {
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            due_at: None,
            start_at: None,
            end_at: None,
            payload: None,
            alarms: Vec::new(),
        }
    }

    #[test]
    fn test_ensure_creates_all_three_lists() {
        let (store, manager, contact) = setup();
        let provisioned = manager.ensure_default_lists(&contact.id).unwrap();

        for category in DEFAULT_CATEGORIES {
            let list_id = provisioned
                .default_list_id(category)
                .unwrap_or_else(|| panic!("missing {} reference", category.as_str()));
            let list = store.get_list(list_id).unwrap();
            assert!(list.is_default);
            assert_eq!(list.contact_owner.as_deref(), Some(contact.id.as_str()));
            assert_eq!(list.list_type, category);
        }

        let task_list = store
            .get_list(provisioned.task_list_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(task_list.name, "Alice - Tasks");
    }

    #[test]
    fn test_ensure_is_noop_when_complete() {
        let (store, manager, contact) = setup();
        let first = manager.ensure_default_lists(&contact.id).unwrap();
        let second = manager.ensure_default_lists(&contact.id).unwrap();

        assert_eq!(first.task_list_id, second.task_list_id);
        assert_eq!(first.meeting_list_id, second.meeting_list_id);
        assert_eq!(first.transaction_list_id, second.transaction_list_id);
        assert_eq!(store.list_lists(&contact.user_id).unwrap().len(), 3);
    }

    #[test]
    fn test_ensure_completes_partial_state() {
        let (store, manager, contact) = setup();

        // simulate a crash after the tasks list was created and wired
        let mut task_list = List {
            id: String::new(),
            user_id: contact.user_id.clone(),
            name: "Alice - Tasks".to_string(),
            list_type: ListCategory::Task,
            is_default: true,
            contact_owner: Some(contact.id.clone()),
            color: String::new(),
            icon: String::new(),
            members: Vec::new(),
            shared_with: Vec::new(),
            alarm_lead_minutes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create_list(&mut task_list).unwrap();
        store
            .set_default_list_ref(&contact.id, ListCategory::Task, &task_list.id)
            .unwrap();

        let repaired = manager.ensure_default_lists(&contact.id).unwrap();
        assert_eq!(repaired.task_list_id.as_deref(), Some(task_list.id.as_str()));
        assert!(repaired.meeting_list_id.is_some());
        assert!(repaired.transaction_list_id.is_some());
        assert_eq!(store.list_lists(&contact.user_id).unwrap().len(), 3);
    }

    #[test]
    fn test_ensure_adopts_orphaned_list_without_backref() {
        let (store, manager, contact) = setup();

        // the list exists but the crash hit before the back-reference
        let mut orphan = List {
            id: String::new(),
            user_id: contact.user_id.clone(),
            name: "Alice - Meetings".to_string(),
            list_type: ListCategory::Meeting,
            is_default: true,
            contact_owner: Some(contact.id.clone()),
            color: String::new(),
            icon: String::new(),
            members: Vec::new(),
            shared_with: Vec::new(),
            alarm_lead_minutes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create_list(&mut orphan).unwrap();

        let repaired = manager.ensure_default_lists(&contact.id).unwrap();
        assert_eq!(repaired.meeting_list_id.as_deref(), Some(orphan.id.as_str()));
        assert_eq!(store.list_lists(&contact.user_id).unwrap().len(), 3);
    }

    #[test]
    fn test_add_task_appends_to_default_list() {
        let (store, manager, contact) = setup();
        manager.ensure_default_lists(&contact.id).unwrap();

        let item = manager.add_task(&contact.id, item_request("Call Alice")).unwrap();
        let provisioned = store.get_contact(&contact.id).unwrap();
        assert_eq!(
            item.list_id,
            provisioned.task_list_id.clone().unwrap()
        );

        let items = store.list_items(&item.list_id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Call Alice");
    }

    #[test]
    fn test_add_task_without_lists_fails() {
        let (_store, manager, contact) = setup();

        match manager.add_task(&contact.id, item_request("Call Alice")) {
            Err(LifecycleError::DefaultListMissing { category, .. }) => {
                assert_eq!(category, "task")
            }
            other => panic!("expected DefaultListMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_add_item_derives_alarm_from_lead_time() {
        let (store, manager, contact) = setup();
        let provisioned = manager.ensure_default_lists(&contact.id).unwrap();

        let mut list = store
            .get_list(provisioned.task_list_id.as_deref().unwrap())
            .unwrap();
        list.alarm_lead_minutes = Some(30);
        store.update_list(&mut list).unwrap();
        let list = store.get_list(&list.id).unwrap();

        let due = Utc::now() + Duration::days(1);
        let mut request = item_request("Send papers");
        request.due_at = Some(due);
        request.alarms = vec![NewAlarm {
            trigger_at: due - Duration::hours(2),
            channel: AlarmChannel::Email,
            message: "two hours out".to_string(),
        }];

        let item = manager.add_item(&list, request).unwrap();
        assert_eq!(item.alarms.len(), 2);

        let derived = &item.alarms[1];
        assert_eq!(derived.trigger_at, due - Duration::minutes(30));
        assert_eq!(derived.channel, AlarmChannel::Notification);
        assert_eq!(derived.message, "Reminder: Send papers");
        assert!(!derived.triggered);
    }

    #[test]
    fn test_add_item_without_lead_time_keeps_supplied_alarms() {
        let (store, manager, contact) = setup();
        let provisioned = manager.ensure_default_lists(&contact.id).unwrap();
        let list = store
            .get_list(provisioned.task_list_id.as_deref().unwrap())
            .unwrap();

        let due = Utc::now() + Duration::days(1);
        let mut request = item_request("Send papers");
        request.due_at = Some(due);

        let item = manager.add_item(&list, request).unwrap();
        assert!(item.alarms.is_empty());
    }

    #[test]
    fn test_add_item_with_lead_time_but_no_due_date() {
        let (store, manager, contact) = setup();
        let provisioned = manager.ensure_default_lists(&contact.id).unwrap();

        let mut list = store
            .get_list(provisioned.task_list_id.as_deref().unwrap())
            .unwrap();
        list.alarm_lead_minutes = Some(30);
        store.update_list(&mut list).unwrap();
        let list = store.get_list(&list.id).unwrap();

        let item = manager.add_item(&list, item_request("No due date")).unwrap();
        assert!(item.alarms.is_empty());
    }
}
