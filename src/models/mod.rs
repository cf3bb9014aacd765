use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User is an account holder - each user owns their contacts and lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub profession: Profession,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub profession_info: HashMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub shared_with: Vec<ShareGrant>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub access_via: Vec<AccessRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profession category, a fixed closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Profession {
    RealEstate,
    Insurance,
    Finance,
    Legal,
    Sales,
    #[default]
    Other,
}

impl Profession {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profession::RealEstate => "real_estate",
            Profession::Insurance => "insurance",
            Profession::Finance => "finance",
            Profession::Legal => "legal",
            Profession::Sales => "sales",
            Profession::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Profession {
        match s {
            "real_estate" => Profession::RealEstate,
            "insurance" => Profession::Insurance,
            "finance" => Profession::Finance,
            "legal" => Profession::Legal,
            "sales" => Profession::Sales,
            _ => Profession::Other,
        }
    }
}

/// ShareGrant is one directional permission record on the granting
/// account: the grantee may view or edit this account's data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareGrant {
    pub user_id: String,
    pub level: AccessLevel,
    pub granted_at: DateTime<Utc>,
}

/// AccessRecord is one redemption record on the redeeming account:
/// which code was used and whose account it resolved to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRecord {
    pub code: String,
    pub owner_id: String,
    pub redeemed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    View,
    Edit,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::View => "view",
            AccessLevel::Edit => "edit",
        }
    }
}

/// Contact is a relationship entity owned by exactly one user.
/// Referrals form a directed graph: a contact remembers who introduced
/// it and which contacts it introduced in turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub referrals: Vec<String>,
    pub task_list_id: Option<String>,
    pub meeting_list_id: Option<String>,
    pub transaction_list_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Back-reference to the default list for the given category, if set
    pub fn default_list_id(&self, category: ListCategory) -> Option<&str> {
        match category {
            ListCategory::Task => self.task_list_id.as_deref(),
            ListCategory::Meeting => self.meeting_list_id.as_deref(),
            ListCategory::Transaction => self.transaction_list_id.as_deref(),
            _ => None,
        }
    }

    pub fn set_default_list_id(&mut self, category: ListCategory, list_id: String) {
        match category {
            ListCategory::Task => self.task_list_id = Some(list_id),
            ListCategory::Meeting => self.meeting_list_id = Some(list_id),
            ListCategory::Transaction => self.transaction_list_id = Some(list_id),
            _ => {}
        }
    }
}

/// List is an ordered named collection of Items, optionally pinned to
/// one contact as its default container for a fixed category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub list_type: ListCategory,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_owner: Option<String>,
    pub color: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub shared_with: Vec<ListGrant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_lead_minutes: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// ListGrant is the list-level sharing record, a simpler parallel to the
/// account-level share-code system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListGrant {
    pub user_id: String,
    pub level: AccessLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListCategory {
    Task,
    Meeting,
    Transaction,
    Booking,
    #[default]
    Custom,
}

impl ListCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListCategory::Task => "task",
            ListCategory::Meeting => "meeting",
            ListCategory::Transaction => "transaction",
            ListCategory::Booking => "booking",
            ListCategory::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> ListCategory {
        match s {
            "task" => ListCategory::Task,
            "meeting" => ListCategory::Meeting,
            "transaction" => ListCategory::Transaction,
            "booking" => ListCategory::Booking,
            _ => ListCategory::Custom,
        }
    }
}

/// Item is a unit of work/event/record inside a list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub list_id: String,
    pub title: String,
    pub description: String,
    pub status: ItemStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ItemPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub alarms: Vec<Alarm>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Completed => "completed",
            ItemStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> ItemStatus {
        match s {
            "in_progress" => ItemStatus::InProgress,
            "completed" => ItemStatus::Completed,
            "cancelled" => ItemStatus::Cancelled,
            _ => ItemStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Priority {
        match s {
            "low" => Priority::Low,
            "high" => Priority::High,
            "urgent" => Priority::Urgent,
            _ => Priority::Medium,
        }
    }
}

/// ItemPayload is the category-specific half of an item. Exactly one
/// variant is semantically active, chosen by the parent list's category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemPayload {
    Task {
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        checklist: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        assignee: Option<String>,
    },
    Meeting {
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        attendees: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        agenda: Option<String>,
    },
    Transaction {
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        currency: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        direction: Option<String>,
    },
    Booking {
        #[serde(skip_serializing_if = "Option::is_none")]
        venue: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        party_size: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        confirmation: Option<String>,
    },
}

/// Alarm is a scheduled trigger attached to an item. An external sweep
/// flips `triggered`; once true it never resets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    pub trigger_at: DateTime<Utc>,
    pub channel: AlarmChannel,
    pub message: String,
    pub triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlarmChannel {
    #[default]
    Notification,
    Email,
    Sms,
}

/// Tag is a taxonomy entry for profession-typed contact labelling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub category: String,
    pub name: String,
}

// Request/Response types for API

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub profession: Profession,
    #[serde(default)]
    pub profession_info: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub linked_user_id: Option<String>,
    pub referred_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub name: Option<String>,
    pub linked_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub list_type: ListCategory,
    pub color: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
    pub alarm_lead_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub members: Option<Vec<String>>,
    pub alarm_lead_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub due_at: Option<DateTime<Utc>>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub payload: Option<ItemPayload>,
    #[serde(default)]
    pub alarms: Vec<NewAlarm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAlarm {
    pub trigger_at: DateTime<Utc>,
    #[serde(default)]
    pub channel: AlarmChannel,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
    pub priority: Option<Priority>,
    pub due_at: Option<DateTime<Utc>>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub payload: Option<ItemPayload>,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub user_id: String,
    #[serde(default)]
    pub level: AccessLevel,
}

#[derive(Debug, Deserialize)]
pub struct ListGrantRequest {
    pub user_id: String,
    #[serde(default)]
    pub level: AccessLevel,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
