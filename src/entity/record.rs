//! Teacher and school records.
//!
//! Records come from storage with many optional fields. Imports are lenient:
//! a contact field holding a non-string JSON value (number, bool, object) is
//! read as absent instead of rejecting the whole record, because a malformed
//! field must only disable its own comparison branch.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::fields::{present, ContactFields, Freshness};
use super::{EntityId, EntityKind};

/// Accepts any JSON value and keeps it only when it is a string.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Like [`lenient_string`] for required display names; non-strings become "".
fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

/// Keeps the value only when it has the expected JSON shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

/// Flags that are not JSON booleans read as `false`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, bool>(deserializer)?.unwrap_or(false))
}

/// An unreadable creation time falls back to the import time.
fn lenient_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, DateTime<Utc>>(deserializer)?.unwrap_or_else(Utc::now))
}

/// Subject lists keep their string entries; a bare string is one subject.
fn lenient_subjects<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => vec![s],
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// A teacher profile.
///
/// # Examples
///
/// ```
/// use edureconcile::{ContactFields, Teacher};
///
/// let teacher = Teacher::new("t-1", "Sarah Nakamya").with_email("S@X.com");
/// assert_eq!(teacher.name(), Some("Sarah Nakamya"));
/// assert_eq!(teacher.email(), Some("S@X.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    /// Storage id.
    pub id: EntityId,

    /// Display name, compared after normalization.
    #[serde(default, deserialize_with = "lenient_name")]
    pub full_name: String,

    /// Contact email.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Contact phone, any spacing.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Subjects taught.
    #[serde(default, deserialize_with = "lenient_subjects")]
    pub subjects: Vec<String>,

    /// Home district.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    /// Highest qualification, free-form.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,

    /// Years of teaching experience.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,

    /// Shown on the public site.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_active: bool,

    /// Promoted on the public site.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_featured: bool,

    /// When the profile was created.
    #[serde(default = "Utc::now", deserialize_with = "lenient_created_at")]
    pub created_at: DateTime<Utc>,

    /// Last profile edit; the teacher's activity signal.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Teacher {
    /// Creates an active teacher with only an id and a name.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            email: None,
            phone: None,
            subjects: Vec::new(),
            district: None,
            qualification: None,
            experience_years: None,
            is_active: true,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Sets the contact email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the contact phone.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the district.
    #[must_use]
    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    /// Adds a subject taught.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }

    /// Sets the last-modified timestamp.
    #[must_use]
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Fills every absent optional field from `other`. Identity, name,
    /// timestamps and flags are kept.
    pub fn absorb_missing(&mut self, other: &Self) {
        fill(&mut self.email, &other.email);
        fill(&mut self.phone, &other.phone);
        fill(&mut self.district, &other.district);
        fill(&mut self.qualification, &other.qualification);
        if self.experience_years.is_none() {
            self.experience_years = other.experience_years;
        }
        if self.subjects.is_empty() {
            self.subjects.clone_from(&other.subjects);
        }
    }
}

impl ContactFields for Teacher {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        Some(self.full_name.as_str()).filter(|s| !s.trim().is_empty())
    }

    fn email(&self) -> Option<&str> {
        present(self.email.as_ref())
    }

    fn phone(&self) -> Option<&str> {
        present(self.phone.as_ref())
    }
}

impl Freshness for Teacher {
    fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// A teacher with recorded experience, a qualification or at least one
    /// subject counts as more complete.
    fn has_completeness_signal(&self) -> bool {
        self.experience_years.is_some_and(|y| y > 0)
            || present(self.qualification.as_ref()).is_some()
            || self.subjects.iter().any(|s| !s.trim().is_empty())
    }
}

/// A school profile.
///
/// # Examples
///
/// ```
/// use edureconcile::{Freshness, School};
///
/// let school = School::new("s-1", "Gayaza High School").with_total_teachers(48);
/// assert!(school.has_completeness_signal());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    /// Storage id.
    pub id: EntityId,

    /// Institution name, compared by similarity.
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,

    /// Contact email.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Contact phone.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// District the school is in.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    /// Free-form classification, e.g. "primary", "secondary", "international".
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,

    /// Teaching staff count; non-zero marks the record as complete.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub total_teachers: Option<u32>,

    /// Enrolment.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub total_students: Option<u32>,

    /// Shown on the public site.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_active: bool,

    /// Promoted on the public site.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_featured: bool,

    /// When the profile was created.
    #[serde(default = "Utc::now", deserialize_with = "lenient_created_at")]
    pub created_at: DateTime<Utc>,

    /// Most recent activity by the school account.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl School {
    /// Creates an active school with only an id and a name.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            district: None,
            school_type: None,
            total_teachers: None,
            total_students: None,
            is_active: true,
            is_featured: false,
            created_at: Utc::now(),
            last_activity: None,
        }
    }

    /// Sets the contact email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the contact phone.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the school type.
    #[must_use]
    pub fn with_type(mut self, school_type: impl Into<String>) -> Self {
        self.school_type = Some(school_type.into());
        self
    }

    /// Sets the teaching staff count.
    #[must_use]
    pub fn with_total_teachers(mut self, count: u32) -> Self {
        self.total_teachers = Some(count);
        self
    }

    /// Sets the last activity timestamp.
    #[must_use]
    pub fn with_last_activity(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity = Some(at);
        self
    }

    /// Fills every absent optional field from `other`. Identity, name,
    /// timestamps and flags are kept.
    pub fn absorb_missing(&mut self, other: &Self) {
        fill(&mut self.email, &other.email);
        fill(&mut self.phone, &other.phone);
        fill(&mut self.district, &other.district);
        fill(&mut self.school_type, &other.school_type);
        if self.total_teachers.is_none() {
            self.total_teachers = other.total_teachers;
        }
        if self.total_students.is_none() {
            self.total_students = other.total_students;
        }
    }
}

impl ContactFields for School {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|s| !s.trim().is_empty())
    }

    fn email(&self) -> Option<&str> {
        present(self.email.as_ref())
    }

    fn phone(&self) -> Option<&str> {
        present(self.phone.as_ref())
    }
}

impl Freshness for School {
    fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    /// A populated, non-zero teaching staff count.
    fn has_completeness_signal(&self) -> bool {
        self.total_teachers.is_some_and(|n| n > 0)
    }
}

fn fill(slot: &mut Option<String>, other: &Option<String>) {
    if present(slot.as_ref()).is_none() {
        if let Some(value) = present(other.as_ref()) {
            *slot = Some(value.to_string());
        }
    }
}

/// A record of either kind, as returned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRecord {
    /// A teacher profile.
    Teacher(Teacher),
    /// A school profile.
    School(School),
}

impl EntityRecord {
    /// The record family.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Teacher(_) => EntityKind::Teacher,
            Self::School(_) => EntityKind::School,
        }
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Teacher(t) => t.created_at,
            Self::School(s) => s.created_at,
        }
    }

    /// Whether the record is shown on the public site.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        match self {
            Self::Teacher(t) => t.is_active,
            Self::School(s) => s.is_active,
        }
    }

    /// Whether the record is promoted on the public site.
    #[must_use]
    pub const fn is_featured(&self) -> bool {
        match self {
            Self::Teacher(t) => t.is_featured,
            Self::School(s) => s.is_featured,
        }
    }

    /// Returns the teacher, if this is one.
    #[must_use]
    pub const fn as_teacher(&self) -> Option<&Teacher> {
        match self {
            Self::Teacher(t) => Some(t),
            Self::School(_) => None,
        }
    }

    /// Returns the school, if this is one.
    #[must_use]
    pub const fn as_school(&self) -> Option<&School> {
        match self {
            Self::School(s) => Some(s),
            Self::Teacher(_) => None,
        }
    }

    /// Fills absent optional fields from `other` when both are the same kind.
    /// Records of different kinds are left untouched.
    pub fn absorb_missing(&mut self, other: &Self) {
        match (self, other) {
            (Self::Teacher(a), Self::Teacher(b)) => a.absorb_missing(b),
            (Self::School(a), Self::School(b)) => a.absorb_missing(b),
            _ => {}
        }
    }
}

impl From<Teacher> for EntityRecord {
    fn from(value: Teacher) -> Self {
        Self::Teacher(value)
    }
}

impl From<School> for EntityRecord {
    fn from(value: School) -> Self {
        Self::School(value)
    }
}

impl ContactFields for EntityRecord {
    fn id(&self) -> &EntityId {
        match self {
            Self::Teacher(t) => t.id(),
            Self::School(s) => s.id(),
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            Self::Teacher(t) => t.name(),
            Self::School(s) => ContactFields::name(s),
        }
    }

    fn email(&self) -> Option<&str> {
        match self {
            Self::Teacher(t) => t.email(),
            Self::School(s) => s.email(),
        }
    }

    fn phone(&self) -> Option<&str> {
        match self {
            Self::Teacher(t) => t.phone(),
            Self::School(s) => s.phone(),
        }
    }
}

impl Freshness for EntityRecord {
    fn last_activity(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Teacher(t) => t.last_activity(),
            Self::School(s) => s.last_activity(),
        }
    }

    fn has_completeness_signal(&self) -> bool {
        match self {
            Self::Teacher(t) => t.has_completeness_signal(),
            Self::School(s) => s.has_completeness_signal(),
        }
    }
}
