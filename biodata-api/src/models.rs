use chrono::{DateTime, Datelike, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use biodata_shared::text_enum;
use biodata_shared::types::UserRole;

use crate::schema::{admin_actions, interests, profiles, refresh_tokens, users};

// --- Enums ---

text_enum! {
    pub enum ProfileStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Withdrawn => "WITHDRAWN",
    }
}

text_enum! {
    pub enum Gender {
        Male => "MALE",
        Female => "FEMALE",
    }
}

text_enum! {
    pub enum Complexion {
        VeryFair => "VERY_FAIR",
        Fair => "FAIR",
        Wheatish => "WHEATISH",
        Brown => "BROWN",
        Dark => "DARK",
    }
}

text_enum! {
    pub enum MaritalStatus {
        NeverMarried => "NEVER_MARRIED",
        Divorced => "DIVORCED",
        Widowed => "WIDOWED",
    }
}

text_enum! {
    pub enum ImmigrationStatus {
        Citizen => "CITIZEN",
        PermanentResident => "PERMANENT_RESIDENT",
        TemporaryVisa => "TEMPORARY_VISA",
        StudentVisa => "STUDENT_VISA",
        WorkVisa => "WORK_VISA",
        Other => "OTHER",
    }
}

text_enum! {
    pub enum ReligiousPractice {
        VeryPracticing => "VERY_PRACTICING",
        Practicing => "PRACTICING",
        Moderate => "MODERATE",
        Basic => "BASIC",
    }
}

text_enum! {
    pub enum AdminActionKind {
        ApproveProfile => "APPROVE_PROFILE",
        RejectProfile => "REJECT_PROFILE",
        UpdateUserRole => "UPDATE_USER_ROLE",
    }
}

// --- User ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

// --- RefreshToken ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = refresh_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

// --- Profile ---

/// The biodata a user submits. Shared by insert, owner update and reads, so
/// the column list lives in one place.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub country_of_birth: String,
    pub height: String,
    pub complexion: Complexion,
    pub education_degree: String,
    pub education_degree_other: Option<String>,
    pub education_subject: String,
    pub education_year: i32,
    pub education_institute: String,
    pub profession: String,
    pub profession_other: Option<String>,
    pub company: Option<String>,
    pub marital_status: MaritalStatus,
    pub father_occupation: String,
    pub father_education: Option<String>,
    pub mother_occupation: String,
    pub mother_education: Option<String>,
    pub parents_location: String,
    pub current_residence: String,
    pub citizenship: String,
    pub immigration_status: ImmigrationStatus,
    pub immigration_details: Option<String>,
    pub willing_to_relocate: bool,
    pub willing_to_live_with_in_laws: bool,
    pub religious_practice: ReligiousPractice,
    pub prays_five_time_daily: bool,
    pub attends_mosque_regularly: bool,
    pub halaal_earning: bool,
    pub halaal_food: bool,
    pub drinks_alcohol: bool,
    pub smokes: bool,
    pub hobbies: Option<String>,
    pub has_pets: bool,
    pub pet_details: Option<String>,
    pub spouse_age_range_min: i32,
    pub spouse_age_range_max: i32,
    pub spouse_education: Option<String>,
    pub spouse_citizenship: Option<String>,
    pub spouse_min_height: Option<String>,
    pub about_you: String,
    pub about_spouse: String,
    #[serde(default = "no_siblings")]
    pub siblings: serde_json::Value,
    pub has_parent_consent: bool,
    pub agreed_to_terms: bool,
}

fn no_siblings() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub submitted_by_id: Uuid,
    pub status: ProfileStatus,
    pub rejection_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[diesel(embed)]
    #[serde(flatten)]
    pub fields: ProfileFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.submitted_by_id == user_id
    }

    pub fn summary(&self, today: NaiveDate) -> ProfileSummary {
        ProfileSummary {
            id: self.id,
            name: self.fields.name.clone(),
            gender: self.fields.gender,
            age: age_on(self.fields.date_of_birth, today),
            education_degree: self.fields.education_degree.clone(),
            education_subject: self.fields.education_subject.clone(),
            profession: self.fields.profession.clone(),
            current_residence: self.fields.current_residence.clone(),
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub submitted_by_id: Uuid,
    pub status: ProfileStatus,
    #[diesel(embed)]
    pub fields: ProfileFields,
}

/// Whole years between `born` and `today`.
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}

// --- Interest ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = interests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: Uuid,
    pub interested_user_id: Uuid,
    pub target_profile_id: Uuid,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = interests)]
pub struct NewInterest {
    pub interested_user_id: Uuid,
    pub target_profile_id: Uuid,
    pub notes: Option<String>,
}

// --- AdminAction ---

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = admin_actions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct AdminAction {
    pub id: Uuid,
    pub action: AdminActionKind,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub admin_id: Uuid,
    pub profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = admin_actions)]
pub struct NewAdminAction {
    pub action: AdminActionKind,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub admin_id: Uuid,
    pub profile_id: Option<Uuid>,
}

// --- Response views ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub age: i32,
    pub education_degree: String,
    pub education_subject: String,
    pub profession: String,
    pub current_residence: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestWithProfile {
    #[serde(flatten)]
    pub interest: Interest,
    pub profile: ProfileSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestWithUser {
    #[serde(flatten)]
    pub interest: Interest,
    pub interested_user: UserIdentity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub submitted_by: Submitter,
}

#[derive(Debug, Serialize)]
pub struct ProfileRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActionEntry {
    #[serde(flatten)]
    pub action: AdminAction,
    pub admin: UserIdentity,
    pub profile: Option<ProfileRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_users: i64,
    pub total_profiles: i64,
    pub pending_profiles: i64,
    pub approved_profiles: i64,
    pub rejected_profiles: i64,
    pub active_interests: i64,
}

// --- Listing filter ---

/// Optional narrowing of the public profile list. Age bounds are turned into
/// date-of-birth bounds so both stores filter on the stored column.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFilter {
    pub gender: Option<Gender>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub education: Option<String>,
    pub country: Option<String>,
    pub immigration_status: Option<ImmigrationStatus>,
    pub religious_practice: Option<ReligiousPractice>,
    pub marital_status: Option<MaritalStatus>,
}

impl ProfileFilter {
    /// Latest birth date still old enough for `min_age`.
    pub fn born_on_or_before(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.min_age.map(|age| years_before(today, age))
    }

    /// Earliest birth date still young enough for `max_age`.
    pub fn born_after(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.max_age.map(|age| years_before(today, age.saturating_add(1)))
    }

    pub fn matches(&self, profile: &Profile, today: NaiveDate) -> bool {
        let f = &profile.fields;
        if self.gender.is_some_and(|g| g != f.gender) {
            return false;
        }
        if self.born_on_or_before(today).is_some_and(|d| f.date_of_birth > d) {
            return false;
        }
        if self.born_after(today).is_some_and(|d| f.date_of_birth <= d) {
            return false;
        }
        if let Some(education) = &self.education {
            if !contains_ignore_case(&f.education_degree, education) {
                return false;
            }
        }
        if let Some(country) = &self.country {
            if !contains_ignore_case(&f.current_residence, country)
                && !contains_ignore_case(&f.citizenship, country)
            {
                return false;
            }
        }
        if self.immigration_status.is_some_and(|s| s != f.immigration_status) {
            return false;
        }
        if self.religious_practice.is_some_and(|p| p != f.religious_practice) {
            return false;
        }
        if self.marital_status.is_some_and(|m| m != f.marital_status) {
            return false;
        }
        true
    }
}

fn years_before(today: NaiveDate, years: u32) -> NaiveDate {
    today
        .checked_sub_months(chrono::Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_counts_whole_years() {
        let born = date(1995, 6, 15);
        assert_eq!(age_on(born, date(2025, 6, 14)), 29);
        assert_eq!(age_on(born, date(2025, 6, 15)), 30);
        assert_eq!(age_on(born, date(2025, 12, 31)), 30);
    }

    #[test]
    fn age_bounds_become_birth_date_bounds() {
        let today = date(2025, 3, 10);
        let filter = ProfileFilter {
            min_age: Some(25),
            max_age: Some(30),
            ..Default::default()
        };
        assert_eq!(filter.born_on_or_before(today), Some(date(2000, 3, 10)));
        assert_eq!(filter.born_after(today), Some(date(1994, 3, 10)));
    }

    #[test]
    fn status_strings_match_wire_format() {
        assert_eq!(ProfileStatus::Pending.as_str(), "PENDING");
        assert_eq!("WITHDRAWN".parse::<ProfileStatus>(), Ok(ProfileStatus::Withdrawn));
        assert_eq!(
            serde_json::to_value(AdminActionKind::UpdateUserRole).unwrap(),
            serde_json::json!("UPDATE_USER_ROLE")
        );
    }

    #[test]
    fn filter_query_parses_camel_case() {
        let filter: ProfileFilter = serde_json::from_value(serde_json::json!({
            "gender": "FEMALE",
            "minAge": 22,
            "religiousPractice": "PRACTICING"
        }))
        .unwrap();
        assert_eq!(filter.gender, Some(Gender::Female));
        assert_eq!(filter.min_age, Some(22));
        assert_eq!(filter.religious_practice, Some(ReligiousPractice::Practicing));
    }
}
