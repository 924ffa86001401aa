//! Database models
//!
//! Enumerated columns are stored as their lowercase text tag and guarded by
//! `CHECK` constraints in the schema; `FromStr` accepts exactly those tags.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Declares a closed set of text tags with serde, `Display` and `FromStr`
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Text tag as stored in the database
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(crate::Error::InvalidInput(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

// ============================================================================
// Identity Store
// ============================================================================

text_enum! {
    /// Role tag of a caregiver account
    pub enum CaregiverRole {
        Family => "family",
        Medical => "medical",
        Caregiver => "caregiver",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caregiver {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: CaregiverRole,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration payload (credentials are handled outside this service)
#[derive(Debug, Clone, Deserialize)]
pub struct NewCaregiver {
    pub email: String,
    pub display_name: String,
    pub role: CaregiverRole,
    #[serde(default)]
    pub phone_number: Option<String>,
}

// ============================================================================
// Care-Subject Registry
// ============================================================================

text_enum! {
    pub enum Gender {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

text_enum! {
    pub enum MobilityStatus {
        Independent => "independent",
        Limited => "limited",
        Assisted => "assisted",
        Wheelchair => "wheelchair",
    }
}

text_enum! {
    pub enum VisionStatus {
        Normal => "normal",
        Corrected => "corrected",
        Limited => "limited",
        Blind => "blind",
    }
}

text_enum! {
    pub enum HearingStatus {
        Normal => "normal",
        Corrected => "corrected",
        Limited => "limited",
        Deaf => "deaf",
    }
}

text_enum! {
    pub enum SpeechStatus {
        Normal => "normal",
        Limited => "limited",
        NonVerbal => "non_verbal",
    }
}

/// One entry of a condition or medication list
///
/// Medications require `dose` and `schedule`; conditions only need a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub name: String,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Demographic and clinical profile of a care subject
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CareSubjectProfile {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub health_status: Option<String>,
    pub medical_history: Option<String>,
    pub conditions: Vec<ProfileEntry>,
    pub medications: Vec<ProfileEntry>,
    pub allergies: Vec<String>,
    pub sensitivities: Vec<String>,
    pub mobility_status: Option<MobilityStatus>,
    pub mobility_aids: Vec<String>,
    pub vision_status: Option<VisionStatus>,
    pub hearing_status: Option<HearingStatus>,
    pub speech_status: Option<SpeechStatus>,
    pub emergency_contact: Option<String>,
    pub care_instructions: Option<String>,
    pub robot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareSubject {
    pub id: Uuid,
    #[serde(flatten)]
    pub profile: CareSubjectProfile,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a care subject
///
/// An absent field is left unchanged. For nullable columns an explicit
/// `null` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CareSubjectPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub gender: Option<Option<Gender>>,
    #[serde(deserialize_with = "double_option")]
    pub phone_number: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub health_status: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub medical_history: Option<Option<String>>,
    pub conditions: Option<Vec<ProfileEntry>>,
    pub medications: Option<Vec<ProfileEntry>>,
    pub allergies: Option<Vec<String>>,
    pub sensitivities: Option<Vec<String>>,
    #[serde(deserialize_with = "double_option")]
    pub mobility_status: Option<Option<MobilityStatus>>,
    pub mobility_aids: Option<Vec<String>>,
    #[serde(deserialize_with = "double_option")]
    pub vision_status: Option<Option<VisionStatus>>,
    #[serde(deserialize_with = "double_option")]
    pub hearing_status: Option<Option<HearingStatus>>,
    #[serde(deserialize_with = "double_option")]
    pub speech_status: Option<Option<SpeechStatus>>,
    #[serde(deserialize_with = "double_option")]
    pub emergency_contact: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub care_instructions: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub robot_id: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Distinguishes a present `null` (Some(None)) from an absent field (None)
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Access Relation Graph
// ============================================================================

text_enum! {
    /// How a caregiver relates to a care subject
    pub enum RelationshipType {
        Child => "child",
        MedicalProfessional => "medical_professional",
        Caregiver => "caregiver",
        Other => "other",
    }
}

text_enum! {
    /// Permission carried by an access relation
    ///
    /// Declaration order is the total order `view < edit < admin`, so a
    /// permission check is a single comparison.
    #[derive(PartialOrd, Ord)]
    pub enum PermissionLevel {
        View => "view",
        Edit => "edit",
        Admin => "admin",
    }
}

impl PermissionLevel {
    /// True when this level is at least `required`
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        self >= required
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRelation {
    pub id: Uuid,
    pub caregiver_id: Uuid,
    pub care_subject_id: Uuid,
    pub relationship_type: RelationshipType,
    pub permission_level: PermissionLevel,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Interaction Ledger
// ============================================================================

text_enum! {
    pub enum InteractionKind {
        Conversation => "conversation",
        HealthCheck => "health_check",
        Reminder => "reminder",
        Game => "game",
        VoiceRecording => "voice_recording",
    }
}

text_enum! {
    pub enum SentimentLabel {
        Positive => "positive",
        Neutral => "neutral",
        Negative => "negative",
    }
}

impl SentimentLabel {
    /// Label implied by a score in [-1, 1]
    pub fn from_score(score: f64) -> Self {
        if score > 0.3 {
            SentimentLabel::Positive
        } else if score < -0.3 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

text_enum! {
    /// Urgency flag attached by the recording device
    #[derive(Default)]
    pub enum AlertLevel {
        #[default]
        Normal => "normal",
        Attention => "attention",
        Urgent => "urgent",
    }
}

/// Interaction as submitted by a recording device
#[derive(Debug, Clone, Deserialize)]
pub struct NewInteraction {
    pub kind: InteractionKind,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub sentiment_label: Option<SentimentLabel>,
    #[serde(default)]
    pub mood_score: Option<i64>,
    #[serde(default)]
    pub cognitive_score: Option<f64>,
    #[serde(default)]
    pub health_indicators: Option<serde_json::Value>,
    #[serde(default)]
    pub alert_level: Option<AlertLevel>,
    #[serde(default)]
    pub robot_response: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub duration_seconds: i64,
    /// Capture time for sessions uploaded after the fact; defaults to now
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl NewInteraction {
    /// Interaction with only the mandatory fields set
    pub fn new(kind: InteractionKind, duration_seconds: i64) -> Self {
        Self {
            kind,
            transcript: None,
            audio_url: None,
            sentiment_score: None,
            sentiment_label: None,
            mood_score: None,
            cognitive_score: None,
            health_indicators: None,
            alert_level: None,
            robot_response: None,
            notes: None,
            duration_seconds,
            recorded_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub care_subject_id: Uuid,
    pub kind: InteractionKind,
    pub transcript: Option<String>,
    pub audio_url: Option<String>,
    pub sentiment_score: Option<f64>,
    pub sentiment_label: Option<SentimentLabel>,
    pub mood_score: Option<i64>,
    pub cognitive_score: Option<f64>,
    pub health_indicators: Option<serde_json::Value>,
    pub alert_level: AlertLevel,
    pub robot_response: Option<String>,
    pub notes: Option<String>,
    pub duration_seconds: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Alert Lifecycle
// ============================================================================

text_enum! {
    pub enum AlertType {
        Health => "health",
        Safety => "safety",
        Mood => "mood",
        Cognitive => "cognitive",
    }
}

text_enum! {
    #[derive(PartialOrd, Ord)]
    pub enum Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

text_enum! {
    /// Two-state alert lifecycle: Active (initial) -> Resolved (terminal)
    pub enum AlertState {
        Active => "active",
        Resolved => "resolved",
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewHealthAlert {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub id: Uuid,
    pub care_subject_id: Uuid,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub state: AlertState,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Aggregation
// ============================================================================

/// Point-in-time statistics for one care subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_interactions: i64,
    pub avg_mood_score: f64,
    pub avg_sentiment: f64,
    pub total_duration_seconds: i64,
    pub active_alerts_count: i64,
}

/// One calendar-day bucket of a sentiment series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub avg_sentiment: f64,
    pub avg_mood: f64,
}
